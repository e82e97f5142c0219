// ==========================================
// 学院财务管理系统 - 缴费状态（派生结果）
// ==========================================
// 红线: 派生结果只读,不落库（逾期是计算值,不是存储值）
// 用途: 学员列表徽标 / 欠费工作清单 / 考勤页提示
// ==========================================

use crate::domain::types::FeeStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// DataFlag - 数据质量标记
// ==========================================
// 脏数据不中断计算,兜底为 0 并打标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFlag {
    MissingMonthlyFee,        // 课程月费缺失
    NegativeMonthlyFee,       // 课程月费为负
    MissingDiscount,          // 学员折扣缺失
    DiscountOutOfRange,       // 折扣不在 [0,100]
    InvalidPaymentAmount,     // 缴费金额缺失或非正数
    AmountOverflow,           // 金额累计溢出,已按 Decimal::MAX 截断
}

// ==========================================
// PaymentStatus - 单门课程的缴费状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub student_id: String,
    pub course_id: String,
    pub course_name: String,
    pub monthly_fee: Decimal,      // 折后月费
    pub remaining_amount: Decimal, // 当前应缴窗口内的未缴金额（>= 0）
    pub payment_status: FeeStatus,
    pub months_overdue: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<DataFlag>,
}

// ==========================================
// StudentPaymentSummary - 学员跨课程聚合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPaymentSummary {
    pub student_id: String,
    pub courses: Vec<PaymentStatus>,
    pub total_remaining: Decimal,
    pub has_overdue: bool,
    pub max_months_overdue: u32,
    pub overall_status: FeeStatus, // 各课程中最严重的状态；无在读课程为 Paid
}

impl StudentPaymentSummary {
    /// 由单课程状态聚合
    pub fn from_courses(student_id: &str, courses: Vec<PaymentStatus>) -> Self {
        let total_remaining = courses
            .iter()
            .map(|c| c.remaining_amount)
            .fold(Decimal::ZERO, |acc, v| {
                acc.checked_add(v).unwrap_or(Decimal::MAX)
            });
        let has_overdue = courses
            .iter()
            .any(|c| c.payment_status == FeeStatus::Overdue);
        let max_months_overdue = courses
            .iter()
            .map(|c| c.months_overdue)
            .max()
            .unwrap_or(0);
        let overall_status = courses
            .iter()
            .map(|c| c.payment_status)
            .max()
            .unwrap_or(FeeStatus::Paid);

        Self {
            student_id: student_id.to_string(),
            courses,
            total_remaining,
            has_overdue,
            max_months_overdue,
            overall_status,
        }
    }

    /// 是否存在未缴金额
    pub fn has_balance(&self) -> bool {
        self.total_remaining > Decimal::ZERO
    }
}

// ==========================================
// DuePaymentEntry - 欠费工作清单条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuePaymentEntry {
    pub student_id: String,
    pub student_name: String,
    pub phone: Option<String>,
    pub summary: StudentPaymentSummary,
    pub suggested_penalty: Decimal, // 逾期时为配置的滞纳金,否则为 0
    pub badge: String,
}
