// ==========================================
// 学院财务管理系统 - 选课与缴费领域模型
// ==========================================
// 对齐: enrollments / payments 表
// ==========================================

use crate::domain::types::{EnrollmentStatus, PaymentMethod, PaymentRecordStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Enrollment - 选课记录（学员↔课程）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,                 // 选课ID
    pub student_id: String,         // 学员ID（FK）
    pub course_id: String,          // 课程ID（FK）
    pub enrollment_date: NaiveDate, // 选课日期（应缴起算月）
    pub status: EnrollmentStatus,   // 选课状态
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    /// 创建新选课记录（默认在读）
    pub fn new(student_id: &str, course_id: &str, enrollment_date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            enrollment_date,
            status: EnrollmentStatus::Enrolled,
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// Payment - 缴费记录
// ==========================================
// course_id 可为空（与课程无关的缴费,如报名费）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    pub course_id: Option<String>,
    pub amount: Option<Decimal>,          // 金额（正数；脏数据为 None）
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// 创建一笔已到账的月费缴费
    pub fn monthly_fee(
        student_id: &str,
        course_id: &str,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            course_id: Some(course_id.to_string()),
            amount: Some(amount),
            payment_date,
            payment_method: PaymentMethod::MonthlyFee,
            status: PaymentRecordStatus::Completed,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// 可抵扣月费的课程ID
    ///
    /// 条件: 已到账 + 月费类型 + 关联课程；不满足返回 None
    pub fn qualifying_course_id(&self) -> Option<&str> {
        if self.status != PaymentRecordStatus::Completed
            || self.payment_method != PaymentMethod::MonthlyFee
        {
            return None;
        }
        self.course_id.as_deref()
    }
}
