// ==========================================
// 学院财务管理系统 - 领域类型定义
// ==========================================
// 存储格式: 小写 snake_case（与数据库一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 学员状态 (Student Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,    // 在读
    Inactive,  // 已离校
    Suspended, // 暂停
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StudentStatus {
    /// 从字符串解析学员状态（未知值按 active 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "inactive" => StudentStatus::Inactive,
            "suspended" => StudentStatus::Suspended,
            _ => StudentStatus::Active,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Suspended => "suspended",
        }
    }
}

// ==========================================
// 课程状态 (Course Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Active,   // 开课中
    Inactive, // 停课
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CourseStatus {
    /// 从字符串解析课程状态（未知值按 inactive 处理，不参与应缴计算）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => CourseStatus::Active,
            _ => CourseStatus::Inactive,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Inactive => "inactive",
        }
    }
}

// ==========================================
// 选课状态 (Enrollment Status)
// ==========================================
// 只有 Enrolled 参与应缴金额计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,  // 在读
    Completed, // 已结业
    Dropped,   // 已退课
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EnrollmentStatus {
    /// 从字符串解析选课状态（未知值按 dropped 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "enrolled" => EnrollmentStatus::Enrolled,
            "completed" => EnrollmentStatus::Completed,
            _ => EnrollmentStatus::Dropped,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
        }
    }
}

// ==========================================
// 缴费类型 (Payment Method)
// ==========================================
// 只有 MonthlyFee 计入月费抵扣
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MonthlyFee,   // 月费
    Registration, // 报名费
    Materials,    // 教材费
    Penalty,      // 滞纳金
    Refund,       // 退款
    Other,        // 其他
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PaymentMethod {
    /// 从字符串解析缴费类型
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "monthly_fee" => PaymentMethod::MonthlyFee,
            "registration" => PaymentMethod::Registration,
            "materials" => PaymentMethod::Materials,
            "penalty" => PaymentMethod::Penalty,
            "refund" => PaymentMethod::Refund,
            _ => PaymentMethod::Other,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentMethod::MonthlyFee => "monthly_fee",
            PaymentMethod::Registration => "registration",
            PaymentMethod::Materials => "materials",
            PaymentMethod::Penalty => "penalty",
            PaymentMethod::Refund => "refund",
            PaymentMethod::Other => "other",
        }
    }
}

// ==========================================
// 缴费记录状态 (Payment Record Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Completed, // 已到账
    Pending,   // 待确认
    Cancelled, // 已取消
    Refunded,  // 已退款
}

impl fmt::Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PaymentRecordStatus {
    /// 从字符串解析缴费记录状态（未知值按 pending 处理，不计入已缴）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" => PaymentRecordStatus::Completed,
            "cancelled" => PaymentRecordStatus::Cancelled,
            "refunded" => PaymentRecordStatus::Refunded,
            _ => PaymentRecordStatus::Pending,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Completed => "completed",
            PaymentRecordStatus::Pending => "pending",
            PaymentRecordStatus::Cancelled => "cancelled",
            PaymentRecordStatus::Refunded => "refunded",
        }
    }
}

// ==========================================
// 缴费状态 (Fee Status) - 派生结果
// ==========================================
// 顺序: Paid < Due < Overdue（聚合时取最严重）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Paid,    // 已缴清
    Due,     // 待缴（宽限期内）
    Overdue, // 逾期
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeStatus::Paid => write!(f, "paid"),
            FeeStatus::Due => write!(f, "due"),
            FeeStatus::Overdue => write!(f, "overdue"),
        }
    }
}
