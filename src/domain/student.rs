// ==========================================
// 学院财务管理系统 - 学员与课程领域模型
// ==========================================
// 用途: 数据访问层写入,引擎层只读
// 对齐: students / courses 表
// ==========================================

use crate::domain::types::{CourseStatus, StudentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Student - 学员
// ==========================================
// 数值字段允许缺失：库中脏数据以 None 表示,由引擎兜底为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,                            // 学员ID
    pub name: String,                          // 姓名
    pub phone: Option<String>,                 // 联系电话
    pub enrollment_date: NaiveDate,            // 入学日期
    pub discount_percentage: Option<Decimal>,  // 个人折扣（0-100）
    pub status: StudentStatus,                 // 学员状态
    pub created_at: DateTime<Utc>,             // 记录创建时间
}

impl Student {
    /// 创建新学员（自动生成ID,默认在读、无折扣）
    pub fn new(name: &str, enrollment_date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: None,
            enrollment_date,
            discount_percentage: Some(Decimal::ZERO),
            status: StudentStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// 设置折扣（链式）
    pub fn with_discount(mut self, discount_percentage: Decimal) -> Self {
        self.discount_percentage = Some(discount_percentage);
        self
    }
}

// ==========================================
// Course - 课程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,                     // 课程ID
    pub name: String,                   // 课程名称
    pub monthly_fee: Option<Decimal>,   // 月费（标价,未打折）
    pub status: CourseStatus,           // 课程状态
    pub created_at: DateTime<Utc>,      // 记录创建时间
}

impl Course {
    /// 创建新课程（自动生成ID,默认开课中）
    pub fn new(name: &str, monthly_fee: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            monthly_fee: Some(monthly_fee),
            status: CourseStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// 是否开课中
    pub fn is_active(&self) -> bool {
        self.status == CourseStatus::Active
    }
}
