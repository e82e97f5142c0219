// ==========================================
// 学院财务管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、派生结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod enrollment;
pub mod fee_status;
pub mod student;
pub mod types;

// 重导出核心类型
pub use enrollment::{Enrollment, Payment};
pub use fee_status::{DataFlag, DuePaymentEntry, PaymentStatus, StudentPaymentSummary};
pub use student::{Course, Student};
pub use types::{
    CourseStatus, EnrollmentStatus, FeeStatus, PaymentMethod, PaymentRecordStatus, StudentStatus,
};
