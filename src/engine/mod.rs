// ==========================================
// 学院财务管理系统 - 引擎层
// ==========================================
// 职责: 实现缴费状态派生规则,不拼 SQL
// 红线: Engine 不拼 SQL, 不修改任何记录
// ==========================================

pub mod due_worklist;
pub mod fee_core;
pub mod payment_status;

// 重导出核心引擎
pub use due_worklist::{DueWorklistBuilder, StudentLedger};
pub use fee_core::{FeeCore, CURRENCY_SCALE};
pub use payment_status::PaymentStatusDeriver;
