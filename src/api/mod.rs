// ==========================================
// 学院财务管理系统 - API 层
// ==========================================
// 职责: 组合数据源、学院设置与派生引擎,对外提供业务接口
// ==========================================

pub mod error;
pub mod payment_status_api;

pub use error::{ApiError, ApiResult};
pub use payment_status_api::PaymentStatusApi;
