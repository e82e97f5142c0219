// ==========================================
// 学院财务管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学员缴费状态派生（逾期是计算值,不落库）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 缴费状态派生
pub mod engine;

// 配置层 - 学院设置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CourseStatus, EnrollmentStatus, FeeStatus, PaymentMethod, PaymentRecordStatus, StudentStatus,
};

// 领域实体
pub use domain::{
    Course, DataFlag, DuePaymentEntry, Enrollment, Payment, PaymentStatus, Student,
    StudentPaymentSummary,
};

// 引擎
pub use engine::{DueWorklistBuilder, PaymentStatusDeriver, StudentLedger};

// API
pub use api::PaymentStatusApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学院财务管理系统";
