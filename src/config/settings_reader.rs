// ==========================================
// 学院财务管理系统 - 学院设置读取 Trait
// ==========================================
// 职责: 定义缴费状态派生所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::error::Error;

// ==========================================
// AcademySettingsReader Trait
// ==========================================
// 用途: 派生引擎的调用方读取宽限期/滞纳金,再以参数形式传入引擎
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AcademySettingsReader: Send + Sync {
    /// 获取缴费宽限天数（每月 1 号之后）
    ///
    /// # 返回
    /// - i32: 宽限天数（>= 0）
    ///
    /// # 默认值
    /// - 5
    ///
    /// # 用途
    /// - 区分当月 due 与 overdue
    async fn get_grace_period_days(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取滞纳金金额
    ///
    /// # 返回
    /// - Decimal: 单次滞纳金（>= 0）
    ///
    /// # 默认值
    /// - 0
    async fn get_late_penalty_amount(&self) -> Result<Decimal, Box<dyn Error>>;
}
