// ==========================================
// 学院财务管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::settings_reader::AcademySettingsReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 默认宽限天数
pub const DEFAULT_GRACE_PERIOD_DAYS: i32 = 5;

/// 宽限天数上限（不超过一个自然月）
pub const MAX_GRACE_PERIOD_DAYS: i32 = 31;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 导出欠费清单时附带当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// AcademySettingsReader Trait 实现
// ==========================================
#[async_trait]
impl AcademySettingsReader for ConfigManager {
    async fn get_grace_period_days(&self) -> Result<i32, Box<dyn Error>> {
        let default = DEFAULT_GRACE_PERIOD_DAYS.to_string();
        let value = self.get_config_or_default(config_keys::DEFAULT_GRACE_PERIOD, &default)?;

        match value.trim().parse::<i32>() {
            Ok(days) if (0..=MAX_GRACE_PERIOD_DAYS).contains(&days) => Ok(days),
            _ => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_GRACE_PERIOD,
                    raw_value = %value,
                    max = MAX_GRACE_PERIOD_DAYS,
                    "宽限天数配置无效或超出上限，使用默认值"
                );
                Ok(DEFAULT_GRACE_PERIOD_DAYS)
            }
        }
    }

    async fn get_late_penalty_amount(&self) -> Result<Decimal, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LATE_PENALTY_AMOUNT, "0")?;

        match Decimal::from_str(value.trim()) {
            Ok(amount) if amount >= Decimal::ZERO => Ok(amount),
            _ => {
                tracing::warn!(
                    config_key = config_keys::LATE_PENALTY_AMOUNT,
                    raw_value = %value,
                    "滞纳金配置无效，按 0 处理"
                );
                Ok(Decimal::ZERO)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 缴费宽限期（天）
    pub const DEFAULT_GRACE_PERIOD: &str = "default_grace_period";

    // 滞纳金金额
    pub const LATE_PENALTY_AMOUNT: &str = "late_penalty_amount";
}
