// ==========================================
// 学院财务管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::PaymentStatusApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::SqliteDataSource;

/// 应用状态
///
/// 包含所有API实例和共享资源（同一数据库连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 缴费状态API
    pub payment_status_api: Arc<PaymentStatusApi>,

    /// 学院设置
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（学员/课程/选课/缴费维护）
    pub data_source: Arc<SqliteDataSource>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        let data_source = Arc::new(SqliteDataSource::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let payment_status_api = Arc::new(PaymentStatusApi::new(
            data_source.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            payment_status_api,
            config_manager,
            data_source,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 ACADEMY_FINANCE_DB_PATH（非空时）
/// - 开发环境: 用户数据目录/academy-finance-dev/academy_finance.db
/// - 生产环境: 用户数据目录/academy-finance/academy_finance.db
/// - 无用户数据目录时: ./academy_finance.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("ACADEMY_FINANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./academy_finance.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("academy-finance-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("academy-finance");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("academy_finance.db");
    }

    path.to_string_lossy().to_string()
}
