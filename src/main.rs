// ==========================================
// 学院财务管理系统 - 命令行入口
// ==========================================
// 用法:
//   academy-finance init
//   academy-finance student <student_id> [as_of]
//   academy-finance due [as_of]
//   academy-finance export <csv_path> [as_of]
//
// 数据库路径: ACADEMY_FINANCE_DB_PATH 或用户数据目录
// as_of 格式: YYYY-MM-DD（缺省为今天）
// ==========================================

use academy_finance::app::{get_default_db_path, AppState};
use academy_finance::logging;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::fs::File;

const USAGE: &str = "用法: academy-finance \
    <init | student <student_id> [as_of] | due [as_of] | export <csv_path> [as_of]>";

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var("ACADEMY_FINANCE_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).ok_or_else(|| anyhow!(USAGE))?;

    let db_path = get_default_db_path();
    tracing::info!(
        "{} v{}，使用数据库: {}",
        academy_finance::APP_NAME,
        academy_finance::VERSION,
        db_path
    );

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let api = &state.payment_status_api;

    match command {
        "init" => {
            println!("{}", academy_finance::i18n::t("common.success"));
        }
        "student" => {
            let student_id = args.get(1).ok_or_else(|| anyhow!(USAGE))?;
            let as_of = parse_as_of(args.get(2))?;
            let summary = api.get_student_payment_status(student_id, as_of).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "due" => {
            let as_of = parse_as_of(args.get(1))?;
            let entries = api.list_due_payments(as_of).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        "export" => {
            let path = args.get(1).ok_or_else(|| anyhow!(USAGE))?;
            let as_of = parse_as_of(args.get(2))?;
            let file =
                File::create(path).with_context(|| format!("无法创建导出文件: {}", path))?;
            let rows = api.export_due_payments_csv(as_of, file).await?;
            println!("{}", serde_json::json!({ "path": path, "rows": rows }));
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}

/// 解析基准日期（缺省为本地今天）
fn parse_as_of(arg: Option<&String>) -> Result<NaiveDate> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("无效日期: {}（格式 YYYY-MM-DD）", raw)),
        None => Ok(Local::now().date_naive()),
    }
}
