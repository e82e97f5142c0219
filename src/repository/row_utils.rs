// ==========================================
// 学院财务管理系统 - 行映射工具
// ==========================================
// 职责: 日期/金额列的统一读写格式,动态 WHERE 子句构建
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Row, ToSql};
use rust_decimal::Decimal;
use std::str::FromStr;

/// 日期列存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 读取日期列（YYYY-MM-DD）
pub fn get_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取时间戳列（RFC3339）,无法解析时回退为当前时间
pub fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    Ok(DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now()))
}

/// 读取金额/百分比列
///
/// # 规则
/// - INTEGER / REAL / 可解析的 TEXT → Some(Decimal)
/// - NULL / 不可解析 → None（交由引擎兜底并打标）
pub fn get_decimal(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).ok(),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| Decimal::from_str(s.trim()).ok()),
        ValueRef::Blob(_) => None,
    };
    Ok(value)
}

/// 金额写库格式
pub fn decimal_to_db(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.normalize().to_string())
}

// ==========================================
// WhereBuilder - 动态过滤条件
// ==========================================
/// 按可选条件拼接 WHERE 子句,参数一律走绑定
#[derive(Default)]
pub struct WhereBuilder {
    clauses: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条件（值为 None 时跳过）
    pub fn push<T: ToSql + 'static>(
        &mut self,
        clause: &'static str,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(v) = value {
            self.clauses.push(clause);
            self.params.push(Box::new(v));
        }
        self
    }

    /// 生成 SQL 片段（无条件时为空串）
    pub fn to_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// 绑定参数
    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
