// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::types::FeeStatus;

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use academy_finance::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use academy_finance::i18n::t_with_args;
/// let msg = t_with_args("badge.overdue_months", &[("months", "2")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 缴费状态徽标文案
///
/// # 规则
/// - Paid → "已缴清" / "Paid"
/// - Due → "待缴" / "Due"
/// - Overdue 且逾期月数 > 0 → "逾期（N 个月）" / "Overdue (N months)"
/// - Overdue 且不足一个月 → "逾期" / "Overdue"
pub fn fee_badge(status: FeeStatus, months_overdue: u32) -> String {
    match status {
        FeeStatus::Paid => t("badge.paid"),
        FeeStatus::Due => t("badge.due"),
        FeeStatus::Overdue if months_overdue > 0 => t_with_args(
            "badge.overdue_months",
            &[("months", &months_overdue.to_string())],
        ),
        FeeStatus::Overdue => t("badge.overdue"),
    }
}
