// ==========================================
// 学院财务管理系统 - Fee Core 纯函数库
// ==========================================
// 职责: 折后月费、应缴月份、宽限期截止、逾期月数的纯逻辑
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::fee_status::DataFlag;
use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// 金额精度（货币最小单位: 分）
pub const CURRENCY_SCALE: u32 = 2;

// ==========================================
// FeeCore - 纯函数工具类
// ==========================================
pub struct FeeCore;

impl FeeCore {
    /// 金额四舍五入到分（半数向上）
    pub fn round_currency(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    /// 兜底课程月费
    ///
    /// # 规则
    /// - None → 0 + MissingMonthlyFee
    /// - 负数 → 0 + NegativeMonthlyFee
    pub fn coerce_monthly_fee(monthly_fee: Option<Decimal>) -> (Decimal, Option<DataFlag>) {
        match monthly_fee {
            None => (Decimal::ZERO, Some(DataFlag::MissingMonthlyFee)),
            Some(fee) if fee < Decimal::ZERO => (Decimal::ZERO, Some(DataFlag::NegativeMonthlyFee)),
            Some(fee) => (fee, None),
        }
    }

    /// 兜底学员折扣
    ///
    /// # 规则
    /// - None → 0 + MissingDiscount
    /// - 超出 [0,100] → 截断到边界 + DiscountOutOfRange
    pub fn coerce_discount(discount_percentage: Option<Decimal>) -> (Decimal, Option<DataFlag>) {
        match discount_percentage {
            None => (Decimal::ZERO, Some(DataFlag::MissingDiscount)),
            Some(d) if d < Decimal::ZERO => (Decimal::ZERO, Some(DataFlag::DiscountOutOfRange)),
            Some(d) if d > Decimal::ONE_HUNDRED => {
                (Decimal::ONE_HUNDRED, Some(DataFlag::DiscountOutOfRange))
            }
            Some(d) => (d, None),
        }
    }

    /// 计算折后月费
    ///
    /// # 规则
    /// - effective_fee = round(monthly_fee * (1 - discount/100), 2)
    /// - 结果不小于 0
    ///
    /// # 参数
    /// - monthly_fee: 已兜底的课程月费
    /// - discount_percentage: 已兜底的折扣（0-100）
    pub fn effective_monthly_fee(monthly_fee: Decimal, discount_percentage: Decimal) -> Decimal {
        let ratio = Decimal::ONE - discount_percentage / Decimal::ONE_HUNDRED;
        Self::round_currency(monthly_fee * ratio).max(Decimal::ZERO)
    }

    /// 某日期所在月的 1 号
    pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
        // day=1 对任何合法年月都存在
        date.with_day(1).unwrap_or(date)
    }

    /// 列出应缴月份（每月 1 号）
    ///
    /// # 规则
    /// - 从选课月开始,逐月向前,直到 as_of 所在月（含当月）
    /// - 选课日期晚于 as_of → 空列表
    pub fn obligation_months(enrollment_date: NaiveDate, as_of: NaiveDate) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        if enrollment_date > as_of {
            return months;
        }

        let last = Self::first_day_of_month(as_of);
        let mut cursor = Self::first_day_of_month(enrollment_date);
        while cursor <= last {
            months.push(cursor);
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        months
    }

    /// 当月应缴起算点
    ///
    /// # 规则
    /// - 一般为当月 1 号
    /// - 选课当月以选课日期为起算点
    pub fn current_due_point(enrollment_date: NaiveDate, as_of: NaiveDate) -> NaiveDate {
        Self::first_day_of_month(as_of).max(enrollment_date)
    }

    /// 宽限期截止日（含当日）
    ///
    /// 负数宽限天数按 0 处理；日期越界时取 NaiveDate::MAX
    pub fn grace_cutoff(due_point: NaiveDate, grace_period_days: i32) -> NaiveDate {
        due_point
            .checked_add_signed(Duration::days(i64::from(grace_period_days.max(0))))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 计算逾期月数
    ///
    /// # 规则
    /// - floor(overdue_amount / effective_fee)
    /// - effective_fee = 0 → 0（不做除零）
    pub fn months_overdue(overdue_amount: Decimal, effective_fee: Decimal) -> u32 {
        if effective_fee <= Decimal::ZERO || overdue_amount <= Decimal::ZERO {
            return 0;
        }
        overdue_amount
            .checked_div(effective_fee)
            .and_then(|months| months.floor().to_u32())
            .unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_effective_fee_applies_discount() {
        assert_eq!(FeeCore::effective_monthly_fee(dec("50"), dec("20")), dec("40"));
        assert_eq!(FeeCore::effective_monthly_fee(dec("100"), dec("0")), dec("100"));
        assert_eq!(FeeCore::effective_monthly_fee(dec("100"), dec("100")), Decimal::ZERO);
    }

    #[test]
    fn test_effective_fee_rounds_half_up() {
        // 10.05 * 0.5 = 5.025 → 5.03
        assert_eq!(FeeCore::effective_monthly_fee(dec("10.05"), dec("50")), dec("5.03"));
        // 33.33 * (1 - 0.333) = 22.23111 → 22.23
        assert_eq!(FeeCore::effective_monthly_fee(dec("33.33"), dec("33.3")), dec("22.23"));
    }

    #[test]
    fn test_effective_fee_never_negative() {
        for fee in ["0", "0.01", "75", "1999.99"] {
            for discount in ["0", "12.5", "50", "99.99", "100"] {
                let eff = FeeCore::effective_monthly_fee(dec(fee), dec(discount));
                assert!(eff >= Decimal::ZERO, "fee={} discount={}", fee, discount);
                assert!(eff <= dec(fee));
            }
        }
    }

    #[test]
    fn test_coerce_monthly_fee() {
        assert_eq!(
            FeeCore::coerce_monthly_fee(None),
            (Decimal::ZERO, Some(DataFlag::MissingMonthlyFee))
        );
        assert_eq!(
            FeeCore::coerce_monthly_fee(Some(dec("-10"))),
            (Decimal::ZERO, Some(DataFlag::NegativeMonthlyFee))
        );
        assert_eq!(FeeCore::coerce_monthly_fee(Some(dec("80"))), (dec("80"), None));
    }

    #[test]
    fn test_coerce_discount_clamps() {
        assert_eq!(
            FeeCore::coerce_discount(Some(dec("150"))),
            (Decimal::ONE_HUNDRED, Some(DataFlag::DiscountOutOfRange))
        );
        assert_eq!(
            FeeCore::coerce_discount(Some(dec("-5"))),
            (Decimal::ZERO, Some(DataFlag::DiscountOutOfRange))
        );
        assert_eq!(
            FeeCore::coerce_discount(None),
            (Decimal::ZERO, Some(DataFlag::MissingDiscount))
        );
    }

    #[test]
    fn test_obligation_months_inclusive_of_current() {
        let months = FeeCore::obligation_months(d(2026, 8, 15), d(2026, 10, 2));
        assert_eq!(months, vec![d(2026, 8, 1), d(2026, 9, 1), d(2026, 10, 1)]);
    }

    #[test]
    fn test_obligation_months_across_year_end() {
        let months = FeeCore::obligation_months(d(2025, 11, 30), d(2026, 1, 31));
        assert_eq!(months.len(), 3);
        assert_eq!(months[2], d(2026, 1, 1));
    }

    #[test]
    fn test_obligation_months_future_enrollment() {
        assert!(FeeCore::obligation_months(d(2026, 11, 1), d(2026, 10, 31)).is_empty());
    }

    #[test]
    fn test_due_point_and_grace_cutoff() {
        // 选课当月: 以选课日为起算
        assert_eq!(FeeCore::current_due_point(d(2026, 10, 10), d(2026, 10, 12)), d(2026, 10, 10));
        // 之后月份: 以 1 号为起算
        assert_eq!(FeeCore::current_due_point(d(2026, 8, 10), d(2026, 10, 12)), d(2026, 10, 1));

        assert_eq!(FeeCore::grace_cutoff(d(2026, 10, 1), 5), d(2026, 10, 6));
        assert_eq!(FeeCore::grace_cutoff(d(2026, 10, 1), -3), d(2026, 10, 1));
    }

    #[test]
    fn test_grace_cutoff_saturates_instead_of_overflowing() {
        assert_eq!(FeeCore::grace_cutoff(d(2026, 10, 1), i32::MAX), NaiveDate::MAX);
        assert_eq!(FeeCore::grace_cutoff(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn test_months_overdue_floor_and_zero_fee() {
        assert_eq!(FeeCore::months_overdue(dec("100"), dec("100")), 1);
        assert_eq!(FeeCore::months_overdue(dec("250"), dec("100")), 2);
        assert_eq!(FeeCore::months_overdue(dec("99.99"), dec("100")), 0);
        assert_eq!(FeeCore::months_overdue(dec("100"), Decimal::ZERO), 0);
    }

    #[test]
    fn test_months_overdue_saturates_on_huge_ratio() {
        assert_eq!(FeeCore::months_overdue(Decimal::MAX, dec("0.01")), u32::MAX);
    }
}
