// ==========================================
// 学院财务管理系统 - 缴费状态派生引擎
// ==========================================
// 职责: 从选课记录 + 缴费记录派生每门在读课程的缴费状态
// 红线: 纯计算,不访问数据库,不修改任何记录
// 红线: 脏数据不中断计算,兜底为 0 并打标
// ==========================================

use crate::domain::enrollment::{Enrollment, Payment};
use crate::domain::fee_status::{DataFlag, PaymentStatus, StudentPaymentSummary};
use crate::domain::student::{Course, Student};
use crate::domain::types::{EnrollmentStatus, FeeStatus};
use crate::engine::fee_core::FeeCore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

// ==========================================
// PaymentStatusDeriver
// ==========================================
/// 缴费状态派生器
///
/// 只持有两个参数（基准日、宽限天数）,无可变状态,可在多线程中共享。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStatusDeriver {
    as_of: NaiveDate,
    grace_period_days: i32,
}

impl PaymentStatusDeriver {
    /// 创建派生器
    ///
    /// # 参数
    /// - as_of: 基准日期（通常为今天）
    /// - grace_period_days: 宽限天数（由配置提供,不在引擎内写死）
    pub fn new(as_of: NaiveDate, grace_period_days: i32) -> Self {
        Self {
            as_of,
            grace_period_days,
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn grace_period_days(&self) -> i32 {
        self.grace_period_days
    }

    /// 派生学员各在读课程的缴费状态（主入口）
    ///
    /// # 参数
    /// - student: 学员（提供折扣）
    /// - enrollments: 学员的选课记录（可含已结业/退课,内部过滤）
    /// - courses: 课程目录（至少包含学员所选课程）
    /// - payments: 学员的缴费记录（可含非月费/未到账,内部过滤）
    ///
    /// # 返回
    /// - 每门 enrolled 且课程 active 的选课一条 PaymentStatus
    pub fn derive(
        &self,
        student: &Student,
        enrollments: &[Enrollment],
        courses: &[Course],
        payments: &[Payment],
    ) -> Vec<PaymentStatus> {
        let (discount, discount_flag) = FeeCore::coerce_discount(student.discount_percentage);
        if let Some(flag) = discount_flag {
            warn!(
                student_id = %student.id,
                raw_discount = ?student.discount_percentage,
                ?flag,
                "学员折扣数据异常,已兜底"
            );
        }

        let course_index: HashMap<&str, &Course> =
            courses.iter().map(|c| (c.id.as_str(), c)).collect();
        let (payments_by_course, payment_flags) = self.partition_payments(&student.id, payments);

        let mut seen_courses: HashSet<&str> = HashSet::new();
        let mut statuses = Vec::new();

        for enrollment in self.active_enrollments(&student.id, enrollments) {
            let course = match course_index.get(enrollment.course_id.as_str()) {
                Some(course) if course.is_active() => *course,
                Some(_) => {
                    debug!(course_id = %enrollment.course_id, "课程已停课,跳过");
                    continue;
                }
                None => {
                    debug!(course_id = %enrollment.course_id, "课程不存在,跳过");
                    continue;
                }
            };

            // 同一课程重复选课只按最早一条计算,避免缴费被重复抵扣
            if !seen_courses.insert(course.id.as_str()) {
                debug!(course_id = %course.id, "重复选课记录,已忽略");
                continue;
            }

            let course_payments = payments_by_course
                .get(course.id.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);

            let mut flags: Vec<DataFlag> = discount_flag.into_iter().collect();
            if payment_flags.contains(course.id.as_str()) {
                flags.push(DataFlag::InvalidPaymentAmount);
            }

            statuses.push(self.derive_course(
                &student.id,
                enrollment,
                course,
                discount,
                course_payments,
                flags,
            ));
        }

        statuses
    }

    /// 派生并聚合为学员汇总
    pub fn derive_summary(
        &self,
        student: &Student,
        enrollments: &[Enrollment],
        courses: &[Course],
        payments: &[Payment],
    ) -> StudentPaymentSummary {
        let statuses = self.derive(student, enrollments, courses, payments);
        StudentPaymentSummary::from_courses(&student.id, statuses)
    }

    /// 过滤在读选课,并按选课日期排序（同日保持原顺序）
    fn active_enrollments<'a>(
        &self,
        student_id: &str,
        enrollments: &'a [Enrollment],
    ) -> Vec<&'a Enrollment> {
        let mut active: Vec<&Enrollment> = enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.status == EnrollmentStatus::Enrolled)
            .collect();
        active.sort_by_key(|e| e.enrollment_date);
        active
    }

    /// 按课程拆分有效月费缴费
    ///
    /// # 返回
    /// - 课程ID → (缴费日期, 金额)
    /// - 存在金额异常缴费的课程ID集合
    fn partition_payments<'a>(
        &self,
        student_id: &str,
        payments: &'a [Payment],
    ) -> (HashMap<&'a str, Vec<(NaiveDate, Decimal)>>, HashSet<&'a str>) {
        let mut by_course: HashMap<&str, Vec<(NaiveDate, Decimal)>> = HashMap::new();
        let mut flagged: HashSet<&str> = HashSet::new();

        for payment in payments {
            if payment.student_id != student_id {
                continue;
            }
            let course_id = match payment.qualifying_course_id() {
                Some(id) => id,
                None => continue,
            };

            match payment.amount {
                Some(amount) if amount > Decimal::ZERO => {
                    by_course
                        .entry(course_id)
                        .or_default()
                        .push((payment.payment_date, amount));
                }
                _ => {
                    warn!(
                        payment_id = %payment.id,
                        raw_amount = ?payment.amount,
                        "缴费金额缺失或非正数,按 0 计"
                    );
                    flagged.insert(course_id);
                }
            }
        }

        (by_course, flagged)
    }

    /// 派生单门课程的缴费状态
    fn derive_course(
        &self,
        student_id: &str,
        enrollment: &Enrollment,
        course: &Course,
        discount: Decimal,
        payments: &[(NaiveDate, Decimal)],
        mut flags: Vec<DataFlag>,
    ) -> PaymentStatus {
        // === 步骤 1: 折后月费 ===
        let (list_fee, fee_flag) = FeeCore::coerce_monthly_fee(course.monthly_fee);
        if let Some(flag) = fee_flag {
            warn!(
                course_id = %course.id,
                raw_fee = ?course.monthly_fee,
                ?flag,
                "课程月费数据异常,已兜底"
            );
            flags.push(flag);
        }
        let effective_fee = FeeCore::effective_monthly_fee(list_fee, discount);

        // === 步骤 2: 应缴月份与应缴金额 ===
        let months = FeeCore::obligation_months(enrollment.enrollment_date, self.as_of);
        let expected = match effective_fee.checked_mul(Decimal::from(months.len() as u64)) {
            Some(v) => v,
            None => {
                warn!(
                    course_id = %course.id,
                    %effective_fee,
                    months = months.len(),
                    "应缴金额溢出,按上限截断"
                );
                flags.push(DataFlag::AmountOverflow);
                Decimal::MAX
            }
        };

        // === 步骤 3: 窗口内已缴金额 ===
        let mut paid_overflowed = false;
        let paid = match months.first() {
            Some(window_start) => payments
                .iter()
                .filter(|(date, _)| *date >= *window_start && *date <= self.as_of)
                .fold(Decimal::ZERO, |acc, (_, amount)| {
                    acc.checked_add(*amount).unwrap_or_else(|| {
                        paid_overflowed = true;
                        Decimal::MAX
                    })
                }),
            None => Decimal::ZERO,
        };
        if paid_overflowed {
            warn!(course_id = %course.id, "已缴金额累计溢出,按上限截断");
            if !flags.contains(&DataFlag::AmountOverflow) {
                flags.push(DataFlag::AmountOverflow);
            }
        }

        // === 步骤 4: 未缴金额 ===
        let remaining_amount = (expected - paid).max(Decimal::ZERO);

        // === 步骤 5: 分类 ===
        let (payment_status, months_overdue) = self.classify(
            enrollment.enrollment_date,
            effective_fee,
            remaining_amount,
        );

        debug!(
            student_id,
            course_id = %course.id,
            months = months.len(),
            %effective_fee,
            %expected,
            %paid,
            %remaining_amount,
            %payment_status,
            months_overdue,
            "课程缴费状态派生完成"
        );

        PaymentStatus {
            student_id: student_id.to_string(),
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            monthly_fee: effective_fee,
            remaining_amount,
            payment_status,
            months_overdue,
            flags,
        }
    }

    /// 判定 paid / due / overdue
    ///
    /// # 规则
    /// 1. remaining <= 0 → Paid
    /// 2. 当月仍在宽限期内,当月月费记为待缴,不计入逾期
    /// 3. 扣除当月待缴后仍有余额 → Overdue,months_overdue = floor(逾期金额 / 折后月费)
    /// 4. 否则 → Due
    fn classify(
        &self,
        enrollment_date: NaiveDate,
        effective_fee: Decimal,
        remaining_amount: Decimal,
    ) -> (FeeStatus, u32) {
        if remaining_amount <= Decimal::ZERO {
            return (FeeStatus::Paid, 0);
        }

        let due_point = FeeCore::current_due_point(enrollment_date, self.as_of);
        let within_grace = self.as_of <= FeeCore::grace_cutoff(due_point, self.grace_period_days);

        let current_portion = if within_grace {
            effective_fee
        } else {
            Decimal::ZERO
        };
        let overdue_amount = (remaining_amount - current_portion).max(Decimal::ZERO);

        if overdue_amount > Decimal::ZERO {
            (
                FeeStatus::Overdue,
                FeeCore::months_overdue(overdue_amount, effective_fee),
            )
        } else {
            (FeeStatus::Due, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CourseStatus, PaymentMethod, PaymentRecordStatus};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn student(discount: &str) -> Student {
        let mut s = Student::new("Test Student", d(2026, 1, 1)).with_discount(dec(discount));
        s.id = "S1".to_string();
        s
    }

    fn course(id: &str, fee: &str) -> Course {
        let mut c = Course::new(id, dec(fee));
        c.id = id.to_string();
        c
    }

    fn enroll(course_id: &str, date: NaiveDate) -> Enrollment {
        Enrollment::new("S1", course_id, date)
    }

    fn pay(course_id: &str, amount: &str, date: NaiveDate) -> Payment {
        Payment::monthly_fee("S1", course_id, dec(amount), date)
    }

    #[test]
    fn test_scenario_a_two_of_three_months_paid_is_overdue() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 8, 1))],
            &[course("C1", "100")],
            &[pay("C1", "100", d(2026, 8, 3)), pay("C1", "100", d(2026, 9, 2))],
        );

        assert_eq!(statuses.len(), 1);
        let s = &statuses[0];
        assert_eq!(s.monthly_fee, dec("100"));
        assert_eq!(s.remaining_amount, dec("100"));
        assert_eq!(s.payment_status, FeeStatus::Overdue);
        assert_eq!(s.months_overdue, 1);
    }

    #[test]
    fn test_scenario_b_new_enrollment_within_grace_is_due() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 12), 5);
        let statuses = deriver.derive(
            &student("20"),
            &[enroll("C1", d(2026, 10, 10))],
            &[course("C1", "50")],
            &[],
        );

        let s = &statuses[0];
        assert_eq!(s.monthly_fee, dec("40"));
        assert_eq!(s.remaining_amount, dec("40"));
        assert_eq!(s.payment_status, FeeStatus::Due);
        assert_eq!(s.months_overdue, 0);
    }

    #[test]
    fn test_scenario_c_free_course_is_paid() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 0);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2025, 1, 1))],
            &[course("C1", "0")],
            &[],
        );

        let s = &statuses[0];
        assert_eq!(s.monthly_fee, Decimal::ZERO);
        assert_eq!(s.remaining_amount, Decimal::ZERO);
        assert_eq!(s.payment_status, FeeStatus::Paid);
        assert_eq!(s.months_overdue, 0);
    }

    #[test]
    fn test_scenario_d_summary_counts_only_overdue_course() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let summary = deriver.derive_summary(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1)), enroll("C2", d(2026, 9, 1))],
            &[course("C1", "80"), course("C2", "60")],
            &[pay("C1", "80", d(2026, 10, 1)), pay("C2", "60", d(2026, 9, 1))],
        );

        assert_eq!(summary.courses.len(), 2);
        assert!(summary.has_overdue);
        assert_eq!(summary.total_remaining, dec("60"));
        assert_eq!(summary.max_months_overdue, 1);
        assert_eq!(summary.overall_status, FeeStatus::Overdue);
    }

    #[test]
    fn test_full_discount_is_always_paid() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 0);
        let statuses = deriver.derive(
            &student("100"),
            &[enroll("C1", d(2024, 1, 15))],
            &[course("C1", "250")],
            &[],
        );

        assert_eq!(statuses[0].monthly_fee, Decimal::ZERO);
        assert_eq!(statuses[0].remaining_amount, Decimal::ZERO);
        assert_eq!(statuses[0].payment_status, FeeStatus::Paid);
    }

    #[test]
    fn test_overpayment_never_goes_negative() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1))],
            &[course("C1", "100")],
            &[pay("C1", "500", d(2026, 10, 2))],
        );

        assert_eq!(statuses[0].remaining_amount, Decimal::ZERO);
        assert_eq!(statuses[0].payment_status, FeeStatus::Paid);
    }

    #[test]
    fn test_arrears_within_grace_count_previous_months_only() {
        // 8、9 月未缴,10 月仍在宽限期 → 逾期 2 个月,余额含当月
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 3), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 8, 1))],
            &[course("C1", "100")],
            &[],
        );

        assert_eq!(statuses[0].remaining_amount, dec("300"));
        assert_eq!(statuses[0].payment_status, FeeStatus::Overdue);
        assert_eq!(statuses[0].months_overdue, 2);
    }

    #[test]
    fn test_partial_payment_past_grace_is_overdue_with_zero_full_months() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1))],
            &[course("C1", "100")],
            &[pay("C1", "60", d(2026, 10, 2))],
        );

        assert_eq!(statuses[0].remaining_amount, dec("40"));
        assert_eq!(statuses[0].payment_status, FeeStatus::Overdue);
        assert_eq!(statuses[0].months_overdue, 0);
    }

    #[test]
    fn test_grace_cutoff_day_is_still_due() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 6), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 9, 1))],
            &[course("C1", "100")],
            &[pay("C1", "100", d(2026, 9, 1))],
        );
        assert_eq!(statuses[0].payment_status, FeeStatus::Due);

        let deriver = PaymentStatusDeriver::new(d(2026, 10, 7), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 9, 1))],
            &[course("C1", "100")],
            &[pay("C1", "100", d(2026, 9, 1))],
        );
        assert_eq!(statuses[0].payment_status, FeeStatus::Overdue);
        assert_eq!(statuses[0].months_overdue, 1);
    }

    #[test]
    fn test_non_qualifying_payments_are_ignored() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);

        let mut pending = pay("C1", "100", d(2026, 10, 2));
        pending.status = PaymentRecordStatus::Pending;
        let mut registration = pay("C1", "100", d(2026, 10, 2));
        registration.payment_method = PaymentMethod::Registration;
        let other_course = pay("C9", "100", d(2026, 10, 2));
        let before_window = pay("C1", "100", d(2026, 9, 30));
        let after_as_of = pay("C1", "100", d(2026, 10, 25));

        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1))],
            &[course("C1", "100"), course("C9", "100")],
            &[pending, registration, other_course, before_window, after_as_of],
        );

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].remaining_amount, dec("100"));
        assert_eq!(statuses[0].payment_status, FeeStatus::Overdue);
    }

    #[test]
    fn test_inactive_enrollments_and_courses_are_excluded() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);

        let mut dropped = enroll("C1", d(2026, 1, 1));
        dropped.status = EnrollmentStatus::Dropped;
        let mut completed = enroll("C2", d(2026, 1, 1));
        completed.status = EnrollmentStatus::Completed;
        let mut closed_course = course("C3", "100");
        closed_course.status = CourseStatus::Inactive;

        let statuses = deriver.derive(
            &student("0"),
            &[dropped, completed, enroll("C3", d(2026, 1, 1)), enroll("C4", d(2026, 1, 1))],
            &[course("C1", "100"), course("C2", "100"), closed_course],
            &[],
        );

        assert!(statuses.is_empty());
    }

    #[test]
    fn test_duplicate_enrollment_uses_earliest() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1)), enroll("C1", d(2026, 9, 1))],
            &[course("C1", "100")],
            &[],
        );

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].remaining_amount, dec("200"));
    }

    #[test]
    fn test_missing_numbers_are_flagged_not_fatal() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);

        let mut s = student("0");
        s.discount_percentage = None;
        let mut c = course("C1", "0");
        c.monthly_fee = None;
        let mut broken = pay("C1", "0", d(2026, 10, 2));
        broken.amount = None;

        let statuses = deriver.derive(&s, &[enroll("C1", d(2026, 10, 1))], &[c], &[broken]);

        let status = &statuses[0];
        assert_eq!(status.monthly_fee, Decimal::ZERO);
        assert_eq!(status.payment_status, FeeStatus::Paid);
        assert!(status.flags.contains(&DataFlag::MissingDiscount));
        assert!(status.flags.contains(&DataFlag::MissingMonthlyFee));
        assert!(status.flags.contains(&DataFlag::InvalidPaymentAmount));
    }

    #[test]
    fn test_amount_overflow_is_flagged_not_fatal() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let huge = "50000000000000000000000000000";

        // 应缴 = 10 个月 × 5e28,超出 Decimal 范围
        let summary = deriver.derive_summary(
            &student("0"),
            &[enroll("C1", d(2026, 1, 1)), enroll("C2", d(2026, 1, 1))],
            &[course("C1", huge), course("C2", huge)],
            &[],
        );

        for status in &summary.courses {
            assert_eq!(status.remaining_amount, Decimal::MAX);
            assert_eq!(status.payment_status, FeeStatus::Overdue);
            assert_eq!(status.months_overdue, 1);
            assert!(status.flags.contains(&DataFlag::AmountOverflow));
        }
        assert_eq!(summary.total_remaining, Decimal::MAX);

        // 已缴累计溢出
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 10, 1))],
            &[course("C1", huge)],
            &[pay("C1", huge, d(2026, 10, 2)), pay("C1", huge, d(2026, 10, 3))],
        );
        assert_eq!(statuses[0].payment_status, FeeStatus::Paid);
        assert_eq!(statuses[0].flags, vec![DataFlag::AmountOverflow]);
    }

    #[test]
    fn test_huge_grace_period_does_not_panic() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), i32::MAX);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 8, 1))],
            &[course("C1", "100")],
            &[],
        );

        // 当月仍在宽限期内,只有 8、9 月逾期
        assert_eq!(statuses[0].payment_status, FeeStatus::Overdue);
        assert_eq!(statuses[0].months_overdue, 2);
    }

    #[test]
    fn test_future_enrollment_owes_nothing() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let statuses = deriver.derive(
            &student("0"),
            &[enroll("C1", d(2026, 11, 1))],
            &[course("C1", "100")],
            &[],
        );

        assert_eq!(statuses[0].remaining_amount, Decimal::ZERO);
        assert_eq!(statuses[0].payment_status, FeeStatus::Paid);
    }

    #[test]
    fn test_derive_is_idempotent() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let s = student("15");
        let enrollments = vec![enroll("C1", d(2026, 6, 12)), enroll("C2", d(2026, 9, 1))];
        let courses = vec![course("C1", "120"), course("C2", "45.50")];
        let payments = vec![pay("C1", "102", d(2026, 6, 20)), pay("C2", "38.68", d(2026, 9, 3))];

        let first = deriver.derive(&s, &enrollments, &courses, &payments);
        let second = deriver.derive(&s, &enrollments, &courses, &payments);
        assert_eq!(first, second);
    }

    #[test]
    fn test_deriver_shared_across_threads() {
        let deriver = PaymentStatusDeriver::new(d(2026, 10, 20), 5);
        let s = student("0");
        let enrollments = vec![enroll("C1", d(2026, 8, 1))];
        let courses = vec![course("C1", "100")];
        let payments: Vec<Payment> = vec![];

        let results: Vec<Vec<PaymentStatus>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| deriver.derive(&s, &enrollments, &courses, &payments)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0][0].months_overdue, 3);
    }
}
