// ==========================================
// 学院财务管理系统 - 欠费工作清单引擎
// ==========================================
// 职责: 批量派生学员缴费状态,产出待跟进的欠费清单
// 红线: 纯计算,输入为调用方已取回的记录
// ==========================================

use crate::domain::enrollment::{Enrollment, Payment};
use crate::domain::fee_status::{DuePaymentEntry, StudentPaymentSummary};
use crate::domain::student::{Course, Student};
use crate::domain::types::StudentStatus;
use crate::engine::payment_status::PaymentStatusDeriver;
use crate::i18n::fee_badge;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::info;

// ==========================================
// StudentLedger - 单个学员的原始记录
// ==========================================
#[derive(Debug, Clone)]
pub struct StudentLedger {
    pub student: Student,
    pub enrollments: Vec<Enrollment>,
    pub payments: Vec<Payment>,
}

// ==========================================
// DueWorklistBuilder
// ==========================================
pub struct DueWorklistBuilder {
    deriver: PaymentStatusDeriver,
    late_penalty_amount: Decimal,
}

impl DueWorklistBuilder {
    /// 创建清单构建器
    ///
    /// # 参数
    /// - deriver: 缴费状态派生器（已带基准日与宽限天数）
    /// - late_penalty_amount: 配置的滞纳金金额（负数按 0 处理）
    pub fn new(deriver: PaymentStatusDeriver, late_penalty_amount: Decimal) -> Self {
        Self {
            deriver,
            late_penalty_amount: late_penalty_amount.max(Decimal::ZERO),
        }
    }

    /// 构建欠费清单
    ///
    /// # 规则
    /// - 跳过已离校（inactive）学员
    /// - 只保留 total_remaining > 0 的学员
    /// - 排序: 有逾期优先 → 最大逾期月数降序 → 未缴总额降序 → 姓名升序
    pub fn build(&self, ledgers: &[StudentLedger], courses: &[Course]) -> Vec<DuePaymentEntry> {
        let mut entries: Vec<DuePaymentEntry> = ledgers
            .iter()
            .filter(|l| l.student.status != StudentStatus::Inactive)
            .map(|l| {
                let summary = self.deriver.derive_summary(
                    &l.student,
                    &l.enrollments,
                    courses,
                    &l.payments,
                );
                (l, summary)
            })
            .filter(|(_, summary)| summary.has_balance())
            .map(|(l, summary)| self.to_entry(&l.student, summary))
            .collect();

        entries.sort_by(compare_entries);

        info!(
            as_of = %self.deriver.as_of(),
            students = ledgers.len(),
            due = entries.len(),
            "欠费清单构建完成"
        );

        entries
    }

    fn to_entry(&self, student: &Student, summary: StudentPaymentSummary) -> DuePaymentEntry {
        let suggested_penalty = if summary.has_overdue {
            self.late_penalty_amount
        } else {
            Decimal::ZERO
        };
        let badge = fee_badge(summary.overall_status, summary.max_months_overdue);

        DuePaymentEntry {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            phone: student.phone.clone(),
            summary,
            suggested_penalty,
            badge,
        }
    }
}

fn compare_entries(a: &DuePaymentEntry, b: &DuePaymentEntry) -> Ordering {
    b.summary
        .has_overdue
        .cmp(&a.summary.has_overdue)
        .then_with(|| b.summary.max_months_overdue.cmp(&a.summary.max_months_overdue))
        .then_with(|| b.summary.total_remaining.cmp(&a.summary.total_remaining))
        .then_with(|| a.student_name.cmp(&b.student_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ledger(id: &str, name: &str, enrolled: NaiveDate, paid: &[NaiveDate]) -> StudentLedger {
        let mut student = Student::new(name, enrolled);
        student.id = id.to_string();
        StudentLedger {
            enrollments: vec![Enrollment::new(id, "C1", enrolled)],
            payments: paid
                .iter()
                .map(|date| Payment::monthly_fee(id, "C1", Decimal::new(100, 0), *date))
                .collect(),
            student,
        }
    }

    fn courses() -> Vec<Course> {
        let mut c = Course::new("Piano", Decimal::new(100, 0));
        c.id = "C1".to_string();
        vec![c]
    }

    #[test]
    fn test_worklist_orders_by_severity_and_skips_paid() {
        let as_of = d(2026, 10, 20);
        let ledgers = vec![
            ledger("S1", "Paid Up", d(2026, 10, 1), &[d(2026, 10, 1)]),
            ledger("S2", "One Month", d(2026, 10, 1), &[]),
            ledger("S3", "Three Months", d(2026, 8, 1), &[]),
            ledger("S4", "Just Joined", d(2026, 10, 18), &[]),
        ];

        let builder = DueWorklistBuilder::new(
            PaymentStatusDeriver::new(as_of, 5),
            Decimal::new(15, 0),
        );
        let entries = builder.build(&ledgers, &courses());

        let ids: Vec<&str> = entries.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, vec!["S3", "S2", "S4"]);

        assert_eq!(entries[0].summary.max_months_overdue, 3);
        assert_eq!(entries[0].suggested_penalty, Decimal::new(15, 0));
        // S4 仍在宽限期内: 待缴,无滞纳金
        assert!(!entries[2].summary.has_overdue);
        assert_eq!(entries[2].suggested_penalty, Decimal::ZERO);
    }

    #[test]
    fn test_worklist_skips_inactive_students() {
        let mut gone = ledger("S1", "Left", d(2026, 1, 1), &[]);
        gone.student.status = StudentStatus::Inactive;
        let mut paused = ledger("S2", "Paused", d(2026, 1, 1), &[]);
        paused.student.status = StudentStatus::Suspended;

        let builder = DueWorklistBuilder::new(
            PaymentStatusDeriver::new(d(2026, 10, 20), 5),
            Decimal::ZERO,
        );
        let entries = builder.build(&[gone, paused], &courses());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].student_id, "S2");
    }

    #[test]
    fn test_negative_penalty_clamped() {
        let builder = DueWorklistBuilder::new(
            PaymentStatusDeriver::new(d(2026, 10, 20), 5),
            Decimal::new(-5, 0),
        );
        let entries = builder.build(&[ledger("S1", "A", d(2026, 9, 1), &[])], &courses());
        assert_eq!(entries[0].suggested_penalty, Decimal::ZERO);
    }
}
