// ==========================================
// 学院财务管理系统 - 缴费状态 API
// ==========================================
// 职责: 读取数据源与学院设置,调用派生引擎,输出缴费状态/欠费清单
// 红线: 只读,不写入任何记录
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::AcademySettingsReader;
use crate::domain::fee_status::{DuePaymentEntry, StudentPaymentSummary};
use crate::domain::student::Student;
use crate::domain::types::{PaymentMethod, PaymentRecordStatus, StudentStatus};
use crate::engine::{DueWorklistBuilder, PaymentStatusDeriver, StudentLedger};
use crate::i18n::t;
use crate::repository::{AcademyDataSource, PaymentQuery, StudentQuery};

// ==========================================
// PaymentStatusApi - 缴费状态 API
// ==========================================

/// 缴费状态API
///
/// 职责：
/// 1. 单个学员的缴费状态（学员列表徽标、考勤提示）
/// 2. 欠费工作清单
/// 3. 欠费清单 CSV 导出
pub struct PaymentStatusApi {
    data_source: Arc<dyn AcademyDataSource>,
    settings: Arc<dyn AcademySettingsReader>,
}

impl PaymentStatusApi {
    /// 创建新的PaymentStatusApi实例
    pub fn new(
        data_source: Arc<dyn AcademyDataSource>,
        settings: Arc<dyn AcademySettingsReader>,
    ) -> Self {
        Self {
            data_source,
            settings,
        }
    }

    /// 查询单个学员的缴费状态
    ///
    /// # 参数
    /// - student_id: 学员ID
    /// - as_of: 基准日期
    ///
    /// # 返回
    /// - Ok(StudentPaymentSummary): 各在读课程状态及汇总
    /// - Err(ApiError::NotFound): 学员不存在
    #[instrument(skip(self))]
    pub async fn get_student_payment_status(
        &self,
        student_id: &str,
        as_of: NaiveDate,
    ) -> ApiResult<StudentPaymentSummary> {
        if student_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("学员ID不能为空".to_string()));
        }

        let deriver = self.build_deriver(as_of).await?;

        let student = self
            .data_source
            .find_student(student_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Student(id={})不存在", student_id)))?;
        let courses = self.data_source.list_courses()?;
        let ledger = self.load_ledger(student, as_of)?;

        let summary = deriver.derive_summary(
            &ledger.student,
            &ledger.enrollments,
            &courses,
            &ledger.payments,
        );

        info!(
            student_id,
            total_remaining = %summary.total_remaining,
            overall_status = %summary.overall_status,
            "学员缴费状态派生完成"
        );
        Ok(summary)
    }

    /// 查询欠费工作清单
    ///
    /// # 规则
    /// - 不含已离校学员
    /// - 只含未缴总额 > 0 的学员,逾期优先
    /// - 单个学员记录读取失败时记录告警并跳过,不影响整张清单
    #[instrument(skip(self))]
    pub async fn list_due_payments(&self, as_of: NaiveDate) -> ApiResult<Vec<DuePaymentEntry>> {
        let deriver = self.build_deriver(as_of).await?;
        let penalty = self.read_late_penalty().await?;

        let courses = self.data_source.list_courses()?;
        let mut ledgers = Vec::new();
        for status in [StudentStatus::Active, StudentStatus::Suspended] {
            let students = self
                .data_source
                .query_students(&StudentQuery::default().with_status(status))?;
            for student in students {
                let student_id = student.id.clone();
                match self.load_ledger(student, as_of) {
                    Ok(ledger) => ledgers.push(ledger),
                    Err(e) => warn!(
                        student_id = %student_id,
                        error = %e,
                        "学员缴费记录读取失败，跳过"
                    ),
                }
            }
        }

        Ok(DueWorklistBuilder::new(deriver, penalty).build(&ledgers, &courses))
    }

    /// 导出欠费清单为 CSV
    ///
    /// # 参数
    /// - as_of: 基准日期
    /// - writer: 输出目标（文件、内存缓冲）
    ///
    /// # 返回
    /// - 写出的数据行数（不含表头）
    pub async fn export_due_payments_csv<W: Write>(
        &self,
        as_of: NaiveDate,
        writer: W,
    ) -> ApiResult<usize> {
        let entries = self.list_due_payments(as_of).await?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            t("export.header_student_id"),
            t("export.header_student_name"),
            t("export.header_phone"),
            t("export.header_status"),
            t("export.header_total_remaining"),
            t("export.header_months_overdue"),
            t("export.header_suggested_penalty"),
        ])?;

        for entry in &entries {
            csv_writer.write_record([
                entry.student_id.clone(),
                entry.student_name.clone(),
                entry.phone.clone().unwrap_or_default(),
                entry.badge.clone(),
                entry.summary.total_remaining.to_string(),
                entry.summary.max_months_overdue.to_string(),
                entry.suggested_penalty.to_string(),
            ])?;
        }
        csv_writer
            .flush()
            .map_err(|e| ApiError::ExportError(e.to_string()))?;

        info!(as_of = %as_of, rows = entries.len(), "欠费清单导出完成");
        Ok(entries.len())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn build_deriver(&self, as_of: NaiveDate) -> ApiResult<PaymentStatusDeriver> {
        let grace_period_days = self
            .settings
            .get_grace_period_days()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(PaymentStatusDeriver::new(as_of, grace_period_days))
    }

    async fn read_late_penalty(&self) -> ApiResult<Decimal> {
        self.settings
            .get_late_penalty_amount()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 读取学员的选课与可计入月费的缴费记录
    fn load_ledger(&self, student: Student, as_of: NaiveDate) -> ApiResult<StudentLedger> {
        let enrollments = self.data_source.list_enrollments(&student.id)?;
        let mut payment_query = PaymentQuery::for_student(&student.id)
            .with_method(PaymentMethod::MonthlyFee)
            .with_status(PaymentRecordStatus::Completed);
        payment_query.date_to = Some(as_of);
        let payments = self.data_source.query_payments(&payment_query)?;

        Ok(StudentLedger {
            student,
            enrollments,
            payments,
        })
    }
}
