// ==========================================
// 学院财务管理系统 - 选课与缴费数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（状态派生在 engine 层）
// ==========================================

use crate::domain::enrollment::{Enrollment, Payment};
use crate::domain::types::{EnrollmentStatus, PaymentMethod, PaymentRecordStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    decimal_to_db, get_date, get_decimal, get_timestamp, WhereBuilder, DATE_FORMAT,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, enrollment_date, status, created_at";
const PAYMENT_COLUMNS: &str =
    "id, student_id, course_id, amount, payment_date, payment_method, status, notes, created_at";

fn map_enrollment(row: &Row) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        enrollment_date: get_date(row, 3)?,
        status: EnrollmentStatus::from_str(&row.get::<_, String>(4)?),
        created_at: get_timestamp(row, 5)?,
    })
}

fn map_payment(row: &Row) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        amount: get_decimal(row, 3)?,
        payment_date: get_date(row, 4)?,
        payment_method: PaymentMethod::from_str(&row.get::<_, String>(5)?),
        status: PaymentRecordStatus::from_str(&row.get::<_, String>(6)?),
        notes: row.get(7)?,
        created_at: get_timestamp(row, 8)?,
    })
}

// ==========================================
// EnrollmentRepository - 选课仓储
// ==========================================
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增选课记录
    ///
    /// 学员或课程不存在时返回 ForeignKeyViolation
    pub fn create(&self, enrollment: &Enrollment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO enrollments (id, student_id, course_id, enrollment_date, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                enrollment.id,
                enrollment.student_id,
                enrollment.course_id,
                enrollment.enrollment_date.format(DATE_FORMAT).to_string(),
                enrollment.status.to_db_str(),
                enrollment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 查询学员的全部选课记录（含已退课，过滤交给引擎）
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM enrollments WHERE student_id = ?1 ORDER BY enrollment_date ASC, id ASC",
            ENROLLMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let enrollments = stmt
            .query_map(params![student_id], map_enrollment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(enrollments)
    }

    /// 更新选课状态（退课/结课）
    pub fn update_status(
        &self,
        enrollment_id: &str,
        status: EnrollmentStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE enrollments SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), enrollment_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Enrollment".to_string(),
                id: enrollment_id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// PaymentQuery - 缴费查询条件
// ==========================================
/// 缴费记录查询条件（全部可选，None 表示不过滤）
#[derive(Debug, Clone, Default)]
pub struct PaymentQuery {
    pub student_id: Option<String>,
    pub course_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentRecordStatus>,
    pub date_from: Option<NaiveDate>, // 含
    pub date_to: Option<NaiveDate>,   // 含
}

impl PaymentQuery {
    pub fn for_student(student_id: &str) -> Self {
        Self {
            student_id: Some(student_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_course(mut self, course_id: &str) -> Self {
        self.course_id = Some(course_id.to_string());
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_status(mut self, status: PaymentRecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// 按缴费日期区间过滤（闭区间）
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }
}

// ==========================================
// PaymentRepository - 缴费仓储
// ==========================================
pub struct PaymentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增缴费记录
    ///
    /// # 规则
    /// - 金额必须为正数
    pub fn create(&self, payment: &Payment) -> RepositoryResult<()> {
        match payment.amount {
            Some(amount) if amount > rust_decimal::Decimal::ZERO => {}
            other => {
                return Err(RepositoryError::ValidationError(format!(
                    "缴费金额必须为正数: {:?}",
                    other
                )))
            }
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO payments (
                id, student_id, course_id, amount, payment_date,
                payment_method, status, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                payment.id,
                payment.student_id,
                payment.course_id,
                decimal_to_db(payment.amount),
                payment.payment_date.format(DATE_FORMAT).to_string(),
                payment.payment_method.to_db_str(),
                payment.status.to_db_str(),
                payment.notes,
                payment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, payment_id: &str) -> RepositoryResult<Option<Payment>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS);
        let payment = conn
            .query_row(&sql, params![payment_id], map_payment)
            .optional()?;
        Ok(payment)
    }

    /// 按条件查询（过滤在 SQL 中完成，按缴费日期升序）
    pub fn query(&self, query: &PaymentQuery) -> RepositoryResult<Vec<Payment>> {
        let mut filter = WhereBuilder::new();
        filter
            .push("student_id = ?", query.student_id.clone())
            .push("course_id = ?", query.course_id.clone())
            .push("payment_method = ?", query.method.map(|m| m.to_db_str()))
            .push("status = ?", query.status.map(|s| s.to_db_str()))
            .push(
                "payment_date >= ?",
                query.date_from.map(|d| d.format(DATE_FORMAT).to_string()),
            )
            .push(
                "payment_date <= ?",
                query.date_to.map(|d| d.format(DATE_FORMAT).to_string()),
            );

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM payments{} ORDER BY payment_date ASC, id ASC",
            PAYMENT_COLUMNS,
            filter.to_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let payments = stmt
            .query_map(filter.params().as_slice(), map_payment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(payments)
    }

    /// 查询学员的全部缴费记录
    pub fn list_by_student(&self, student_id: &str) -> RepositoryResult<Vec<Payment>> {
        self.query(&PaymentQuery::for_student(student_id))
    }

    /// 更新缴费状态（如 pending → completed / refunded）
    pub fn update_status(
        &self,
        payment_id: &str,
        status: PaymentRecordStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE payments SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), payment_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Payment".to_string(),
                id: payment_id.to_string(),
            });
        }
        Ok(())
    }
}
