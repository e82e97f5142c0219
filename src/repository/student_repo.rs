// ==========================================
// 学院财务管理系统 - 学员与课程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::student::{Course, Student};
use crate::domain::types::{CourseStatus, StudentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    decimal_to_db, get_date, get_decimal, get_timestamp, WhereBuilder, DATE_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const STUDENT_COLUMNS: &str =
    "id, name, phone, enrollment_date, discount_percentage, status, created_at";
const COURSE_COLUMNS: &str = "id, name, monthly_fee, status, created_at";

// ==========================================
// StudentQuery - 学员查询条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    pub status: Option<StudentStatus>,
    pub name_contains: Option<String>,
}

impl StudentQuery {
    /// 按状态过滤
    pub fn with_status(mut self, status: StudentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// 按姓名模糊匹配
    pub fn with_name(mut self, name: &str) -> Self {
        self.name_contains = Some(name.to_string());
        self
    }
}

fn map_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        enrollment_date: get_date(row, 3)?,
        discount_percentage: get_decimal(row, 4)?,
        status: StudentStatus::from_str(&row.get::<_, String>(5)?),
        created_at: get_timestamp(row, 6)?,
    })
}

fn map_course(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        monthly_fee: get_decimal(row, 2)?,
        status: CourseStatus::from_str(&row.get::<_, String>(3)?),
        created_at: get_timestamp(row, 4)?,
    })
}

// ==========================================
// StudentRepository - 学员仓储
// ==========================================
/// 学员仓储
/// 职责: 管理 students 表的 CRUD 操作
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增学员
    pub fn create(&self, student: &Student) -> RepositoryResult<()> {
        if student.name.trim().is_empty() {
            return Err(RepositoryError::ValidationError("学员姓名不能为空".to_string()));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO students (
                id, name, phone, enrollment_date, discount_percentage, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                student.id,
                student.name,
                student.phone,
                student.enrollment_date.format(DATE_FORMAT).to_string(),
                decimal_to_db(student.discount_percentage),
                student.status.to_db_str(),
                student.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS);
        let student = conn
            .query_row(&sql, params![student_id], map_student)
            .optional()?;
        Ok(student)
    }

    /// 按条件查询（过滤在 SQL 中完成）
    pub fn query(&self, query: &StudentQuery) -> RepositoryResult<Vec<Student>> {
        let mut filter = WhereBuilder::new();
        filter
            .push("status = ?", query.status.map(|s| s.to_db_str()))
            .push(
                "name LIKE ?",
                query.name_contains.as_ref().map(|n| format!("%{}%", n.trim())),
            );

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM students{} ORDER BY name ASC, id ASC",
            STUDENT_COLUMNS,
            filter.to_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map(filter.params().as_slice(), map_student)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// 更新学员状态
    pub fn update_status(&self, student_id: &str, status: StudentStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE students SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), student_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }
        Ok(())
    }

    /// 更新学员折扣
    pub fn update_discount(
        &self,
        student_id: &str,
        discount_percentage: Decimal,
    ) -> RepositoryResult<()> {
        if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE_HUNDRED {
            return Err(RepositoryError::ValidationError(format!(
                "折扣必须在 0-100 之间: {}",
                discount_percentage
            )));
        }

        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE students SET discount_percentage = ?1 WHERE id = ?2",
            params![decimal_to_db(Some(discount_percentage)), student_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除学员及其选课、缴费记录（单事务）
    ///
    /// # 返回
    /// - 删除的记录总数（含学员本身）
    pub fn delete_cascade(&self, student_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let payments =
            tx.execute("DELETE FROM payments WHERE student_id = ?1", params![student_id])?;
        let enrollments =
            tx.execute("DELETE FROM enrollments WHERE student_id = ?1", params![student_id])?;
        let students = tx.execute("DELETE FROM students WHERE id = ?1", params![student_id])?;

        if students == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(student_id, payments, enrollments, "学员及关联记录已删除");
        Ok(payments + enrollments + students)
    }
}

// ==========================================
// CourseRepository - 课程仓储
// ==========================================
/// 课程仓储
/// 职责: 管理 courses 表的 CRUD 操作
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增课程
    pub fn create(&self, course: &Course) -> RepositoryResult<()> {
        if course.name.trim().is_empty() {
            return Err(RepositoryError::ValidationError("课程名称不能为空".to_string()));
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO courses (id, name, monthly_fee, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                course.id,
                course.name,
                decimal_to_db(course.monthly_fee),
                course.status.to_db_str(),
                course.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, course_id: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS);
        let course = conn
            .query_row(&sql, params![course_id], map_course)
            .optional()?;
        Ok(course)
    }

    /// 查询课程目录（可按状态过滤）
    pub fn list(&self, status: Option<CourseStatus>) -> RepositoryResult<Vec<Course>> {
        let mut filter = WhereBuilder::new();
        filter.push("status = ?", status.map(|s| s.to_db_str()));

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM courses{} ORDER BY name ASC, id ASC",
            COURSE_COLUMNS,
            filter.to_sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let courses = stmt
            .query_map(filter.params().as_slice(), map_course)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    /// 更新课程状态
    pub fn update_status(&self, course_id: &str, status: CourseStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE courses SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), course_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除课程及其选课、缴费记录（单事务）
    pub fn delete_cascade(&self, course_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let payments = tx.execute("DELETE FROM payments WHERE course_id = ?1", params![course_id])?;
        let enrollments =
            tx.execute("DELETE FROM enrollments WHERE course_id = ?1", params![course_id])?;
        let courses = tx.execute("DELETE FROM courses WHERE id = ?1", params![course_id])?;

        if courses == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course_id.to_string(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(course_id, payments, enrollments, "课程及关联记录已删除");
        Ok(payments + enrollments + courses)
    }
}
