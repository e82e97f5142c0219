// ==========================================
// 学院财务管理系统 - 数据源聚合
// ==========================================
// 职责: 聚合缴费状态派生所需的所有 Repository
// 目标: API 层只依赖 AcademyDataSource，测试可替换为内存实现
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::enrollment::{Enrollment, Payment};
use crate::domain::student::{Course, Student};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::payment_repo::{EnrollmentRepository, PaymentQuery, PaymentRepository};
use crate::repository::student_repo::{CourseRepository, StudentQuery, StudentRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// AcademyDataSource Trait
// ==========================================
/// 学院数据源
///
/// 派生缴费状态时只读取，不写入。
/// 返回原始记录（含已退课、未到账等），过滤规则由引擎层负责。
pub trait AcademyDataSource: Send + Sync {
    /// 按ID读取学员
    fn find_student(&self, student_id: &str) -> RepositoryResult<Option<Student>>;

    /// 按条件读取学员
    fn query_students(&self, query: &StudentQuery) -> RepositoryResult<Vec<Student>>;

    /// 读取课程目录（全部状态）
    fn list_courses(&self) -> RepositoryResult<Vec<Course>>;

    /// 读取学员的选课记录
    fn list_enrollments(&self, student_id: &str) -> RepositoryResult<Vec<Enrollment>>;

    /// 按条件读取缴费记录
    fn query_payments(&self, query: &PaymentQuery) -> RepositoryResult<Vec<Payment>>;

    /// 读取全部学员
    fn list_students(&self) -> RepositoryResult<Vec<Student>> {
        self.query_students(&StudentQuery::default())
    }

    /// 读取学员的全部缴费记录
    fn list_payments(&self, student_id: &str) -> RepositoryResult<Vec<Payment>> {
        self.query_payments(&PaymentQuery::for_student(student_id))
    }
}

// ==========================================
// SqliteDataSource - SQLite 实现
// ==========================================
/// SQLite 数据源（共享同一连接的仓储集合）
#[derive(Clone)]
pub struct SqliteDataSource {
    /// 学员仓储
    pub student_repo: Arc<StudentRepository>,
    /// 课程仓储
    pub course_repo: Arc<CourseRepository>,
    /// 选课仓储
    pub enrollment_repo: Arc<EnrollmentRepository>,
    /// 缴费仓储
    pub payment_repo: Arc<PaymentRepository>,
}

impl SqliteDataSource {
    /// 打开数据库并创建仓储集合
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建仓储集合
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            student_repo: Arc::new(StudentRepository::from_connection(conn.clone())),
            course_repo: Arc::new(CourseRepository::from_connection(conn.clone())),
            enrollment_repo: Arc::new(EnrollmentRepository::from_connection(conn.clone())),
            payment_repo: Arc::new(PaymentRepository::from_connection(conn)),
        }
    }
}

impl AcademyDataSource for SqliteDataSource {
    fn find_student(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        self.student_repo.find_by_id(student_id)
    }

    fn query_students(&self, query: &StudentQuery) -> RepositoryResult<Vec<Student>> {
        self.student_repo.query(query)
    }

    fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.course_repo.list(None)
    }

    fn list_enrollments(&self, student_id: &str) -> RepositoryResult<Vec<Enrollment>> {
        self.enrollment_repo.list_by_student(student_id)
    }

    fn query_payments(&self, query: &PaymentQuery) -> RepositoryResult<Vec<Payment>> {
        self.payment_repo.query(query)
    }
}
