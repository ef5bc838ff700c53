use crate::connection::connect;
use crate::error::DbError;
use configuration::{DatabaseSettings, is_valid_table_name};
use core_types::StudentRecord;
use sqlx::postgres::PgPool;
use std::future::Future;

/// Anything that can persist one record and report how many rows it wrote.
///
/// `insert_all` is written against this trait so the insertion loop does not
/// care whether it is talking to PostgreSQL or to something in memory.
pub trait RecordSink {
    fn insert(&self, record: &StudentRecord) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    /// Releases whatever the sink holds open. Called once, after the last insert.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized,
    {
        async {}
    }
}

/// The `StudentRepository` owns the connection pool and the INSERT statement
/// for the configured student table.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: PgPool,
    table: String,
    insert_sql: String,
}

impl StudentRepository {
    /// Creates a repository over an existing pool.
    ///
    /// The table name ends up in SQL text, so it is validated here.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DbError> {
        if !is_valid_table_name(table) {
            return Err(DbError::InvalidTableName(table.to_string()));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
            insert_sql: format!(
                "INSERT INTO {table} (name, age, grade, gender) VALUES ($1, $2, $3, $4)"
            ),
        })
    }

    /// Opens a pool from `settings` and wraps it.
    pub async fn connect(settings: DatabaseSettings) -> Result<Self, DbError> {
        if !is_valid_table_name(&settings.table) {
            return Err(DbError::InvalidTableName(settings.table));
        }
        let pool = connect(&settings).await?;
        Self::new(pool, &settings.table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Inserts one student as its own unit of work (auto-commit, no
    /// surrounding transaction). Returns the number of rows affected.
    pub async fn insert_student(&self, record: &StudentRecord) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&self.insert_sql)
            .bind(&record.name)
            .bind(record.age)
            .bind(record.grade)
            .bind(&record.gender)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Database connection pool closed.");
    }
}

impl RecordSink for StudentRepository {
    async fn insert(&self, record: &StudentRecord) -> Result<u64, sqlx::Error> {
        self.insert_student(record).await
    }

    async fn close(self) {
        StudentRepository::close(self).await
    }
}

/// Inserts `records` one at a time, in order, and returns the total number of
/// rows written.
///
/// Stops at the first failure. Rows written before it stay committed, since
/// each insert is independent.
pub async fn insert_all<S: RecordSink>(sink: &S, records: &[StudentRecord]) -> Result<u64, DbError> {
    let mut inserted = 0;
    for (index, record) in records.iter().enumerate() {
        let position = index + 1;
        let affected = sink
            .insert(record)
            .await
            .map_err(|source| DbError::from_insert(position, &record.name, source))?;
        inserted += affected;
        tracing::debug!(position, name = %record.name, "Inserted record.");
    }
    tracing::info!(inserted, "Finished inserting records.");
    Ok(inserted)
}
