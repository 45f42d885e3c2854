use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, QueryResult, SqlErr,
    Statement, Value,
};

use crate::ResultEngine;

mod assistant;
mod categories;
mod entries;
mod reports;
mod users;

pub use categories::{DEFAULT_CATEGORY_CATALOG, DefaultCategory};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Run a raw aggregation query inside the current transaction.
async fn query_all(
    db_tx: &DatabaseTransaction,
    sql: &str,
    values: Vec<Value>,
) -> ResultEngine<Vec<QueryResult>> {
    let backend = db_tx.get_database_backend();
    Ok(db_tx
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?)
}

async fn query_sum(db_tx: &DatabaseTransaction, sql: &str, values: Vec<Value>) -> ResultEngine<i64> {
    let backend = db_tx.get_database_backend();
    let row = db_tx
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(match row {
        Some(row) => row.try_get::<i64>("", "total")?,
        None => 0,
    })
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
