//! Transaction-scoped locking for posting scopes.
//!
//! A posting takes three guards inside the caller's transaction:
//! a `lock_timeout`, an advisory lock on the scope key, and a row lock on
//! the latest entry of the scope. All of them are released on commit or
//! rollback.
//!
//! # Usage
//!
//! ```ignore
//! use coopledger_db::lock;
//!
//! let txn = db.begin().await?;
//! lock::set_lock_timeout(&txn, 5_000).await?;
//! lock::lock_scope(&txn, &scope.lock_key()).await?;
//! // read the latest row FOR UPDATE, insert the next one
//! txn.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, RuntimeErr, Statement};

/// SQLSTATE codes that mean "another writer holds what we need".
const CONFLICT_SQLSTATES: [&str; 4] = [
    // deadlock_detected
    "40P01",
    // lock_not_available (lock_timeout)
    "55P03",
    // serialization_failure
    "40001",
    // unique_violation (scope version backstop)
    "23505",
];

/// Bounds how long statements in this transaction wait for locks.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn set_lock_timeout(txn: &DatabaseTransaction, timeout_ms: u64) -> Result<(), DbErr> {
    let sql = format!("SET LOCAL lock_timeout = '{timeout_ms}ms'");
    txn.execute_unprepared(&sql).await?;
    Ok(())
}

/// Serializes writers of one posting scope until the transaction ends.
///
/// Covers the first posting of a scope, where there is no row to lock yet.
///
/// # Errors
///
/// Returns an error if the lock cannot be taken within `lock_timeout`.
pub async fn lock_scope(txn: &DatabaseTransaction, key: &str) -> Result<(), DbErr> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
        [key.into()],
    ))
    .await?;
    Ok(())
}

/// Extracts the PostgreSQL SQLSTATE of a database error, if any.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            db_err.code().map(std::borrow::Cow::into_owned)
        }
        _ => None,
    }
}

/// Returns true if the error is a lock timeout, deadlock, serialization
/// failure or scope version collision.
#[must_use]
pub fn is_lock_conflict(err: &DbErr) -> bool {
    sqlstate(err).is_some_and(|code| CONFLICT_SQLSTATES.contains(&code.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: lock behaviour itself needs a real PostgreSQL database and is
    // covered by the integration tests.

    #[test]
    fn test_lock_timeout_sql_format() {
        let sql = format!("SET LOCAL lock_timeout = '{}ms'", 5_000u64);
        assert_eq!(sql, "SET LOCAL lock_timeout = '5000ms'");
    }

    #[test]
    fn test_non_sqlx_errors_are_not_conflicts() {
        assert!(!is_lock_conflict(&DbErr::RecordNotFound("gl".into())));
        assert!(!is_lock_conflict(&DbErr::Custom("boom".into())));
        assert!(sqlstate(&DbErr::Exec(RuntimeErr::Internal("x".into()))).is_none());
    }
}
