/*!
 * Transaction Helper Utilities
 *
 * Scoped transactions: commit when the closure succeeds, roll back on every
 * other exit path, and hand the connection back to the pool either way.
 */

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// The error type of the closure is preserved, so a typed failure raised while
/// staging rows reaches the caller unchanged after the rollback.
///
/// # Example
///
/// ```rust,ignore
/// use almox_api::db::with_transaction;
///
/// let inserted = with_transaction(&db, "seed_admin", |txn| {
///     Box::pin(async move {
///         let user = admin.insert(txn).await?;
///         Ok::<_, ServiceError>(user)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(
    db: &DatabaseConnection,
    label: &'static str,
    f: F,
) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: From<DbErr> + std::error::Error + Send,
{
    let start = Instant::now();
    debug!(transaction = label, "Starting database transaction");
    counter!("almox_db.transaction.started", 1, "transaction" => label);

    let result = db.transaction::<_, T, E>(f).await;

    let elapsed = start.elapsed();
    histogram!("almox_db.transaction.duration", elapsed, "transaction" => label);

    match &result {
        Ok(_) => {
            counter!("almox_db.transaction.committed", 1, "transaction" => label);
            debug!(transaction = label, "Transaction committed in {:?}", elapsed);
        }
        Err(_) => {
            counter!("almox_db.transaction.rolled_back", 1, "transaction" => label);
            warn!(transaction = label, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}
