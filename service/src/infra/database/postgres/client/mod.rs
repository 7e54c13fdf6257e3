//! Postgres database clients.
//!
//! [`NonTx`] runs every statement on its own, while [`Tx`] runs them inside a
//! single transaction started lazily on the first statement.

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the connection stored in the provided `slot`, establishing it with
/// the provided `connect` function, if there is none yet.
///
/// Concurrent callers establish the connection only once.
async fn lazy_connection<'s, C, F, Fut>(
    slot: &'s RwLock<Option<C>>,
    connect: F,
) -> Result<RwLockReadGuard<'s, C>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(connect().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |conn| {
        conn.as_ref()
            .expect("connection cannot be dropped while guard is alive")
    }))
}
