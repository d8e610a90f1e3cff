use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DbErr};
use tokio::sync::RwLock;

use crate::prelude::*;

/// Pooled connection to the relational store.
///
/// The backing connection is known to die silently after idle periods,
/// so every operation gets exactly one recovery attempt: open a fresh
/// pool, retry once, and give up with `Error::Storage` on a second
/// failure. Reconnects are not deduplicated across concurrent requests;
/// two in-flight operations that both hit a dead pool each swap in
/// their own fresh pool.
pub struct Store {
  url: String,
  pool: RwLock<DatabaseConnection>,
  reconnects: AtomicU64,
}

impl Store {
  pub async fn connect(url: impl Into<String>) -> Result<Self, DbErr> {
    let url = url.into();
    let pool = Self::open(&url).await?;

    Ok(Self { url, pool: RwLock::new(pool), reconnects: AtomicU64::new(0) })
  }

  async fn open(url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
  }

  async fn handle(&self) -> DatabaseConnection {
    self.pool.read().await.clone()
  }

  /// Discard the current pool and open a fresh one.
  pub async fn reconnect(&self) -> Result<(), DbErr> {
    let fresh = Self::open(&self.url).await?;

    let old = {
      let mut pool = self.pool.write().await;
      std::mem::replace(&mut *pool, fresh)
    };
    // the old pool is likely already dead
    let _ = old.close().await;

    let total = self.reconnects.fetch_add(1, Ordering::Relaxed) + 1;
    info!("storage pool reconnected ({total} total)");
    Ok(())
  }

  pub fn reconnects(&self) -> u64 {
    self.reconnects.load(Ordering::Relaxed)
  }

  /// Run `op` against the current pool with the bounded retry policy.
  pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
  where
    F: Fn(DatabaseConnection) -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
  {
    match op(self.handle().await).await {
      Err(err) if is_transient(&err) => {
        warn!("transient storage failure, reconnecting: {err}");
        self.reconnect().await.map_err(Error::Storage)?;

        op(self.handle().await).await.map_err(|err| {
          if is_transient(&err) { Error::Storage(err) } else { Error::Db(err) }
        })
      }
      other => Ok(other?),
    }
  }
}

/// Connection-level failures worth one reconnect attempt, as opposed to
/// query errors that a fresh pool would not fix.
fn is_transient(err: &DbErr) -> bool {
  match err {
    DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
    DbErr::Exec(_) | DbErr::Query(_) => {
      let text = err.to_string();
      text.contains("broken pipe")
        || text.contains("connection closed")
        || text.contains("connection reset")
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicU32;

  use sea_orm::RuntimeErr;

  use super::*;

  fn broken_pipe() -> DbErr {
    DbErr::Conn(RuntimeErr::Internal("broken pipe".into()))
  }

  #[test]
  fn transient_classification() {
    assert!(is_transient(&broken_pipe()));
    assert!(is_transient(&DbErr::Query(RuntimeErr::Internal(
      "connection closed".into()
    ))));
    assert!(!is_transient(&DbErr::Query(RuntimeErr::Internal(
      "syntax error".into()
    ))));
    assert!(!is_transient(&DbErr::RecordNotInserted));
  }

  #[tokio::test]
  async fn recovers_from_a_single_transient_failure() {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    let calls = AtomicU32::new(0);

    let out = store
      .run(|_db| {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if attempt == 0 { Err(broken_pipe()) } else { Ok(7) }
        }
      })
      .await
      .unwrap();

    assert_eq!(out, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.reconnects(), 1);
  }

  #[tokio::test]
  async fn a_second_failure_is_fatal() {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    let calls = AtomicU32::new(0);

    let out: Result<u32> = store
      .run(|_db| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(broken_pipe()) }
      })
      .await;

    assert!(matches!(out, Err(Error::Storage(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.reconnects(), 1);
  }

  #[tokio::test]
  async fn query_errors_do_not_reconnect() {
    let store = Store::connect("sqlite::memory:").await.unwrap();

    let out: Result<u32> = store
      .run(|_db| async {
        Err(DbErr::Query(RuntimeErr::Internal("syntax error".into())))
      })
      .await;

    assert!(matches!(out, Err(Error::Db(_))));
    assert_eq!(store.reconnects(), 0);
  }
}
