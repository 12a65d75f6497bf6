//! Transaction guard - rolls back a transaction that was never finished.

use std::sync::Arc;

use crate::infrastructure::ports::{RepoError, TransactionPort};

/// An open transaction on a [`TransactionPort`].
///
/// Dropping the guard before `commit` or `rollback` completes (a cancelled
/// mutation future, say) schedules a rollback on the current runtime so the
/// port is released.
pub(crate) struct TransactionGuard {
    transactions: Option<Arc<dyn TransactionPort>>,
}

impl TransactionGuard {
    pub(crate) async fn begin(transactions: &Arc<dyn TransactionPort>) -> Result<Self, RepoError> {
        transactions.begin().await?;
        Ok(Self {
            transactions: Some(transactions.clone()),
        })
    }

    /// Stays armed when the commit fails, so the caller can still roll back.
    pub(crate) async fn commit(&mut self) -> Result<(), RepoError> {
        if let Some(transactions) = &self.transactions {
            transactions.commit().await?;
        }
        self.transactions = None;
        Ok(())
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), RepoError> {
        let result = match &self.transactions {
            Some(transactions) => transactions.rollback().await,
            None => Ok(()),
        };
        self.transactions = None;
        result
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        let Some(transactions) = self.transactions.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Transaction dropped while open, rolling back");
                handle.spawn(async move {
                    if let Err(err) = transactions.rollback().await {
                        tracing::error!(error = %err, "Rollback of dropped transaction failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!("Transaction dropped outside a runtime, rollback skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryStore;
    use crate::infrastructure::ports::MockTransactionPort;

    #[tokio::test]
    async fn finished_guards_do_not_roll_back_again() {
        let mut transactions = MockTransactionPort::new();
        transactions.expect_begin().times(2).returning(|| Ok(()));
        transactions.expect_commit().times(1).returning(|| Ok(()));
        transactions.expect_rollback().times(1).returning(|| Ok(()));
        let transactions: Arc<dyn TransactionPort> = Arc::new(transactions);

        let mut committed = TransactionGuard::begin(&transactions).await.unwrap();
        committed.commit().await.unwrap();
        drop(committed);

        let mut rolled_back = TransactionGuard::begin(&transactions).await.unwrap();
        rolled_back.rollback().await.unwrap();
        drop(rolled_back);
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn dropping_an_open_guard_releases_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let transactions: Arc<dyn TransactionPort> = store.clone();

        let guard = TransactionGuard::begin(&transactions).await.unwrap();
        assert!(store.in_transaction().await);
        drop(guard);

        let next = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            TransactionGuard::begin(&transactions),
        )
        .await;
        let mut next = next.expect("begin waited on a dropped transaction").unwrap();
        next.commit().await.unwrap();
        assert!(!store.in_transaction().await);
    }
}
