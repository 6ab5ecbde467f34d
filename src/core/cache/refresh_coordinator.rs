// Refresh coordination - one backing-store fetch at a time per coordinator.
//
// The first caller becomes the leader and spawns the fetch on its own task.
// Everyone who arrives while that task runs waits on the same watch channel
// and observes the same outcome. The fetch is never cancelled by a caller
// giving up: a timed-out caller simply stops waiting. A fetch that panics
// is reported as `Aborted` and the coordinator goes back to idle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

// ============================================================================
// ERRORS
// ============================================================================

/// Outcome of a failed refresh. `Clone` because every waiter gets a copy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefreshError {
    #[error("Backing store error: {0}")]
    BackingStore(String),

    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error("Refresh task ended without a result")]
    Aborted,
}

type Outcome<T> = Option<Result<T, RefreshError>>;

// ============================================================================
// COORDINATOR
// ============================================================================

/// Coalesces concurrent refreshes into a single in-flight fetch.
///
/// State is either idle (`None`) or fetching (`Some(receiver)`); both success
/// and failure return it to idle, so it can be reused indefinitely.
pub struct RefreshCoordinator<T> {
    in_flight: Arc<Mutex<Option<watch::Receiver<Outcome<T>>>>>,
}

impl<T> RefreshCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a fetch is currently running.
    pub async fn is_refreshing(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }

    /// Run `fetch` unless one is already in flight, then wait for the result.
    ///
    /// `fetch` is only invoked by the leader. It is responsible for publishing
    /// its result (e.g. swapping a snapshot) before resolving. With a
    /// `timeout`, this caller returns [`RefreshError::Timeout`] once the
    /// deadline passes while the shared fetch keeps running.
    pub async fn coordinate<F, Fut>(
        &self,
        fetch: F,
        timeout: Option<Duration>,
    ) -> Result<T, RefreshError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let receiver = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(receiver) => {
                    tracing::debug!("Refresh already in flight, waiting on it");
                    receiver.clone()
                }
                None => {
                    let (sender, receiver) = watch::channel(None);
                    *in_flight = Some(receiver.clone());
                    self.spawn_leader(fetch(), sender);
                    receiver
                }
            }
        };

        match timeout {
            Some(limit) => match tokio::time::timeout(limit, Self::wait(receiver)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "Refresh wait timed out; fetch continues in background"
                    );
                    Err(RefreshError::Timeout(limit))
                }
            },
            None => Self::wait(receiver).await,
        }
    }

    fn spawn_leader<Fut>(&self, fetch: Fut, sender: watch::Sender<Outcome<T>>)
    where
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            // The fetch runs on its own task so a panic surfaces here as a
            // JoinError instead of killing the task that owns `sender`.
            let outcome = match tokio::spawn(fetch).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Refresh task died: {}", e);
                    Err(RefreshError::Aborted)
                }
            };
            if let Err(e) = &outcome {
                tracing::warn!("Refresh failed: {}", e);
            }

            // Back to idle before releasing waiters, so anyone calling after
            // this point starts a fresh fetch instead of reading a stale one.
            *in_flight.lock().await = None;
            // Nobody listening is fine; the result was already published.
            let _ = sender.send(Some(outcome));
        });
    }

    async fn wait(mut receiver: watch::Receiver<Outcome<T>>) -> Result<T, RefreshError> {
        let outcome = match receiver.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(RefreshError::Aborted))
    }
}

impl<T> Default for RefreshCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
