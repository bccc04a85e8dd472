//! Single-flight coordination of access-token refreshes
//!
//! When a request comes back unauthorized the client asks the coordinator
//! for a [`Ticket`]. The first caller becomes the leader and performs the
//! one refresh call; everyone arriving while that call is outstanding gets
//! a waiter that resolves when the leader settles. Waiters are released in
//! insertion order, all with the same outcome. A leader that goes away
//! before the refresh call finishes releases its waiters as
//! [`RefreshOutcome::Abandoned`]; they contend for leadership again.

use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// How a refresh cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token is in the token store
    Refreshed,
    /// The session is gone; queued requests must fail
    Failed,
    /// The leader was cancelled mid-refresh; nothing is known about the
    /// session
    Abandoned,
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// What a caller hitting an unauthorized response should do next
pub enum Ticket<'a> {
    /// Perform the refresh, then settle the guard
    Leader(RefreshGuard<'a>),
    /// Wait for the leader's outcome
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

/// Where [`RefreshCoordinator::join`] left the caller
pub enum Joined<'a> {
    /// Perform the refresh, then settle the guard
    Leader(RefreshGuard<'a>),
    /// Another caller's refresh finished with this outcome
    Settled(RefreshOutcome),
}

/// Tracks whether a refresh is running and who is waiting on it
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the current refresh cycle, or start one if none is running
    pub fn begin(&self) -> Ticket<'_> {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            trace!(queued = state.waiters.len(), "Queued request behind token refresh");
            Ticket::Waiter(rx)
        } else {
            state.in_flight = true;
            Ticket::Leader(RefreshGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Lead a refresh or wait for the running one to settle.
    ///
    /// Never yields [`RefreshOutcome::Abandoned`]: waiters released by a
    /// cancelled leader queue up again until one of them leads.
    pub async fn join(&self) -> Joined<'_> {
        loop {
            match self.begin() {
                Ticket::Leader(guard) => return Joined::Leader(guard),
                Ticket::Waiter(receiver) => match wait(receiver).await {
                    RefreshOutcome::Abandoned => {
                        debug!("Refresh leader went away, contending again");
                    }
                    outcome => return Joined::Settled(outcome),
                },
            }
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of requests parked behind the running refresh
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(?outcome, released = waiters.len(), "Token refresh settled");
        for waiter in waiters {
            // The waiting request may have been dropped; nothing to do then
            let _ = waiter.send(outcome);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the leader for the duration of the refresh call.
///
/// Dropping the guard without settling it releases the queue with
/// [`RefreshOutcome::Abandoned`], so the in-flight flag is cleared on every
/// exit path including cancellation of the leader's future.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    pub fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(RefreshOutcome::Abandoned);
        }
    }
}

/// Wait for a leader's outcome; a vanished leader counts as abandoned
pub async fn wait(receiver: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
    receiver.await.unwrap_or(RefreshOutcome::Abandoned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(ticket: Ticket<'_>) -> RefreshGuard<'_> {
        match ticket {
            Ticket::Leader(guard) => guard,
            Ticket::Waiter(_) => panic!("expected to lead the refresh"),
        }
    }

    fn waiter(ticket: Ticket<'_>) -> oneshot::Receiver<RefreshOutcome> {
        match ticket {
            Ticket::Waiter(rx) => rx,
            Ticket::Leader(_) => panic!("expected to wait on the refresh"),
        }
    }

    #[tokio::test]
    async fn test_only_first_caller_leads() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin());
        assert!(coordinator.is_refreshing());

        let first = waiter(coordinator.begin());
        let second = waiter(coordinator.begin());
        assert_eq!(coordinator.pending(), 2);

        guard.settle(RefreshOutcome::Refreshed);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 0);

        assert_eq!(wait(first).await, RefreshOutcome::Refreshed);
        assert_eq!(wait(second).await, RefreshOutcome::Refreshed);
    }

    #[tokio::test]
    async fn test_failure_rejects_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin());
        let receivers: Vec<_> = (0..5).map(|_| waiter(coordinator.begin())).collect();

        guard.settle(RefreshOutcome::Failed);
        for rx in receivers {
            assert_eq!(wait(rx).await, RefreshOutcome::Failed);
        }
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_queue() {
        let coordinator = RefreshCoordinator::new();
        let rx = {
            let _guard = leader(coordinator.begin());
            waiter(coordinator.begin())
        };
        assert!(!coordinator.is_refreshing());
        assert_eq!(wait(rx).await, RefreshOutcome::Abandoned);

        // The next unauthorized response starts a fresh cycle
        let guard = leader(coordinator.begin());
        guard.settle(RefreshOutcome::Refreshed);
    }

    #[tokio::test]
    async fn test_vanished_sender_counts_as_abandoned() {
        let (tx, rx) = oneshot::channel::<RefreshOutcome>();
        drop(tx);
        assert_eq!(wait(rx).await, RefreshOutcome::Abandoned);
    }

    #[tokio::test]
    async fn test_waiter_takes_over_abandoned_refresh() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin());

        let mut joining = std::pin::pin!(coordinator.join());
        assert!(futures::poll!(joining.as_mut()).is_pending());
        assert_eq!(coordinator.pending(), 1);

        // Leader cancelled mid-refresh
        drop(guard);
        match joining.await {
            Joined::Leader(guard) => {
                assert!(coordinator.is_refreshing());
                guard.settle(RefreshOutcome::Refreshed);
            }
            Joined::Settled(outcome) => panic!("expected to take over, got {outcome:?}"),
        }
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_join_reports_settled_outcome() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin());

        let mut joining = std::pin::pin!(coordinator.join());
        assert!(futures::poll!(joining.as_mut()).is_pending());

        guard.settle(RefreshOutcome::Failed);
        assert!(matches!(
            joining.await,
            Joined::Settled(RefreshOutcome::Failed)
        ));
    }
}
