//! Convergence polling for resources and work requests
//!
//! [`wait_until`] is the single polling loop behind every composite
//! operation: fetch a snapshot, evaluate a predicate over its state label,
//! and sleep with truncated exponential backoff until the predicate holds,
//! the resource disappears (delete-class waits), or the total budget runs
//! out. Transient transport failures are NOT retried here; that belongs to
//! the client below the fetch closure, so the timeout accounting in this
//! loop stays unambiguous.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use meridian_cloud::backups::Backup;
use meridian_cloud::clusters::Cluster;
use meridian_cloud::databases::Database;
use meridian_cloud::work_requests::WorkRequest;

use crate::error::WaitError;

/// Default ceiling for a single sleep between polls (30 seconds)
pub const DEFAULT_INTERVAL_CEILING: Duration = Duration::from_secs(30);

/// Default ceiling for a whole wait (20 minutes)
pub const DEFAULT_TOTAL_CEILING: Duration = Duration::from_secs(1200);

/// First sleep of the backoff schedule; doubles per attempt up to the
/// interval ceiling
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// What a wait should wait for, and how long
///
/// An empty target set means "do not wait": composite operations return the
/// raw mutation result without a single poll. State labels are matched
/// case-insensitively.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use meridian_cloud_core::WaitOptions;
///
/// let options = WaitOptions::for_states(["AVAILABLE"])
///     .with_total_ceiling(Duration::from_secs(600));
/// assert!(options.waits());
/// assert!(options.matches("available"));
/// ```
#[derive(Debug, Clone)]
pub struct WaitOptions {
    target_states: Vec<String>,
    /// Upper bound on a single sleep between polls
    pub interval_ceiling: Duration,
    /// Upper bound on the whole wait, measured from loop entry
    pub total_ceiling: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::none()
    }
}

impl WaitOptions {
    /// Do not wait; return the mutation result as-is
    #[must_use]
    pub fn none() -> Self {
        Self {
            target_states: Vec::new(),
            interval_ceiling: DEFAULT_INTERVAL_CEILING,
            total_ceiling: DEFAULT_TOTAL_CEILING,
        }
    }

    /// Wait until the watched state matches one of `states`
    #[must_use]
    pub fn for_states<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_states: states.into_iter().map(Into::into).collect(),
            ..Self::none()
        }
    }

    /// Override the per-sleep ceiling
    #[must_use]
    pub fn with_interval_ceiling(mut self, ceiling: Duration) -> Self {
        self.interval_ceiling = ceiling;
        self
    }

    /// Override the total wait ceiling
    #[must_use]
    pub fn with_total_ceiling(mut self, ceiling: Duration) -> Self {
        self.total_ceiling = ceiling;
        self
    }

    /// Whether any wait was requested at all
    #[must_use]
    pub fn waits(&self) -> bool {
        !self.target_states.is_empty()
    }

    /// The target state labels, as supplied
    #[must_use]
    pub fn target_states(&self) -> &[String] {
        &self.target_states
    }

    /// Case-insensitive membership test against the target set.
    ///
    /// Evaluating this twice against the same label always yields the same
    /// answer; nothing is consumed or cached.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        self.target_states
            .iter()
            .any(|s| s.eq_ignore_ascii_case(label))
    }
}

/// Anything the waiter can poll: a point-in-time read with a lifecycle or
/// status label
pub trait StateSnapshot {
    /// The current lifecycle/status label
    fn state_label(&self) -> &str;
}

impl StateSnapshot for Database {
    fn state_label(&self) -> &str {
        &self.lifecycle_state
    }
}

impl StateSnapshot for Cluster {
    fn state_label(&self) -> &str {
        &self.lifecycle_state
    }
}

impl StateSnapshot for Backup {
    fn state_label(&self) -> &str {
        &self.lifecycle_state
    }
}

impl StateSnapshot for WorkRequest {
    fn state_label(&self) -> &str {
        &self.status
    }
}

/// How a wait ended successfully
#[derive(Debug)]
pub enum Converged<T> {
    /// The predicate held; this is the snapshot it held for
    Reached(T),
    /// The watched resource disappeared while `succeed_on_not_found` was
    /// set. There is no snapshot to return; the resource no longer exists.
    Gone,
}

impl<T> Converged<T> {
    /// The final snapshot, if the resource still existed
    pub fn into_snapshot(self) -> Option<T> {
        match self {
            Converged::Reached(snapshot) => Some(snapshot),
            Converged::Gone => None,
        }
    }
}

/// Poll `fetch` until `predicate` holds over the returned snapshot.
///
/// * Exactly one fetch per iteration; the predicate only ever sees the
///   snapshot from the current iteration.
/// * A not-found fetch error converges immediately when
///   `succeed_on_not_found` is set (delete-class waits); any other fetch
///   error propagates untouched.
/// * The deadline is fixed once at loop entry from `total_ceiling`, so a
///   slow individual fetch counts against the budget. It is checked before
///   sleeping, and each sleep is clamped to the remaining budget, so the
///   loop overshoots the ceiling by at most one fetch.
/// * Sleeps follow truncated exponential backoff without jitter, capped at
///   `interval_ceiling`.
/// * `on_attempt` observes every snapshot with the elapsed wait time;
///   composite operations use it for progress reporting.
///
/// The future suspends only inside `fetch` and the sleep, so dropping it
/// (or racing it in a `select!`) cancels the wait between iterations.
pub async fn wait_until<T, F, Fut, P, A>(
    mut fetch: F,
    predicate: P,
    interval_ceiling: Duration,
    total_ceiling: Duration,
    succeed_on_not_found: bool,
    mut on_attempt: A,
) -> Result<Converged<T>, WaitError>
where
    T: StateSnapshot,
    F: FnMut() -> Fut,
    Fut: Future<Output = meridian_cloud::Result<T>>,
    P: Fn(&T) -> bool,
    A: FnMut(&T, Duration),
{
    let started = Instant::now();
    let deadline = started + total_ceiling;
    let mut backoff = INITIAL_BACKOFF.min(interval_ceiling);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let snapshot = match fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) if succeed_on_not_found && err.is_not_found() => {
                tracing::debug!(attempt, "watched resource is gone, wait satisfied");
                return Ok(Converged::Gone);
            }
            Err(err) => return Err(WaitError::Fetch(err)),
        };

        let elapsed = started.elapsed();
        on_attempt(&snapshot, elapsed);
        tracing::trace!(attempt, state = snapshot.state_label(), ?elapsed, "polled");

        if predicate(&snapshot) {
            return Ok(Converged::Reached(snapshot));
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::Timeout {
                waited: started.elapsed(),
            });
        }

        tokio::time::sleep(backoff.min(deadline - now)).await;
        backoff = (backoff * 2).min(interval_ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_cloud::ApiError;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Stub {
        state: String,
    }

    impl StateSnapshot for Stub {
        fn state_label(&self) -> &str {
            &self.state
        }
    }

    fn stub(state: &str) -> meridian_cloud::Result<Stub> {
        Ok(Stub {
            state: state.to_string(),
        })
    }

    #[test]
    fn matches_is_case_insensitive_and_repeatable() {
        let options = WaitOptions::for_states(["AVAILABLE", "Stopped"]);

        assert!(options.matches("available"));
        assert!(options.matches("available"));
        assert!(options.matches("STOPPED"));
        assert!(!options.matches("provisioning"));
        assert!(!options.matches("provisioning"));
    }

    #[test]
    fn empty_target_set_never_waits() {
        assert!(!WaitOptions::none().waits());
        assert!(!WaitOptions::default().waits());
        assert!(WaitOptions::for_states(["AVAILABLE"]).waits());
    }

    #[test]
    fn default_timing_ceilings() {
        let options = WaitOptions::none();
        assert_eq!(options.interval_ceiling, Duration::from_secs(30));
        assert_eq!(options.total_ceiling, Duration::from_secs(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn converges_on_the_exact_fetch_that_matches() {
        let calls = Cell::new(0usize);
        let states = ["provisioning", "provisioning", "available"];
        let options = WaitOptions::for_states(["AVAILABLE"]);

        let outcome = wait_until(
            || {
                let n = calls.get();
                calls.set(n + 1);
                let state = states[n.min(states.len() - 1)];
                async move { stub(state) }
            },
            |s: &Stub| options.matches(s.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            false,
            |_, _| {},
        )
        .await
        .expect("wait converges");

        assert_eq!(calls.get(), 3);
        let snapshot = outcome.into_snapshot().expect("snapshot present");
        assert_eq!(snapshot.state_label(), "available");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_state_never_matches() {
        let calls = Cell::new(0u32);
        let options = WaitOptions::for_states(["AVAILABLE"])
            .with_interval_ceiling(Duration::from_secs(1))
            .with_total_ceiling(Duration::from_secs(2));

        let started = Instant::now();
        let err = wait_until(
            || {
                calls.set(calls.get() + 1);
                async { stub("provisioning") }
            },
            |s: &Stub| options.matches(s.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            false,
            |_, _| {},
        )
        .await
        .unwrap_err();

        match err {
            WaitError::Timeout { waited } => assert!(waited >= Duration::from_secs(2)),
            other => panic!("expected timeout, got {other:?}"),
        }
        // ceiling 2 with 1s sleeps: polls at t=0, 1, 2, then gives up
        assert_eq!(calls.get(), 3);
        assert!(started.elapsed() <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_satisfies_delete_class_waits() {
        let calls = Cell::new(0u32);

        let outcome = wait_until(
            || {
                calls.set(calls.get() + 1);
                async {
                    Err::<Stub, _>(ApiError::NotFound {
                        message: "gone".into(),
                    })
                }
            },
            |s: &Stub| s.state_label() == "terminated",
            DEFAULT_INTERVAL_CEILING,
            DEFAULT_TOTAL_CEILING,
            true,
            |_, _| {},
        )
        .await
        .expect("not-found converges");

        assert_eq!(calls.get(), 1);
        assert!(matches!(outcome, Converged::Gone));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_propagates_without_the_flag() {
        let err = wait_until(
            || async {
                Err::<Stub, _>(ApiError::NotFound {
                    message: "gone".into(),
                })
            },
            |_: &Stub| false,
            DEFAULT_INTERVAL_CEILING,
            DEFAULT_TOTAL_CEILING,
            false,
            |_, _| {},
        )
        .await
        .unwrap_err();

        match err {
            WaitError::Fetch(e) => assert!(e.is_not_found()),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_fetch_errors_propagate_immediately() {
        let calls = Cell::new(0u32);

        let err = wait_until(
            || {
                calls.set(calls.get() + 1);
                async {
                    Err::<Stub, _>(ApiError::ServerError {
                        status: 500,
                        message: "boom".into(),
                    })
                }
            },
            |_: &Stub| false,
            DEFAULT_INTERVAL_CEILING,
            DEFAULT_TOTAL_CEILING,
            true,
            |_, _| {},
        )
        .await
        .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(matches!(err, WaitError::Fetch(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_capped_by_the_interval_ceiling() {
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let options = WaitOptions::for_states(["done"])
            .with_interval_ceiling(Duration::from_secs(2))
            .with_total_ceiling(Duration::from_secs(60));

        let _ = wait_until(
            || {
                calls.set(calls.get() + 1);
                let state = if calls.get() >= 6 { "done" } else { "busy" };
                async move { stub(state) }
            },
            |s: &Stub| options.matches(s.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            false,
            |_, _| {},
        )
        .await
        .expect("wait converges");

        // sleeps: 1, 2, 2, 2, 2 once the cap kicks in
        assert_eq!(calls.get(), 6);
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn on_attempt_sees_every_snapshot() {
        let calls = Cell::new(0usize);
        let observed = std::cell::RefCell::new(Vec::new());
        let states = ["creating", "active"];
        let options = WaitOptions::for_states(["ACTIVE"]);

        wait_until(
            || {
                let n = calls.get();
                calls.set(n + 1);
                let state = states[n.min(states.len() - 1)];
                async move { stub(state) }
            },
            |s: &Stub| options.matches(s.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            false,
            |s: &Stub, _| observed.borrow_mut().push(s.state_label().to_string()),
        )
        .await
        .expect("wait converges");

        assert_eq!(*observed.borrow(), vec!["creating", "active"]);
    }
}
