//! Cancellable execution of scroll plans.
//!
//! Browsers reflow content asynchronously after a client-side route
//! change, silently undoing an immediate scroll. Plans therefore carry a
//! short schedule of repeated attempts. Every attempt is idempotent (it
//! sets an absolute position), and each delayed attempt re-checks the
//! driver epoch before touching the surface, so a newer navigation
//! cancels all stale retries instead of flickering back to an old offset.
//!
//! This is a best-effort UX affordance, not a correctness mechanism: an
//! attempt that loses the race with a late reflow is simply retried.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::trace;

/// Viewport collaborator. The host shell implements this over the real
/// document; tests use a recording mock.
pub trait ScrollSurface: Send + Sync {
    /// Current vertical scroll offset in pixels.
    fn position(&self) -> u32;
    /// Jump to an absolute vertical offset.
    fn scroll_to(&self, y: u32);
}

/// What a navigation decided the viewport should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollCommand {
    /// Leave the viewport alone (initial mount, malformed input).
    None,
    /// Jump to the top, retried on the given offsets from plan start.
    ToTop { schedule: Vec<Duration> },
    /// Restore a saved offset, retried on the given offsets from plan start.
    Restore { offset: u32, schedule: Vec<Duration> },
}

/// A scroll decision tagged with its navigation generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    /// Monotonic counter from the tracker; newer navigations carry
    /// larger values.
    pub generation: u64,
    /// The decided behavior.
    pub command: ScrollCommand,
}

/// Executes scroll plans on the current tokio runtime.
///
/// Cheap to clone; clones share the cancellation epoch.
#[derive(Clone)]
pub struct ScrollDriver {
    surface: Arc<dyn ScrollSurface>,
    epoch: Arc<AtomicU64>,
    last_deps: Arc<AtomicU64>,
    top_schedule: Arc<Vec<Duration>>,
}

impl ScrollDriver {
    /// Create a driver over a surface. `top_schedule` is used by
    /// [`Self::force_top`] and [`Self::force_top_on_change`].
    #[must_use]
    pub fn new(surface: Arc<dyn ScrollSurface>, top_schedule: Vec<Duration>) -> Self {
        Self {
            surface,
            epoch: Arc::new(AtomicU64::new(0)),
            last_deps: Arc::new(AtomicU64::new(u64::MAX)),
            top_schedule: Arc::new(top_schedule),
        }
    }

    /// Execute a plan, invalidating any pending retries of earlier plans.
    ///
    /// Must be called within a tokio runtime; delayed attempts run as a
    /// spawned task.
    pub fn execute(&self, plan: ScrollPlan) {
        // Every navigation invalidates stale timers, even one that plans
        // no scrolling.
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let (target, schedule) = match plan.command {
            ScrollCommand::None => return,
            ScrollCommand::ToTop { schedule } => (0, schedule),
            ScrollCommand::Restore { offset, schedule } => (offset, schedule),
        };
        trace!(
            generation = plan.generation,
            target,
            attempts = schedule.len(),
            "executing scroll plan"
        );
        self.run_schedule(my_epoch, target, schedule);
    }

    /// Unconditionally run the top schedule under a fresh epoch.
    pub fn force_top(&self) {
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.run_schedule(my_epoch, 0, self.top_schedule.as_ref().clone());
    }

    /// Run the top schedule when a dependency set changes.
    ///
    /// For same-route content switches (e.g. flipping chapter number)
    /// that the router never reports. Hash the values that should
    /// trigger the scroll with [`hash_deps`].
    pub fn force_top_on_change(&self, deps_hash: u64) {
        if self.last_deps.swap(deps_hash, Ordering::SeqCst) == deps_hash {
            return;
        }
        self.force_top();
    }

    fn run_schedule(&self, my_epoch: u64, target: u32, schedule: Vec<Duration>) {
        let surface = Arc::clone(&self.surface);
        let epoch = Arc::clone(&self.epoch);
        tokio::spawn(async move {
            let mut elapsed = Duration::ZERO;
            for at in schedule {
                tokio::time::sleep(at.saturating_sub(elapsed)).await;
                elapsed = at;
                if epoch.load(Ordering::SeqCst) != my_epoch {
                    trace!(my_epoch, "scroll plan superseded, stopping retries");
                    return;
                }
                surface.scroll_to(target);
            }
        });
    }
}

/// Hash an arbitrary dependency set for [`ScrollDriver::force_top_on_change`].
#[must_use]
pub fn hash_deps<T: Hash>(deps: &T) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    deps.hash(&mut hasher);
    hasher.finish()
}
