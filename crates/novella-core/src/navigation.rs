//! Navigation history tracking and scroll-behavior decisions.
//!
//! On every route change the tracker updates three structures and decides
//! what should happen to the viewport:
//!
//! - **scroll position table** — last saved vertical offset per route path,
//!   written by the navigating component just before it leaves a page;
//! - **history stack** — the most recent visited paths (capped), used to
//!   spot "disguised back" pushes that should restore instead of reset;
//! - **transition log** — recent novel↔chapter hops (capped), consumed by
//!   [`crate::back_nav`] to avoid the novel↔chapter ping-pong trap.
//!
//! The tracker is pure state: it returns a [`ScrollPlan`] and never touches
//! the viewport itself. Plans are executed (and cancelled by newer plans)
//! by [`crate::scroll::ScrollDriver`].
//!
//! # Data flow
//!
//! ```text
//! Router (path, kind) → record_navigation → ScrollPlan → ScrollDriver
//! ```

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::NavigationConfig;
use crate::scroll::{ScrollCommand, ScrollPlan};

/// Navigation kind reported by the host router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    /// New forward history entry.
    Push,
    /// Back/forward through existing history.
    Pop,
    /// Current entry swapped without adding history.
    Replace,
}

/// Which side of a novel↔chapter hop a path is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageView {
    /// Novel detail page.
    Novel,
    /// Chapter reading page.
    Chapter,
}

/// One recorded novel↔chapter hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Page kind the user left.
    pub from: PageView,
    /// Page kind the user arrived at.
    pub to: PageView,
    /// Destination path of the hop.
    pub path: String,
}

/// Tracks visited routes and decides scroll behavior per navigation.
///
/// Single-owner mutable state; hosts with concurrent writers must wrap it
/// in a mutex. A "disguised back" is a `Push` whose destination equals the
/// second-to-last history entry — typically an in-app back button that
/// navigates forward to a previously seen path. The check can misfire for
/// a genuine forward revisit of a recent path; the saved offset (if any)
/// is restored in that case, which is the accepted ambiguity.
#[derive(Debug)]
pub struct NavigationTracker {
    config: NavigationConfig,
    offsets: HashMap<String, u32>,
    history: Vec<String>,
    transitions: Vec<Transition>,
    generation: u64,
    seeded: bool,
}

impl NavigationTracker {
    /// Create a tracker with the given configuration.
    #[must_use]
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            offsets: HashMap::new(),
            history: Vec::new(),
            transitions: Vec::new(),
            generation: 0,
            seeded: false,
        }
    }

    /// Record a route change and decide the scroll behavior.
    ///
    /// The first observed navigation only seeds the history stack — the
    /// page is already where the browser put it, so no plan is issued
    /// beyond cancelling nothing. Malformed (empty) paths are a no-op.
    pub fn record_navigation(&mut self, path: &str, kind: NavKind) -> ScrollPlan {
        self.generation += 1;
        let generation = self.generation;

        if path.is_empty() {
            return ScrollPlan {
                generation,
                command: ScrollCommand::None,
            };
        }

        if !self.seeded {
            self.seeded = true;
            self.history.push(path.to_string());
            trace!(path, "seeded navigation history");
            return ScrollPlan {
                generation,
                command: ScrollCommand::None,
            };
        }

        let previous = self.history.last().cloned();

        // Log the novel↔chapter hop. Forward hops only: a Pop return is
        // evaluated by the back-navigation resolver, not re-logged.
        if kind != NavKind::Pop {
            if let Some(prev) = previous.as_deref() {
                self.log_transition(prev, path);
            }
        }

        let disguised_back = kind == NavKind::Push
            && self.history.len() >= 2
            && self.history[self.history.len() - 2] == path;

        let command = match kind {
            NavKind::Push if !disguised_back => {
                debug!(path, generation, "forward navigation, scrolling to top");
                ScrollCommand::ToTop {
                    schedule: self.config.top_schedule(),
                }
            }
            NavKind::Replace => ScrollCommand::ToTop {
                schedule: vec![std::time::Duration::ZERO],
            },
            // Pop, or a push identified as a disguised back.
            _ => match self.offsets.get(path) {
                Some(&offset) if offset > 0 => {
                    debug!(path, offset, generation, "back navigation, restoring offset");
                    ScrollCommand::Restore {
                        offset,
                        schedule: self.config.restore_schedule(),
                    }
                }
                _ => {
                    debug!(path, generation, "back navigation without saved offset");
                    ScrollCommand::ToTop {
                        schedule: self.config.top_schedule(),
                    }
                }
            },
        };

        match kind {
            NavKind::Push if !disguised_back => {
                self.history.push(path.to_string());
                let cap = self.config.history_cap.max(1);
                if self.history.len() > cap {
                    let excess = self.history.len() - cap;
                    self.history.drain(..excess);
                }
            }
            NavKind::Replace => {}
            // Pop or disguised back unwinds one entry.
            _ => {
                self.history.pop();
            }
        }

        ScrollPlan { generation, command }
    }

    /// Save a vertical scroll offset for a path.
    ///
    /// Must be called before the DOM updates for the next route — the
    /// offset is not recoverable afterwards.
    pub fn save_offset(&mut self, path: &str, offset: u32) {
        if path.is_empty() {
            return;
        }
        trace!(path, offset, "saved scroll offset");
        self.offsets.insert(path.to_string(), offset);
    }

    /// Save the current position of a scroll surface for a path.
    pub fn save_offset_from(&mut self, surface: &dyn crate::scroll::ScrollSurface, path: &str) {
        self.save_offset(path, surface.position());
    }

    /// Saved offset for a path, if any.
    #[must_use]
    pub fn saved_offset(&self, path: &str) -> Option<u32> {
        self.offsets.get(path).copied()
    }

    /// Snapshot copy of the novel↔chapter transition log, oldest first.
    #[must_use]
    pub fn transition_log(&self) -> Vec<Transition> {
        self.transitions.clone()
    }

    /// Snapshot copy of the visited-path stack, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.clone()
    }

    /// Monotonic navigation counter; newer plans carry larger values.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Empty all three structures. Testing/debugging only.
    pub fn clear_all(&mut self) {
        self.offsets.clear();
        self.history.clear();
        self.transitions.clear();
        self.seeded = false;
    }

    /// Classify a path against the configured route prefixes.
    #[must_use]
    pub fn classify(&self, path: &str) -> Option<PageView> {
        if path.starts_with(self.config.novel_prefix.as_str()) {
            Some(PageView::Novel)
        } else if path.starts_with(self.config.chapter_prefix.as_str()) {
            Some(PageView::Chapter)
        } else {
            None
        }
    }

    fn log_transition(&mut self, prev: &str, path: &str) {
        let hop = match (self.classify(prev), self.classify(path)) {
            (Some(PageView::Novel), Some(PageView::Chapter)) => (PageView::Novel, PageView::Chapter),
            (Some(PageView::Chapter), Some(PageView::Novel)) => (PageView::Chapter, PageView::Novel),
            _ => return,
        };
        self.transitions.push(Transition {
            from: hop.0,
            to: hop.1,
            path: path.to_string(),
        });
        let cap = self.config.transition_log_cap.max(1);
        if self.transitions.len() > cap {
            let excess = self.transitions.len() - cap;
            self.transitions.drain(..excess);
        }
    }
}

impl Default for NavigationTracker {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}
