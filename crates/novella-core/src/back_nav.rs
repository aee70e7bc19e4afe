//! Back-navigation resolution.
//!
//! Reading a chapter and returning to its novel page must not trap the
//! user in a novel↔chapter ping-pong: a naive browser-back from the novel
//! page would just re-enter the chapter. When the transition log shows
//! the user arrived at the current novel page from one of its chapters,
//! "go back" jumps straight to the canonical route of the origin tag the
//! arriving component recorded (library listing, home, …) instead of a
//! generic single-step back.

use crate::config::NavigationConfig;
use crate::navigation::{PageView, Transition};

/// Where "go back" should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackTarget {
    /// Navigate to a canonical route.
    Route(String),
    /// Generic single-step back through history.
    HistoryBack,
}

/// Origin tags recorded by components that navigate to a novel page.
pub const ORIGIN_LIBRARY: &str = "library";
pub const ORIGIN_HOME: &str = "home";

/// Resolve a back-navigation request.
///
/// `origin` is the textual tag the component that navigated *to* the
/// current page supplied (e.g. `"library"`); unknown tags fall back to
/// generic back-navigation.
#[must_use]
pub fn resolve_back(
    config: &NavigationConfig,
    transition_log: &[Transition],
    current_path: &str,
    origin: Option<&str>,
) -> BackTarget {
    let on_novel_page = current_path.starts_with(config.novel_prefix.as_str());
    let returned_from_chapter = transition_log
        .last()
        .is_some_and(|t| t.from == PageView::Chapter && t.to == PageView::Novel);

    if on_novel_page && returned_from_chapter {
        match origin {
            Some(ORIGIN_LIBRARY) => return BackTarget::Route("/library".to_string()),
            Some(ORIGIN_HOME) => return BackTarget::Route("/".to_string()),
            _ => {}
        }
    }
    BackTarget::HistoryBack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavKind, NavigationTracker};

    fn chapter_return_log() -> Vec<Transition> {
        // Novel → chapter → pushed return to novel.
        let mut t = NavigationTracker::default();
        t.record_navigation("/novel/42", NavKind::Push);
        t.record_navigation("/read/42/chapter/3", NavKind::Push);
        t.record_navigation("/novel/42", NavKind::Push);
        t.transition_log()
    }

    #[test]
    fn chapter_return_with_library_origin_jumps_to_library() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &chapter_return_log(), "/novel/42", Some("library"));
        assert_eq!(target, BackTarget::Route("/library".to_string()));
    }

    #[test]
    fn chapter_return_with_home_origin_jumps_home() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &chapter_return_log(), "/novel/42", Some("home"));
        assert_eq!(target, BackTarget::Route("/".to_string()));
    }

    #[test]
    fn unknown_origin_falls_back_to_history() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &chapter_return_log(), "/novel/42", Some("bookmarks"));
        assert_eq!(target, BackTarget::HistoryBack);
    }

    #[test]
    fn missing_origin_falls_back_to_history() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &chapter_return_log(), "/novel/42", None);
        assert_eq!(target, BackTarget::HistoryBack);
    }

    #[test]
    fn non_novel_page_always_goes_back() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &chapter_return_log(), "/library", Some("library"));
        assert_eq!(target, BackTarget::HistoryBack);
    }

    #[test]
    fn forward_hop_does_not_trigger_the_special_case() {
        let cfg = NavigationConfig::default();
        let mut t = NavigationTracker::default();
        t.record_navigation("/novel/42", NavKind::Push);
        t.record_navigation("/read/42/chapter/3", NavKind::Push);
        // Latest transition is novel → chapter: plain back is correct.
        let target = resolve_back(&cfg, &t.transition_log(), "/novel/42", Some("library"));
        assert_eq!(target, BackTarget::HistoryBack);
    }

    #[test]
    fn empty_log_goes_back() {
        let cfg = NavigationConfig::default();
        let target = resolve_back(&cfg, &[], "/novel/42", Some("library"));
        assert_eq!(target, BackTarget::HistoryBack);
    }
}
