//! Tracker + driver scenarios over a mock viewport with a paused clock.
//!
//! Covers:
//! 1. Forward navigation converges on the top of the document
//! 2. Back navigation converges on the saved offset
//! 3. Back navigation without a saved offset converges on the top
//! 4. The fresh-tab novel→chapter→back scenario, including the
//!    transition log contents
//! 5. A newer navigation cancels stale restore retries

mod common;

use std::time::Duration;

use common::MockSurface;
use novella_core::navigation::{NavKind, NavigationTracker, PageView, Transition};
use novella_core::scroll::{ScrollDriver, ScrollSurface};

fn driver_over(surface: &std::sync::Arc<MockSurface>) -> ScrollDriver {
    ScrollDriver::new(surface.clone(), Vec::new())
}

/// Run past the longest schedule in the default configuration.
async fn run_schedules() {
    tokio::time::sleep(Duration::from_millis(1100)).await;
}

#[tokio::test(start_paused = true)]
async fn forward_navigation_converges_on_top() {
    let surface = MockSurface::new();
    let driver = driver_over(&surface);
    let mut tracker = NavigationTracker::default();

    tracker.record_navigation("/", NavKind::Push);
    surface.user_scroll(1400);

    driver.execute(tracker.record_navigation("/library", NavKind::Push));
    run_schedules().await;

    assert_eq!(surface.position(), 0);
    // Every attempt on the top schedule ran.
    assert_eq!(surface.calls(), vec![0, 0, 0]);
}

#[tokio::test(start_paused = true)]
async fn back_navigation_restores_saved_offset() {
    let surface = MockSurface::new();
    let driver = driver_over(&surface);
    let mut tracker = NavigationTracker::default();

    tracker.record_navigation("/library", NavKind::Push);
    surface.user_scroll(640);
    tracker.save_offset_from(surface.as_ref(), "/library");

    driver.execute(tracker.record_navigation("/novel/3", NavKind::Push));
    run_schedules().await;
    assert_eq!(surface.position(), 0);

    driver.execute(tracker.record_navigation("/library", NavKind::Pop));
    run_schedules().await;
    assert_eq!(surface.position(), 640);
}

#[tokio::test(start_paused = true)]
async fn back_navigation_without_saved_offset_goes_to_top() {
    let surface = MockSurface::new();
    let driver = driver_over(&surface);
    let mut tracker = NavigationTracker::default();

    tracker.record_navigation("/", NavKind::Push);
    driver.execute(tracker.record_navigation("/library", NavKind::Push));
    run_schedules().await;

    surface.user_scroll(900);
    driver.execute(tracker.record_navigation("/", NavKind::Pop));
    run_schedules().await;

    assert_eq!(surface.position(), 0);
}

#[tokio::test(start_paused = true)]
async fn fresh_tab_chapter_roundtrip() {
    let surface = MockSurface::new();
    let driver = driver_over(&surface);
    let mut tracker = NavigationTracker::default();

    // Fresh tab on home.
    tracker.record_navigation("/", NavKind::Push);

    driver.execute(tracker.record_navigation("/novel/42", NavKind::Push));
    run_schedules().await;

    // Reader scrolls down the novel page, then opens a chapter.
    surface.user_scroll(800);
    tracker.save_offset_from(surface.as_ref(), "/novel/42");
    driver.execute(tracker.record_navigation("/read/42/chapter/3", NavKind::Push));
    run_schedules().await;
    assert_eq!(surface.position(), 0);

    // Browser back to the novel page.
    driver.execute(tracker.record_navigation("/novel/42", NavKind::Pop));
    run_schedules().await;

    assert_eq!(surface.position(), 800);
    // Only the forward hop is logged; the return is not.
    assert_eq!(
        tracker.transition_log(),
        vec![Transition {
            from: PageView::Novel,
            to: PageView::Chapter,
            path: "/read/42/chapter/3".to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn newer_navigation_cancels_stale_restore() {
    let surface = MockSurface::new();
    let driver = driver_over(&surface);
    let mut tracker = NavigationTracker::default();

    tracker.record_navigation("/library", NavKind::Push);
    surface.user_scroll(500);
    tracker.save_offset_from(surface.as_ref(), "/library");
    driver.execute(tracker.record_navigation("/novel/1", NavKind::Push));
    run_schedules().await;

    // Pop back, then immediately push forward again before any restore
    // attempt runs.
    driver.execute(tracker.record_navigation("/library", NavKind::Pop));
    driver.execute(tracker.record_navigation("/novel/2", NavKind::Push));
    run_schedules().await;

    // No flicker to 500: the stale restore never touched the surface.
    assert!(!surface.calls().contains(&500));
    assert_eq!(surface.position(), 0);
}
