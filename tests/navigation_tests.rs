//! Navigation pipeline tests: commits, hook chains, concurrency and links.

mod common;

use common::*;
use futures::future::ready;
use std::sync::Arc;
use std::time::Duration;
use villa_navigator::*;

fn params(pairs: &[(&str, &str)]) -> RouteParams {
    RouteParams::from_pairs(pairs.iter().copied())
}

// ============================================================================
// Commits
// ============================================================================

#[test]
fn test_basic_navigation_commits_target() {
    init_logging();
    let navigator = navigator();

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(result.committed_key(), Some("dashboard"));
    assert_eq!(navigator.current_key().as_deref(), Some("dashboard"));
    assert_eq!(navigator.phase(), NavigationPhase::Committed);
    assert_eq!(navigator.render().as_deref(), Some("Dashboard"));
}

#[test]
fn test_every_registered_key_is_reachable() {
    let navigator = navigator();
    for key in ["home", "dashboard", "bookings", "reviews", "login"] {
        let result = pollster::block_on(navigator.navigate_to(key, RouteParams::new()));
        assert_eq!(result.committed_key(), Some(key));
        assert_eq!(navigator.current_key().as_deref(), Some(key));
    }
}

#[test]
fn test_unknown_key_reports_and_keeps_current() {
    let navigator = navigator();
    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));

    for key in ["reports", "", "Dashboard"] {
        let result = pollster::block_on(navigator.navigate_to(key, RouteParams::new()));
        assert!(result.is_not_found(), "{key:?} should be unknown");
        assert_eq!(navigator.current_key().as_deref(), Some("home"));
    }
    assert_eq!(navigator.history().len(), 1);
    assert_eq!(navigator.phase(), NavigationPhase::Committed);
}

#[test]
fn test_params_reach_the_component() {
    let navigator = navigator();
    let result =
        pollster::block_on(navigator.navigate_to("booking", params(&[("bookingId", "B-17")])));

    assert!(result.is_success());
    assert_eq!(navigator.current_path().as_deref(), Some("/bookings/B-17"));
    assert_eq!(navigator.render().as_deref(), Some("Booking B-17"));
}

#[test]
fn test_address_uses_navigator_base_path() {
    let navigator = navigator_with(NavigatorConfig::new().base_path("/app"));
    pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));
    assert_eq!(navigator.current_path().as_deref(), Some("/dashboard"));
    assert_eq!(navigator.address().as_deref(), Some("/app/dashboard"));

    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    assert_eq!(navigator.address().as_deref(), Some("/app/"));
    assert_eq!(
        navigator
            .href_for("booking", &params(&[("bookingId", "3")]))
            .unwrap(),
        "/app/bookings/3"
    );
}

#[test]
fn test_start_commits_initial_route() {
    let navigator = navigator_with(NavigatorConfig::new().initial_route("dashboard"));
    let result = pollster::block_on(navigator.start()).unwrap();
    assert_eq!(result.committed_key(), Some("dashboard"));
    assert_eq!(navigator.history().len(), 1);

    assert!(pollster::block_on(crate::navigator().start()).is_none());
}

#[test]
fn test_replace_keeps_history_length() {
    let navigator = navigator();
    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    pollster::block_on(navigator.navigate_to("bookings", RouteParams::new()));
    pollster::block_on(navigator.replace_with("reviews", RouteParams::new()));

    let history = navigator.history();
    let keys: Vec<&str> = history.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["home", "reviews"]);
}

// ============================================================================
// Before hooks
// ============================================================================

#[test]
fn test_hooks_run_in_order_before_commit() {
    let navigator = navigator();
    let recorder = Recorder::new();

    navigator.before_each(recording_hook("h1", &recorder));
    let observer = navigator.clone();
    let log = recorder.clone();
    navigator.before_each(before_fn(
        "h2",
        move |next: Continuation, event: Arc<NavigationEvent<String>>| {
            log.push(format!("h2:{}", event.target.key()));
            log.push(format!(
                "current-during-h2:{}",
                observer.current_key().unwrap_or_default()
            ));
            next.proceed();
            ready(Ok(()))
        },
    ));
    let log = recorder.clone();
    navigator.after_each(after_fn(
        "after",
        move |event: Arc<NavigationEvent<String>>| {
            log.push(format!("after:{}", event.target.key()));
            ready(Ok(()))
        },
    ));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(
        recorder.entries(),
        vec![
            "h1:dashboard",
            "h2:dashboard",
            "current-during-h2:",
            "after:dashboard"
        ]
    );
}

#[test]
fn test_event_carries_source_and_target() {
    let navigator = navigator();
    let recorder = Recorder::new();
    let log = recorder.clone();
    navigator.before_each(guard_fn("inspect", move |event: &NavigationEvent<String>| {
        log.push(format!(
            "{}->{} {}",
            event.source_key().unwrap_or("-"),
            event.target.key(),
            event.path
        ));
        NavigationAction::Continue
    }));

    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    pollster::block_on(navigator.navigate_to("booking", params(&[("bookingId", "5")])));

    assert_eq!(
        recorder.entries(),
        vec!["-->home /", "home->booking /bookings/5"]
    );
}

#[test]
fn test_denied_navigation_is_blocked() {
    let navigator = navigator();
    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    navigator.before_each(guard_fn("unsaved", |event: &NavigationEvent<String>| {
        if event.target.key() == "reviews" {
            NavigationAction::deny("Unsaved listing draft")
        } else {
            NavigationAction::Continue
        }
    }));

    let result = pollster::block_on(navigator.navigate_to("reviews", RouteParams::new()));

    match result {
        NavigationResult::Blocked { reason } => assert_eq!(reason, "Unsaved listing draft"),
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert_eq!(navigator.current_key().as_deref(), Some("home"));
}

#[test]
fn test_continuation_called_twice_commits_once() {
    let navigator = navigator();
    let recorder = Recorder::new();
    navigator.before_each(before_fn(
        "eager",
        |next: Continuation, _event: Arc<NavigationEvent<String>>| {
            assert!(next.proceed());
            assert!(!next.proceed());
            assert!(!next.deny("changed my mind"));
            ready(Ok(()))
        },
    ));
    let log = recorder.clone();
    navigator.after_each(after_fn("count", move |_event: Arc<NavigationEvent<String>>| {
        log.push("commit");
        ready(Ok(()))
    }));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(recorder.entries(), vec!["commit"]);
    assert_eq!(navigator.history().len(), 1);
}

#[test]
fn test_dropped_continuation_is_a_veto() {
    let navigator = navigator();
    navigator.before_each(before_fn(
        "forgetful",
        |next: Continuation, _event: Arc<NavigationEvent<String>>| {
            drop(next);
            ready(Ok(()))
        },
    ));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_blocked());
    assert_eq!(navigator.current_key(), None);
    assert_eq!(navigator.phase(), NavigationPhase::Idle);
}

#[test]
fn test_failing_before_hook_aborts_without_commit() {
    let navigator = navigator();
    let recorder = Recorder::new();
    navigator.before_each(before_fn(
        "session",
        |_next: Continuation, _event: Arc<NavigationEvent<String>>| {
            ready(Err::<(), HookError>("session expired".into()))
        },
    ));
    navigator.before_each(recording_hook("never", &recorder));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert_eq!(
        result.error(),
        Some(&NavigationError::HookFailed {
            hook: "session".to_string(),
            message: "session expired".to_string(),
        })
    );
    assert!(recorder.entries().is_empty());
    assert_eq!(navigator.current_key(), None);
}

#[test]
fn test_decision_commits_while_hook_keeps_working() {
    let navigator = navigator();
    navigator.before_each(before_fn(
        "analytics",
        |next: Continuation, _event: Arc<NavigationEvent<String>>| async move {
            next.proceed();
            futures::future::pending::<()>().await;
            Ok::<(), HookError>(())
        },
    ));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(navigator.current_key().as_deref(), Some("dashboard"));
    assert_eq!(navigator.phase(), NavigationPhase::Committed);
}

#[test]
fn test_hook_error_after_its_decision_is_ignored() {
    let navigator = navigator();
    navigator.before_each(before_fn(
        "autosave",
        |next: Continuation, _event: Arc<NavigationEvent<String>>| {
            next.proceed();
            ready(Err::<(), HookError>("draft not saved".into()))
        },
    ));

    let result = pollster::block_on(navigator.navigate_to("bookings", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(navigator.current_key().as_deref(), Some("bookings"));
}

#[test]
fn test_redirect_to_login() {
    let navigator = navigator();
    navigator.before_each(guard_fn("auth", |event: &NavigationEvent<String>| {
        if event.target.key() == "login" {
            NavigationAction::Continue
        } else {
            NavigationAction::redirect_with_reason("login", "not signed in")
        }
    }));

    let result = pollster::block_on(navigator.navigate_to("bookings", RouteParams::new()));

    assert_eq!(result.committed_key(), Some("login"));
    assert_eq!(navigator.current_path().as_deref(), Some("/login"));
    assert_eq!(navigator.history().len(), 1);
}

#[test]
fn test_redirect_loop_is_capped() {
    let navigator = navigator_with(NavigatorConfig::new().max_redirects(2));
    navigator.before_each(guard_fn("loop", |event: &NavigationEvent<String>| {
        if event.target.key() == "home" {
            NavigationAction::redirect("dashboard")
        } else {
            NavigationAction::redirect("home")
        }
    }));

    let result = pollster::block_on(navigator.navigate_to("home", RouteParams::new()));

    assert_eq!(
        result.error(),
        Some(&NavigationError::RedirectLoop {
            depth: 3,
            key: "dashboard".to_string(),
        })
    );
    assert_eq!(navigator.current_key(), None);
}

#[test]
fn test_redirect_to_unknown_key_is_not_found() {
    let navigator = navigator();
    navigator.before_each(guard_fn("stale", |_event: &NavigationEvent<String>| {
        NavigationAction::redirect("legacy-dashboard")
    }));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));
    match result {
        NavigationResult::NotFound { key } => assert_eq!(key, "legacy-dashboard"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

// ============================================================================
// After hooks
// ============================================================================

#[test]
fn test_failing_after_hook_is_a_warning() {
    let navigator = navigator();
    let title = DocumentTitle::new();
    navigator.after_each(after_fn(
        "analytics",
        |_event: Arc<NavigationEvent<String>>| ready(Err::<(), HookError>("tracker down".into())),
    ));
    navigator.after_each(TitleHook::new("Villa Manager", title.clone()));

    let result = pollster::block_on(navigator.navigate_to("reviews", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(
        result.warnings(),
        &[NavigationError::HookFailed {
            hook: "analytics".to_string(),
            message: "tracker down".to_string(),
        }]
    );
    assert_eq!(navigator.current_key().as_deref(), Some("reviews"));
    assert_eq!(title.get(), "Reviews | Villa Manager");
}

// ============================================================================
// Suspension, concurrency and cancellation
// ============================================================================

#[tokio::test]
async fn test_unresolved_hook_never_commits() {
    let navigator = navigator();
    navigator.navigate_to("home", RouteParams::new()).await;
    let parked = Parked::new();
    navigator.before_each(parking_hook("dashboard", &parked));

    let waited = tokio::time::timeout(
        Duration::from_millis(50),
        navigator.navigate_to("dashboard", RouteParams::new()),
    )
    .await;

    assert!(waited.is_err(), "navigation must still be suspended");
    assert_eq!(parked.len(), 1);
    assert_eq!(navigator.current_key().as_deref(), Some("home"));
    // Dropping the suspended request releases its pending slot.
    assert_eq!(navigator.phase(), NavigationPhase::Committed);
}

#[tokio::test]
async fn test_continuation_resolved_from_another_task() {
    let navigator = navigator();
    navigator.before_each(before_fn(
        "remote-check",
        |next: Continuation, _event: Arc<NavigationEvent<String>>| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                next.proceed();
            });
            ready(Ok(()))
        },
    ));

    let result = navigator.navigate_to("bookings", RouteParams::new()).await;
    assert_eq!(result.committed_key(), Some("bookings"));
}

#[test]
fn test_new_request_supersedes_pending() {
    let navigator = navigator();
    let parked = Parked::new();
    navigator.before_each(parking_hook("dashboard", &parked));

    let first = navigator.navigate_to("dashboard", RouteParams::new());
    let second = async {
        assert!(navigator.phase().is_resolving());
        navigator.navigate_to("reviews", RouteParams::new()).await
    };
    let (first, second) = pollster::block_on(futures::future::join(first, second));

    match first {
        NavigationResult::Superseded { key } => assert_eq!(key, "dashboard"),
        other => panic!("expected Superseded, got {other:?}"),
    }
    assert_eq!(second.committed_key(), Some("reviews"));
    assert_eq!(navigator.current_key().as_deref(), Some("reviews"));
    assert_eq!(navigator.phase(), NavigationPhase::Committed);

    // The stale continuation resolves into nothing.
    let stale = parked.take().unwrap();
    assert!(stale.proceed());
    assert_eq!(navigator.current_key().as_deref(), Some("reviews"));
}

#[test]
fn test_reject_policy_refuses_overlap() {
    let navigator = navigator_with(NavigatorConfig::new().concurrency(ConcurrencyPolicy::Reject));
    let parked = Parked::new();
    navigator.before_each(parking_hook("dashboard", &parked));

    let first = navigator.navigate_to("dashboard", RouteParams::new());
    let second = async {
        let refused = navigator.navigate_to("reviews", RouteParams::new()).await;
        parked.take().unwrap().proceed();
        refused
    };
    let (first, second) = pollster::block_on(futures::future::join(first, second));

    assert_eq!(
        second.error(),
        Some(&NavigationError::Busy {
            pending: "dashboard".to_string()
        })
    );
    assert_eq!(first.committed_key(), Some("dashboard"));
    assert_eq!(navigator.current_key().as_deref(), Some("dashboard"));
}

#[test]
fn test_cancel_pending() {
    let navigator = navigator();
    assert!(!navigator.cancel_pending());
    let parked = Parked::new();
    navigator.before_each(parking_hook("dashboard", &parked));

    let pending = navigator.navigate_to("dashboard", RouteParams::new());
    let cancel = async { navigator.cancel_pending() };
    let (result, cancelled) = pollster::block_on(futures::future::join(pending, cancel));

    assert!(cancelled);
    assert!(result.is_cancelled());
    assert_eq!(navigator.current_key(), None);
    assert_eq!(navigator.phase(), NavigationPhase::Idle);
}

#[cfg(feature = "timeout")]
#[tokio::test]
async fn test_hook_timeout() {
    let navigator = navigator_with(NavigatorConfig::new().hook_timeout(Duration::from_millis(20)));
    let parked = Parked::new();
    navigator.before_each(parking_hook("dashboard", &parked));

    let result = navigator.navigate_to("dashboard", RouteParams::new()).await;

    assert_eq!(
        result.error(),
        Some(&NavigationError::TimedOut {
            key: "dashboard".to_string(),
            after_ms: 20,
        })
    );
    assert_eq!(navigator.phase(), NavigationPhase::Idle);

    // Other targets still pass within the deadline.
    let result = navigator.navigate_to("reviews", RouteParams::new()).await;
    assert!(result.is_success());
}

#[test]
fn test_hook_timeout_outside_tokio_is_ignored() {
    let navigator = navigator_with(NavigatorConfig::new().hook_timeout(Duration::from_secs(5)));
    navigator.before_each(guard_fn("auth", |_event: &NavigationEvent<String>| {
        NavigationAction::Continue
    }));

    let result = pollster::block_on(navigator.navigate_to("dashboard", RouteParams::new()));

    assert!(result.is_success());
    assert_eq!(navigator.current_key().as_deref(), Some("dashboard"));
}

#[tokio::test]
async fn test_unsaved_changes_dialog_in_hook() {
    let navigator = navigator();
    let host: DialogHost<String> = DialogHost::new();
    let pending_answer: Arc<parking_lot::Mutex<Option<CloseHandle<bool>>>> = Arc::default();
    navigator.navigate_to("bookings", RouteParams::new()).await;

    let dialog_host = host.clone();
    let answer_slot = pending_answer.clone();
    navigator.before_each(before_fn(
        "unsaved-changes",
        move |next: Continuation, event: Arc<NavigationEvent<String>>| {
            let answer = dialog_host.open_dialog(|close: CloseHandle<bool>| {
                *answer_slot.lock() = Some(close);
                Ok(format!(
                    "Discard changes and open {}?",
                    event.target.display_label()
                ))
            });
            async move {
                if answer.await? {
                    next.proceed();
                } else {
                    next.deny("kept editing");
                }
                Ok::<(), HookError>(())
            }
        },
    ));

    for (discard, expected) in [(false, Some("bookings")), (true, Some("reviews"))] {
        let navigation = navigator.navigate_to("reviews", RouteParams::new());
        let user = async {
            while host.is_empty() {
                tokio::task::yield_now().await;
            }
            assert_eq!(
                host.top().unwrap().view(),
                "Discard changes and open Reviews?"
            );
            let close = pending_answer.lock().take().unwrap();
            assert!(close.close(discard));
        };
        let (result, ()) = tokio::join!(navigation, user);

        assert_eq!(result.is_blocked(), !discard);
        assert_eq!(navigator.current_key().as_deref(), expected);
        assert!(host.is_empty());
    }
}

#[tokio::test]
async fn test_dismissed_dialog_fails_the_hook() {
    let navigator = navigator();
    let host: DialogHost<String> = DialogHost::new();
    let pending_answer: Arc<parking_lot::Mutex<Option<CloseHandle<bool>>>> = Arc::default();

    let dialog_host = host.clone();
    let answer_slot = pending_answer.clone();
    navigator.before_each(before_fn(
        "confirm",
        move |next: Continuation, _event: Arc<NavigationEvent<String>>| {
            let answer = dialog_host.open_dialog(|close: CloseHandle<bool>| {
                *answer_slot.lock() = Some(close);
                Ok("Leave?".to_string())
            });
            async move {
                if answer.await? {
                    next.proceed();
                }
                Ok::<(), HookError>(())
            }
        },
    ));

    let navigation = navigator.navigate_to("reviews", RouteParams::new());
    let user = async {
        while host.is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(host.dismiss_all(), 1);
    };
    let (result, ()) = tokio::join!(navigation, user);

    assert_eq!(
        result.error(),
        Some(&NavigationError::HookFailed {
            hook: "confirm".to_string(),
            message: DialogError::Dismissed.to_string(),
        })
    );
    assert_eq!(navigator.current_key(), None);
    assert!(pending_answer.lock().as_ref().unwrap().is_closed());
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_back_and_forward_rerun_hooks() {
    let navigator = navigator();
    let recorder = Recorder::new();
    navigator.before_each(recording_hook("seen", &recorder));

    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    pollster::block_on(navigator.navigate_to("bookings", RouteParams::new()));
    pollster::block_on(navigator.navigate_to("booking", params(&[("bookingId", "8")])));
    assert!(navigator.can_go_back());
    assert!(!navigator.can_go_forward());

    let back = pollster::block_on(navigator.back()).unwrap();
    assert_eq!(back.committed_key(), Some("bookings"));
    let forward = pollster::block_on(navigator.forward()).unwrap();
    assert_eq!(forward.committed_key(), Some("booking"));
    assert_eq!(navigator.current_path().as_deref(), Some("/bookings/8"));
    assert!(pollster::block_on(navigator.forward()).is_none());

    assert_eq!(
        recorder.entries(),
        vec![
            "seen:home",
            "seen:bookings",
            "seen:booking",
            "seen:bookings",
            "seen:booking"
        ]
    );
    assert_eq!(navigator.history().len(), 3);
}

#[test]
fn test_push_after_back_drops_forward_entries() {
    let navigator = navigator();
    pollster::block_on(navigator.navigate_to("home", RouteParams::new()));
    pollster::block_on(navigator.navigate_to("bookings", RouteParams::new()));
    pollster::block_on(navigator.back());
    pollster::block_on(navigator.navigate_to("reviews", RouteParams::new()));

    let history = navigator.history();
    let keys: Vec<&str> = history.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["home", "reviews"]);
    assert!(!navigator.can_go_forward());
}

// ============================================================================
// Links and paths
// ============================================================================

#[test]
fn test_follow_link_classifies() {
    let navigator = navigator_with(NavigatorConfig::new().base_path("/app"));

    match pollster::block_on(navigator.follow_link("https://example.com/#top")) {
        LinkOutcome::External(url) => assert_eq!(url, "https://example.com/#top"),
        other => panic!("expected External, got {other:?}"),
    }
    match pollster::block_on(navigator.follow_link("#amenities")) {
        LinkOutcome::Hash(anchor) => assert_eq!(anchor, "amenities"),
        other => panic!("expected Hash, got {other:?}"),
    }
    assert_eq!(navigator.current_key(), None);

    let outcome = pollster::block_on(navigator.follow_link("/app/bookings/5?tab=fees"));
    assert_eq!(
        outcome.navigation().and_then(NavigationResult::committed_key),
        Some("booking")
    );
    let active = navigator.current().unwrap();
    assert_eq!(active.params.get("bookingId"), Some(&"5".to_string()));
    assert_eq!(active.params.get("tab"), Some(&"fees".to_string()));
    assert_eq!(active.address, "/app/bookings/5");

    let outcome = pollster::block_on(navigator.follow_link("/reviews"));
    assert_eq!(
        outcome.navigation().and_then(NavigationResult::committed_key),
        Some("reviews")
    );

    let outcome = pollster::block_on(navigator.follow_link("/villas/9"));
    assert!(outcome.navigation().unwrap().is_not_found());
    assert_eq!(navigator.current_key().as_deref(), Some("reviews"));
}

#[test]
fn test_navigate_to_path_root_and_trailing_slash() {
    let navigator = navigator();
    let result = pollster::block_on(navigator.navigate_to_path(""));
    assert_eq!(result.committed_key(), Some("home"));
    let result = pollster::block_on(navigator.navigate_to_path("/bookings/"));
    assert_eq!(result.committed_key(), Some("bookings"));
}

#[cfg(feature = "cache")]
#[test]
fn test_path_resolution_is_cached() {
    let navigator = navigator();
    pollster::block_on(navigator.navigate_to_path("/bookings/1"));
    pollster::block_on(navigator.navigate_to_path("/bookings/1"));
    pollster::block_on(navigator.navigate_to_path("/nowhere"));
    pollster::block_on(navigator.navigate_to_path("/nowhere"));

    let stats = navigator.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_menus_follow_registration_order() {
    let navigator = navigator();
    let nav: Vec<&str> = navigator.routes().nav_items().map(|r| r.key()).collect();
    assert_eq!(nav, vec!["home", "dashboard", "bookings", "reviews"]);
}
