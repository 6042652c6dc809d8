// Unit tests for the cooldown rule and the shared last-action timestamp

use crate::ACTION_COOLDOWN;
use crate::debounce::{LastAction, should_accept};

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// **VALUE**: Pins down the boundary of the cooldown rule.
///
/// **WHY THIS MATTERS**: A reload exactly three seconds after a tap is a new
/// request and must go through; anything sooner must not.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one switch from `>=` to `>`.
#[test]
fn given_elapsed_equal_to_cooldown_when_checked_then_accepts() {
    // GIVEN: A previous trigger exactly one cooldown ago
    let last = Instant::now();
    let now = last + ACTION_COOLDOWN;

    // WHEN/THEN: The boundary is accepted
    assert!(should_accept(now, Some(last), ACTION_COOLDOWN));
}

/// **VALUE**: Verifies both sides of the rule across a spread of gaps.
///
/// **WHY THIS MATTERS**: This is the only thing standing between a double tap
/// and the hibernate script running twice.
///
/// **BUG THIS CATCHES**: Would catch an inverted comparison or a rule that
/// ignores `last` entirely.
#[test]
fn given_various_gaps_when_checked_then_accepts_only_past_cooldown() {
    // GIVEN: A cooldown of three seconds
    let cooldown = Duration::from_secs(3);
    let last = Instant::now();

    let cases = [
        (Duration::ZERO, false),
        (Duration::from_millis(1), false),
        (Duration::from_secs(1), false),
        (Duration::from_millis(2_999), false),
        (Duration::from_millis(3_500), true),
        (Duration::from_secs(60), true),
    ];

    // WHEN/THEN: Only gaps of at least the cooldown are accepted
    for (gap, expected) in cases {
        assert_eq!(
            should_accept(last + gap, Some(last), cooldown),
            expected,
            "gap {gap:?}"
        );
    }
}

/// **VALUE**: Verifies the very first trigger always goes through.
///
/// **WHY THIS MATTERS**: Right after start there is no previous trigger; the
/// first tap must not be swallowed.
///
/// **BUG THIS CATCHES**: Would catch an implementation that treats "never" as
/// "just now".
#[test]
fn given_no_previous_trigger_when_checked_then_accepts() {
    assert!(should_accept(Instant::now(), None, ACTION_COOLDOWN));
}

/// **VALUE**: Verifies a clock reading older than `last` is rejected, not
/// wrapped around.
///
/// **WHY THIS MATTERS**: Handlers read the clock before taking the lock, so a
/// slower request can arrive with an older `now` than the stored value.
///
/// **BUG THIS CATCHES**: Would catch a plain subtraction that panics or
/// underflows to a huge duration.
#[test]
fn given_now_before_last_when_checked_then_rejects() {
    let now = Instant::now();
    let last = now + Duration::from_secs(1);

    assert!(!should_accept(now, Some(last), ACTION_COOLDOWN));
}

/// **VALUE**: Verifies requests 1s apart are collapsed and 3.5s apart are not.
///
/// **WHY THIS MATTERS**: This is the user-visible contract of the action route.
///
/// **BUG THIS CATCHES**: Would catch `try_accept` forgetting to record the
/// accepted time, or recording rejected ones.
#[test]
fn given_last_action_when_requests_spaced_then_only_spaced_ones_accepted() {
    // GIVEN: A fresh timestamp with a three second cooldown
    let last_action = LastAction::new(Duration::from_secs(3));
    let t0 = Instant::now();

    // WHEN: Triggering at 0s, 1s, 3.5s and 4s
    let first = last_action.try_accept(t0);
    let second = last_action.try_accept(t0 + Duration::from_secs(1));
    let third = last_action.try_accept(t0 + Duration::from_millis(3_500));
    let fourth = last_action.try_accept(t0 + Duration::from_secs(4));

    // THEN: Only 0s and 3.5s fire, and the stored time is the 3.5s one
    assert!(first, "first trigger should fire");
    assert!(!second, "trigger 1s later should be suppressed");
    assert!(third, "trigger 3.5s later should fire");
    assert!(!fourth, "trigger 0.5s after the third should be suppressed");
    assert_eq!(last_action.last(), Some(t0 + Duration::from_millis(3_500)));
}

/// **VALUE**: Verifies the check-and-set is atomic under contention.
///
/// **WHY THIS MATTERS**: Two phones (or two tabs) hitting `/do` at the same
/// instant must still produce a single script run.
///
/// **BUG THIS CATCHES**: Would catch a split read-then-write where both
/// threads see the old timestamp and both accept.
#[test]
fn given_concurrent_triggers_when_same_instant_then_exactly_one_accepted() {
    // GIVEN: A shared timestamp and one shared clock reading
    let last_action = Arc::new(LastAction::new(ACTION_COOLDOWN));
    let now = Instant::now();

    // WHEN: Sixteen threads trigger at once
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let last_action = Arc::clone(&last_action);
            thread::spawn(move || last_action.try_accept(now))
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|accepted| *accepted)
        .count();

    // THEN: Exactly one wins
    assert_eq!(accepted, 1, "exactly one concurrent trigger should fire");
}
