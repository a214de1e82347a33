//! Tests for RateController

use super::*;

const T0: u64 = 1_700_000_000_000;

fn site(line: u32) -> CallSite<'static> {
    CallSite::new("sysevent_client::tests", line)
}

// =============================================================================
// Hash tests
// =============================================================================

#[test]
fn test_fnv1a_known_values() {
    assert_eq!(fnv1a(b""), 0xCBF2_9CE4_8422_2325);
    assert_eq!(fnv1a(b"a"), 0xAF63_DC4C_8601_EC8C);
}

#[test]
fn test_hash_key_distinguishes_call_sites() {
    let a = hash_key("EVENT", &site(10));
    let b = hash_key("EVENT", &site(11));
    let c = hash_key("OTHER", &site(10));
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, hash_key("EVENT", &site(10)));
}

#[test]
fn test_hash_key_truncates_long_input() {
    let long_func_a = format!("{}A", "f".repeat(300));
    let long_func_b = format!("{}B", "f".repeat(300));
    assert_eq!(
        hash_key("E", &CallSite::new(&long_func_a, 1)),
        hash_key("E", &CallSite::new(&long_func_b, 1))
    );
}

// =============================================================================
// Window tests
// =============================================================================

#[test]
fn test_threshold_within_one_second() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(1, 10));

    let results: Vec<_> = (0..15)
        .map(|i| controller.check_at(param, "DOMAIN", "EVENT", &site(1), T0 + i * 10))
        .collect();

    assert!(results[..10].iter().all(|a| a.is_admitted()));
    assert!(results[10..].iter().all(|a| !a.is_admitted()));
    assert_eq!(controller.stats().admitted(), 10);
    assert_eq!(controller.stats().suppressed(), 5);
}

#[test]
fn test_next_window_resets_count() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(1, 2));

    for _ in 0..2 {
        assert!(controller.check_at(param, "D", "E", &site(1), T0).is_admitted());
    }
    assert_eq!(
        controller.check_at(param, "D", "E", &site(1), T0 + 500),
        Admission::Suppressed
    );

    // One full second later the window has rolled over
    assert!(controller.check_at(param, "D", "E", &site(1), T0 + 1000).is_admitted());
    assert!(controller.check_at(param, "D", "E", &site(1), T0 + 1001).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0 + 1002).is_admitted());
}

#[test]
fn test_window_covers_exactly_period_buckets() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(2, 1));

    // Window opens late in its first second bucket
    assert!(controller.check_at(param, "D", "E", &site(1), T0 + 999).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0 + 1_999).is_admitted());

    // Third bucket starts a new window after one second and one millisecond
    assert!(controller.check_at(param, "D", "E", &site(1), T0 + 2_000).is_admitted());
}

#[test]
fn test_multi_second_period() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(5, 1));

    assert!(controller.check_at(param, "D", "E", &site(1), T0).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0 + 4_999).is_admitted());
    assert!(controller.check_at(param, "D", "E", &site(1), T0 + 5_000).is_admitted());
}

#[test]
fn test_clock_rollback_opens_new_window() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(60, 1));

    assert!(controller.check_at(param, "D", "E", &site(1), T0).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0 + 10).is_admitted());

    // Wall clock jumps back a minute
    assert!(controller.check_at(param, "D", "E", &site(1), T0 - 60_000).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0 - 59_990).is_admitted());
}

#[test]
fn test_suppressed_writes_keep_counting() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(1, 1));

    for _ in 0..5 {
        controller.check_at(param, "D", "E", &site(1), T0);
    }

    let windows = controller.windows.lock().get(&hash_key("E", &site(1)));
    assert_eq!(windows.map(|w| w.count), Some(5));
}

#[test]
fn test_call_sites_are_independent() {
    let controller = RateController::new();
    let param = Some(ControlParam::new(1, 1));

    assert!(controller.check_at(param, "D", "E", &site(1), T0).is_admitted());
    assert!(controller.check_at(param, "D", "E", &site(2), T0).is_admitted());
    assert!(!controller.check_at(param, "D", "E", &site(1), T0).is_admitted());
    assert_eq!(controller.tracked(), 2);
}

#[test]
fn test_default_param_used_when_none() {
    let controller = RateController::with_capacity(ControlParam::new(1, 3), 10);

    let admitted = (0..5)
        .filter(|_| controller.check_at(None, "D", "E", &site(1), T0).is_admitted())
        .count();

    assert_eq!(admitted, 3);
    assert_eq!(controller.default_param(), ControlParam::new(1, 3));
}

#[test]
fn test_lru_bound_on_call_sites() {
    let controller = RateController::with_capacity(ControlParam::new(1, 1), 3);

    for line in 0..10 {
        controller.check_at(None, "D", "E", &site(line), T0);
    }
    assert_eq!(controller.tracked(), 3);

    // The oldest site was evicted, so it starts a fresh window
    assert!(controller.check_at(None, "D", "E", &site(0), T0).is_admitted());
}

#[test]
fn test_disabled_controller_admits_everything() {
    let config = RateLimitConfig {
        enabled: false,
        threshold: 1,
        ..RateLimitConfig::default()
    };
    let controller = RateController::from_config(&config);

    for _ in 0..10 {
        assert!(controller.check_at(None, "D", "E", &site(1), T0).is_admitted());
    }
    assert_eq!(controller.tracked(), 0);
}

#[test]
fn test_from_config() {
    let config = RateLimitConfig {
        enabled: true,
        period: 7,
        threshold: 3,
        cache_capacity: 5,
    };
    let controller = RateController::from_config(&config);
    assert_eq!(controller.default_param(), ControlParam::new(7, 3));
    assert_eq!(controller.capacity(), 5);
}

#[test]
fn test_clear_forgets_windows() {
    let controller = RateController::new();
    controller.check_at(None, "D", "E", &site(1), T0);
    controller.clear();
    assert_eq!(controller.tracked(), 0);
}

#[test]
fn test_check_uses_wall_clock() {
    let controller = RateController::new();
    assert!(controller.check(None, "D", "E", &site(1)).is_admitted());
}
