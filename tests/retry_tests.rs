use push_worker::clients::rbmq::retry_ttl_millis;
use push_worker::models::retry::{RetryDecision, RetryPolicy};

/// Test: Delay is taken from the tier table at the pre-increment count
#[test]
fn test_delay_follows_tier_table() {
    let policy = RetryPolicy::default();

    assert_eq!(
        policy.decide(0),
        RetryDecision::Retry {
            next_attempt: 1,
            delay_secs: 60
        }
    );
    assert_eq!(
        policy.decide(1),
        RetryDecision::Retry {
            next_attempt: 2,
            delay_secs: 300
        }
    );
    assert_eq!(
        policy.decide(2),
        RetryDecision::Retry {
            next_attempt: 3,
            delay_secs: 900
        }
    );
}

/// Test: Counts past the end of the table reuse the last tier
#[test]
fn test_delay_clamped_to_last_tier() {
    let policy = RetryPolicy {
        max_attempts: 5,
        delay_tiers: vec![60, 300, 900],
    };

    assert_eq!(
        policy.decide(3),
        RetryDecision::Retry {
            next_attempt: 4,
            delay_secs: 900
        }
    );
    assert_eq!(
        policy.decide(4),
        RetryDecision::Retry {
            next_attempt: 5,
            delay_secs: 900
        }
    );
}

/// Test: The retry count reaching the maximum means give up
#[test]
fn test_give_up_at_max_attempts() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.decide(3), RetryDecision::GiveUp);
    assert_eq!(policy.decide(10), RetryDecision::GiveUp);
}

/// Test: A persistently failing item walks every tier then gives up,
/// never reaching a fourth retry
#[test]
fn test_failure_trajectory_walks_tiers_then_gives_up() {
    let policy = RetryPolicy::default();
    let mut retry_count = 0;
    let mut delays = Vec::new();

    loop {
        match policy.decide(retry_count) {
            RetryDecision::Retry {
                next_attempt,
                delay_secs,
            } => {
                assert_eq!(next_attempt, retry_count + 1);
                delays.push(delay_secs);
                retry_count = next_attempt;
            }
            RetryDecision::GiveUp => break,
        }
    }

    assert_eq!(delays, vec![60, 300, 900]);
    assert_eq!(retry_count, 3);
}

/// Test: Delay-queue TTLs convert to milliseconds without wrapping
#[test]
fn test_retry_ttl_conversion_is_checked() {
    assert_eq!(retry_ttl_millis(60), 60_000);
    assert_eq!(retry_ttl_millis(900), 900_000);

    // Oversized tiers saturate instead of going negative.
    assert_eq!(retry_ttl_millis(u64::MAX), i64::MAX);
    assert_eq!(retry_ttl_millis(i64::MAX as u64), i64::MAX);
}

/// Test: Retry counts never decrease through policy decisions
#[test]
fn test_retry_count_monotonic() {
    let policy = RetryPolicy::default();

    for count in 0..policy.max_attempts {
        if let RetryDecision::Retry { next_attempt, .. } = policy.decide(count) {
            assert!(next_attempt > count);
        } else {
            panic!("Expected retry below max_attempts");
        }
    }
}
