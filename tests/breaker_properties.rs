//! End-to-end behaviour of a single breaker under the paused tokio clock.

use std::time::Duration;

use gateway_breaker::{BreakerError, CircuitBreaker, CircuitState};

mod common;
use common::{fail, policy, succeed, DownstreamError, Invocations};

#[tokio::test]
async fn test_trips_after_consecutive_failures() {
    let cb = CircuitBreaker::new("hotels", policy(3, Duration::from_secs(60), 1, 3));
    let calls = Invocations::default();

    for _ in 0..3 {
        let err = fail(&cb, &calls).await.unwrap_err();
        assert!(matches!(err, BreakerError::Inner(_)));
    }
    assert_eq!(cb.state(), CircuitState::Open);

    let err = succeed(&cb, &calls).await.unwrap_err();
    assert!(err.is_open());
    assert_eq!(calls.count(), 3);
    assert_eq!(cb.snapshot().total_requests, 3);
}

#[tokio::test(start_paused = true)]
async fn test_stays_open_until_recovery_timeout() {
    let cb = CircuitBreaker::new("flights", policy(1, Duration::from_secs(5), 1, 0));
    let calls = Invocations::default();
    let _ = fail(&cb, &calls).await;

    for _ in 0..4 {
        tokio::time::advance(Duration::from_millis(1_200)).await;
        assert!(succeed(&cb, &calls).await.unwrap_err().is_open());
    }
    // 4.8s elapsed
    tokio::time::advance(Duration::from_millis(199)).await;
    assert!(succeed(&cb, &calls).await.unwrap_err().is_open());
    assert_eq!(calls.count(), 1);
    assert_eq!(cb.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_probe_closes_breaker() {
    let cb = CircuitBreaker::new("cars", policy(2, Duration::from_secs(5), 2, 0));
    let calls = Invocations::default();
    for _ in 0..2 {
        let _ = fail(&cb, &calls).await;
    }
    assert_eq!(cb.state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(5)).await;
    // Still Open in storage until a call arrives.
    assert_eq!(cb.state(), CircuitState::Open);

    succeed(&cb, &calls).await.unwrap();
    assert_eq!(calls.count(), 3);
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    succeed(&cb, &calls).await.unwrap();
    assert_eq!(calls.count(), 4);

    let snapshot = cb.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert_eq!(snapshot.consecutive_successes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_failure_reopens_immediately() {
    let cb = CircuitBreaker::new("tours", policy(3, Duration::from_secs(5), 3, 0));
    let calls = Invocations::default();
    for _ in 0..3 {
        let _ = fail(&cb, &calls).await;
    }

    tokio::time::advance(Duration::from_secs(5)).await;
    succeed(&cb, &calls).await.unwrap();
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    let _ = fail(&cb, &calls).await;
    assert_eq!(cb.state(), CircuitState::Open);
    assert_eq!(cb.snapshot().time_in_current_state, Duration::ZERO);

    // A fresh recovery timeout applies from the reopen.
    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(succeed(&cb, &calls).await.unwrap_err().is_open());
}

#[tokio::test]
async fn test_volume_gate_prevents_early_trip() {
    let cb = CircuitBreaker::new("insurance", policy(3, Duration::from_secs(60), 1, 10));
    let calls = Invocations::default();

    for _ in 0..9 {
        let _ = fail(&cb, &calls).await;
    }
    let snapshot = cb.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 9);

    let _ = fail(&cb, &calls).await;
    assert_eq!(cb.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_failure_rate_percent() {
    let cb = CircuitBreaker::new("visa", policy(100, Duration::from_secs(60), 1, 0));
    let calls = Invocations::default();
    assert_eq!(cb.snapshot().failure_rate_percent, 0.0);

    let _ = fail(&cb, &calls).await;
    for _ in 0..2 {
        succeed(&cb, &calls).await.unwrap();
    }
    assert_eq!(cb.snapshot().failure_rate_percent, 33.33);

    for _ in 0..3 {
        let _ = fail(&cb, &calls).await;
    }
    // 4 of 6
    assert_eq!(cb.snapshot().failure_rate_percent, 66.67);
}

#[tokio::test(start_paused = true)]
async fn test_reset_from_every_state() {
    let calls = Invocations::default();

    let closed = CircuitBreaker::new("closed", policy(5, Duration::from_secs(5), 2, 0));
    succeed(&closed, &calls).await.unwrap();

    let open = CircuitBreaker::new("open", policy(1, Duration::from_secs(5), 2, 0));
    let _ = fail(&open, &calls).await;

    let half_open = CircuitBreaker::new("half-open", policy(1, Duration::from_secs(5), 2, 0));
    let _ = fail(&half_open, &calls).await;
    tokio::time::advance(Duration::from_secs(5)).await;
    succeed(&half_open, &calls).await.unwrap();

    assert_eq!(closed.state(), CircuitState::Closed);
    assert_eq!(open.state(), CircuitState::Open);
    assert_eq!(half_open.state(), CircuitState::HalfOpen);

    for cb in [&closed, &open, &half_open] {
        cb.reset();
        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.failed_requests, 0);
        assert!(snapshot.last_failure_time.is_none());

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}

#[tokio::test]
async fn test_work_error_returned_unchanged() {
    let cb = CircuitBreaker::new("payments", policy(5, Duration::from_secs(60), 1, 10));

    let result = cb
        .call(|| async { Err::<(), _>(DownstreamError { code: 418 }) })
        .await;

    match result {
        Err(BreakerError::Inner(e)) => assert_eq!(e, DownstreamError { code: 418 }),
        other => panic!("unexpected result: {:?}", other),
    }
    let err = cb
        .call(|| async { Err::<(), _>(DownstreamError { code: 500 }) })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "downstream returned 500");

    let snapshot = cb.snapshot();
    assert_eq!(snapshot.failed_requests, 2);
    assert!(snapshot.last_failure_time.is_some());
}
