//! EOF 재시도 backoff
//!
//! 대기 후 `current × factor`로 증가하며 `max`에서 멈춥니다.
//! 대기는 취소 토큰과 경합하므로 취소 시 즉시 깨어납니다.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// 다음 대기 시간을 계산합니다: `min(current × factor, max)`.
///
/// 이미 상한에 도달했으면 `max`를 그대로 반환합니다.
pub fn next_backoff(current: Duration, factor: u32, max: Duration) -> Duration {
    if current >= max {
        return max;
    }
    current.saturating_mul(factor).min(max)
}

/// `duration`만큼 대기합니다.
///
/// 대기를 끝까지 마치면 `true`, 도중에 취소되면 `false`를 반환합니다.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn grows_by_factor_until_cap() {
        let max = Duration::from_secs(8);
        let mut backoff = Duration::from_secs(1);
        let mut waits = Vec::new();
        for _ in 0..6 {
            waits.push(backoff.as_secs());
            backoff = next_backoff(backoff, 2, max);
        }
        assert_eq!(waits, vec![1, 2, 4, 8, 8, 8]);
    }

    #[test]
    fn clamps_overshoot_to_max() {
        let next = next_backoff(Duration::from_secs(3), 4, Duration::from_secs(10));
        assert_eq!(next, Duration::from_secs(10));
    }

    #[test]
    fn factor_one_keeps_base() {
        let base = Duration::from_millis(250);
        assert_eq!(next_backoff(base, 1, Duration::from_secs(1)), base);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let next = next_backoff(Duration::MAX / 2, u32::MAX, Duration::MAX);
        assert_eq!(next, Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_cancel() {
        let cancel = CancellationToken::new();
        let started = Instant::now();
        assert!(sleep_or_cancel(Duration::from_secs(3), &cancel).await);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_sleep() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        assert!(!sleep_or_cancel(Duration::from_secs(60), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stays_within_bounds(
                base_ms in 1u64..10_000,
                extra_ms in 0u64..100_000,
                factor in 1u32..16,
                steps in 0usize..64,
            ) {
                let base = Duration::from_millis(base_ms);
                let max = Duration::from_millis(base_ms + extra_ms);
                let mut backoff = base;
                for _ in 0..steps {
                    let next = next_backoff(backoff, factor, max);
                    prop_assert!(next >= backoff);
                    backoff = next;
                    prop_assert!(backoff >= base && backoff <= max);
                }
            }

            #[test]
            fn matches_closed_form(base_ms in 1u64..1_000, factor in 1u32..5, i in 1u32..12) {
                let base = Duration::from_millis(base_ms);
                let max = Duration::from_millis(base_ms * 50);
                let mut backoff = base;
                for _ in 1..i {
                    backoff = next_backoff(backoff, factor, max);
                }
                let expected = base_ms
                    .saturating_mul(u64::from(factor).saturating_pow(i - 1))
                    .min(base_ms * 50);
                prop_assert_eq!(backoff, Duration::from_millis(expected));
            }
        }
    }
}
