//! Rate-limit window tracking and pacing policies.
//!
//! The server reports its window through `X-RateLimit-*` headers. The
//! window is stored in the caller's clock: the reset time is shifted by the
//! difference between the local clock and the server's `Date` header.
//!
//! All functions here are pure; the dispatcher owns the sleeping.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tusk_common_http::headers;

/// Longest single sleep. Callers re-evaluate after waking.
pub const MAX_SLEEP: Duration = Duration::from_secs(300);

/// Delay before retrying a throttled call whose window already looks reset.
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Assumed window size until the server reports one.
pub const DEFAULT_LIMIT: u32 = 150;

/// How a session responds to rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitPolicy {
    /// Never sleep; a throttled call fails with `RateLimited`.
    FailFast,
    /// Sleep until the window resets, then resubmit.
    #[default]
    BlockAndRetry,
    /// Spread calls evenly across the window, and retry like `BlockAndRetry`.
    Pace,
}

impl RateLimitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitPolicy::FailFast => "fail-fast",
            RateLimitPolicy::BlockAndRetry => "block-and-retry",
            RateLimitPolicy::Pace => "pace",
        }
    }

    /// Wait required before dispatching the next call.
    pub fn pre_call_wait(
        &self,
        window: &RateLimitWindow,
        pace_factor: f64,
        now: DateTime<Utc>,
    ) -> Duration {
        match self {
            RateLimitPolicy::FailFast => Duration::ZERO,
            RateLimitPolicy::BlockAndRetry => {
                if window.remaining == 0 {
                    cap_secs(window.seconds_until_reset(now))
                } else {
                    Duration::ZERO
                }
            }
            RateLimitPolicy::Pace => {
                if window.remaining == 0 {
                    return cap_secs(window.seconds_until_reset(now));
                }
                let ideal = window.seconds_until_reset(now) / f64::from(window.remaining);
                let wait = ideal - window.seconds_since_last_call(now);
                if wait > 0.0 {
                    cap_secs(wait / pace_factor)
                } else {
                    Duration::ZERO
                }
            }
        }
    }

    /// Wait before resubmitting a throttled call, or `None` when the call must fail.
    pub fn throttle_wait(&self, window: &RateLimitWindow, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            RateLimitPolicy::FailFast => None,
            RateLimitPolicy::BlockAndRetry | RateLimitPolicy::Pace => {
                let wait = cap_secs(window.seconds_until_reset(now));
                Some(if wait.is_zero() { MIN_RETRY_DELAY } else { wait })
            }
        }
    }
}

impl FromStr for RateLimitPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "throw" => Ok(RateLimitPolicy::FailFast),
            "block-and-retry" | "wait" => Ok(RateLimitPolicy::BlockAndRetry),
            "pace" => Ok(RateLimitPolicy::Pace),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown rate limit policy {other:?}, expected fail-fast, block-and-retry or pace"
            ))),
        }
    }
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a sleep to [`MAX_SLEEP`].
pub fn cap_sleep(duration: Duration) -> Duration {
    duration.min(MAX_SLEEP)
}

fn cap_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else if secs >= MAX_SLEEP.as_secs_f64() {
        MAX_SLEEP
    } else {
        cap_sleep(Duration::from_secs_f64(secs))
    }
}

fn delta_secs(delta: chrono::Duration) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// The server's rate-limit window as last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the window resets, in local time.
    pub reset_at: DateTime<Utc>,
    /// When the previous rate-limited call was dispatched.
    pub last_call_at: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Window with the default limit, resetting at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            remaining: DEFAULT_LIMIT,
            reset_at: now,
            last_call_at: now,
        }
    }

    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> f64 {
        delta_secs(self.reset_at - now)
    }

    pub fn seconds_since_last_call(&self, now: DateTime<Utc>) -> f64 {
        delta_secs(now - self.last_call_at)
    }

    /// Refresh from response headers received at `local_now`.
    ///
    /// Responses without `X-RateLimit-Remaining` leave the window untouched.
    pub fn update_from_headers(
        &mut self,
        response_headers: &HeaderMap,
        local_now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(remaining) = header(response_headers, headers::X_RATELIMIT_REMAINING) else {
            return Ok(());
        };
        let remaining = parse_count("X-RateLimit-Remaining", remaining)?;

        let limit = match header(response_headers, headers::X_RATELIMIT_LIMIT) {
            Some(value) => parse_count("X-RateLimit-Limit", value)?,
            None => self.limit,
        };

        let reset = match header(response_headers, headers::X_RATELIMIT_RESET) {
            Some(value) => Some((parse_reset(value)?, value)),
            None => None,
        };

        let skew = match header(response_headers, headers::DATE) {
            Some(value) => local_now - parse_http_date(value)?,
            None => {
                tracing::debug!("rate-limited response has no Date header, assuming no clock skew");
                chrono::Duration::zero()
            }
        };

        let reset_at = match reset {
            Some((reset, value)) => Some(
                reset
                    .checked_add_signed(skew)
                    .ok_or_else(|| parse_error("X-RateLimit-Reset", value))?,
            ),
            None => None,
        };

        self.limit = limit;
        self.remaining = remaining.min(limit);
        if let Some(reset_at) = reset_at {
            self.reset_at = reset_at;
        }

        tracing::debug!(
            limit = self.limit,
            remaining = self.remaining,
            reset_at = %self.reset_at,
            skew_ms = skew.num_milliseconds(),
            "rate limit window updated"
        );
        Ok(())
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn parse_error(header: &'static str, value: &str) -> Error {
    Error::RateLimitParse {
        header,
        value: value.to_string(),
    }
}

fn parse_count(name: &'static str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| parse_error(name, value))
}

/// Parse `X-RateLimit-Reset`: ISO 8601, HTTP date, or epoch seconds.
pub fn parse_reset(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(epoch) = value.parse::<f64>() {
        if epoch.is_finite() {
            let millis = (epoch * 1000.0).round() as i64;
            if let Some(at) = Utc.timestamp_millis_opt(millis).single() {
                return Ok(at);
            }
        }
    }
    Err(parse_error("X-RateLimit-Reset", value))
}

/// Parse a `Date` header.
pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| parse_error("Date", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn window(remaining: u32, reset_in: i64, last_call_ago: i64) -> RateLimitWindow {
        RateLimitWindow {
            limit: 300,
            remaining,
            reset_at: t0() + secs(reset_in),
            last_call_at: t0() - secs(last_call_ago),
        }
    }

    #[test_case("fail-fast", RateLimitPolicy::FailFast)]
    #[test_case("throw", RateLimitPolicy::FailFast)]
    #[test_case("block-and-retry", RateLimitPolicy::BlockAndRetry)]
    #[test_case("wait", RateLimitPolicy::BlockAndRetry)]
    #[test_case("PACE", RateLimitPolicy::Pace)]
    fn test_policy_names(name: &str, expected: RateLimitPolicy) {
        assert_eq!(name.parse::<RateLimitPolicy>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_policy_is_invalid_configuration() {
        let err = "sometimes".parse::<RateLimitPolicy>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_pace_worked_example() {
        let w = window(10, 100, 5);
        let wait = RateLimitPolicy::Pace.pre_call_wait(&w, 1.0, t0());
        assert_eq!(wait, Duration::from_secs(5));
    }

    #[test]
    fn test_pace_factor_shortens_wait() {
        let w = window(10, 100, 5);
        let wait = RateLimitPolicy::Pace.pre_call_wait(&w, 2.0, t0());
        assert_eq!(wait, Duration::from_millis(2500));
    }

    #[test]
    fn test_pace_no_wait_when_behind_schedule() {
        let w = window(10, 100, 30);
        assert_eq!(
            RateLimitPolicy::Pace.pre_call_wait(&w, 1.0, t0()),
            Duration::ZERO
        );
    }

    #[test]
    fn test_exhausted_window_waits_until_reset() {
        let w = window(0, 42, 0);
        assert_eq!(
            RateLimitPolicy::Pace.pre_call_wait(&w, 1.1, t0()),
            Duration::from_secs(42)
        );
        assert_eq!(
            RateLimitPolicy::BlockAndRetry.pre_call_wait(&w, 1.1, t0()),
            Duration::from_secs(42)
        );
        assert_eq!(
            RateLimitPolicy::FailFast.pre_call_wait(&w, 1.1, t0()),
            Duration::ZERO
        );
    }

    #[test]
    fn test_block_and_retry_does_not_pace() {
        let w = window(10, 100, 0);
        assert_eq!(
            RateLimitPolicy::BlockAndRetry.pre_call_wait(&w, 1.0, t0()),
            Duration::ZERO
        );
    }

    #[test]
    fn test_sleeps_are_capped() {
        let w = window(0, 3600, 0);
        assert_eq!(RateLimitPolicy::Pace.pre_call_wait(&w, 1.0, t0()), MAX_SLEEP);
        assert_eq!(
            RateLimitPolicy::BlockAndRetry.throttle_wait(&w, t0()),
            Some(MAX_SLEEP)
        );
        assert_eq!(cap_sleep(Duration::from_secs(301)), MAX_SLEEP);
        assert_eq!(cap_sleep(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[test]
    fn test_throttle_wait_per_policy() {
        let w = window(0, 30, 0);
        assert_eq!(RateLimitPolicy::FailFast.throttle_wait(&w, t0()), None);
        assert_eq!(
            RateLimitPolicy::Pace.throttle_wait(&w, t0()),
            Some(Duration::from_secs(30))
        );

        let stale = window(0, -10, 0);
        assert_eq!(
            RateLimitPolicy::BlockAndRetry.throttle_wait(&stale, t0()),
            Some(MIN_RETRY_DELAY)
        );
    }

    #[test]
    fn test_update_applies_clock_skew() {
        // Server clock runs 10 s ahead of ours.
        let mut w = RateLimitWindow::new(t0());
        let server_now = t0() + secs(10);
        let reset = t0() + secs(300);
        let reset_header = reset.to_rfc3339();
        let date_header = server_now.to_rfc2822();
        let h = headers(&[
            ("x-ratelimit-limit", "300"),
            ("x-ratelimit-remaining", "299"),
            ("x-ratelimit-reset", reset_header.as_str()),
            ("date", date_header.as_str()),
        ]);

        w.update_from_headers(&h, t0()).unwrap();

        assert_eq!(w.limit, 300);
        assert_eq!(w.remaining, 299);
        assert_eq!(w.reset_at, reset - secs(10));
    }

    #[test]
    fn test_update_without_date_assumes_no_skew() {
        let mut w = RateLimitWindow::new(t0());
        let h = headers(&[
            ("x-ratelimit-remaining", "5"),
            ("x-ratelimit-reset", "2024-01-01T12:05:00.000Z"),
        ]);

        w.update_from_headers(&h, t0()).unwrap();

        assert_eq!(w.limit, DEFAULT_LIMIT);
        assert_eq!(w.remaining, 5);
        assert_eq!(w.reset_at, t0() + secs(300));
    }

    #[test]
    fn test_update_ignores_responses_without_remaining() {
        let mut w = RateLimitWindow::new(t0());
        let before = w.clone();
        let h = headers(&[("x-ratelimit-reset", "garbage")]);

        w.update_from_headers(&h, t0()).unwrap();
        assert_eq!(w, before);
    }

    #[test]
    fn test_update_clamps_remaining_to_limit() {
        let mut w = RateLimitWindow::new(t0());
        let h = headers(&[("x-ratelimit-limit", "10"), ("x-ratelimit-remaining", "20")]);

        w.update_from_headers(&h, t0()).unwrap();
        assert_eq!(w.remaining, 10);
    }

    #[test_case(&[("x-ratelimit-remaining", "many")], "X-RateLimit-Remaining")]
    #[test_case(&[("x-ratelimit-remaining", "1"), ("x-ratelimit-limit", "-3")], "X-RateLimit-Limit")]
    #[test_case(&[("x-ratelimit-remaining", "1"), ("x-ratelimit-reset", "tomorrow")], "X-RateLimit-Reset")]
    #[test_case(&[("x-ratelimit-remaining", "1"), ("date", "yesterday")], "Date")]
    #[test_case(
        &[("x-ratelimit-remaining", "1"), ("x-ratelimit-reset", "8210000000000"), ("date", "Mon, 01 Jan 1900 00:00:00 GMT")],
        "X-RateLimit-Reset"
    )]
    fn test_update_parse_errors(pairs: &[(&'static str, &str)], expected_header: &str) {
        let mut w = RateLimitWindow::new(t0());
        match w.update_from_headers(&headers(pairs), t0()) {
            Err(Error::RateLimitParse { header, .. }) => assert_eq!(header, expected_header),
            other => panic!("expected RateLimitParse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_reset_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap();
        assert_eq!(parse_reset("2024-01-01T12:05:00Z").unwrap(), expected);
        assert_eq!(parse_reset("Mon, 01 Jan 2024 12:05:00 GMT").unwrap(), expected);
        assert_eq!(
            parse_reset(&expected.timestamp().to_string()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_http_date() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            parse_http_date("Mon, 01 Jan 2024 12:00:00 GMT").unwrap(),
            expected
        );
    }

    proptest::proptest! {
        #[test]
        fn test_pre_call_wait_never_exceeds_cap(
            remaining in 0u32..500,
            reset_in in -10_000i64..100_000,
            last_call_ago in 0i64..10_000,
            pace_factor in 0.01f64..10.0,
        ) {
            let w = window(remaining, reset_in, last_call_ago);
            for policy in [RateLimitPolicy::FailFast, RateLimitPolicy::BlockAndRetry, RateLimitPolicy::Pace] {
                proptest::prop_assert!(policy.pre_call_wait(&w, pace_factor, t0()) <= MAX_SLEEP);
                if let Some(wait) = policy.throttle_wait(&w, t0()) {
                    proptest::prop_assert!(wait <= MAX_SLEEP);
                    proptest::prop_assert!(wait >= MIN_RETRY_DELAY);
                }
            }
        }
    }
}
