//! Rate-limit related response headers

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::retry_after;

/// Parsed rate-limit information of one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatelimitHeaders {
    /// `X-RateLimit-Remaining`
    pub remaining: Option<u32>,
    /// `X-RateLimit-Reset` as epoch milliseconds
    pub reset_at: Option<i64>,
    /// `X-RateLimit-Global`
    pub global: bool,
    /// `Retry-After`, or `retry_after` of a 429 body
    pub retry_after: Option<Duration>,
    /// `Date`, Discord's clock
    pub date: Option<DateTime<Utc>>,
}

impl RatelimitHeaders {
    pub fn parse(headers: &HeaderMap, body: Option<&Value>) -> Self {
        let text = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

        let remaining = text("x-ratelimit-remaining").and_then(|v| v.trim().parse().ok());
        #[allow(clippy::cast_possible_truncation)]
        let reset_at = text("x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite())
            .map(|secs| (secs * 1000.0).round() as i64);
        let global = text("x-ratelimit-global").is_some_and(|v| v.eq_ignore_ascii_case("true"))
            || body
                .and_then(|body| body.get("global"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
        let retry_after = text("retry-after")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
            .or_else(|| retry_after(body));
        let date = text("date")
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|date| date.with_timezone(&Utc));

        Self {
            remaining,
            reset_at,
            global,
            retry_after,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_parse_full_headers() {
        let parsed = RatelimitHeaders::parse(
            &headers(&[
                ("x-ratelimit-remaining", "4"),
                ("x-ratelimit-reset", "1470173023.123"),
                ("x-ratelimit-global", "true"),
                ("retry-after", "2"),
                ("date", "Tue, 02 Aug 2016 21:23:42 GMT"),
            ]),
            None,
        );
        assert_eq!(parsed.remaining, Some(4));
        assert_eq!(parsed.reset_at, Some(1_470_173_023_123));
        assert!(parsed.global);
        assert_eq!(parsed.retry_after, Some(Duration::from_secs(2)));
        assert_eq!(parsed.date.unwrap().timestamp(), 1_470_173_022);
    }

    #[test]
    fn test_missing_headers() {
        let parsed = RatelimitHeaders::parse(&HeaderMap::new(), None);
        assert_eq!(parsed, RatelimitHeaders::default());
    }

    #[test]
    fn test_body_fallback_for_429() {
        let body = json!({"retry_after": 0.25, "global": true});
        let parsed = RatelimitHeaders::parse(&HeaderMap::new(), Some(&body));
        assert_eq!(parsed.retry_after, Some(Duration::from_millis(250)));
        assert!(parsed.global);
    }
}
