//! Response header fixtures.

use chrono::{DateTime, Utc};
use wiremock::ResponseTemplate;

/// Rate-limit headers as a server would send them.
#[derive(Debug, Clone)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
    /// Server clock; omitted from the response when `None`.
    pub date: Option<DateTime<Utc>>,
}

/// Shorthand for [`RateLimitHeaders`] with a `Date` header.
pub fn rate_limit_headers(
    limit: u32,
    remaining: u32,
    reset: DateTime<Utc>,
    date: DateTime<Utc>,
) -> RateLimitHeaders {
    RateLimitHeaders {
        limit,
        remaining,
        reset,
        date: Some(date),
    }
}

/// Format a timestamp the way HTTP `Date` headers are written.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

impl RateLimitHeaders {
    /// Header name/value pairs; `X-RateLimit-Reset` is ISO 8601.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("X-RateLimit-Limit".to_string(), self.limit.to_string()),
            ("X-RateLimit-Remaining".to_string(), self.remaining.to_string()),
            ("X-RateLimit-Reset".to_string(), self.reset.to_rfc3339()),
        ];
        if let Some(date) = self.date {
            pairs.push(("Date".to_string(), http_date(date)));
        }
        pairs
    }

    /// Attach the headers to a wiremock response.
    pub fn apply(&self, mut template: ResponseTemplate) -> ResponseTemplate {
        for (name, value) in self.to_pairs() {
            template = template.insert_header(name.as_str(), value.as_str());
        }
        template
    }
}
