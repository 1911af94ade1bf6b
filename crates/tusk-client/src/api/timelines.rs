//! Timelines.

use super::PageOptions;
use crate::error::{Error, Result};
use crate::session::Session;
use serde_json::Value;

/// Which timeline to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timeline {
    Home,
    /// The public timeline restricted to this server.
    Local,
    Public,
    /// Statuses with a hashtag, given with or without the leading `#`.
    Tag(String),
    List(String),
}

impl Timeline {
    fn endpoint(&self) -> Result<String> {
        match self {
            Timeline::Home => Ok("/api/v1/timelines/home".to_string()),
            Timeline::Local | Timeline::Public => Ok("/api/v1/timelines/public".to_string()),
            Timeline::Tag(tag) => {
                let tag = tag.trim_start_matches('#');
                if tag.is_empty() || tag.contains('/') {
                    return Err(Error::InvalidArguments(format!("invalid hashtag {tag:?}")));
                }
                Ok(format!("/api/v1/timelines/tag/{tag}"))
            }
            Timeline::List(id) => Ok(format!("/api/v1/timelines/list/{id}")),
        }
    }
}

impl Session {
    pub async fn timeline(&mut self, timeline: &Timeline, page: &PageOptions) -> Result<Value> {
        let endpoint = timeline.endpoint()?;
        let mut params = page.to_params()?;
        if *timeline == Timeline::Local {
            params.insert("local", "true");
        }
        self.get(endpoint, params).await
    }

    pub async fn timeline_home(&mut self, page: &PageOptions) -> Result<Value> {
        self.timeline(&Timeline::Home, page).await
    }

    pub async fn timeline_local(&mut self, page: &PageOptions) -> Result<Value> {
        self.timeline(&Timeline::Local, page).await
    }

    pub async fn timeline_public(&mut self, page: &PageOptions) -> Result<Value> {
        self.timeline(&Timeline::Public, page).await
    }

    pub async fn timeline_hashtag(&mut self, tag: &str, page: &PageOptions) -> Result<Value> {
        self.timeline(&Timeline::Tag(tag.to_string()), page).await
    }

    pub async fn timeline_list(&mut self, id: &str, page: &PageOptions) -> Result<Value> {
        self.timeline(&Timeline::List(id.to_string()), page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Timeline::Home, "/api/v1/timelines/home")]
    #[test_case(Timeline::Local, "/api/v1/timelines/public")]
    #[test_case(Timeline::Public, "/api/v1/timelines/public")]
    #[test_case(Timeline::Tag("#rust".into()), "/api/v1/timelines/tag/rust")]
    #[test_case(Timeline::Tag("rust".into()), "/api/v1/timelines/tag/rust")]
    #[test_case(Timeline::List("12".into()), "/api/v1/timelines/list/12")]
    fn test_endpoints(timeline: Timeline, expected: &str) {
        assert_eq!(timeline.endpoint().unwrap(), expected);
    }

    #[test]
    fn test_bad_hashtag() {
        assert!(Timeline::Tag("#".into()).endpoint().is_err());
        assert!(Timeline::Tag("a/b".into()).endpoint().is_err());
    }
}
