//! Paginated results for history-style endpoints.
//!
//! A page is a plain value: its items plus the relations the server
//! advertised. Following a relation issues a fresh request and yields a new
//! page; the earlier page never changes, so pages can be cloned and moved
//! between tasks freely.

use crate::error::{AblyError, AblyResult};
use crate::http::{AblyHttpClient, ContinuationParams, Link};
use crate::protocol::encoding::{self, EncodedData};
use crate::protocol::messages::Message;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Server-side page size ceiling
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forwards,
    Backwards,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forwards => "forwards",
            Direction::Backwards => "backwards",
        }
    }
}

/// Options for a history query; `None` fields are left to the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginateParams {
    pub limit: Option<u32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub direction: Option<Direction>,
}

impl PaginateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Validate and render as query parameters
    pub fn to_query(&self) -> AblyResult<Vec<(String, String)>> {
        let mut query = Vec::new();

        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_LIMIT {
                return Err(AblyError::invalid_argument(format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_LIMIT, limit
                )));
            }
            query.push(("limit".to_string(), limit.to_string()));
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(AblyError::invalid_argument(
                    "start must not be later than end",
                ));
            }
        }
        if let Some(start) = self.start {
            query.push(("start".to_string(), start.timestamp_millis().to_string()));
        }
        if let Some(end) = self.end {
            query.push(("end".to_string(), end.timestamp_millis().to_string()));
        }

        if let Some(direction) = self.direction {
            query.push(("direction".to_string(), direction.as_str().to_string()));
        }

        Ok(query)
    }
}

/// One page of results
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    items: Vec<T>,
    links: HashMap<String, Link>,
    http: Arc<AblyHttpClient>,
}

impl<T> PaginatedResult<T>
where
    T: DeserializeOwned + EncodedData,
{
    pub(crate) async fn fetch(
        http: Arc<AblyHttpClient>,
        path: &str,
        params: &[(String, String)],
    ) -> AblyResult<Self> {
        let response = http.get(path).query(params).send().await?;
        let links = response.links()?;
        let mut items: Vec<T> = response.json().await?;

        for item in &mut items {
            encoding::decode(item)?;
        }

        let page = Self::from_parts(items, links, http);
        debug!(
            path,
            items = page.items.len(),
            has_next = page.has_next(),
            "page received"
        );
        Ok(page)
    }

    /// Fetch the page after this one.
    ///
    /// Fails with `AblyError::NoMoreRelation` on the last page; check
    /// `has_next()` first to avoid the error.
    pub async fn next(&self) -> AblyResult<Self> {
        self.follow("next").await
    }

    /// Fetch the first page of the same query
    pub async fn first(&self) -> AblyResult<Self> {
        self.follow("first").await
    }

    async fn follow(&self, relation: &str) -> AblyResult<Self> {
        let link = self
            .links
            .get(relation)
            .ok_or_else(|| AblyError::no_more(relation))?;
        Self::fetch(Arc::clone(&self.http), &link.path, link.params.as_pairs()).await
    }
}

impl<T> PaginatedResult<T> {
    /// A `next` link without a query would just repeat the first page, so
    /// it is treated as absent.
    fn from_parts(
        items: Vec<T>,
        mut links: HashMap<String, Link>,
        http: Arc<AblyHttpClient>,
    ) -> Self {
        links.retain(|rel, link| rel != "next" || !link.params.is_empty());
        Self { items, links, http }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.links.contains_key("next")
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Parameters of the next page; empty on the last page
    pub fn next_params(&self) -> ContinuationParams {
        self.relation_params("next")
    }

    pub fn first_params(&self) -> ContinuationParams {
        self.relation_params("first")
    }

    fn relation_params(&self, relation: &str) -> ContinuationParams {
        self.links
            .get(relation)
            .map(|link| link.params.clone())
            .unwrap_or_default()
    }
}

impl PaginatedResult<Message> {
    pub fn messages(&self) -> &[Message] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMode;
    use crate::http::HttpConfig;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn page(link_headers: &[&str]) -> PaginatedResult<Message> {
        let links = crate::http::link::parse_links(
            link_headers.iter().copied(),
            "/channels/c/messages",
        )
        .unwrap();
        let http = AblyHttpClient::new(HttpConfig::default(), AuthMode::token("t")).unwrap();
        PaginatedResult::from_parts(Vec::new(), links, Arc::new(http))
    }

    #[tokio::test]
    async fn test_next_link_without_query_is_terminal() {
        let page = page(&[r#"<./messages>; rel="next""#, r#"<./messages?limit=1>; rel="first""#]);

        assert!(!page.has_next());
        assert!(page.is_last());
        assert!(page.next_params().is_empty());
        assert_eq!(page.first_params().get("limit"), Some("1"));

        let err = page.next().await.unwrap_err();
        assert!(matches!(err, AblyError::NoMoreRelation { .. }));
    }

    #[test]
    fn test_next_link_with_query_is_followable() {
        let page = page(&[r#"<./messages?limit=1&offset=1>; rel="next""#]);
        assert!(page.has_next());
        assert_eq!(page.next_params().get("offset"), Some("1"));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        assert!(PaginateParams::new().to_query().unwrap().is_empty());

        let query = PaginateParams::new().limit(1).to_query().unwrap();
        assert_eq!(query, vec![("limit".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_all_fields_render() {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let end = Utc.timestamp_millis_opt(2_000).unwrap();
        let query = PaginateParams::new()
            .limit(100)
            .start(start)
            .end(end)
            .direction(Direction::Forwards)
            .to_query()
            .unwrap();

        assert_eq!(
            query,
            vec![
                ("limit".to_string(), "100".to_string()),
                ("start".to_string(), "1000".to_string()),
                ("end".to_string(), "2000".to_string()),
                ("direction".to_string(), "forwards".to_string()),
            ]
        );
    }

    #[test]
    fn test_limit_bounds() {
        assert!(PaginateParams::new().limit(0).to_query().is_err());
        assert!(PaginateParams::new().limit(MAX_LIMIT + 1).to_query().is_err());
        assert!(PaginateParams::new().limit(MAX_LIMIT).to_query().is_ok());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let start = Utc.timestamp_millis_opt(2_000).unwrap();
        let end = Utc.timestamp_millis_opt(1_000).unwrap();
        let err = PaginateParams::new().start(start).end(end).to_query().unwrap_err();
        assert!(matches!(err, AblyError::InvalidArgument { .. }));
    }
}
