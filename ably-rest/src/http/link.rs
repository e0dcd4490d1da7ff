//! `Link` header parsing for paginated endpoints.
//!
//! Ably advertises neighbouring pages as
//! `<./messages?limit=1&direction=backwards&end=...>; rel="next"`, either in
//! separate headers or joined with commas. The target is relative to the
//! resource that produced the page.

use crate::error::{AblyError, AblyResult};
use std::collections::HashMap;

/// Server-supplied query parameters identifying a neighbouring page.
///
/// Opaque to callers; an empty set means there is nothing to follow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationParams(Vec<(String, String)>);

impl ContinuationParams {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self(params)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// One resolved relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Absolute path of the target resource, still percent-encoded
    pub path: String,
    pub params: ContinuationParams,
}

/// Parse every `Link` header value into relations keyed by `rel`.
///
/// Relation names are lowercased; the first occurrence of a relation wins.
pub fn parse_links<'a, I>(values: I, base_path: &str) -> AblyResult<HashMap<String, Link>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut links = HashMap::new();

    for value in values {
        for (target, rels) in split_entries(value)? {
            let link = resolve(target, base_path)?;
            for rel in rels {
                links.entry(rel).or_insert_with(|| link.clone());
            }
        }
    }

    Ok(links)
}

fn split_entries(value: &str) -> AblyResult<Vec<(&str, Vec<String>)>> {
    let mut entries = Vec::new();
    let mut rest = value;

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let close = after_open
            .find('>')
            .ok_or_else(|| AblyError::decode(format!("Unterminated Link target in {:?}", value)))?;
        let target = after_open[..close].trim();
        let tail = &after_open[close + 1..];

        let params_end = tail.find('<').unwrap_or(tail.len());
        let rels = rel_values(&tail[..params_end]);
        if !rels.is_empty() {
            entries.push((target, rels));
        }

        rest = &tail[params_end..];
    }

    Ok(entries)
}

fn rel_values(params: &str) -> Vec<String> {
    params
        .split(';')
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("rel") {
                Some(value)
            } else {
                None
            }
        })
        .flat_map(|value| {
            value
                .trim()
                .trim_end_matches(',')
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .map(str::to_ascii_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn resolve(target: &str, base_path: &str) -> AblyResult<Link> {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    let path = if let Some(scheme_end) = path.find("://") {
        let after_host = &path[scheme_end + 3..];
        after_host
            .find('/')
            .map(|slash| after_host[slash..].to_string())
            .unwrap_or_else(|| "/".to_string())
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        let dir = base_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let relative = path.strip_prefix("./").unwrap_or(path);
        format!("{}/{}", dir, relative)
    };

    let params: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| AblyError::decode(format!("Invalid Link query {:?}: {}", query, e)))?;

    Ok(Link {
        path,
        params: ContinuationParams::new(params),
    })
}
