//! Query-string filters for list endpoints.

use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostFilterParams {
    pub group: Option<String>,
}

/// Exact-match filters applied to the post listing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub group_id: Option<i64>,
}

impl PostFilter {
    pub fn from_params(params: &PostFilterParams) -> Result<Self> {
        let group_id = match params.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::ValidationError(format!("group: '{}' is not a valid group id.", raw))
            })?),
        };
        Ok(Self { group_id })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// Terms of a `?search=` query. Every term must match at least one of the
/// searched fields, case-insensitively, as a substring.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    pub fn parse(raw: Option<&str>) -> Self {
        let terms = raw
            .unwrap_or_default()
            .replace('\0', "")
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();
        Self(terms)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    /// True when every term occurs in at least one of `fields`.
    pub fn matches(&self, fields: &[&str]) -> bool {
        let lowered: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
        self.0
            .iter()
            .all(|term| lowered.iter().any(|field| field.contains(term.as_str())))
    }

    /// `ILIKE` patterns, one per term, with LIKE metacharacters escaped.
    pub fn like_patterns(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|term| {
                let escaped = term
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{}%", escaped)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_filter_parses_ids() {
        let f = PostFilter::from_params(&PostFilterParams {
            group: Some("7".into()),
        })
        .unwrap();
        assert_eq!(f.group_id, Some(7));

        let f = PostFilter::from_params(&PostFilterParams { group: None }).unwrap();
        assert_eq!(f.group_id, None);

        let f = PostFilter::from_params(&PostFilterParams {
            group: Some("".into()),
        })
        .unwrap();
        assert_eq!(f.group_id, None);
    }

    #[test]
    fn group_filter_rejects_garbage() {
        let err = PostFilter::from_params(&PostFilterParams {
            group: Some("cats".into()),
        })
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn search_splits_on_whitespace_and_commas() {
        let terms = SearchTerms::parse(Some(" Bob, alice  x"));
        assert_eq!(terms.terms(), &["bob", "alice", "x"]);
        assert!(SearchTerms::parse(Some("  ,, ")).is_empty());
        assert!(SearchTerms::parse(None).is_empty());
    }

    #[test]
    fn every_term_must_hit_some_field() {
        let terms = SearchTerms::parse(Some("bob ali"));
        assert!(terms.matches(&["alice", "BOBBY"]));
        assert!(!terms.matches(&["alice", "carol"]));
        assert!(SearchTerms::default().matches(&["anything"]));
    }

    #[test]
    fn like_patterns_escape_metacharacters() {
        let terms = SearchTerms::parse(Some("a_b 5%"));
        assert_eq!(terms.like_patterns(), vec!["%a\\_b%", "%5\\%%"]);
    }
}
