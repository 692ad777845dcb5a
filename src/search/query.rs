//! Search query building: request parameters, structured filters, sort
//! criteria resolution, and the tantivy query assembly.

use crate::models::{CommentThread, SortKey};
use crate::search::error::SearchResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw thread-search request parameters, as received from the HTTP layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadSearchParams {
    /// Free-text query
    pub text: Option<String>,

    /// Requested sort key
    pub sort_key: Option<String>,

    /// 1-indexed page number
    pub page: Option<usize>,

    /// Page size
    pub per_page: Option<usize>,

    /// Course scope
    pub course_id: Option<String>,

    /// Single commentable scope
    pub commentable_id: Option<String>,

    /// Comma-delimited commentable scopes
    pub commentable_ids: Option<String>,

    /// Single group id
    pub group_id: Option<String>,

    /// Comma-delimited group ids
    pub group_ids: Option<String>,

    /// Exclude all group-restricted content
    #[serde(default)]
    pub exclude_groups: bool,
}

/// Structured filter predicate applied alongside the text match.
///
/// When `exclude_groups` is set, group-id filtering is ignored: exclusion
/// wins. Otherwise a non-empty `group_ids` set matches content that either
/// has no group or whose group is in the set; ungrouped content stays
/// visible unless explicitly excluded. An empty set applies no group
/// predicate at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSearchFilter {
    /// Single commentable scope
    pub commentable_id: Option<String>,

    /// Commentable scopes (any-of)
    pub commentable_ids: Vec<String>,

    /// Course scope
    pub course_id: Option<String>,

    /// Group scopes (any-of, plus ungrouped)
    pub group_ids: Vec<i64>,

    /// Exclude all group-restricted content
    pub exclude_groups: bool,
}

impl ThreadSearchFilter {
    /// Build a filter from raw request parameters.
    ///
    /// Comma-delimited list parameters are split here; group ids that do not
    /// parse as integers are dropped.
    pub fn from_params(params: &ThreadSearchParams) -> Self {
        let commentable_ids = params
            .commentable_ids
            .as_deref()
            .map(split_csv)
            .unwrap_or_default();

        let mut group_ids: Vec<i64> = Vec::new();
        if let Some(ref group_id) = params.group_id {
            group_ids.extend(group_id.trim().parse::<i64>().ok());
        }
        if let Some(ref ids) = params.group_ids {
            group_ids.extend(split_csv(ids).iter().filter_map(|s| s.parse::<i64>().ok()));
        }

        Self {
            commentable_id: params.commentable_id.clone(),
            commentable_ids,
            course_id: params.course_id.clone(),
            group_ids,
            exclude_groups: params.exclude_groups,
        }
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sort order for thread listings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A resolved sort: a recognized key plus a direction the primary store's
/// records can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriteria {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortCriteria {
    /// Apply this criteria to a set of fetched threads
    pub fn apply(&self, threads: &mut [CommentThread]) {
        threads.sort_by(|a, b| {
            let ordering = match self.key {
                SortKey::Date => a.created_at.cmp(&b.created_at),
                SortKey::Activity => a.last_activity_at.cmp(&b.last_activity_at),
                SortKey::Votes => a.vote_count.cmp(&b.vote_count),
                SortKey::Comments => a.comment_count.cmp(&b.comment_count),
            };
            match self.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }
}

/// Requested sort key is not in the recognized set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized sort key: {0}")]
pub struct InvalidSortKey(pub String);

/// Resolve a requested sort key into canonical criteria.
///
/// No requested key falls back to the configured default. Every recognized
/// key orders descending, as thread listings always surface the newest or
/// most engaged threads first.
pub fn resolve_sort_criteria(
    requested: Option<&str>,
    default: SortKey,
) -> Result<SortCriteria, InvalidSortKey> {
    let key = match requested {
        None => default,
        Some(raw) => SortKey::from_str(raw).map_err(|_| InvalidSortKey(raw.to_string()))?,
    };

    Ok(SortCriteria {
        key,
        order: SortOrder::Descending,
    })
}

/// Builds the tantivy query for a thread search: the full-text match plus
/// the structured filter clauses
pub struct QueryBuilder {
    schema: tantivy::schema::Schema,
    index: tantivy::Index,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(schema: tantivy::schema::Schema, index: tantivy::Index) -> Self {
        Self { schema, index }
    }

    /// Build a tantivy query from query text and a structured filter.
    ///
    /// The text match uses AND semantics across terms (conjunction by
    /// default) over title and body, parsed leniently so malformed input
    /// degrades to fewer matches instead of an error. Filter clauses are
    /// plain term queries and do not contribute to scoring.
    pub fn build(
        &self,
        query_text: &str,
        filter: &ThreadSearchFilter,
    ) -> SearchResult<Box<dyn tantivy::query::Query>> {
        use tantivy::query::*;
        use tantivy::schema::IndexRecordOption;

        let title_field = self.schema.get_field("title")?;
        let body_field = self.schema.get_field("body")?;
        let commentable_field = self.schema.get_field("commentable_id")?;
        let course_field = self.schema.get_field("course_id")?;
        let group_field = self.schema.get_field("group_id")?;
        let has_group_field = self.schema.get_field("has_group")?;

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        let mut query_parser = QueryParser::for_index(&self.index, vec![title_field, body_field]);
        query_parser.set_conjunction_by_default();
        let (text_query, _lenient_errors) = query_parser.parse_query_lenient(query_text);
        subqueries.push((Occur::Must, text_query));

        if let Some(ref commentable_id) = filter.commentable_id {
            subqueries.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    tantivy::Term::from_field_text(commentable_field, commentable_id),
                    IndexRecordOption::Basic,
                )),
            ));
        }

        if !filter.commentable_ids.is_empty() {
            let any_commentable: Vec<(Occur, Box<dyn Query>)> = filter
                .commentable_ids
                .iter()
                .map(|commentable_id| {
                    (
                        Occur::Should,
                        Box::new(TermQuery::new(
                            tantivy::Term::from_field_text(commentable_field, commentable_id),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    )
                })
                .collect();
            subqueries.push((Occur::Must, Box::new(BooleanQuery::from(any_commentable))));
        }

        if let Some(ref course_id) = filter.course_id {
            subqueries.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    tantivy::Term::from_field_text(course_field, course_id),
                    IndexRecordOption::Basic,
                )),
            ));
        }

        let ungrouped_query = || {
            Box::new(TermQuery::new(
                tantivy::Term::from_field_bool(has_group_field, false),
                IndexRecordOption::Basic,
            )) as Box<dyn Query>
        };

        if filter.exclude_groups {
            // Exclusion wins over any group-id filtering
            subqueries.push((Occur::Must, ungrouped_query()));
        } else if !filter.group_ids.is_empty() {
            // Ungrouped content OR a group in the requested set
            let mut any_group: Vec<(Occur, Box<dyn Query>)> =
                vec![(Occur::Should, ungrouped_query())];
            for group_id in &filter.group_ids {
                any_group.push((
                    Occur::Should,
                    Box::new(TermQuery::new(
                        tantivy::Term::from_field_i64(group_field, *group_id),
                        IndexRecordOption::Basic,
                    )),
                ));
            }
            subqueries.push((Occur::Must, Box::new(BooleanQuery::from(any_group))));
        }

        Ok(Box::new(BooleanQuery::from(subqueries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_from_params_splits_comma_lists() {
        let params = ThreadSearchParams {
            commentable_ids: Some("general, homework,exams".to_string()),
            group_ids: Some("1,2, 3".to_string()),
            group_id: Some("9".to_string()),
            ..Default::default()
        };

        let filter = ThreadSearchFilter::from_params(&params);
        assert_eq!(
            filter.commentable_ids,
            vec!["general", "homework", "exams"]
        );
        assert_eq!(filter.group_ids, vec![9, 1, 2, 3]);
    }

    #[test]
    fn test_from_params_drops_non_numeric_group_ids() {
        let params = ThreadSearchParams {
            group_ids: Some("1,staff,3".to_string()),
            ..Default::default()
        };

        let filter = ThreadSearchFilter::from_params(&params);
        assert_eq!(filter.group_ids, vec![1, 3]);
    }

    #[test]
    fn test_from_params_empty_means_no_filtering() {
        let filter = ThreadSearchFilter::from_params(&ThreadSearchParams::default());
        assert_eq!(filter, ThreadSearchFilter::default());
        assert!(filter.group_ids.is_empty());
        assert!(!filter.exclude_groups);
    }

    #[test]
    fn test_resolve_sort_criteria_default() {
        let criteria = resolve_sort_criteria(None, SortKey::Activity).unwrap();
        assert_eq!(criteria.key, SortKey::Activity);
        assert_eq!(criteria.order, SortOrder::Descending);
    }

    #[test]
    fn test_resolve_sort_criteria_recognized() {
        let criteria = resolve_sort_criteria(Some("votes"), SortKey::Date).unwrap();
        assert_eq!(criteria.key, SortKey::Votes);
    }

    #[test]
    fn test_resolve_sort_criteria_unrecognized() {
        let err = resolve_sort_criteria(Some("hotness"), SortKey::Date).unwrap_err();
        assert_eq!(err, InvalidSortKey("hotness".to_string()));
    }

    fn thread_with_votes(title: &str, votes: i64, age_days: i64) -> CommentThread {
        let mut thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            title.to_string(),
            "body".to_string(),
            "user-1".to_string(),
        );
        thread.vote_count = votes;
        thread.created_at = Utc::now() - Duration::days(age_days);
        thread
    }

    #[test]
    fn test_sort_criteria_apply_votes_descending() {
        let mut threads = vec![
            thread_with_votes("low", 1, 0),
            thread_with_votes("high", 10, 0),
            thread_with_votes("mid", 5, 0),
        ];

        SortCriteria {
            key: SortKey::Votes,
            order: SortOrder::Descending,
        }
        .apply(&mut threads);

        let titles: Vec<&str> = threads.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_sort_criteria_apply_date_descending() {
        let mut threads = vec![
            thread_with_votes("old", 0, 10),
            thread_with_votes("new", 0, 0),
            thread_with_votes("middle", 0, 5),
        ];

        SortCriteria {
            key: SortKey::Date,
            order: SortOrder::Descending,
        }
        .apply(&mut threads);

        let titles: Vec<&str> = threads.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "middle", "old"]);
    }
}
