//! Spelling-correction suggestions.
//!
//! The correction is computed from the index's own term dictionaries rather
//! than an external speller: each query token that is absent from the
//! vocabulary is replaced with the nearest indexed term within a bounded
//! edit distance, ties broken by document frequency. Scoring combines every
//! requested field, so a term common in bodies can correct a token that
//! never appears in a title.

use crate::search::error::SearchResult;
use std::collections::BTreeMap;
use tantivy::schema::Field;
use tantivy::Searcher;

/// Compute the single best corrected phrase for `text`, or `None` when no
/// token can be improved.
///
/// Returns `None` when a token is unknown to the vocabulary and has no
/// candidate within `max_edit_distance`, and when every token is already a
/// known term (nothing to correct).
pub(crate) fn suggest_phrase(
    searcher: &Searcher,
    fields: &[Field],
    text: &str,
    max_edit_distance: usize,
) -> SearchResult<Option<String>> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Ok(None);
    }

    let vocabulary = collect_vocabulary(searcher, fields)?;
    if vocabulary.is_empty() {
        return Ok(None);
    }

    let mut corrected = Vec::with_capacity(tokens.len());
    let mut changed = false;

    for token in &tokens {
        if vocabulary.contains_key(token.as_str()) {
            corrected.push(token.clone());
            continue;
        }

        match best_correction(&vocabulary, token, max_edit_distance) {
            Some(term) => {
                corrected.push(term);
                changed = true;
            }
            // One hopeless token sinks the whole phrase
            None => return Ok(None),
        }
    }

    if !changed {
        return Ok(None);
    }

    Ok(Some(corrected.join(" ")))
}

/// Merge the term dictionaries of the given fields across all segments,
/// summing document frequencies per term
fn collect_vocabulary(
    searcher: &Searcher,
    fields: &[Field],
) -> SearchResult<BTreeMap<String, u64>> {
    let mut vocabulary: BTreeMap<String, u64> = BTreeMap::new();

    for segment_reader in searcher.segment_readers() {
        for field in fields {
            let inverted_index = segment_reader.inverted_index(*field)?;
            let term_dict = inverted_index.terms();

            let mut stream = term_dict.stream()?;
            while stream.advance() {
                let Ok(term) = std::str::from_utf8(stream.key()) else {
                    continue;
                };
                let doc_freq = stream.value().doc_freq as u64;
                *vocabulary.entry(term.to_string()).or_insert(0) += doc_freq;
            }
        }
    }

    Ok(vocabulary)
}

/// Pick the vocabulary term closest to `token`: smallest edit distance, then
/// highest document frequency, then lexicographic order for determinism
fn best_correction(
    vocabulary: &BTreeMap<String, u64>,
    token: &str,
    max_edit_distance: usize,
) -> Option<String> {
    let token_len = token.chars().count();
    let mut best: Option<(usize, u64, &str)> = None;

    for (term, &doc_freq) in vocabulary {
        let term_len = term.chars().count();
        if token_len.abs_diff(term_len) > max_edit_distance {
            continue;
        }

        let distance = strsim::levenshtein(token, term);
        if distance == 0 || distance > max_edit_distance {
            continue;
        }

        let candidate = (distance, doc_freq, term.as_str());
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let better = candidate.0 < current.0
                    || (candidate.0 == current.0 && candidate.1 > current.1);
                if better {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }

    best.map(|(_, _, term)| term.to_string())
}

/// Split on non-alphanumeric characters and lowercase, matching the index's
/// default analyzer
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentThread;
    use crate::search::config::SearchConfig;
    use crate::search::document::ContentDocument;
    use crate::search::index::IndexManager;
    use tempfile::TempDir;

    async fn indexed_manager(titles: &[&str]) -> (IndexManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await.unwrap();
        for title in titles {
            let thread = CommentThread::new(
                "course-v1:Demo".to_string(),
                "general".to_string(),
                title.to_string(),
                "body text".to_string(),
                "user-1".to_string(),
            );
            manager
                .index_document(&ContentDocument::from(&thread))
                .await
                .unwrap();
        }
        (manager, temp_dir)
    }

    fn text_fields(manager: &IndexManager) -> Vec<Field> {
        vec![
            manager.schema().get_field("title").unwrap(),
            manager.schema().get_field("body").unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_corrects_misspelled_token() {
        let (manager, _dir) = indexed_manager(&["Refund policy details"]).await;
        let searcher = manager.reader().searcher();

        let suggestion =
            suggest_phrase(&searcher, &text_fields(&manager), "refnud policy", 2).unwrap();

        assert_eq!(suggestion.as_deref(), Some("refund policy"));
    }

    #[tokio::test]
    async fn test_no_suggestion_when_all_tokens_known() {
        let (manager, _dir) = indexed_manager(&["Refund policy details"]).await;
        let searcher = manager.reader().searcher();

        let suggestion =
            suggest_phrase(&searcher, &text_fields(&manager), "refund policy", 2).unwrap();

        assert!(suggestion.is_none());
    }

    #[tokio::test]
    async fn test_no_suggestion_for_hopeless_token() {
        let (manager, _dir) = indexed_manager(&["Refund policy details"]).await;
        let searcher = manager.reader().searcher();

        let suggestion =
            suggest_phrase(&searcher, &text_fields(&manager), "xqzwvbnmk", 2).unwrap();

        assert!(suggestion.is_none());
    }

    #[tokio::test]
    async fn test_ties_break_by_document_frequency() {
        // "cart" appears in two documents, "card" in one; both are distance
        // one from "carx"
        let (manager, _dir) =
            indexed_manager(&["cart checkout", "cart totals", "card payment"]).await;
        let searcher = manager.reader().searcher();

        let suggestion = suggest_phrase(&searcher, &text_fields(&manager), "carx", 2).unwrap();

        assert_eq!(suggestion.as_deref(), Some("cart"));
    }

    #[tokio::test]
    async fn test_empty_index_yields_no_suggestion() {
        let (manager, _dir) = indexed_manager(&[]).await;
        let searcher = manager.reader().searcher();

        let suggestion = suggest_phrase(&searcher, &text_fields(&manager), "refund", 2).unwrap();

        assert!(suggestion.is_none());
    }
}
