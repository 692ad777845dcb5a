//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{build_content_schema, ContentDocument};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages the tantivy search index
pub struct IndexManager {
    /// The tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader
    reader: IndexReader,

    /// Configuration
    config: SearchConfig,
}

impl IndexManager {
    /// Create a new IndexManager
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let schema = build_content_schema();

        let index = if Self::index_exists(&config.index_path) {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(&config.index_path, schema.clone()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        };

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        // Manual reload policy: commit() reloads the reader explicitly, so a
        // committed write is visible to the next search without a watcher
        // delay.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Index a single content document
    pub async fn index_document(&self, document: &ContentDocument) -> SearchResult<()> {
        let tantivy_doc = document.to_tantivy_doc(&self.schema);

        let mut writer = self.writer.write().await;

        // Delete any existing document with the same id first
        if let Ok(id_field) = self.schema.get_field("id") {
            let term = tantivy::Term::from_field_text(id_field, document.document_id());
            writer.delete_term(term);
        }

        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        if self.config.realtime_indexing {
            Self::commit_writer(&mut writer)?;
            self.reload_reader()?;
        }

        Ok(())
    }

    /// Index multiple content documents
    pub async fn index_documents(&self, documents: &[ContentDocument]) -> SearchResult<usize> {
        let mut writer = self.writer.write().await;
        let mut indexed = 0;

        for document in documents {
            let tantivy_doc = document.to_tantivy_doc(&self.schema);

            if let Ok(id_field) = self.schema.get_field("id") {
                let term = tantivy::Term::from_field_text(id_field, document.document_id());
                writer.delete_term(term);
            }

            writer.add_document(tantivy_doc).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to add document {}: {}", indexed, e))
            })?;

            indexed += 1;
        }

        Self::commit_writer(&mut writer)?;
        self.reload_reader()?;

        Ok(indexed)
    }

    /// Delete a document by id
    pub async fn delete_document(&self, document_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        if let Ok(id_field) = self.schema.get_field("id") {
            let term = tantivy::Term::from_field_text(id_field, document_id);
            writer.delete_term(term);

            if self.config.realtime_indexing {
                Self::commit_writer(&mut writer)?;
                self.reload_reader()?;
            }
        }

        Ok(())
    }

    /// Commit pending changes and make them visible to searches
    pub async fn commit(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        Self::commit_writer(&mut writer)?;
        self.reload_reader()
    }

    /// Clear the entire index
    pub async fn clear_index(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .delete_all_documents()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to clear index: {}", e)))?;
        Self::commit_writer(&mut writer)?;
        self.reload_reader()
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let total_documents = searcher
            .search(&tantivy::query::AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        Ok(IndexStats {
            total_documents,
            num_segments,
        })
    }

    fn commit_writer(writer: &mut IndexWriter) -> SearchResult<()> {
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        Ok(())
    }

    fn reload_reader(&self) -> SearchResult<()> {
        self.reader
            .reload()
            .map_err(|e| SearchError::SearchFailed(format!("Failed to reload reader: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentThread;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_index_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await;
        assert!(manager.is_ok());
    }

    #[tokio::test]
    async fn test_index_and_count() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await.unwrap();

        let thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            "Refund policy".to_string(),
            "How do refunds work?".to_string(),
            "user-1".to_string(),
        );

        manager
            .index_document(&ContentDocument::from(&thread))
            .await
            .unwrap();

        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await.unwrap();

        let thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            "Refund policy".to_string(),
            "How do refunds work?".to_string(),
            "user-1".to_string(),
        );

        manager
            .index_document(&ContentDocument::from(&thread))
            .await
            .unwrap();
        manager
            .index_document(&ContentDocument::from(&thread))
            .await
            .unwrap();

        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await.unwrap();

        let thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            "Refund policy".to_string(),
            "How do refunds work?".to_string(),
            "user-1".to_string(),
        );

        manager
            .index_document(&ContentDocument::from(&thread))
            .await
            .unwrap();
        manager
            .delete_document(&thread.id.to_string())
            .await
            .unwrap();

        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
    }
}
