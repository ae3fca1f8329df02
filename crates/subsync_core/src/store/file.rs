//! Directory-backed document store: one JSON-lines file per collection.

use crate::document::{Document, DocumentId};
use crate::filter::Criteria;
use crate::store::{
    distinct_from_documents, prepare_insert, CollectionHandle, Cursor, Store, StoreError,
    StoreResult,
};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A document store backed by a directory of JSON-lines files.
///
/// Each collection lives in `<root>/<name>.jsonl`, one document per line.
/// Suitable for small dumps and for exercising the CLI end to end without
/// an external database; not a performance-oriented backend.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `path`, creating the directory if missing.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Store for FileStore {
    type Collection = FileCollection;

    fn collection(&self, name: &str) -> FileCollection {
        FileCollection {
            path: self.root.join(format!("{name}.jsonl")),
            name: name.to_string(),
        }
    }
}

/// A handle into one collection file of a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileCollection {
    path: PathBuf,
    name: String,
}

impl FileCollection {
    fn load(&self) -> StoreResult<Vec<Document>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let mut documents = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let document: Document = serde_json::from_str(line).map_err(|e| {
                StoreError::malformed_document(&self.name, format!("line {}: {e}", lineno + 1))
            })?;
            documents.push(document);
        }
        Ok(documents)
    }

    fn rewrite(&self, documents: &[Document]) -> StoreResult<()> {
        let mut text = String::new();
        for document in documents {
            let line = serde_json::to_string(document).map_err(|e| {
                StoreError::malformed_document(&self.name, format!("unserializable document: {e}"))
            })?;
            text.push_str(&line);
            text.push('\n');
        }
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl CollectionHandle for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, criteria: &Criteria) -> StoreResult<Cursor> {
        let matching: Vec<Document> = self
            .load()?
            .into_iter()
            .filter(|d| criteria.matches(d))
            .collect();
        Ok(Cursor::from_documents(matching))
    }

    fn count(&self, criteria: &Criteria) -> StoreResult<u64> {
        Ok(self.load()?.iter().filter(|d| criteria.matches(d)).count() as u64)
    }

    fn insert_one(&self, mut document: Document) -> StoreResult<DocumentId> {
        let id = prepare_insert(&self.name, &mut document)?;
        let line = serde_json::to_string(&document).map_err(|e| {
            StoreError::malformed_document(&self.name, format!("unserializable document: {e}"))
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(id)
    }

    fn delete_many(&self, criteria: &Criteria) -> StoreResult<u64> {
        let documents = self.load()?;
        let before = documents.len();
        let kept: Vec<Document> = documents
            .into_iter()
            .filter(|d| !criteria.matches(d))
            .collect();
        let deleted = (before - kept.len()) as u64;
        if deleted > 0 {
            self.rewrite(&kept)?;
        }
        Ok(deleted)
    }

    fn distinct_values(&self, criteria: &Criteria, field: &str) -> StoreResult<Vec<Value>> {
        let documents = self.load()?;
        Ok(distinct_from_documents(documents.iter(), criteria, field))
    }
}
