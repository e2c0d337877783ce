//! In-memory document corpus.
//!
//! Loads every supported text file under a directory, one document per
//! file, and ranks documents by how many distinct query terms they contain.
//! Loading and scoring fan out across cores with rayon.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::agent::engine::{RetrievedDocument, Retriever};
use crate::error::{AgentError, CorpusError};

/// File type of a loaded document, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// `.txt`
    Text,
    /// `.md` / `.markdown`
    Markdown,
    /// `.json`
    Json,
    /// `.csv`
    Csv,
}

impl DocumentKind {
    /// Maps a file extension (case-insensitive) to a kind.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Path relative to the corpus root, `/`-separated. Used as the citation name.
    pub source: String,
    /// File type.
    pub kind: DocumentKind,
    /// Size in bytes.
    pub size: usize,
    /// Full text.
    #[serde(skip)]
    pub content: String,
}

/// Immutable set of documents with a per-document term index.
#[derive(Debug, Clone)]
pub struct DocumentCorpus {
    root: PathBuf,
    documents: Vec<Document>,
    terms: Vec<HashSet<String>>,
}

impl DocumentCorpus {
    /// Loads all supported files under `dir`, recursively, sorted by source.
    ///
    /// Files that are not valid UTF-8 are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`CorpusError::NotADirectory`] if `dir` is not a directory
    /// - [`CorpusError::Read`] if a directory or file cannot be read
    /// - [`CorpusError::Empty`] if no supported file could be loaded
    pub fn load(dir: &Path) -> Result<Self, CorpusError> {
        if !dir.is_dir() {
            return Err(CorpusError::NotADirectory(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        collect_files(dir, &mut paths)?;

        let mut documents = paths
            .par_iter()
            .map(|(path, kind)| read_document(dir, path, *kind))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if documents.is_empty() {
            return Err(CorpusError::Empty(dir.to_path_buf()));
        }
        documents.sort_by(|a, b| a.source.cmp(&b.source));

        let terms = documents
            .par_iter()
            .map(|d| tokenize(&d.content))
            .collect();

        debug!(root = %dir.display(), documents = documents.len(), "corpus loaded");
        Ok(Self {
            root: dir.to_path_buf(),
            documents,
            terms,
        })
    }

    /// Directory the corpus was loaded from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded documents, sorted by source.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the corpus holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Ranks documents for `query`, best first, dropping non-matches.
    ///
    /// The score is the fraction of distinct query terms present in the
    /// document. Ties keep source order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedDocument> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .terms
            .par_iter()
            .enumerate()
            .filter_map(|(idx, doc_terms)| {
                let hits = query_terms.iter().filter(|t| doc_terms.contains(*t)).count();
                (hits > 0).then_some((idx, hits as f64 / query_terms.len() as f64))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, score)| {
                let doc = &self.documents[idx];
                RetrievedDocument {
                    source: doc.source.clone(),
                    content: doc.content.clone(),
                    score,
                }
            })
            .collect()
    }
}

impl Retriever for DocumentCorpus {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>, AgentError> {
        Ok(self.search(query, top_k))
    }
}

/// Lowercased Unicode words of at least two characters.
fn tokenize(text: &str) -> HashSet<String> {
    text.unicode_words()
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

fn collect_files(dir: &Path, out: &mut Vec<(PathBuf, DocumentKind)>) -> Result<(), CorpusError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CorpusError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|source| CorpusError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if let Some(kind) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentKind::from_extension)
        {
            out.push((path, kind));
        }
    }
    Ok(())
}

/// Reads one file. Files that are not valid UTF-8 yield `None`.
fn read_document(
    root: &Path,
    path: &Path,
    kind: DocumentKind,
) -> Result<Option<Document>, CorpusError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            warn!(path = %path.display(), "skipping file that is not valid UTF-8");
            return Ok(None);
        }
        Err(source) => {
            return Err(CorpusError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let source = path
        .strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(Some(Document {
        source,
        kind,
        size: content.len(),
        content,
    }))
}
