//! Candidate files and the validated selection built from them.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::TRACING_TARGET_SELECTION;
use crate::error::{ImportError, Result};

/// Media type every imported statement must declare.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Maximum number of files accepted in one batch.
pub const MAX_BATCH_FILES: usize = 100;

/// Media type used when the extension is not recognized.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// A file the user picked or dropped, not yet validated.
#[derive(Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Original file name, without directories.
    pub name: String,
    /// Size of the content in bytes.
    pub size: u64,
    /// Declared media type.
    pub media_type: String,
    /// File content.
    pub content: Bytes,
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("media_type", &self.media_type)
            .finish_non_exhaustive()
    }
}

impl CandidateFile {
    /// Creates a candidate from in-memory content.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            media_type: media_type.into(),
            content,
        }
    }

    /// Reads a candidate from disk, declaring a media type from its extension.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read '{}': {e}", path.display()),
            )
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type_for(path), content))
    }

    /// Returns whether this candidate declares the PDF media type.
    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }

    /// Lowercase hex SHA-256 of the content.
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.content))
    }
}

/// Infers a declared media type from a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return FALLBACK_MEDIA_TYPE;
    };

    match extension.to_ascii_lowercase().as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "csv" => "text/csv",
        "txt" => "text/plain",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

/// The user's current, validated selection.
///
/// Order is the arrival order of the selection. Names are not required to be
/// unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    files: Vec<CandidateFile>,
}

impl CandidateSet {
    /// Filters a raw selection down to PDFs and validates the result.
    ///
    /// Non-PDF entries are dropped silently.
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidSelection`] if no PDF remains.
    /// - [`ImportError::BatchTooLarge`] if more than [`MAX_BATCH_FILES`] remain.
    pub fn select(candidates: impl IntoIterator<Item = CandidateFile>) -> Result<Self> {
        let mut offered = 0usize;
        let files: Vec<_> = candidates
            .into_iter()
            .inspect(|_| offered += 1)
            .filter(CandidateFile::is_pdf)
            .collect();

        tracing::debug!(
            target: TRACING_TARGET_SELECTION,
            offered,
            accepted = files.len(),
            "Filtered candidate selection"
        );

        if files.is_empty() {
            return Err(ImportError::invalid_selection("no PDF files found"));
        }

        if files.len() > MAX_BATCH_FILES {
            return Err(ImportError::BatchTooLarge {
                count: files.len(),
                limit: MAX_BATCH_FILES,
            });
        }

        Ok(Self { files })
    }

    /// Returns the selected files in arrival order.
    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    /// Number of selected files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of the selection in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
