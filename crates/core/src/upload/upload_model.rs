//! Upload batch domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// A file the user selected or dropped, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// MIME type as declared by the picker; may be empty.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Validation outcome for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileVerdict {
    pub reasons: Vec<ValidationError>,
}

impl FileVerdict {
    pub fn accepted(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// A candidate file together with its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub file: CandidateFile,
    pub verdict: FileVerdict,
}

/// A transient set of candidate files checked for submission.
///
/// Created at selection/drop time and discarded after submission or when the
/// selection changes. One rejected file never blocks the accepted ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    pub id: Uuid,
    pub files: Vec<ValidatedFile>,
}

impl UploadBatch {
    pub fn accepted(&self) -> impl Iterator<Item = &CandidateFile> {
        self.files
            .iter()
            .filter(|f| f.verdict.accepted())
            .map(|f| &f.file)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ValidatedFile> {
        self.files.iter().filter(|f| !f.verdict.accepted())
    }

    pub fn accepted_count(&self) -> usize {
        self.files.iter().filter(|f| f.verdict.accepted()).count()
    }

    pub fn total_accepted_bytes(&self) -> u64 {
        self.accepted().map(CandidateFile::size_bytes).sum()
    }

    /// True when nothing in the batch survived validation.
    pub fn is_fully_rejected(&self) -> bool {
        self.accepted_count() == 0
    }
}

/// Structured result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub files_total: u32,
    pub sales_found: u32,
    pub receipts_found: u32,
    pub total_sales: Decimal,
    pub total_received: Decimal,
    pub message: String,
}
