//! Candidate-file validation.
//!
//! Each file is checked independently against the allowed type set, the size
//! limit, and filename safety. Reasons accumulate per file, so a single file
//! can surface several rejection reasons and a bad file never drags down the
//! rest of the batch.

use log::debug;
use uuid::Uuid;

use crate::constants::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES};
use crate::errors::ValidationError;

use super::{CandidateFile, FileVerdict, UploadBatch, ValidatedFile};

/// Validates a single candidate file.
pub fn validate_file(file: &CandidateFile) -> FileVerdict {
    let mut reasons = Vec::new();

    if file.name.contains('/') || file.name.contains('\\') || file.name.starts_with('.') {
        reasons.push(ValidationError::UnsafeFileName(file.name.clone()));
    }

    match file.extension() {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {
            // Extension is authoritative; a declared MIME outside the allowed
            // set still rejects the file.
            if !file.mime_type.is_empty()
                && !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str())
            {
                reasons.push(ValidationError::UnsupportedFileType(file.mime_type.clone()));
            }
        }
        _ => reasons.push(ValidationError::UnsupportedFileType(file.name.clone())),
    }

    if file.size_bytes() > MAX_UPLOAD_BYTES {
        reasons.push(ValidationError::FileTooLarge {
            size: file.size_bytes(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    FileVerdict { reasons }
}

/// Validates a selection, producing a batch with per-file verdicts.
pub fn validate_batch(files: Vec<CandidateFile>) -> UploadBatch {
    let files: Vec<ValidatedFile> = files
        .into_iter()
        .map(|file| {
            let verdict = validate_file(&file);
            if !verdict.accepted() {
                debug!("rejected upload candidate {}: {:?}", file.name, verdict.reasons);
            }
            ValidatedFile { file, verdict }
        })
        .collect();

    UploadBatch {
        id: Uuid::new_v4(),
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> CandidateFile {
        CandidateFile::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_path_traversal_name_is_rejected() {
        let verdict = validate_file(&file("../secret.csv", "text/csv", 10));
        assert!(!verdict.accepted());
        assert!(matches!(
            verdict.reasons[0],
            ValidationError::UnsafeFileName(_)
        ));
    }

    #[test]
    fn test_backslash_and_dotfile_names_are_rejected() {
        assert!(!validate_file(&file("a\\b.csv", "text/csv", 10)).accepted());
        assert!(!validate_file(&file(".hidden.csv", "text/csv", 10)).accepted());
    }

    #[test]
    fn test_oversized_file_is_rejected_with_size_reason() {
        let verdict = validate_file(&file("big.csv", "text/csv", 11 * 1024 * 1024));
        assert!(verdict
            .reasons
            .iter()
            .any(|r| matches!(r, ValidationError::FileTooLarge { .. })));
    }

    #[test]
    fn test_file_at_limit_is_accepted() {
        let verdict = validate_file(&file("edge.csv", "text/csv", 10 * 1024 * 1024));
        assert!(verdict.accepted());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let verdict = validate_file(&file("report.pdf", "application/pdf", 10));
        assert!(verdict
            .reasons
            .iter()
            .any(|r| matches!(r, ValidationError::UnsupportedFileType(_))));
    }

    #[test]
    fn test_foreign_mime_with_good_extension_is_rejected() {
        let verdict = validate_file(&file("data.csv", "text/html", 10));
        assert!(!verdict.accepted());
    }

    #[test]
    fn test_empty_mime_is_tolerated() {
        let verdict = validate_file(&file("extrato.ofx", "", 10));
        assert!(verdict.accepted());
    }

    #[test]
    fn test_reasons_accumulate_per_file() {
        let verdict = validate_file(&file("../big.pdf", "application/pdf", 11 * 1024 * 1024));
        assert_eq!(verdict.reasons.len(), 3);
    }

    #[test]
    fn test_one_bad_file_does_not_block_the_batch() {
        let batch = validate_batch(vec![
            file("../secret.csv", "text/csv", 10),
            file("vendas.csv", "text/csv", 10),
        ]);
        assert_eq!(batch.accepted_count(), 1);
        assert_eq!(batch.rejected().count(), 1);
        assert_eq!(batch.accepted().next().unwrap().name, "vendas.csv");
    }

    #[test]
    fn test_fully_rejected_batch() {
        let batch = validate_batch(vec![file("x.pdf", "", 10)]);
        assert!(batch.is_fully_rejected());
    }
}
