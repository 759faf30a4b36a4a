//! Upload batch model and validation.

mod upload_model;
mod upload_validator;

pub use upload_model::{CandidateFile, FileVerdict, UploadBatch, UploadSummary, ValidatedFile};
pub use upload_validator::{validate_batch, validate_file};
