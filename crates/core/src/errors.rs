//! Core error types for the Concilia dashboard layer.
//!
//! This module defines the transport-agnostic error taxonomy. The HTTP
//! boundary (`concilia-client`) converts reqwest/serde failures into these
//! types; render paths only ever see one of these variants.

use std::time::Duration;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the dashboard layer.
///
/// Every asynchronous boundary converts its failures into one of these
/// variants before any render path runs. Nothing here is fatal to the page:
/// each error is scoped to the widget that triggered it.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (DNS, connection refused, broken pipe).
    #[error("network failure: {0}")]
    Network(String),

    /// The request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}")]
    Http { status: u16 },

    /// The response body could not be parsed as JSON.
    #[error("response body is not valid JSON: {0}")]
    BadJson(String),

    /// The payload parsed but failed schema validation or coercion.
    #[error("payload failed validation: {0}")]
    BadPayload(String),

    /// The payload carried a success flag set to false, with a message.
    #[error("server reported failure: {0}")]
    Business(String),

    /// A 401/403 on an API path. Carries the login route with the return
    /// target already encoded.
    #[error("session expired, login required")]
    Unauthorized { login_path: String },

    /// Upload input validation failed.
    #[error("upload validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The chart backend failed to construct an instance. Recovered locally
    /// with an inline error artifact.
    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl Error {
    /// Stable machine-readable kind for logs and widget failure events.
    pub fn kind(&self) -> String {
        match self {
            Error::Network(_) => "network".to_string(),
            Error::Timeout(_) => "timeout".to_string(),
            Error::Http { status } => format!("http_{}", status),
            Error::BadJson(_) => "bad_json".to_string(),
            Error::BadPayload(_) => "bad_payload".to_string(),
            Error::Business(_) => "business".to_string(),
            Error::Unauthorized { .. } => "unauthorized".to_string(),
            Error::Validation(_) => "validation".to_string(),
            Error::Render(_) => "render".to_string(),
        }
    }

    /// User-facing message in the dashboard's locale.
    ///
    /// Business messages come from the server verbatim; callers must escape
    /// the returned string before inserting it into markup.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => "Erro de conexão. Verifique sua internet.".to_string(),
            Error::Timeout(_) => "Tempo esgotado. Tente novamente.".to_string(),
            Error::Unauthorized { .. } => "Sessão expirada. Faça login novamente.".to_string(),
            Error::Business(message) => message.clone(),
            Error::Validation(reason) => reason.user_message(),
            Error::Render(_) => "Não foi possível exibir o gráfico.".to_string(),
            Error::Http { .. } | Error::BadJson(_) | Error::BadPayload(_) => {
                "Ocorreu um erro. Tente novamente.".to_string()
            }
        }
    }
}

/// Validation errors for upload candidates.
///
/// A batch collects one of these per failed check, so a single file can be
/// rejected for several independent reasons.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsafe file name: {0}")]
    UnsafeFileName(String),

    #[error("no files selected")]
    EmptySelection,
}

impl ValidationError {
    /// User-facing reason shown in the upload panel's rejection list.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::UnsupportedFileType(name) => {
                format!("Formato não suportado: {}", name)
            }
            ValidationError::FileTooLarge { size, .. } => {
                format!("Arquivo excede o limite de 10 MB ({} bytes)", size)
            }
            ValidationError::UnsafeFileName(name) => {
                format!("Nome de arquivo inválido: {}", name)
            }
            ValidationError::EmptySelection => "Nenhum arquivo selecionado.".to_string(),
        }
    }
}
