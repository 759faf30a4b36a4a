/// Maximum accepted size for a single uploaded file (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the upload pipeline accepts.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["csv", "xls", "xlsx", "ofx"];

/// Declared MIME types the upload pipeline accepts. Browsers are loose about
/// spreadsheet MIME types, so the extension check is authoritative and this
/// list only rejects clearly foreign declarations.
pub const ALLOWED_MIME_TYPES: [&str; 6] = [
    "text/csv",
    "text/plain",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/x-ofx",
    "application/octet-stream",
];

/// Decimal precision for displayed monetary values.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Tolerance when cross-checking a server-reported difference against the
/// totals it was derived from.
pub const DIFFERENCE_TOLERANCE: &str = "0.01";

/// Category a sale row falls into when it carries no acquirer.
pub const UNASSIGNED_ACQUIRER: &str = "Outros";

/// Login route a 401/403 on an API path redirects to.
pub const LOGIN_PATH: &str = "/auth/login";

/// Default timeout for read requests, in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Upper bound for the reconciliation trigger timeout, in seconds.
pub const MAX_PROCESS_TIMEOUT_SECS: u64 = 60;
