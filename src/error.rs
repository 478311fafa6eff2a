/// Operational failure carrying the process exit code.
///
/// Exit codes:
/// - `2`: input/output problem (missing file, bad schema, unwritable export)
/// - `3`: input parsed but nothing usable remained
///
/// Data-quality conditions inside a dataset are not errors; they are reported as
/// `domain::Diagnostic` or `io::ingest::RowError` values.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::new(2, format!("CSV error: {err}"))
    }
}
