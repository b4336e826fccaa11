use thiserror::Error;

/// Failures talking to the spreadsheet collaborator.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Tab \"{0}\" not found in spreadsheet")]
    TabNotFound(String),

    #[error("Cell {0} has not been loaded")]
    NotLoaded(String),

    #[error("Malformed range: {0}")]
    BadRange(String),

    #[error("Sheet metadata has not been loaded")]
    MetadataNotLoaded,
}

/// Per-row fetch failures. These never abort a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("reading body: {0}")]
    Io(#[from] std::io::Error),

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("{0}")]
    Other(String),
}

/// Run-level failures. Every variant is fatal.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Tab \"{0}\" not found")]
    TabNotFound(String),

    #[error("No free header column among {columns} columns (widen the sheet)")]
    NoFreeColumn { columns: u32 },

    #[error("Could not build HTTP client: {0}")]
    HttpClient(FetchError),

    #[error("Invalid metric pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Sheet(SheetError),
}

impl From<SheetError> for TallyError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::TabNotFound(tab) => TallyError::TabNotFound(tab),
            other => TallyError::Sheet(other),
        }
    }
}
