use thiserror::Error;

/// Fatal for the session: without a catalog nothing interactive can run.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
  #[error("Could not read catalog {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Catalog request failed: {0}")]
  Http(String),

  #[error("Catalog document is malformed: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Catalog contains card id {0} more than once")]
  DuplicateId(String),
}

impl From<reqwest::Error> for CatalogLoadError {
  fn from(e: reqwest::Error) -> Self {
    let message = if e.is_timeout() {
      format!("Request timed out: {}", e)
    } else if e.is_connect() {
      format!("Connection failed: {}", e)
    } else if let Some(status) = e.status() {
      format!("HTTP {} error: {}", status.as_u16(), e)
    } else {
      format!("HTTP error: {}", e)
    };
    CatalogLoadError::Http(message)
  }
}

/// Failures of the persisted grade blob. Always absorbed by the session.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Persisted grades are not valid JSON: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Failed to persist grades: {0}")]
  Persist(String),

  #[error("Storage backend error: {0}")]
  Backend(#[from] rusqlite::Error),

  #[error("Storage IO error: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
  #[error("Invalid ranking string: empty input")]
  Empty,

  #[error("Invalid ranking string: {0}")]
  Base64(String),

  #[error("Invalid ranking string: decoded bytes are not UTF-8")]
  Utf8,

  #[error("Invalid ranking string: {0}")]
  Json(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradeError {
  #[error("'{0}' is not a grade (expected A-D with optional +/-, or F)")]
  Invalid(String),

  #[error("Unknown card id: {0}")]
  UnknownCard(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("Cards are still loading")]
  NotReady,

  #[error("Card data failed to load: {0}")]
  Failed(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Catalog(#[from] CatalogLoadError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error(transparent)]
  Grade(#[from] GradeError),

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error("Could not serialize grades: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
