use autograph_core::AutographError;

/// Errors raised by storage adapters.
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    /// A mutation transport carried neither `id` nor `data`.
    InvalidQuery(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by adapter crates to wrap driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::InvalidQuery(entity) => {
                write!(f, "Invalid mutation on {entity}: neither id nor data given")
            }
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for AutographError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidQuery(entity) => AutographError::InvalidQuery { entity },
            other => AutographError::Storage(Box::new(other)),
        }
    }
}
