/// Errors returned by catalogue mutations.
///
/// Read accessors never return these; they fall back to cached or empty data.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] memoires_http::Error),

    #[error("Invalid file: {}", .errors.join("; "))]
    InvalidFile { errors: Vec<String> },
}

impl Error {
    /// The message shown to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
