use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type used by the plumbing around the analysis core (database, command line).
pub type SiteResult<T> = Result<T, Box<dyn Error>>;

/// Precondition violations reported by the analysis core.
///
/// Every message names the constraint that failed so it can be shown to a user as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    /// A parameter, such as the number of clusters, is outside its allowed range.
    InvalidParameter(String),
    /// The data handed to the core can't be analyzed, e.g. an empty business list.
    InvalidInput(String),
}

impl Display for SiteError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            SiteError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            SiteError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl Error for SiteError {}
