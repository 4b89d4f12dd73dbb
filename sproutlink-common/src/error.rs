//! Common error types for sproutlink

use thiserror::Error;

/// Common result type for sproutlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across sproutlink services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No donors exist to assign to a student
    #[error("No donors available for assignment")]
    DonorPoolEmpty,
}
