/*!
 * Error types for the pagelingo application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions. Only extraction
 * errors on the input document are allowed to reach the caller as hard
 * failures; provider and resolution errors are recovered inside the pipeline.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A single request exceeded its timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// All retry attempts were used up without a successful response
    #[error("Provider gave up after {attempts} attempts: {summary}")]
    Exhausted {
        /// Number of attempts made before giving up
        attempts: usize,
        /// Aggregated description of the most recent failures
        summary: String,
    },
}

/// Errors that can occur while extracting translatable units from a document
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input document could not be read or parsed
    #[error("Failed to parse input document: {0}")]
    Parse(String),
}

/// Errors raised while reconciling provider outputs for one unit
///
/// These never escape the resolver; they exist so the arbitration plumbing
/// can report *why* a step was skipped.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// No arbitration provider is configured
    #[error("Arbitration provider unavailable")]
    ArbiterUnavailable,

    /// The arbitration response could not be interpreted
    #[error("Malformed arbitration response: {0}")]
    MalformedVerdict(String),

    /// Error from the arbitration provider call itself
    #[error("Arbitration call failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error extracting units from the input document
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with the supplied configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
