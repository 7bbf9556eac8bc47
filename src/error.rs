//! Error types for MargaNav

use thiserror::Error;

/// MargaNav error type
#[derive(Error, Debug)]
pub enum NavError {
    /// Origin or destination coordinate is malformed (NaN or out of range).
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// The routing service returned zero routes for the request.
    #[error("no route found between origin and destination")]
    NoRouteFound,

    /// The routing service failed at the transport level.
    #[error("routing transport failure: {0}")]
    Transport(String),

    /// Navigation was started without a stored route.
    #[error("no active route to start navigation")]
    NoActiveRoute,

    /// An alternative route index did not resolve to a stored alternative.
    #[error("alternative route index {0} out of range")]
    AlternativeOutOfRange(usize),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
