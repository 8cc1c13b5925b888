use crate::models::{ImageId, PropertyId};

/// Errors surfaced by the API layer and the state store
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    #[error("Image {image_id} not found on property {property_id}")]
    ImageNotFound {
        property_id: PropertyId,
        image_id: ImageId,
    },

    #[error("Backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session storage error: {0}")]
    Session(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
