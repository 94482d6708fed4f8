use thiserror::Error;
use uuid::Uuid;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid setting `{0}`: {1}")]
    InvalidSetting(&'static str, String),
    #[error("Backend Error: {0}")]
    Backend(#[from] BackendError),
    #[error("Stream Error: {0}")]
    Stream(#[from] StreamError),
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Upload {0} is still in flight")]
    UploadInFlight(Uuid),
    #[error("UI Error: {0}")]
    Ui(String),
}

// Media Backend Error Type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request {
        endpoint: &'static str,
        reason: String,
    },
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("{endpoint} returned a malformed body: {reason}")]
    MalformedBody {
        endpoint: &'static str,
        reason: String,
    },
    #[error("Failed to build upload form: {0}")]
    Form(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Stream buffer exceeded {0} bytes without a complete part")]
    Overflow(usize),
}
