use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoscoutError {
    #[error("Geocoding error: {0}")]
    GeocodingError(#[from] crate::geocoding::GeocodingError),
    #[error("Request error: {0}")]
    RequestError(#[from] geoscout_transport::RequestError),
    #[error("Transport error: {0}")]
    TransportError(#[from] geoscout_transport::TransportError),
    #[error("Store error: {0}")]
    StoreError(#[from] crate::suggest::StoreError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GeoscoutError>;
