use common::crypto::KeyFormatError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("server does not advertise a Crypt4gh public key")]
    NoAdvertisedKey,
    #[error("server advertises an invalid Crypt4gh public key: {0}")]
    InvalidServerKey(#[source] KeyFormatError),
}
