//! Error type shared by the whole client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request itself failed (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },

    /// Malformed XML-RPC document, either direction.
    #[error("XML-RPC error: {0}")]
    Xml(String),

    /// The server raised an exception and answered with an XML-RPC fault.
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The decoded response did not match the requested Rust type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed for {user} on {database}")]
    AuthenticationFailed { user: String, database: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Error::Xml(err.to_string())
    }
}
