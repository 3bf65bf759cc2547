//! Error types for the web server

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("Page render failed: {0}")]
    Render(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid listen address '{0}'")]
    InvalidAddr(String),
}

pub type WebResult<T> = Result<T, WebError>;
