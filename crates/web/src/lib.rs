//! Hands-on web page
//!
//! Serves one static HTML document at `/` plus a `/health` check used by
//! the end-to-end runner to wait for startup.

pub mod error;
pub mod page;
pub mod server;

pub use error::{WebError, WebResult};
pub use page::PageDescriptor;
pub use server::{WebServer, WebServerConfig};
