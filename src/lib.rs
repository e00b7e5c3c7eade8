//! Chipmunk - small web application framework
//!
//! Immutable HTTP messages, a regex router and a middleware pipeline,
//! served over a tokio HTTP/1.1 transport.

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod stream;

pub use app::App;
pub use error::{Error, Result, UploadError};
