//! HTTP messages and the HTTP/1.1 server transport.
//!
//! # Messages
//!
//! - **`uri`**: Validated, normalized URIs with per-component encoding
//! - **`message`**: Header bag, shared body handle and the accessors common to all messages
//! - **`request`**: Outgoing-style request (method, URI, request target)
//! - **`server_request`**: Incoming request with server, cookie, query and body params
//! - **`response`**: Status code, reason phrase and the standard phrase table
//! - **`uploaded_file`**: Files received with a request
//! - **`environment`**: Ambient request data and the constructors built on it
//!
//! Every message is a value: `with_*` methods return a modified copy and
//! leave the receiver untouched. Copies share their body stream.
//!
//! # Transport
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Run the middleware pipeline
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod environment;
pub mod message;
pub mod parser;
pub mod request;
pub mod response;
pub mod server_request;
pub mod uploaded_file;
pub mod uri;
pub mod writer;
