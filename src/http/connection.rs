use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{error, info, warn};

use crate::app::App;
use crate::http::environment::ServerEnvironment;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::response::Response;
use crate::http::server_request::ServerRequest;
use crate::http::writer::ResponseWriter;

/// Buffered bytes allowed for one request before it is refused with 413.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;

pub struct Connection {
    stream: TcpStream,
    buffer: Vec<u8>,
    max_request_size: usize,
    state: ConnectionState,
    app: App,
    peer: Option<SocketAddr>,
    local: Option<SocketAddr>,
    display_errors: bool,
}

pub enum ConnectionState {
    Reading,
    Processing(ServerEnvironment),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

enum Incoming {
    Request(ServerEnvironment),
    Rejected(Response),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, app: App) -> Self {
        let peer = stream.peer_addr().ok();
        let local = stream.local_addr().ok();
        Self {
            stream,
            buffer: Vec::with_capacity(4096),
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            state: ConnectionState::Reading,
            app,
            peer,
            local,
            display_errors: false,
        }
    }

    /// Renders error details into 500 pages produced at this level.
    pub fn display_errors(mut self, display_errors: bool) -> Self {
        self.display_errors = display_errors;
        self
    }

    pub fn max_request_size(mut self, max_request_size: usize) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
            match state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Incoming::Request(env) => ConnectionState::Processing(env),
                        // the rest of the buffer cannot be trusted, so close after replying
                        Incoming::Rejected(response) => {
                            ConnectionState::Writing(ResponseWriter::new(&response), false)
                        }
                        Incoming::Closed => ConnectionState::Closed,
                    };
                }

                ConnectionState::Processing(env) => {
                    let env = self.fill_connection_info(env);
                    let (response, keep_alive) =
                        Self::handle_request(self.app.clone(), env, self.display_errors).await;

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<Incoming> {
        loop {
            // Try parsing whatever we already have
            if let Some(incoming) = take_request(&mut self.buffer, self.max_request_size) {
                return Ok(incoming);
            }

            // Read more data
            let mut temp = [0u8; 1024];
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                // Client closed connection
                return Ok(Incoming::Closed);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    fn fill_connection_info(&self, mut env: ServerEnvironment) -> ServerEnvironment {
        if let Some(local) = self.local {
            // only IPv4 addresses are exposed as the server address
            if local.is_ipv4() {
                env.server_addr = Some(local.ip().to_string());
            }
            env.server_port = Some(local.port());
        }
        env.remote_addr = self.peer.map(|p| p.ip().to_string());
        env
    }

    /// Runs the application on a blocking thread and maps whatever escapes
    /// it onto an error response.
    async fn handle_request(app: App, env: ServerEnvironment, display_errors: bool) -> (Response, bool) {
        let method = env.method.clone();
        let path = env.request_uri.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let request = match ServerRequest::from_environment(env) {
                Ok(request) => request,
                Err(e) => {
                    warn!(method = %method, path = %path, error = %e, "rejecting malformed request");
                    return (Response::bad_request(), false);
                }
            };
            let keep_alive = request.keep_alive();
            let response = match app.handle(request) {
                Ok(response) => response,
                Err(e) => {
                    error!(method = %method, path = %path, error = %e, "request failed");
                    Response::for_error(&e, display_errors)
                }
            };
            info!(method = %method, path = %path, status = response.status_code(), "request served");
            (response, keep_alive)
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("request task failed: {}", e);
                (Response::internal_error(), false)
            }
        }
    }
}

/// Takes one request off the front of `buffer`, or `None` when more data
/// is needed.
fn take_request(buffer: &mut Vec<u8>, max_request_size: usize) -> Option<Incoming> {
    match parse_http_request(buffer) {
        Ok((env, consumed)) => {
            buffer.drain(..consumed);
            Some(Incoming::Request(env))
        }
        Err(ParseError::Incomplete) if buffer.len() > max_request_size => {
            warn!(buffered = buffer.len(), limit = max_request_size, "request too large");
            buffer.clear();
            Some(Incoming::Rejected(Response::payload_too_large()))
        }
        Err(ParseError::Incomplete) => None,
        Err(e) => {
            warn!(error = ?e, "HTTP parse error");
            buffer.clear();
            Some(Incoming::Rejected(Response::bad_request()))
        }
    }
}
