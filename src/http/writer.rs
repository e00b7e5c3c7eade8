use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::message::Body;
use crate::http::response::Response;

const CHUNK_SIZE: usize = 8192;

/// Status line and header block, terminated by the blank line.
///
/// Header values are joined with commas. A `Content-Length` is added when
/// the response lacks one and the body size is known.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "HTTP/{} {} {}\r\n",
        resp.protocol_version(),
        resp.status_code(),
        resp.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (name, values) in resp.headers().iter() {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(values.join(",").as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    if !resp.has_header("Content-Length") {
        if let Some(size) = resp.body().lock().size() {
            buf.extend_from_slice(format!("Content-Length: {size}\r\n").as_bytes());
        }
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    head: Vec<u8>,
    written: usize,
    body: Body,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            head: serialize_head(response),
            written: 0,
            body: response.body().clone(),
        }
    }

    /// Writes the head, then the body from its start in fixed-size chunks
    /// until it reports end-of-stream.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.head.len() {
            let n = stream.write(&self.head[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        {
            let mut body = self.body.lock();
            if body.is_seekable() {
                body.rewind()?;
            }
        }
        loop {
            let chunk = {
                let mut body = self.body.lock();
                if body.eof() {
                    break;
                }
                body.read(CHUNK_SIZE)?
            };
            if chunk.is_empty() {
                break;
            }
            stream.write_all(&chunk).await?;
        }

        stream.flush().await?;
        Ok(())
    }
}
