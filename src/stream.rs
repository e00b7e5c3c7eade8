//! Seekable byte streams backing message bodies and uploaded files.
//!
//! A [`Stream`] exclusively owns its [`Resource`]: either a growable in-memory
//! buffer or an open file. Access rights come from the `fopen`-style mode the
//! stream was opened with. Once [`Stream::close`] or [`Stream::detach`] has
//! been called every I/O operation fails.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;

use crate::error::{Error, Result};

/// Access mode of a stream, parsed from `fopen`-style strings
/// (`"r"`, `"r+"`, `"w"`, `"w+"`, `"a"`, `"a+"`, `"x"`, `"x+"`, `"c"`, `"c+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    readable: bool,
    writable: bool,
    append: bool,
    create: bool,
    create_new: bool,
    truncate: bool,
}

impl Mode {
    /// Read and write, the mode of temporary buffers.
    pub const READ_WRITE: Mode = Mode {
        readable: true,
        writable: true,
        append: false,
        create: false,
        create_new: false,
        truncate: false,
    };

    pub const READ_ONLY: Mode = Mode {
        readable: true,
        writable: false,
        append: false,
        create: false,
        create_new: false,
        truncate: false,
    };

    /// Parses a mode string. Binary/text flags (`b`, `t`) are ignored.
    pub fn parse(mode: &str) -> Result<Self> {
        let flags: String = mode.chars().filter(|c| *c != 'b' && *c != 't').collect();
        let (base, plus) = match flags.strip_suffix('+') {
            Some(base) => (base, true),
            None => (flags.as_str(), false),
        };

        let mut parsed = Mode {
            readable: plus,
            writable: plus,
            append: false,
            create: false,
            create_new: false,
            truncate: false,
        };
        match base {
            "r" => parsed.readable = true,
            "w" => {
                parsed.writable = true;
                parsed.create = true;
                parsed.truncate = true;
            }
            "a" => {
                parsed.writable = true;
                parsed.append = true;
                parsed.create = true;
            }
            "x" => {
                parsed.writable = true;
                parsed.create_new = true;
            }
            "c" => {
                parsed.writable = true;
                parsed.create = true;
            }
            _ => return Err(Error::invalid_argument(format!("invalid stream mode \"{mode}\""))),
        }
        Ok(parsed)
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.readable)
            .write(self.writable && !self.append)
            .append(self.append)
            .create(self.create)
            .create_new(self.create_new)
            .truncate(self.truncate);
        options
    }
}

/// The byte resource owned by a stream.
#[derive(Debug)]
pub enum Resource {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

impl Read for Resource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Resource::Memory(cursor) => cursor.read(buf),
            Resource::File(file) => file.read(buf),
        }
    }
}

impl Write for Resource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Resource::Memory(cursor) => cursor.write(buf),
            Resource::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Resource::Memory(cursor) => cursor.flush(),
            Resource::File(file) => file.flush(),
        }
    }
}

impl Seek for Resource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Resource::Memory(cursor) => cursor.seek(pos),
            Resource::File(file) => file.seek(pos),
        }
    }
}

#[derive(Debug)]
pub struct Stream {
    resource: Option<Resource>,
    mode: Mode,
}

impl Stream {
    /// Creates an empty read/write temporary buffer.
    pub fn new() -> Self {
        Self::from_resource(Resource::Memory(Cursor::new(Vec::new())), Mode::READ_WRITE)
    }

    /// Creates a temporary buffer holding `data`, positioned after it.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let position = data.len() as u64;
        let mut cursor = Cursor::new(data);
        cursor.set_position(position);
        Self::from_resource(Resource::Memory(cursor), Mode::READ_WRITE)
    }

    /// Opens a file with an `fopen`-style mode.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self> {
        let mode = Mode::parse(mode)?;
        let file = mode.open_options().open(path.as_ref())?;
        Ok(Self::from_resource(Resource::File(file), mode))
    }

    pub fn from_resource(resource: Resource, mode: Mode) -> Self {
        Self {
            resource: Some(resource),
            mode,
        }
    }

    fn resource(&mut self) -> Result<&mut Resource> {
        self.resource.as_mut().ok_or_else(unusable)
    }

    pub fn is_readable(&self) -> bool {
        self.resource.is_some() && self.mode.readable
    }

    pub fn is_writable(&self) -> bool {
        self.resource.is_some() && self.mode.writable
    }

    pub fn is_seekable(&self) -> bool {
        self.resource.is_some()
    }

    /// Reads up to `max_bytes` from the current position.
    pub fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        if !self.is_readable() {
            return Err(denied("stream is not readable"));
        }
        let resource = self.resource()?;
        let mut buf = Vec::new();
        Read::by_ref(resource)
            .take(u64::try_from(max_bytes).unwrap_or(u64::MAX))
            .read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Writes `data` and returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.is_writable() {
            return Err(denied("stream is not writable"));
        }
        let append = self.mode.append;
        let resource = self.resource()?;
        if append {
            if let Resource::Memory(cursor) = &mut *resource {
                cursor.seek(SeekFrom::End(0))?;
            }
        }
        resource.write_all(data)?;
        Ok(data.len())
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.resource()?.seek(pos)?)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.resource()?.stream_position()?)
    }

    /// True once the position has reached the end of the resource, and for
    /// streams that are no longer usable.
    pub fn eof(&self) -> bool {
        match &self.resource {
            Some(Resource::Memory(cursor)) => cursor.position() >= cursor.get_ref().len() as u64,
            Some(Resource::File(file)) => {
                let mut handle = file;
                match (handle.stream_position(), file.metadata()) {
                    (Ok(position), Ok(meta)) => position >= meta.len(),
                    _ => true,
                }
            }
            None => true,
        }
    }

    /// Size in bytes, `None` when unknown.
    pub fn size(&self) -> Option<u64> {
        match &self.resource {
            Some(Resource::Memory(cursor)) => Some(cursor.get_ref().len() as u64),
            Some(Resource::File(file)) => file.metadata().ok().map(|meta| meta.len()),
            None => None,
        }
    }

    /// Reads everything from the current position to the end.
    pub fn contents(&mut self) -> Result<Bytes> {
        if !self.is_readable() {
            return Err(denied("stream is not readable"));
        }
        let mut buf = Vec::new();
        self.resource()?.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Rewinds and reads the whole stream, yielding an empty string on any
    /// failure.
    pub fn to_text(&mut self) -> String {
        let contents = self.rewind().and_then(|_| self.contents());
        match contents {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }

    /// Releases the resource. Calling it again has no effect.
    pub fn close(&mut self) {
        self.resource = None;
    }

    /// Hands the resource over to the caller, leaving the stream unusable.
    /// Returns `None` once the resource has already been released.
    pub fn detach(&mut self) -> Option<Resource> {
        self.resource.take()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

fn unusable() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "stream is closed or detached",
    ))
}

fn denied(msg: &'static str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, msg))
}
