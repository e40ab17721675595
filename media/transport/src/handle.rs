/*!
    Per-connection transport handle.
*/

use std::io::{Read, Seek, SeekFrom};

use media_types::{Error, Result};

use crate::registry;
use crate::source::{ReadSeek, StreamSource};

/**
    Access mode requested when opening a handle.

    Sources produce readers; anything but read-only access is refused at
    open time.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access.
    #[default]
    Read,
    /// Write-only access.
    Write,
    /// Read-write access.
    ReadWrite,
}

/**
    Seek origin for [`TransportHandle::seek`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start.
    Set,
    /// Relative to the current position.
    Current,
    /// Relative to the end of the stream.
    End,
    /// Report the total size without moving the position.
    Size,
}

/**
    One open connection to a registered source.

    Valid from a successful [`open`](TransportHandle::open) until
    [`close`](TransportHandle::close); every operation after close fails with
    an I/O error. A handle is single-connection state and must not be shared
    between threads; independent handles are fully isolated.
*/
pub struct TransportHandle {
    /// The inner connection; `None` once closed.
    inner: Option<Box<dyn ReadSeek>>,
    /// Total size in bytes, or -1 when unknown.
    size: i64,
    /// Random access impossible when set.
    streamed: bool,
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("open", &self.inner.is_some())
            .field("size", &self.size)
            .field("streamed", &self.streamed)
            .finish()
    }
}

impl TransportHandle {
    /**
        Open a connection to the source a transport URI resolves to.

        Fails fast if the mode is not read-only, the URI does not carry the
        transport scheme, no source is registered under it, or the source
        itself fails to open; no handle state is left behind on failure.
    */
    pub fn open(uri: &str, mode: OpenMode) -> Result<Self> {
        if mode != OpenMode::Read {
            return Err(Error::unsupported("transport sources are read-only"));
        }

        let source = registry::resolve(uri).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no source registered for {}", uri),
            ))
        })?;
        Self::from_source(source.as_ref())
    }

    /**
        Open a connection directly against a source, bypassing the registry.
    */
    pub fn from_source(source: &dyn StreamSource) -> Result<Self> {
        let inner = source.open().map_err(Error::Io)?;
        let size = source.size().unwrap_or(-1);
        Ok(Self {
            inner: Some(inner),
            size,
            streamed: source.is_streamed(),
        })
    }

    /**
        Whether only forward sequential reads are possible.
    */
    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    /**
        Total size in bytes, if the source reported one.
    */
    pub fn size(&self) -> Option<i64> {
        (self.size >= 0).then_some(self.size)
    }

    /**
        Read up to `buf.len()` bytes.

        Returns 0 only at end of stream. Reads may be short; callers loop.
    */
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let inner = self.inner.as_mut().ok_or_else(closed)?;
        inner.read(buf).map_err(Error::Io)
    }

    /**
        Seek to a position, or query the total size.

        `Whence::Size` reports the size without affecting the position and
        fails as unsupported when the size is unknown. Any positional seek on
        a streamed handle fails as unsupported.
    */
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<i64> {
        if self.inner.is_none() {
            return Err(closed());
        }

        if whence == Whence::Size {
            return self
                .size()
                .ok_or_else(|| Error::unsupported("size unknown for this source"));
        }

        if self.streamed {
            return Err(Error::unsupported("seek on a streamed transport"));
        }

        let inner = self.inner.as_mut().ok_or_else(closed)?;
        let target = match whence {
            Whence::Set => {
                if offset < 0 {
                    return Err(Error::io("seek before start of stream"));
                }
                SeekFrom::Start(offset as u64)
            }
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
            Whence::Size => unreachable!(),
        };

        let pos = inner.seek(target).map_err(Error::Io)?;
        Ok(pos as i64)
    }

    /**
        Release the inner connection.

        Idempotent: closing an already-closed handle is a no-op, and the
        inner connection is released exactly once.
    */
    pub fn close(&mut self) {
        self.inner = None;
    }

    /**
        Whether the handle has been closed.
    */
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

fn closed() -> Error {
    Error::io("transport handle is closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::register_source;
    use crate::source::MemorySource;
    use std::sync::Arc;

    fn open_memory(data: Vec<u8>) -> TransportHandle {
        TransportHandle::from_source(&MemorySource::new(data)).expect("open")
    }

    #[test]
    fn open_via_registry_url() {
        let reg = register_source(Arc::new(MemorySource::new(vec![9; 16])));
        let mut handle = TransportHandle::open(&reg.url(), OpenMode::Read).expect("open");
        assert_eq!(handle.size(), Some(16));

        let mut buf = [0u8; 4];
        assert_eq!(handle.read(&mut buf).expect("read"), 4);
        assert_eq!(buf, [9; 4]);
    }

    #[test]
    fn open_unknown_uri_fails_without_a_handle() {
        let err = TransportHandle::open("vproto://999999999", OpenMode::Read).expect_err("must fail");
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn open_refuses_write_access() {
        let reg = register_source(Arc::new(MemorySource::new(vec![0; 4])));
        for mode in [OpenMode::Write, OpenMode::ReadWrite] {
            let err = TransportHandle::open(&reg.url(), mode).expect_err("must fail");
            assert!(matches!(err, Error::Unsupported(_)));
        }
    }

    #[test]
    fn read_to_eof_returns_zero() {
        let mut handle = open_memory(vec![1, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(handle.read(&mut buf).expect("read"), 3);
        assert_eq!(handle.read(&mut buf).expect("read"), 0);
    }

    #[test]
    fn seek_whences() {
        let mut handle = open_memory((0..100u8).collect());

        assert_eq!(handle.seek(10, Whence::Set).expect("set"), 10);
        assert_eq!(handle.seek(5, Whence::Current).expect("cur"), 15);
        assert_eq!(handle.seek(-10, Whence::End).expect("end"), 90);
        // Size query does not move the position.
        assert_eq!(handle.seek(0, Whence::Size).expect("size"), 100);
        assert_eq!(handle.seek(0, Whence::Current).expect("cur"), 90);
    }

    #[test]
    fn streamed_handle_refuses_seeks() {
        let mut handle =
            TransportHandle::from_source(&MemorySource::streamed(vec![0; 32])).expect("open");
        assert!(handle.is_streamed());
        assert!(matches!(
            handle.seek(0, Whence::Set),
            Err(Error::Unsupported(_))
        ));
        // Forward reads still work.
        let mut buf = [0u8; 8];
        assert_eq!(handle.read(&mut buf).expect("read"), 8);
    }

    #[test]
    fn close_is_idempotent() {
        let mut handle = open_memory(vec![0; 8]);
        handle.close();
        assert!(handle.is_closed());
        handle.close();
        handle.close();

        let mut buf = [0u8; 1];
        assert!(handle.read(&mut buf).is_err());
        assert!(handle.seek(0, Whence::Set).is_err());
        assert!(handle.seek(0, Whence::Size).is_err());
    }
}
