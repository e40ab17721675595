/*!
    Byte-source abstraction and the built-in backends.
*/

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/**
    A readable, seekable byte stream.
*/
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/**
    A factory for per-connection byte streams.

    One `StreamSource` may be opened any number of times; each `open` yields
    an independent connection with its own position. Implementations must be
    shareable across threads since the registry hands out `Arc`s.
*/
pub trait StreamSource: Send + Sync {
    /**
        Open a fresh connection to the source.
    */
    fn open(&self) -> io::Result<Box<dyn ReadSeek>>;

    /**
        Total size in bytes, if known.
    */
    fn size(&self) -> io::Result<i64>;

    /**
        Whether only forward sequential reads are guaranteed possible.
    */
    fn is_streamed(&self) -> bool {
        false
    }
}

/**
    A source backed by a file on disk.
*/
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /**
        Create a file source for the given path.

        The file is not touched until the source is opened.
    */
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StreamSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn ReadSeek>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(file))
    }

    fn size(&self) -> io::Result<i64> {
        Ok(std::fs::metadata(&self.path)?.len() as i64)
    }
}

/// Shared buffer that can back any number of cursors.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/**
    A source backed by an in-memory buffer.

    Useful in tests and for already-materialized payloads. The buffer is
    shared between connections, not copied per open.
*/
pub struct MemorySource {
    data: Arc<Vec<u8>>,
    streamed: bool,
}

impl MemorySource {
    /**
        Create a seekable in-memory source.
    */
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            streamed: false,
        }
    }

    /**
        Create an in-memory source that only admits forward reads.
    */
    pub fn streamed(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            streamed: true,
        }
    }
}

impl StreamSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&self.data)))))
    }

    fn size(&self) -> io::Result<i64> {
        Ok(self.data.len() as i64)
    }

    fn is_streamed(&self) -> bool {
        self.streamed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_reads_and_sizes() {
        let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
        tmp.write_all(b"hello transport").expect("write");

        let source = FileSource::new(tmp.path());
        assert_eq!(source.size().expect("size"), 15);
        assert!(!source.is_streamed());

        let mut conn = source.open().expect("open");
        let mut buf = Vec::new();
        conn.read_to_end(&mut buf).expect("read");
        assert_eq!(buf, b"hello transport");
    }

    #[test]
    fn file_source_open_fails_for_missing_file() {
        let source = FileSource::new("/nonexistent/path/to/nothing.mp4");
        assert!(source.open().is_err());
    }

    #[test]
    fn memory_source_connections_are_independent() {
        let source = MemorySource::new(vec![1, 2, 3, 4]);
        let mut a = source.open().expect("open a");
        let mut b = source.open().expect("open b");

        let mut one = [0u8; 2];
        a.read_exact(&mut one).expect("read a");
        assert_eq!(one, [1, 2]);

        let mut all = Vec::new();
        b.read_to_end(&mut all).expect("read b");
        assert_eq!(all, vec![1, 2, 3, 4]);
    }
}
