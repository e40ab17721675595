/*!
    Error types shared across the media crates.
*/

/**
    Errors produced by the media crates.
*/
#[derive(Debug)]
pub enum Error {
    /// Transport or file-system failure.
    Io(std::io::Error),
    /// Container or codec negotiation failure.
    Format(String),
    /// Operation not supported by this handle or format.
    Unsupported(String),
    /// Data that does not match its declared shape.
    InvalidData(String),
    /// Allocation failure inside the multimedia library.
    OutOfMemory,
    /// Content or listing divergence between two output trees.
    Mismatch(String),
}

impl Error {
    /**
        Create a container/codec negotiation error.
    */
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /**
        Create an unsupported-operation error.
    */
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /**
        Create an invalid-data error.
    */
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /**
        Create a parity mismatch error.
    */
    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::Mismatch(msg.into())
    }

    /**
        Create an I/O error from a plain message.
    */
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(std::io::Error::other(msg.into()))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {}", e),
            Self::Format(msg) => write!(f, "format error: {}", msg),
            Self::Unsupported(msg) => write!(f, "unsupported operation: {}", msg),
            Self::InvalidData(msg) => write!(f, "invalid data: {}", msg),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Mismatch(msg) => write!(f, "mismatch: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/**
    Result alias used across the media crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        assert!(Error::format("no encoder").to_string().contains("format"));
        assert!(Error::unsupported("seek").to_string().contains("unsupported"));
        assert!(Error::mismatch("seg_00001.m4s").to_string().contains("mismatch"));
    }

    #[test]
    fn io_errors_convert() {
        let e: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, Error::Io(_)));
    }
}
