/*!
    Pluggable byte-source transport.

    Applications register [`StreamSource`] implementations in a process-wide
    registry and receive a `vproto://<id>` URL in return. A demuxer that is
    handed such a URL resolves it back to the source and reads it through a
    [`TransportHandle`]: an opaque per-connection handle exposing exactly
    four operations (open, read, seek, close) across the FFmpeg custom-I/O
    boundary via [`TransportIo`].

    Handles are single-connection and not shareable; independent handles are
    fully isolated and may be driven from different threads.
*/

mod avio;
mod handle;
mod registry;
mod source;

pub use avio::TransportIo;
pub use handle::{OpenMode, TransportHandle, Whence};
pub use registry::{is_transport_url, register_source, SourceHandle, SCHEME};
pub use source::{FileSource, MemorySource, ReadSeek, StreamSource};
