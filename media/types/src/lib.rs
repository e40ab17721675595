/*!
    Shared types for the media crate ecosystem.

    This crate defines the vocabulary of the ecosystem — the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.
*/

mod error;
mod format;
mod packet;
mod stream;
mod time;

pub use error::{Error, Result};
pub use format::{ChannelLayout, CodecId, SampleFormat};
pub use packet::{AudioFrame, Packet, StreamType};
pub use stream::{AudioStreamInfo, MediaInfo, VideoStreamInfo};
pub use time::{rescale, MediaDuration, Pts, Rational, StreamRebase};
