/*!
    Media source and demuxing.

    Opens a container from a file path or a registered `vproto://` transport
    URL and produces encoded packets for the best video and audio streams.
*/

mod codec_config;
mod convert;
mod demuxer;
mod probe;

pub use codec_config::CodecConfig;
pub use convert::{
    channel_layout_from_count, codec_id_from_ffmpeg, duration_from_ffmpeg, pts_from_ffmpeg,
    rational_from_ffmpeg, rational_to_ffmpeg, sample_format_from_ffmpeg,
};
pub use demuxer::{Demuxer, DemuxerConfig, StreamFilter};
pub use probe::probe;
