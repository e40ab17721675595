/*!
    Media demuxer implementation.
*/

use ffmpeg_next::{ffi, format::context::Input as InputContext, media::Type};

use media_transport::{OpenMode, TransportHandle, TransportIo};
use media_types::{Error, MediaInfo, Packet, Rational, Result, StreamType};

use crate::codec_config::CodecConfig;
use crate::convert::{duration_from_ffmpeg, pts_from_ffmpeg, rational_from_ffmpeg};
use crate::probe::extract_media_info;

/**
    Configuration for opening a demuxer.
*/
#[derive(Clone, Debug, Default)]
pub struct DemuxerConfig {
    /// Filter which streams to demux (None = all available).
    pub stream_filter: Option<StreamFilter>,
}

/**
    Filter for selecting which streams to demux.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamFilter {
    /// Only demux video streams.
    VideoOnly,
    /// Only demux audio streams.
    AudioOnly,
    /// Demux both video and audio streams.
    #[default]
    Both,
}

/**
    A demuxer that produces encoded packets.

    Opens either a plain path/URL handled by the multimedia library itself,
    or a `vproto://` URL resolved through the transport registry, in which
    case all reads go through the custom I/O adapter. Packets are produced in
    file order, interleaved between the selected streams; packets of any
    other stream are dropped silently.
*/
pub struct Demuxer {
    /// The FFmpeg input context.
    input: InputContext,
    /// Custom I/O kept alive for transport-backed inputs. Declared after
    /// `input`: the format context must be closed before the I/O context is
    /// released.
    io: Option<TransportIo>,
    /// Cached media info.
    media_info: MediaInfo,
    /// Video stream index (if present and wanted).
    video_stream_index: Option<usize>,
    /// Audio stream index (if present and wanted).
    audio_stream_index: Option<usize>,
    /// Video stream time base.
    video_time_base: Option<Rational>,
    /// Audio stream time base.
    audio_time_base: Option<Rational>,
    /// Video codec config (if present).
    video_codec_config: Option<CodecConfig>,
    /// Audio codec config (if present).
    audio_codec_config: Option<CodecConfig>,
}

impl std::fmt::Debug for Demuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demuxer")
            .field("media_info", &self.media_info)
            .field("video_stream_index", &self.video_stream_index)
            .field("audio_stream_index", &self.audio_stream_index)
            .field("video_time_base", &self.video_time_base)
            .field("audio_time_base", &self.audio_time_base)
            .field("video_codec_config", &self.video_codec_config)
            .field("audio_codec_config", &self.audio_codec_config)
            .finish_non_exhaustive()
    }
}

impl Demuxer {
    /**
        Open a media source.

        `url` may be a file path, anything the multimedia library resolves
        natively, or a `vproto://` transport URL.
    */
    pub fn open(url: &str, config: DemuxerConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::format(e.to_string()))?;

        let (input, io) = if media_transport::is_transport_url(url) {
            let handle = TransportHandle::open(url, OpenMode::Read)?;
            let io = TransportIo::new(handle)?;
            let (input, io) = open_transport_input(io)?;
            (input, Some(io))
        } else {
            let input = ffmpeg_next::format::input(&url).map_err(|e| {
                if e.to_string().contains("No such file") {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        e.to_string(),
                    ))
                } else {
                    Error::format(e.to_string())
                }
            })?;
            (input, None)
        };

        let mut input = input;
        // Synthesize missing presentation timestamps while demuxing.
        unsafe {
            (*input.as_mut_ptr()).flags |= ffi::AVFMT_FLAG_GENPTS as i32;
        }

        let media_info = extract_media_info(&input);

        let want_video = matches!(
            config.stream_filter,
            None | Some(StreamFilter::Both) | Some(StreamFilter::VideoOnly)
        );
        let want_audio = matches!(
            config.stream_filter,
            None | Some(StreamFilter::Both) | Some(StreamFilter::AudioOnly)
        );

        // Find video stream
        let (video_stream_index, video_time_base, video_codec_config) = if want_video {
            match input.streams().best(Type::Video) {
                Some(stream) => (
                    Some(stream.index()),
                    Some(rational_from_ffmpeg(stream.time_base())),
                    Some(CodecConfig::new(stream.parameters())),
                ),
                None => (None, None, None),
            }
        } else {
            (None, None, None)
        };

        // Find audio stream
        let (audio_stream_index, audio_time_base, audio_codec_config) = if want_audio {
            match input.streams().best(Type::Audio) {
                Some(stream) => (
                    Some(stream.index()),
                    Some(rational_from_ffmpeg(stream.time_base())),
                    Some(CodecConfig::new(stream.parameters())),
                ),
                None => (None, None, None),
            }
        } else {
            (None, None, None)
        };

        Ok(Self {
            input,
            io,
            media_info,
            video_stream_index,
            audio_stream_index,
            video_time_base,
            audio_time_base,
            video_codec_config,
            audio_codec_config,
        })
    }

    /**
        Get the media info for this source.
    */
    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    /**
        Take the video codec configuration, if video is present.

        This consumes the codec config from the demuxer; pass it to the sink
        for passthrough muxing.
    */
    pub fn take_video_codec_config(&mut self) -> Option<CodecConfig> {
        self.video_codec_config.take()
    }

    /**
        Take the audio codec configuration, if audio is present.

        This consumes the codec config from the demuxer; pass it to
        `media-decode` to create an audio decoder.
    */
    pub fn take_audio_codec_config(&mut self) -> Option<CodecConfig> {
        self.audio_codec_config.take()
    }

    /**
        Get the video stream time base, if video is present.
    */
    pub fn video_time_base(&self) -> Option<Rational> {
        self.video_time_base
    }

    /**
        Get the audio stream time base, if audio is present.
    */
    pub fn audio_time_base(&self) -> Option<Rational> {
        self.audio_time_base
    }

    /**
        Check if this source has a selected video stream.
    */
    pub fn has_video(&self) -> bool {
        self.video_stream_index.is_some()
    }

    /**
        Check if this source has a selected audio stream.
    */
    pub fn has_audio(&self) -> bool {
        self.audio_stream_index.is_some()
    }

    /**
        Whether packets are being read through the custom transport.
    */
    pub fn uses_transport(&self) -> bool {
        self.io.is_some()
    }

    /**
        Read the next packet from the source.

        Returns `Ok(Some(packet))` for each packet, `Ok(None)` at end of
        stream. Packets are returned in file order, interleaved between
        streams; use `packet.stream_type` to route them.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let (stream, ffmpeg_packet) = match self.input.packets().next() {
                Some(result) => result,
                None => return Ok(None), // End of stream
            };

            let stream_index = stream.index();

            let (stream_type, time_base) = if Some(stream_index) == self.video_stream_index {
                (StreamType::Video, self.video_time_base.unwrap())
            } else if Some(stream_index) == self.audio_stream_index {
                (StreamType::Audio, self.audio_time_base.unwrap())
            } else {
                // Not a selected stream.
                continue;
            };

            let is_keyframe = ffmpeg_packet.is_key();
            let data = ffmpeg_packet.data().map(|d| d.to_vec()).unwrap_or_default();

            let packet = Packet::new(
                data,
                pts_from_ffmpeg(ffmpeg_packet.pts()),
                pts_from_ffmpeg(ffmpeg_packet.dts()),
                duration_from_ffmpeg(ffmpeg_packet.duration()),
                time_base,
                is_keyframe,
                stream_type,
            );

            return Ok(Some(packet));
        }
    }
}

/**
    Iterator adapter for Demuxer that yields packets.
*/
impl Iterator for Demuxer {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/**
    Open a format context over a custom transport I/O adapter.

    The format context takes the adapter's AVIO context as its `pb` with
    `AVFMT_FLAG_CUSTOM_IO` set, so closing the input leaves the adapter for
    us to release. On failure the adapter is dropped (closing the handle)
    and no format context leaks.
*/
fn open_transport_input(mut io: TransportIo) -> Result<(InputContext, TransportIo)> {
    unsafe {
        let mut ctx = ffi::avformat_alloc_context();
        if ctx.is_null() {
            return Err(Error::OutOfMemory);
        }

        (*ctx).pb = io.as_mut_ptr();
        (*ctx).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as i32;

        let ret = ffi::avformat_open_input(
            &mut ctx,
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null_mut(),
        );
        if ret < 0 {
            // avformat_open_input frees the context on failure.
            return Err(Error::format(format!(
                "failed to open transport input: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }

        let ret = ffi::avformat_find_stream_info(ctx, std::ptr::null_mut());
        if ret < 0 {
            let err = ffmpeg_next::Error::from(ret);
            ffi::avformat_close_input(&mut ctx);
            return Err(Error::format(format!(
                "failed to read stream info: {}",
                err
            )));
        }

        Ok((InputContext::wrap(ctx), io))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_transport::{register_source, MemorySource};
    use std::sync::Arc;

    #[test]
    fn open_fails_for_missing_file() {
        let err = Demuxer::open("/nonexistent/clip.mp4", DemuxerConfig::default())
            .expect_err("must fail");
        assert!(matches!(err, Error::Io(_) | Error::Format(_)));
    }

    #[test]
    fn open_fails_for_unregistered_transport_url() {
        let err =
            Demuxer::open("vproto://123456789", DemuxerConfig::default()).expect_err("must fail");
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn open_fails_for_garbage_transport_bytes() {
        // A registered source whose content no demuxer can probe: open must
        // surface a format error and must not leak the handle.
        let reg = register_source(Arc::new(MemorySource::new(vec![0u8; 256])));
        let err = Demuxer::open(&reg.url(), DemuxerConfig::default()).expect_err("must fail");
        assert!(matches!(err, Error::Format(_)));
    }
}
