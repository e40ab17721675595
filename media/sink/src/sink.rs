/*!
    Segmenting sink implementation.
*/

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    codec, ffi, format::context::Output as OutputContext, packet::Mut as PacketMut, Dictionary,
};

use media_source::CodecConfig;
use media_types::{rescale, Error, Packet, Pts, Rational, Result, StreamType};

use crate::config::SinkConfig;

/// Basename of the initialization object.
const INIT_FILENAME: &str = "init.mp4";

/// Printf-style basename pattern for media segments.
const SEGMENT_BASENAME: &str = "seg_%05d.m4s";

/**
    Segmenting media sink.

    Writes packets into an HLS fMP4 output: `init.mp4`, sequentially
    numbered `.m4s` segments next to the playlist, and an event playlist
    that is finalized when [`finish`](SegmentSink::finish) writes the
    trailer.

    Setup is two-phase: create the sink, add streams (the audio encoder
    needs [`needs_global_header`](SegmentSink::needs_global_header) before
    it can be opened), then write the header.
*/
pub struct SegmentSink {
    output: OutputContext,
    playlist: PathBuf,
    segment_duration: std::time::Duration,
    video_stream_index: Option<usize>,
    audio_stream_index: Option<usize>,
    video_time_base: Option<Rational>,
    audio_time_base: Option<Rational>,
    header_written: bool,
    finished: bool,
}

impl SegmentSink {
    /**
        Create a sink that writes HLS output for the given playlist path.

        Segments land next to the playlist. No streams exist yet and no
        header is written; add streams first.
    */
    pub fn create<P: AsRef<Path>>(playlist: P, config: SinkConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::format(e.to_string()))?;

        let playlist = playlist.as_ref().to_path_buf();
        let output = ffmpeg_next::format::output_as(&playlist, "hls")
            .map_err(|e| Error::format(format!("failed to create output: {}", e)))?;

        Ok(Self {
            output,
            playlist,
            segment_duration: config.segment_duration,
            video_stream_index: None,
            audio_stream_index: None,
            video_time_base: None,
            audio_time_base: None,
            header_written: false,
            finished: false,
        })
    }

    /**
        Whether the container requires codecs to emit global headers.

        Check this before opening an encoder whose packets will be written
        here.
    */
    pub fn needs_global_header(&self) -> bool {
        unsafe {
            let oformat = (*self.output.as_ptr()).oformat;
            !oformat.is_null() && ((*oformat).flags & ffi::AVFMT_GLOBALHEADER as i32) != 0
        }
    }

    /**
        Add a passthrough video stream.

        The input stream's codec parameters are installed verbatim; no
        re-encoding happens downstream of this. HEVC gets the `hvc1` codec
        tag for player compatibility; other codecs have their container tag
        cleared.
    */
    pub fn add_video_passthrough(
        &mut self,
        codec_config: &CodecConfig,
        time_base: Rational,
    ) -> Result<()> {
        if self.header_written {
            return Err(Error::invalid_data("streams must be added before the header"));
        }

        let codec_id = codec_config.id();
        let mut stream = self
            .output
            .add_stream(ffmpeg_next::encoder::find(codec::Id::None))
            .map_err(|e| Error::format(format!("failed to add video stream: {}", e)))?;

        stream.set_parameters(codec_config.parameters().clone());

        let params = stream.parameters();
        unsafe {
            let ptr = params.as_ptr() as *mut ffi::AVCodecParameters;
            (*ptr).codec_tag = if codec_id == codec::Id::HEVC {
                mktag(b"hvc1")
            } else {
                0
            };
        }

        stream.set_time_base(ffmpeg_next::Rational::new(time_base.num, time_base.den));

        self.video_stream_index = Some(stream.index());
        self.video_time_base = Some(time_base);
        Ok(())
    }

    /**
        Add an audio stream from an opened encoder's parameters.
    */
    pub fn add_audio(&mut self, codec_config: &CodecConfig, time_base: Rational) -> Result<()> {
        if self.header_written {
            return Err(Error::invalid_data("streams must be added before the header"));
        }

        let mut stream = self
            .output
            .add_stream(ffmpeg_next::encoder::find(codec::Id::None))
            .map_err(|e| Error::format(format!("failed to add audio stream: {}", e)))?;

        stream.set_parameters(codec_config.parameters().clone());

        let params = stream.parameters();
        unsafe {
            let ptr = params.as_ptr() as *mut ffi::AVCodecParameters;
            (*ptr).codec_tag = 0;
        }

        stream.set_time_base(ffmpeg_next::Rational::new(time_base.num, time_base.den));

        self.audio_stream_index = Some(stream.index());
        self.audio_time_base = Some(time_base);
        Ok(())
    }

    /**
        Write the container header with the segmentation options.
    */
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(Error::invalid_data("header already written"));
        }

        let pattern = segment_pattern(&self.playlist);

        let mut opts = Dictionary::new();
        opts.set("hls_time", &self.segment_duration.as_secs().to_string());
        opts.set("hls_list_size", "0");
        opts.set("hls_flags", "independent_segments");
        opts.set("hls_playlist_type", "event");
        opts.set("hls_segment_type", "fmp4");
        opts.set("hls_fmp4_init_filename", INIT_FILENAME);
        opts.set("hls_segment_filename", &pattern.to_string_lossy());

        self.output
            .write_header_with(opts)
            .map_err(|e| Error::format(format!("failed to write header: {}", e)))?;

        self.header_written = true;
        Ok(())
    }

    /**
        Write a packet to the sink.

        Packets are routed to the stream matching their type; timestamps are
        rescaled from the packet's time base to the output stream's.
    */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if !self.header_written {
            return Err(Error::invalid_data("header not written"));
        }

        let (stream_index, stream_time_base) = match packet.stream_type {
            StreamType::Video => {
                let idx = self
                    .video_stream_index
                    .ok_or_else(|| Error::invalid_data("no video stream configured"))?;
                (idx, self.video_time_base.unwrap())
            }
            StreamType::Audio => {
                let idx = self
                    .audio_stream_index
                    .ok_or_else(|| Error::invalid_data("no audio stream configured"))?;
                (idx, self.audio_time_base.unwrap())
            }
        };

        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        ffmpeg_pkt.set_stream(stream_index);

        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(Pts(pts)) = packet.pts {
                (*pkt_ptr).pts = rescale(pts, packet.time_base, stream_time_base);
            }
            if let Some(Pts(dts)) = packet.dts {
                (*pkt_ptr).dts = rescale(dts, packet.time_base, stream_time_base);
            }
            (*pkt_ptr).duration = rescale(packet.duration.0, packet.time_base, stream_time_base);
        }

        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ffmpeg_pkt
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::format(format!("failed to write packet: {}", e)))
    }

    /**
        Finish writing: flush the final segment and finalize the playlist.

        Safe to call after a failed run: the sink still attempts the
        trailer so partially-written output stays structurally valid.
        Calling it again after success is a no-op.
    */
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if !self.header_written {
            return Err(Error::invalid_data("header not written"));
        }

        self.output
            .write_trailer()
            .map_err(|e| Error::format(format!("failed to write trailer: {}", e)))?;

        self.finished = true;
        Ok(())
    }
}

/**
    Media segment pattern for a playlist path.

    Segments are numbered files in the playlist's directory.
*/
pub fn segment_pattern(playlist: &Path) -> PathBuf {
    match playlist.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(SEGMENT_BASENAME),
        _ => PathBuf::from(format!("./{}", SEGMENT_BASENAME)),
    }
}

fn mktag(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

impl std::fmt::Debug for SegmentSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentSink")
            .field("playlist", &self.playlist)
            .field("video_stream", &self.video_stream_index)
            .field("audio_stream", &self.audio_stream_index)
            .field("header_written", &self.header_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_pattern_lands_next_to_playlist() {
        let pattern = segment_pattern(Path::new("/tmp/out/stream.m3u8"));
        assert_eq!(pattern, PathBuf::from("/tmp/out/seg_%05d.m4s"));
    }

    #[test]
    fn segment_pattern_for_bare_playlist_name() {
        let pattern = segment_pattern(Path::new("stream.m3u8"));
        assert_eq!(pattern, PathBuf::from("./seg_%05d.m4s"));
    }

    #[test]
    fn mktag_is_little_endian() {
        // 'h' | 'v' << 8 | 'c' << 16 | '1' << 24
        assert_eq!(
            mktag(b"hvc1"),
            (b'h' as u32) | (b'v' as u32) << 8 | (b'c' as u32) << 16 | (b'1' as u32) << 24
        );
    }
}
