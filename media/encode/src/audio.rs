/*!
    Audio encoder implementation.
*/

use ffmpeg_next::{
    codec::{self, encoder::Audio as AudioEncoderFFmpeg, Id as CodecIdFFmpeg},
    ffi,
    util::frame::audio::Audio as AudioFrameFFmpeg,
    ChannelLayout as FFmpegChannelLayout,
};

use media_source::CodecConfig;
use media_types::{
    AudioFrame, ChannelLayout, CodecId, Error, MediaDuration, Packet, Pts, Rational, Result,
    SampleFormat, StreamType,
};

use crate::config::AudioEncoderConfig;

/**
    Audio encoder.

    Encodes raw audio frames into compressed packets. A single frame may
    yield zero, one, or several packets; the encoder drains itself fully on
    every call and must be flushed at end of stream to empty its buffer.
*/
pub struct AudioEncoder {
    encoder: AudioEncoderFFmpeg,
    time_base: Rational,
    sample_count: i64,
}

impl AudioEncoder {
    /**
        Create a new audio encoder with the given configuration.
    */
    pub fn new(config: AudioEncoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::format(e.to_string()))?;

        let codec_id = codec_id_to_ffmpeg(config.codec)?;
        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| Error::format(format!("codec {:?} not found", config.codec)))?;

        let encoder_ctx = codec::context::Context::new_with_codec(codec);
        let mut encoder = encoder_ctx
            .encoder()
            .audio()
            .map_err(|e| Error::format(e.to_string()))?;

        let sample_format = sample_format_to_ffmpeg(config.sample_format)?;
        encoder.set_format(sample_format);
        encoder.set_rate(config.sample_rate as i32);

        let channel_layout = channel_layout_to_ffmpeg(config.channels);
        encoder.set_channel_layout(channel_layout);

        // 1/sample_rate is the standard audio time base.
        let time_base = ffmpeg_next::Rational::new(1, config.sample_rate as i32);
        encoder.set_time_base(time_base);

        if let Some(bitrate) = config.bitrate {
            encoder.set_bit_rate(bitrate as usize);
        }

        if config.global_header {
            encoder.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder
            .open()
            .map_err(|e| Error::format(format!("failed to open encoder: {}", e)))?;

        let time_base = Rational::new(1, config.sample_rate as i32);

        Ok(Self {
            encoder,
            time_base,
            sample_count: 0,
        })
    }

    /**
        Get the time base for encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the frame size expected by the encoder.

        Some codecs require a specific number of samples per frame.
        Returns None if the codec accepts variable frame sizes.
    */
    pub fn frame_size(&self) -> Option<usize> {
        let size = self.encoder.frame_size() as usize;
        if size == 0 { None } else { Some(size) }
    }

    /**
        Codec parameters of the opened encoder, for the muxer's stream.
    */
    pub fn codec_config(&self) -> Result<CodecConfig> {
        let mut parameters = codec::Parameters::new();
        let ret = unsafe {
            ffi::avcodec_parameters_from_context(parameters.as_mut_ptr(), self.encoder.as_ptr())
        };
        if ret < 0 {
            return Err(Error::format(format!(
                "failed to export encoder parameters: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(CodecConfig::new(parameters))
    }

    /**
        Encode an audio frame, returning encoded packets.

        May return zero, one, or multiple packets depending on encoder
        buffering. The frame's PTS is used as-is when defined; otherwise a
        running sample counter stands in.
    */
    pub fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<Packet>> {
        let sample_format = sample_format_to_ffmpeg(frame.format)?;
        let channel_layout = channel_layout_to_ffmpeg(frame.channels);
        let mut ffmpeg_frame = AudioFrameFFmpeg::new(sample_format, frame.samples, channel_layout);
        ffmpeg_frame.set_rate(frame.sample_rate);

        copy_planes_to_ffmpeg(&mut ffmpeg_frame, frame)?;

        let pts = match frame.pts {
            Some(Pts(p)) => p,
            None => self.sample_count,
        };
        ffmpeg_frame.set_pts(Some(pts));
        self.sample_count += frame.samples as i64;

        self.encoder
            .send_frame(&ffmpeg_frame)
            .map_err(|e| Error::format(e.to_string()))?;

        self.receive_packets()
    }

    /**
        Flush the encoder to get any remaining buffered packets.

        Call this at end of stream: the encoder may hold several frames'
        worth of not-yet-emitted output. Not restartable once flushed.
    */
    pub fn flush(&mut self) -> Result<Vec<Packet>> {
        self.encoder
            .send_eof()
            .map_err(|e| Error::format(e.to_string()))?;

        self.receive_packets()
    }

    /**
        Receive all currently available packets from the encoder.
    */
    fn receive_packets(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut encoded_pkt = ffmpeg_next::Packet::empty();

        loop {
            match self.encoder.receive_packet(&mut encoded_pkt) {
                Ok(()) => {
                    packets.push(self.convert_packet(&encoded_pkt));
                }
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                    break;
                }
                Err(ffmpeg_next::Error::Eof) => {
                    break;
                }
                Err(e) => {
                    return Err(Error::format(e.to_string()));
                }
            }
        }

        Ok(packets)
    }

    /**
        Convert an FFmpeg packet to our Packet type.
    */
    fn convert_packet(&self, pkt: &ffmpeg_next::Packet) -> Packet {
        Packet {
            data: pkt.data().map(|d| d.to_vec()).unwrap_or_default(),
            pts: pkt.pts().map(Pts),
            dts: pkt.dts().map(Pts),
            duration: MediaDuration(pkt.duration()),
            time_base: self.time_base,
            is_keyframe: pkt.is_key(),
            stream_type: StreamType::Audio,
        }
    }
}

/**
    Convert our CodecId to FFmpeg's codec ID.
*/
fn codec_id_to_ffmpeg(codec: CodecId) -> Result<CodecIdFFmpeg> {
    match codec {
        CodecId::Aac => Ok(CodecIdFFmpeg::AAC),
        CodecId::Opus => Ok(CodecIdFFmpeg::OPUS),
        CodecId::Mp3 => Ok(CodecIdFFmpeg::MP3),
        _ => Err(Error::unsupported(format!(
            "audio codec {:?} not supported for encoding",
            codec
        ))),
    }
}

/**
    Convert our SampleFormat to FFmpeg's Sample format.
*/
fn sample_format_to_ffmpeg(format: SampleFormat) -> Result<ffmpeg_next::format::Sample> {
    use ffmpeg_next::format::sample::Type;
    use ffmpeg_next::format::Sample;

    match format {
        SampleFormat::U8 => Ok(Sample::U8(Type::Packed)),
        SampleFormat::S16 => Ok(Sample::I16(Type::Packed)),
        SampleFormat::S16p => Ok(Sample::I16(Type::Planar)),
        SampleFormat::S32 => Ok(Sample::I32(Type::Packed)),
        SampleFormat::F32 => Ok(Sample::F32(Type::Packed)),
        SampleFormat::F32p => Ok(Sample::F32(Type::Planar)),
        SampleFormat::F64 => Ok(Sample::F64(Type::Packed)),
        _ => Err(Error::unsupported(format!(
            "sample format {:?} not supported",
            format
        ))),
    }
}

/**
    Convert our ChannelLayout to FFmpeg's ChannelLayout.
*/
fn channel_layout_to_ffmpeg(layout: ChannelLayout) -> FFmpegChannelLayout {
    match layout {
        ChannelLayout::Mono => FFmpegChannelLayout::MONO,
        ChannelLayout::Stereo => FFmpegChannelLayout::STEREO,
        ChannelLayout::Surround5_1 => FFmpegChannelLayout::_5POINT1,
        ChannelLayout::Surround7_1 => FFmpegChannelLayout::_7POINT1,
        _ => FFmpegChannelLayout::STEREO, // fallback
    }
}

/**
    Copy plane data from our AudioFrame into an FFmpeg frame.
*/
fn copy_planes_to_ffmpeg(dst: &mut AudioFrameFFmpeg, src: &AudioFrame) -> Result<()> {
    if src.planes.len() > dst.planes() {
        return Err(Error::invalid_data(format!(
            "frame has {} planes, destination has {}",
            src.planes.len(),
            dst.planes()
        )));
    }

    let plane_bytes = src.plane_size();
    for (i, plane) in src.planes.iter().enumerate() {
        if plane.len() < plane_bytes {
            return Err(Error::invalid_data(format!(
                "source plane {} has {} bytes, expected {}",
                i,
                plane.len(),
                plane_bytes
            )));
        }
        let dst_data = dst.data_mut(i);
        if dst_data.len() < plane_bytes {
            return Err(Error::invalid_data(format!(
                "destination buffer too small: {} < {}",
                dst_data.len(),
                plane_bytes
            )));
        }
        dst_data[..plane_bytes].copy_from_slice(&plane[..plane_bytes]);
    }
    Ok(())
}

impl std::fmt::Debug for AudioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncoder")
            .field("time_base", &self.time_base)
            .field("buffered_samples", &self.sample_count)
            .finish_non_exhaustive()
    }
}
