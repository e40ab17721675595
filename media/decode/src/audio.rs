/*!
    Audio decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Audio as AudioDecoderFFmpeg},
    ffi,
    packet::Mut as PacketMut,
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use media_source::{sample_format_from_ffmpeg, CodecConfig};
use media_types::{AudioFrame, ChannelLayout, Error, Packet, Pts, Rational, Result, SampleFormat};

/**
    Audio decoder.

    Decodes audio packets into frames. A single packet may yield zero, one,
    or several frames; the decoder drains itself fully on every call.
*/
pub struct AudioDecoder {
    decoder: AudioDecoderFFmpeg,
    time_base: Rational,
}

impl AudioDecoder {
    /**
        Create a new audio decoder from codec configuration.

        # Arguments

        * `codec_config` - Codec configuration from the source
        * `time_base` - Time base for the audio stream
    */
    pub fn new(codec_config: CodecConfig, time_base: Rational) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::format(e.to_string()))?;

        let parameters = codec_config.into_parameters();

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::format(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .audio()
            .map_err(|e| Error::format(e.to_string()))?;

        Ok(Self { decoder, time_base })
    }

    /**
        Get the time base for this decoder.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the sample rate of the decoded audio.
    */
    pub fn sample_rate(&self) -> u32 {
        self.decoder.rate()
    }

    /**
        Get the number of channels.
    */
    pub fn channels(&self) -> u16 {
        self.decoder.channels()
    }

    /**
        Decode a packet, returning decoded frames.

        May return zero, one, or multiple frames depending on codec. Zero
        frames for several consecutive packets is normal at stream start.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>> {
        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        // Set timing info
        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(Pts(pts)) = packet.pts {
                (*pkt_ptr).pts = pts;
            }
            if let Some(Pts(dts)) = packet.dts {
                (*pkt_ptr).dts = dts;
            }
            (*pkt_ptr).duration = packet.duration.0;
        }

        // Send packet to decoder.
        // EAGAIN means the decoder buffer is full - receive frames first then retry.
        match self.decoder.send_packet(&ffmpeg_pkt) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                let mut all_frames = self.receive_frames()?;
                match self.decoder.send_packet(&ffmpeg_pkt) {
                    Ok(()) => {
                        all_frames.extend(self.receive_frames()?);
                    }
                    Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                        // Still can't send - return the frames we drained.
                    }
                    Err(e) => return Err(Error::format(e.to_string())),
                }
                return Ok(all_frames);
            }
            Err(e) => return Err(Error::format(e.to_string())),
        }

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this at end of stream. Not restartable: once flushed, the
        decoder accepts no further packets.
    */
    pub fn flush(&mut self) -> Result<Vec<AudioFrame>> {
        let mut all_frames = self.receive_frames()?;

        match self.decoder.send_eof() {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                all_frames.extend(self.receive_frames()?);
                let _ = self.decoder.send_eof();
            }
            Err(ffmpeg_next::Error::Eof) => {
                // Already at EOF, that's fine
            }
            Err(e) => return Err(Error::format(e.to_string())),
        }

        all_frames.extend(self.receive_frames()?);
        Ok(all_frames)
    }

    /**
        Receive all currently available frames from the decoder.
    */
    fn receive_frames(&mut self) -> Result<Vec<AudioFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = AudioFrameFFmpeg::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => frames.push(self.convert_frame(&decoded_frame)?),
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

        Ok(frames)
    }

    /**
        Convert an FFmpeg audio frame to our AudioFrame type.
    */
    fn convert_frame(&self, frame: &AudioFrameFFmpeg) -> Result<AudioFrame> {
        let samples = frame.samples();
        let sample_rate = frame.rate();
        let channel_count = frame.channels();

        if samples == 0 {
            return Err(Error::invalid_data("audio frame has zero samples"));
        }

        if frame.planes() == 0 {
            return Err(Error::invalid_data(
                "audio frame has no data planes (linesize is 0)",
            ));
        }

        let ffmpeg_format = frame.format();
        let format = sample_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported(format!("unsupported sample format: {:?}", ffmpeg_format))
        })?;

        let channels = ChannelLayout::from_count(channel_count);
        let pts = frame.pts().map(Pts);
        let planes = copy_audio_planes(frame, format, samples, channel_count)?;

        Ok(AudioFrame::new(
            planes,
            samples,
            sample_rate,
            channels,
            format,
            pts,
            self.time_base,
        ))
    }
}

/**
    Copy audio data out of an FFmpeg frame, preserving the plane layout.

    Note: In FFmpeg planar audio, linesize[0] contains the size of EACH plane
    (they're all the same), while linesize[1..] may be 0. We access plane data
    directly via the data pointers rather than relying on linesize per plane.
*/
fn copy_audio_planes(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    samples: usize,
    channels: u16,
) -> Result<Vec<Vec<u8>>> {
    let bytes_per_sample = format.bytes_per_sample();

    if format.is_planar() {
        let plane_bytes = samples * bytes_per_sample;

        let plane0 = frame.data(0);
        if plane0.len() < plane_bytes {
            return Err(Error::invalid_data(format!(
                "audio plane size {} is less than expected {} bytes for {} samples",
                plane0.len(),
                plane_bytes,
                samples
            )));
        }

        if frame.planes() < channels as usize {
            return Err(Error::invalid_data(format!(
                "planar audio frame has {} planes for {} channels",
                frame.planes(),
                channels
            )));
        }

        let mut planes = Vec::with_capacity(channels as usize);
        for ch in 0..channels as usize {
            let plane_data = unsafe {
                let ptr = (*frame.as_ptr()).data[ch];
                std::slice::from_raw_parts(ptr, plane_bytes)
            };
            planes.push(plane_data.to_vec());
        }
        Ok(planes)
    } else {
        let total_bytes = samples * channels as usize * bytes_per_sample;
        let plane0 = frame.data(0);
        if plane0.len() < total_bytes {
            return Err(Error::invalid_data(format!(
                "packed audio data has {} bytes, expected at least {}",
                plane0.len(),
                total_bytes
            )));
        }
        Ok(vec![plane0[..total_bytes].to_vec()])
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("time_base", &self.time_base)
            .field("sample_rate", &self.decoder.rate())
            .field("channels", &self.decoder.channels())
            .finish_non_exhaustive()
    }
}
