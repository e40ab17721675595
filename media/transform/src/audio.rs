/*!
    Audio frame resampling.
*/

use ffmpeg_next::{
    software::resampling::context::Context as ResamplerContext,
    util::frame::audio::Audio as AudioFrameFFmpeg, ChannelLayout as FFmpegChannelLayout,
};

use media_types::{AudioFrame, ChannelLayout, Error, Rational, Result, SampleFormat};

/**
    Target format for audio resampling.
*/
#[derive(Clone, Debug)]
pub struct ResampleConfig {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Target channel layout.
    pub channels: ChannelLayout,
    /// Target sample format.
    pub format: SampleFormat,
}

impl ResampleConfig {
    /**
        Create a new resample configuration.
    */
    pub fn new(sample_rate: u32, channels: ChannelLayout, format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            format,
        }
    }
}

/**
    Audio frame resampler.

    Converts audio frames between formats, handling sample rate, channel
    layout, and sample format conversion. The resampler context is lazily
    initialized on first use and reinitialized if the input format changes.

    Resampling is stateful: the filter buffers samples internally and emits
    them in irregular batches, so the produced sample count of any one call
    may differ from the consumed count. Frames must be processed in order and
    `flush()` called at end of stream to drain the tail.
*/
pub struct AudioResampler {
    config: ResampleConfig,
    /// Cached resampler context and the input format it was created for.
    resampler_state: Option<ResamplerState>,
}

struct ResamplerState {
    context: ResamplerContext,
    src_sample_rate: u32,
    src_channels: ChannelLayout,
    src_format: SampleFormat,
}

impl AudioResampler {
    /**
        Create a new resampler with the given target configuration.
    */
    pub fn new(config: ResampleConfig) -> Self {
        Self {
            config,
            resampler_state: None,
        }
    }

    /**
        Get the target configuration.
    */
    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /**
        Convert an audio frame to the target format.

        The output buffer is sized from the filter's pending delay plus the
        input frame size, rounded up, so produced samples are never
        truncated. The returned frame carries the *actual* produced sample
        count, which may be less than the buffer capacity. Output frames
        carry no timestamp: the caller owns the output presentation clock.
    */
    pub fn convert(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        if frame.samples == 0 {
            return Err(Error::invalid_data("input frame has zero samples"));
        }

        if frame.planes.is_empty() {
            return Err(Error::invalid_data("input frame has no data"));
        }

        let needs_init = match &self.resampler_state {
            None => true,
            Some(state) => {
                state.src_sample_rate != frame.sample_rate
                    || state.src_channels != frame.channels
                    || state.src_format != frame.format
            }
        };

        if needs_init {
            self.init_resampler(frame.sample_rate, frame.channels, frame.format)?;
        }

        self.resample_frame(frame)
    }

    /**
        Flush any remaining samples out of the resampler.

        Call this at end of stream. Returns None if nothing is buffered.
    */
    pub fn flush(&mut self) -> Result<Option<AudioFrame>> {
        let state = match &mut self.resampler_state {
            Some(s) => s,
            None => return Ok(None),
        };

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);

        let delay_samples = state
            .context
            .delay()
            .map(|d| d.output as usize)
            .unwrap_or(0);
        if delay_samples == 0 {
            return Ok(None);
        }

        let mut dst_frame = AudioFrameFFmpeg::new(dst_sample, delay_samples, dst_layout);
        dst_frame.set_rate(self.config.sample_rate);

        match state.context.flush(&mut dst_frame) {
            Ok(_) => {}
            Err(e) => {
                if dst_frame.samples() == 0 {
                    return Ok(None);
                }
                return Err(Error::format(format!("resampler flush failed: {}", e)));
            }
        }

        let samples = dst_frame.samples();
        if samples == 0 {
            return Ok(None);
        }

        let planes =
            copy_planes_from_ffmpeg(&dst_frame, self.config.format, self.config.channels, samples)?;

        Ok(Some(AudioFrame::new(
            planes,
            samples,
            self.config.sample_rate,
            self.config.channels,
            self.config.format,
            None,
            Rational::new(1, self.config.sample_rate as i32),
        )))
    }

    /**
        Initialize or reinitialize the resampler for the given input format.
    */
    fn init_resampler(
        &mut self,
        src_sample_rate: u32,
        src_channels: ChannelLayout,
        src_format: SampleFormat,
    ) -> Result<()> {
        let src_sample = sample_format_to_ffmpeg(src_format)?;
        let src_layout = channel_layout_to_ffmpeg(src_channels);

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);

        let context = ResamplerContext::get(
            src_sample,
            src_layout,
            src_sample_rate,
            dst_sample,
            dst_layout,
            self.config.sample_rate,
        )
        .map_err(|e| Error::format(format!("failed to create resampler: {}", e)))?;

        self.resampler_state = Some(ResamplerState {
            context,
            src_sample_rate,
            src_channels,
            src_format,
        });

        Ok(())
    }

    /**
        Resample a frame using the initialized resampler.
    */
    fn resample_frame(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        let state = self
            .resampler_state
            .as_mut()
            .expect("resampler not initialized");

        let src_sample = sample_format_to_ffmpeg(frame.format)?;
        let src_layout = channel_layout_to_ffmpeg(frame.channels);
        let mut src_frame = AudioFrameFFmpeg::new(src_sample, frame.samples, src_layout);
        src_frame.set_rate(frame.sample_rate);

        copy_planes_to_ffmpeg(&mut src_frame, frame)?;

        // Pending delay plus this frame, rescaled to the output rate and
        // rounded up: the output buffer must never be under-sized.
        let delay = state.context.delay().map(|d| d.input).unwrap_or(0);
        let capacity = output_capacity(
            delay,
            frame.samples,
            frame.sample_rate,
            self.config.sample_rate,
        );

        let dst_sample = sample_format_to_ffmpeg(self.config.format)?;
        let dst_layout = channel_layout_to_ffmpeg(self.config.channels);
        let mut dst_frame = AudioFrameFFmpeg::new(dst_sample, capacity, dst_layout);
        dst_frame.set_rate(self.config.sample_rate);

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::format(format!("resampling failed: {}", e)))?;

        let actual_samples = dst_frame.samples();
        let planes = copy_planes_from_ffmpeg(
            &dst_frame,
            self.config.format,
            self.config.channels,
            actual_samples,
        )?;

        Ok(AudioFrame::new(
            planes,
            actual_samples,
            self.config.sample_rate,
            self.config.channels,
            self.config.format,
            None,
            Rational::new(1, self.config.sample_rate as i32),
        ))
    }
}

/**
    Output buffer capacity for one resample call.

    `ceil((delay + samples) * out_rate / in_rate)`. Rounding up guarantees
    the buffer is never under-sized, since under-sizing would truncate audio.
*/
fn output_capacity(delay_samples: i64, samples: usize, in_rate: u32, out_rate: u32) -> usize {
    let total = delay_samples.max(0) + samples as i64;
    let num = total * out_rate as i64 + in_rate as i64 - 1;
    (num / in_rate as i64) as usize
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
        _ => FFmpegChannelLayout::STEREO, // Default fallback
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

/**
    Copy plane data from an FFmpeg frame into per-plane buffers.
*/
fn copy_planes_from_ffmpeg(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    channels: ChannelLayout,
    samples: usize,
) -> Result<Vec<Vec<u8>>> {
    let bytes_per_sample = format.bytes_per_sample();

    if format.is_planar() {
        let plane_bytes = samples * bytes_per_sample;
        let count = channels.channels() as usize;

        if frame.planes() < count {
            return Err(Error::invalid_data(format!(
                "resampled frame has {} planes for {} channels",
                frame.planes(),
                count
            )));
        }

        let mut planes = Vec::with_capacity(count);
        for ch in 0..count {
            let plane_data = unsafe {
                let ptr = (*frame.as_ptr()).data[ch];
                std::slice::from_raw_parts(ptr, plane_bytes)
            };
            planes.push(plane_data.to_vec());
        }
        Ok(planes)
    } else {
        let total_bytes = samples * channels.channels() as usize * bytes_per_sample;
        let plane0 = frame.data(0);
        if plane0.len() < total_bytes {
            return Err(Error::invalid_data(format!(
                "resampled data has {} bytes, expected at least {}",
                plane0.len(),
                total_bytes
            )));
        }
        Ok(vec![plane0[..total_bytes].to_vec()])
    }
}

impl std::fmt::Debug for AudioResampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResampler")
            .field("config", &self.config)
            .field("initialized", &self.resampler_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_capacity_equal_rates() {
        assert_eq!(output_capacity(0, 1024, 48000, 48000), 1024);
        assert_eq!(output_capacity(10, 1024, 48000, 48000), 1034);
    }

    #[test]
    fn output_capacity_rounds_up() {
        // 441 input samples at 44.1k -> 48k is exactly 480.
        assert_eq!(output_capacity(0, 441, 44100, 48000), 480);
        // One extra input sample must round the buffer up, never down.
        assert_eq!(output_capacity(0, 442, 44100, 48000), 482);
        // Downsampling: 480 at 48k -> 44.1k is 441.
        assert_eq!(output_capacity(0, 480, 48000, 44100), 441);
        assert_eq!(output_capacity(0, 481, 48000, 44100), 442);
    }

    #[test]
    fn output_capacity_includes_delay() {
        assert_eq!(output_capacity(100, 441, 44100, 48000), 589);
    }
}
