/*!
    Sample FIFO for fixed-frame-size encoders.
*/

use media_types::{AudioFrame, ChannelLayout, Error, Rational, Result, SampleFormat};

/**
    Buffers samples across resample calls so the encoder always sees frames
    of its required size.

    Resamplers emit irregular batch sizes while codecs like AAC require a
    fixed sample count per frame; the FIFO absorbs the difference. Leftover
    samples carry over to the next call; whatever remains at end of stream
    is drained as one final short frame.

    Frames pushed into the FIFO must match its configured format exactly.
    Popped frames carry no timestamp; the caller owns the output
    presentation clock.
*/
pub struct SampleFifo {
    /// One growable buffer per plane.
    planes: Vec<Vec<u8>>,
    /// Buffered samples per channel.
    samples: usize,
    sample_rate: u32,
    channels: ChannelLayout,
    format: SampleFormat,
}

impl SampleFifo {
    /**
        Create a FIFO for the given frame format.
    */
    pub fn new(sample_rate: u32, channels: ChannelLayout, format: SampleFormat) -> Self {
        let plane_count = if format.is_planar() {
            channels.channels() as usize
        } else {
            1
        };

        Self {
            planes: vec![Vec::new(); plane_count],
            samples: 0,
            sample_rate,
            channels,
            format,
        }
    }

    /**
        Buffered samples per channel.
    */
    pub fn len(&self) -> usize {
        self.samples
    }

    /**
        Whether the FIFO holds no samples.
    */
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /**
        Append a frame's samples to the FIFO.
    */
    pub fn push(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.format != self.format
            || frame.channels != self.channels
            || frame.sample_rate != self.sample_rate
        {
            return Err(Error::invalid_data(
                "frame format does not match the fifo's configured format",
            ));
        }

        if frame.planes.len() != self.planes.len() {
            return Err(Error::invalid_data(format!(
                "frame has {} planes, fifo expects {}",
                frame.planes.len(),
                self.planes.len()
            )));
        }

        let plane_bytes = frame.plane_size();
        for (buffer, plane) in self.planes.iter_mut().zip(&frame.planes) {
            if plane.len() < plane_bytes {
                return Err(Error::invalid_data(format!(
                    "plane has {} bytes, expected {}",
                    plane.len(),
                    plane_bytes
                )));
            }
            buffer.extend_from_slice(&plane[..plane_bytes]);
        }

        self.samples += frame.samples;
        Ok(())
    }

    /**
        Take exactly `samples` samples, or None if fewer are buffered.
    */
    pub fn pop(&mut self, samples: usize) -> Option<AudioFrame> {
        if samples == 0 || self.samples < samples {
            return None;
        }
        Some(self.take(samples))
    }

    /**
        Take every buffered sample as one (possibly short) final frame.
    */
    pub fn drain(&mut self) -> Option<AudioFrame> {
        if self.samples == 0 {
            return None;
        }
        let samples = self.samples;
        Some(self.take(samples))
    }

    fn take(&mut self, samples: usize) -> AudioFrame {
        let per_sample = if self.format.is_planar() {
            self.format.bytes_per_sample()
        } else {
            self.format.bytes_per_sample() * self.channels.channels() as usize
        };
        let bytes = samples * per_sample;

        let planes: Vec<Vec<u8>> = self
            .planes
            .iter_mut()
            .map(|buffer| buffer.drain(..bytes).collect())
            .collect();
        self.samples -= samples;

        AudioFrame::new(
            planes,
            samples,
            self.sample_rate,
            self.channels,
            self.format,
            None,
            Rational::new(1, self.sample_rate as i32),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: usize, fill: u8) -> AudioFrame {
        let plane = vec![fill; samples * 4];
        AudioFrame::new(
            vec![plane.clone(), plane],
            samples,
            48000,
            ChannelLayout::Stereo,
            SampleFormat::F32p,
            None,
            Rational::new(1, 48000),
        )
    }

    fn fifo() -> SampleFifo {
        SampleFifo::new(48000, ChannelLayout::Stereo, SampleFormat::F32p)
    }

    #[test]
    fn pop_requires_a_full_chunk() {
        let mut fifo = fifo();
        fifo.push(&frame(600, 1)).expect("push");
        assert!(fifo.pop(1024).is_none());

        fifo.push(&frame(600, 2)).expect("push");
        let out = fifo.pop(1024).expect("chunk ready");
        assert_eq!(out.samples, 1024);
        assert_eq!(out.planes.len(), 2);
        assert_eq!(out.planes[0].len(), 1024 * 4);
        assert_eq!(fifo.len(), 176);
    }

    #[test]
    fn pop_preserves_sample_order() {
        let mut fifo = fifo();
        fifo.push(&frame(4, 0xaa)).expect("push");
        fifo.push(&frame(4, 0xbb)).expect("push");

        let out = fifo.pop(6).expect("pop");
        assert_eq!(&out.planes[0][..4 * 4], &[0xaa; 16]);
        assert_eq!(&out.planes[0][4 * 4..], &[0xbb; 8]);
        assert_eq!(fifo.len(), 2);
    }

    #[test]
    fn drain_emits_short_final_frame() {
        let mut fifo = fifo();
        assert!(fifo.drain().is_none());

        fifo.push(&frame(100, 3)).expect("push");
        let out = fifo.drain().expect("drain");
        assert_eq!(out.samples, 100);
        assert!(fifo.is_empty());
        assert!(fifo.drain().is_none());
    }

    #[test]
    fn push_rejects_mismatched_format() {
        let mut fifo = fifo();
        let mut wrong = frame(10, 0);
        wrong.sample_rate = 44100;
        assert!(fifo.push(&wrong).is_err());

        let packed = AudioFrame::new(
            vec![vec![0u8; 10 * 2 * 4]],
            10,
            48000,
            ChannelLayout::Stereo,
            SampleFormat::F32,
            None,
            Rational::new(1, 48000),
        );
        assert!(fifo.push(&packed).is_err());
    }

    #[test]
    fn packed_fifo_uses_one_plane() {
        let mut fifo = SampleFifo::new(48000, ChannelLayout::Stereo, SampleFormat::F32);
        let packed = AudioFrame::new(
            vec![vec![7u8; 10 * 2 * 4]],
            10,
            48000,
            ChannelLayout::Stereo,
            SampleFormat::F32,
            None,
            Rational::new(1, 48000),
        );
        fifo.push(&packed).expect("push");

        let out = fifo.pop(10).expect("pop");
        assert_eq!(out.planes.len(), 1);
        assert_eq!(out.planes[0].len(), 10 * 2 * 4);
    }
}
