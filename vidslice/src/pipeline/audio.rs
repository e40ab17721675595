use media_decode::AudioDecoder;
use media_encode::{AudioEncoder, SampleFifo};
use media_sink::SegmentSink;
use media_transform::AudioResampler;
use media_types::{AudioFrame, Packet, Pts, Result, StreamRebase};

/**
    The audio transcode stage: decode → resample → encode.

    Decoded frames are resampled to the encoder's format and buffered in a
    sample FIFO, from which the encoder is fed frames of exactly its
    required size (plus one short final frame at flush).

    Output presentation timestamps come exclusively from the running sample
    counter: each emitted frame is stamped with the samples produced so far,
    making the audio timeline a pure function of the input samples. The
    rebased input timestamps pin the stream origin but do not drive the
    clock.
*/
pub struct AudioStage {
    decoder: AudioDecoder,
    resampler: AudioResampler,
    fifo: SampleFifo,
    encoder: AudioEncoder,
    rebase: StreamRebase,
    /// Running output sample counter; the audio presentation clock.
    next_pts: i64,
    frame_size: Option<usize>,
}

impl AudioStage {
    pub fn new(decoder: AudioDecoder, resampler: AudioResampler, encoder: AudioEncoder) -> Self {
        let target = resampler.config();
        let fifo = SampleFifo::new(target.sample_rate, target.channels, target.format);
        let frame_size = encoder.frame_size();

        Self {
            decoder,
            resampler,
            fifo,
            encoder,
            rebase: StreamRebase::new(),
            next_pts: 0,
            frame_size,
        }
    }

    /**
        The encoder driving this stage, for wiring up the output stream.
    */
    pub fn encoder(&self) -> &AudioEncoder {
        &self.encoder
    }

    /**
        Feed one input packet through the stage.

        Zero decoded frames is not an error; decoders commonly buffer
        several packets at stream start. Returns the number of packets
        written to the sink.
    */
    pub fn process_packet(&mut self, packet: &Packet, sink: &mut SegmentSink) -> Result<u64> {
        let frames = self.decoder.decode(packet)?;

        let mut written = 0;
        for frame in &frames {
            written += self.push_frame(frame, sink)?;
        }
        Ok(written)
    }

    /**
        Flush the whole stage at end of input.

        Drains the decoder, the resampler tail, the FIFO remainder (as one
        short final frame), and finally the encoder's buffered packets.
    */
    pub fn finish(&mut self, sink: &mut SegmentSink) -> Result<u64> {
        let mut written = 0;

        let frames = self.decoder.flush()?;
        for frame in &frames {
            written += self.push_frame(frame, sink)?;
        }

        if let Some(tail) = self.resampler.flush()? {
            self.fifo.push(&tail)?;
        }

        written += self.encode_ready(sink, true)?;

        for packet in self.encoder.flush()? {
            sink.write(&packet)?;
            written += 1;
        }

        Ok(written)
    }

    fn push_frame(&mut self, frame: &AudioFrame, sink: &mut SegmentSink) -> Result<u64> {
        // Pin the stream origin from the first defined input timestamp; the
        // output clock is the sample counter, not this value.
        let _ = self.rebase.rebase(frame.pts, None);

        let resampled = self.resampler.convert(frame)?;
        self.fifo.push(&resampled)?;

        self.encode_ready(sink, false)
    }

    fn encode_ready(&mut self, sink: &mut SegmentSink, include_tail: bool) -> Result<u64> {
        let mut written = 0;

        loop {
            let chunk = match self.frame_size {
                Some(size) => size,
                None => self.fifo.len(),
            };
            let Some(frame) = self.fifo.pop(chunk) else {
                break;
            };
            written += self.encode_frame(frame, sink)?;
        }

        if include_tail {
            if let Some(frame) = self.fifo.drain() {
                written += self.encode_frame(frame, sink)?;
            }
        }

        Ok(written)
    }

    fn encode_frame(&mut self, mut frame: AudioFrame, sink: &mut SegmentSink) -> Result<u64> {
        frame.pts = Some(Pts(self.next_pts));
        self.next_pts += frame.samples as i64;

        let mut written = 0;
        for packet in self.encoder.encode(&frame)? {
            sink.write(&packet)?;
            written += 1;
        }
        Ok(written)
    }
}
