/*!
    Packet and frame types.
*/

use crate::{ChannelLayout, MediaDuration, Pts, Rational, SampleFormat};

/**
    The role of an elementary stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
}

/**
    An encoded packet, as produced by a demuxer or encoder.

    Timestamps are in `time_base` ticks; undefined timestamps are `None`.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Encoded payload.
    pub data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Option<Pts>,
    /// Decoding timestamp.
    pub dts: Option<Pts>,
    /// Packet duration.
    pub duration: MediaDuration,
    /// Time base the timestamps are expressed in.
    pub time_base: Rational,
    /// Whether this packet starts a decodable unit.
    pub is_keyframe: bool,
    /// Which stream role this packet belongs to.
    pub stream_type: StreamType,
}

impl Packet {
    /**
        Create a new packet.
    */
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
        stream_type: StreamType,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
            stream_type,
        }
    }
}

/**
    A decoded (or resampled) audio frame.

    `planes` holds one buffer per plane: a single interleaved buffer for
    packed formats, one buffer per channel for planar formats. Every plane
    holds `samples * format.bytes_per_sample()` bytes (times the channel
    count for packed formats).
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    /// Raw sample data, one buffer per plane.
    pub planes: Vec<Vec<u8>>,
    /// Number of samples per channel.
    pub samples: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format.
    pub format: SampleFormat,
    /// Presentation timestamp, if defined.
    pub pts: Option<Pts>,
    /// Time base the timestamp is expressed in.
    pub time_base: Rational,
}

impl AudioFrame {
    /**
        Create a new audio frame.
    */
    pub fn new(
        planes: Vec<Vec<u8>>,
        samples: usize,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            planes,
            samples,
            sample_rate,
            channels,
            format,
            pts,
            time_base,
        }
    }

    /**
        The number of planes this frame's format calls for.
    */
    pub fn plane_count(&self) -> usize {
        if self.format.is_planar() {
            self.channels.channels() as usize
        } else {
            1
        }
    }

    /**
        Bytes per plane for this frame.
    */
    pub fn plane_size(&self) -> usize {
        let per_channel = self.samples * self.format.bytes_per_sample();
        if self.format.is_planar() {
            per_channel
        } else {
            per_channel * self.channels.channels() as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_frame_has_one_plane() {
        let frame = AudioFrame::new(
            vec![vec![0u8; 1024 * 2 * 4]],
            1024,
            48000,
            ChannelLayout::Stereo,
            SampleFormat::F32,
            Some(Pts(0)),
            Rational::new(1, 48000),
        );
        assert_eq!(frame.plane_count(), 1);
        assert_eq!(frame.plane_size(), 1024 * 2 * 4);
    }

    #[test]
    fn planar_frame_has_one_plane_per_channel() {
        let frame = AudioFrame::new(
            vec![vec![0u8; 1024 * 4], vec![0u8; 1024 * 4]],
            1024,
            48000,
            ChannelLayout::Stereo,
            SampleFormat::F32p,
            None,
            Rational::new(1, 48000),
        );
        assert_eq!(frame.plane_count(), 2);
        assert_eq!(frame.plane_size(), 1024 * 4);
    }
}
