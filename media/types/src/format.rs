/*!
    Sample format, channel layout, and codec identifier types.
*/

/**
    Audio sample formats.

    Planar variants store each channel in its own buffer; packed variants
    interleave channels in a single buffer.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Unsigned 8-bit integer, packed.
    U8,
    /// Signed 16-bit integer, packed.
    S16,
    /// Signed 16-bit integer, planar.
    S16p,
    /// Signed 32-bit integer, packed.
    S32,
    /// 32-bit floating point, packed, range [-1.0, 1.0].
    F32,
    /// 32-bit floating point, planar.
    F32p,
    /// 64-bit floating point, packed.
    F64,
}

impl SampleFormat {
    /**
        Returns the number of bytes per sample per channel.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::F32 | Self::F32p => 4,
            Self::F64 => 8,
        }
    }

    /**
        Returns true if each channel lives in its own plane.
    */
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::S16p | Self::F32p)
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Left and right channels
    Stereo,
    /// 5.1 surround (FL, FR, FC, LFE, BL, BR)
    Surround5_1,
    /// 7.1 surround (FL, FR, FC, LFE, BL, BR, SL, SR)
    Surround7_1,
}

impl ChannelLayout {
    /**
        Returns the number of channels.
    */
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround5_1 => 6,
            Self::Surround7_1 => 8,
        }
    }

    /**
        Create a channel layout from a channel count.

        Falls back to the closest matching layout.
    */
    pub const fn from_count(count: u16) -> Self {
        match count {
            1 => Self::Mono,
            2 => Self::Stereo,
            6 => Self::Surround5_1,
            8 => Self::Surround7_1,
            3..=5 => Self::Surround5_1,
            _ => Self::Surround7_1,
        }
    }
}

/**
    Codec identifiers for the codecs this ecosystem handles.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg2Video,
    Mpeg4,
    // Audio
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    Ac3,
    PcmS16Le,
    PcmF32Le,
}

impl CodecId {
    /**
        Returns true for video codecs.
    */
    pub const fn is_video(self) -> bool {
        matches!(
            self,
            Self::H264 | Self::H265 | Self::Vp8 | Self::Vp9 | Self::Av1 | Self::Mpeg2Video | Self::Mpeg4
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_format_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F32p.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
    }

    #[test]
    fn sample_format_is_planar() {
        assert!(SampleFormat::F32p.is_planar());
        assert!(SampleFormat::S16p.is_planar());
        assert!(!SampleFormat::F32.is_planar());
        assert!(!SampleFormat::S16.is_planar());
    }

    #[test]
    fn channel_layout_channels() {
        assert_eq!(ChannelLayout::Mono.channels(), 1);
        assert_eq!(ChannelLayout::Stereo.channels(), 2);
        assert_eq!(ChannelLayout::from_count(2), ChannelLayout::Stereo);
        assert_eq!(ChannelLayout::from_count(6), ChannelLayout::Surround5_1);
    }

    #[test]
    fn codec_id_is_video() {
        assert!(CodecId::H265.is_video());
        assert!(!CodecId::Aac.is_video());
    }
}
