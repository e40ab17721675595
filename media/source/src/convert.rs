/*!
    Conversion utilities between ffmpeg-next types and media-types.
*/

use media_types::{ChannelLayout, CodecId, MediaDuration, Pts, Rational, SampleFormat};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert our Rational to ffmpeg_next::Rational.
*/
pub fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}

/**
    Convert ffmpeg_next sample format to our SampleFormat.
*/
pub fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::sample::Type;
    use ffmpeg_next::format::Sample;

    match format {
        Sample::U8(Type::Packed) => Some(SampleFormat::U8),
        Sample::I16(Type::Packed) => Some(SampleFormat::S16),
        Sample::I16(Type::Planar) => Some(SampleFormat::S16p),
        Sample::I32(Type::Packed) => Some(SampleFormat::S32),
        Sample::F32(Type::Packed) => Some(SampleFormat::F32),
        Sample::F32(Type::Planar) => Some(SampleFormat::F32p),
        Sample::F64(Type::Packed) => Some(SampleFormat::F64),
        _ => None,
    }
}

/**
    Convert channel count to our ChannelLayout.
*/
pub fn channel_layout_from_count(channels: u16) -> ChannelLayout {
    ChannelLayout::from_count(channels)
}

/**
    Convert ffmpeg_next codec ID to our CodecId.
*/
pub fn codec_id_from_ffmpeg(id: ffmpeg_next::codec::Id) -> Option<CodecId> {
    use ffmpeg_next::codec::Id;

    match id {
        // Video
        Id::H264 => Some(CodecId::H264),
        Id::HEVC => Some(CodecId::H265),
        Id::VP8 => Some(CodecId::Vp8),
        Id::VP9 => Some(CodecId::Vp9),
        Id::AV1 => Some(CodecId::Av1),
        Id::MPEG4 => Some(CodecId::Mpeg4),
        Id::MPEG2VIDEO => Some(CodecId::Mpeg2Video),
        // Audio
        Id::AAC => Some(CodecId::Aac),
        Id::OPUS => Some(CodecId::Opus),
        Id::MP3 => Some(CodecId::Mp3),
        Id::VORBIS => Some(CodecId::Vorbis),
        Id::FLAC => Some(CodecId::Flac),
        Id::AC3 => Some(CodecId::Ac3),
        Id::PCM_S16LE => Some(CodecId::PcmS16Le),
        Id::PCM_F32LE => Some(CodecId::PcmF32Le),
        _ => None,
    }
}

/**
    Create a Pts from an optional i64 timestamp.
*/
pub fn pts_from_ffmpeg(pts: Option<i64>) -> Option<Pts> {
    pts.map(Pts)
}

/**
    Create a MediaDuration from an i64 duration.
*/
pub fn duration_from_ffmpeg(duration: i64) -> MediaDuration {
    MediaDuration(duration)
}
