/*!
    Stream information types.
*/

use std::time::Duration;

use crate::{ChannelLayout, CodecId, Rational, SampleFormat};

/**
    Information about a video stream.
*/
#[derive(Clone, Debug)]
pub struct VideoStreamInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Codec used.
    pub codec_id: CodecId,
}

/**
    Information about an audio stream.
*/
#[derive(Clone, Debug)]
pub struct AudioStreamInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Sample format.
    pub sample_format: SampleFormat,
    /// Time base for timestamps.
    pub time_base: Rational,
    /// Codec used.
    pub codec_id: CodecId,
}

/**
    Combined information about a media source.
*/
#[derive(Clone, Debug, Default)]
pub struct MediaInfo {
    /// Total duration of the media (may be unavailable).
    pub duration: Option<Duration>,
    /// Video stream information (if video is present).
    pub video: Option<VideoStreamInfo>,
    /// Audio stream information (if audio is present).
    pub audio: Option<AudioStreamInfo>,
}

impl MediaInfo {
    /**
        Returns true if this media has video.
    */
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    /**
        Returns true if this media has audio.
    */
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_info_has_video_audio() {
        let mut info = MediaInfo::default();
        assert!(!info.has_video());
        assert!(!info.has_audio());

        info.audio = Some(AudioStreamInfo {
            sample_rate: 48000,
            channels: ChannelLayout::Stereo,
            sample_format: SampleFormat::F32p,
            time_base: Rational::new(1, 48000),
            codec_id: CodecId::Aac,
        });

        assert!(!info.has_video());
        assert!(info.has_audio());
    }
}
