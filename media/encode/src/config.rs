/*!
    Encoder configuration types.
*/

use media_types::{ChannelLayout, CodecId, SampleFormat};

/**
    Configuration for audio encoding.
*/
#[derive(Clone, Debug)]
pub struct AudioEncoderConfig {
    /// Codec to use.
    pub codec: CodecId,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channels: ChannelLayout,
    /// Expected input sample format.
    pub sample_format: SampleFormat,
    /// Target bitrate in bits per second (None = codec default).
    pub bitrate: Option<u64>,
    /// Emit global codec headers, as segmented containers require.
    pub global_header: bool,
}

impl AudioEncoderConfig {
    /**
        Create a new audio encoder configuration.
    */
    pub fn new(codec: CodecId, sample_rate: u32, channels: ChannelLayout) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            sample_format: SampleFormat::F32p,
            bitrate: None,
            global_header: false,
        }
    }

    /**
        Create configuration for AAC encoding.
    */
    pub fn aac(sample_rate: u32, channels: ChannelLayout) -> Self {
        Self::new(CodecId::Aac, sample_rate, channels)
    }

    /**
        Set the target bitrate in bits per second.
    */
    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /**
        Set the input sample format.
    */
    pub fn with_sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = format;
        self
    }

    /**
        Request global codec headers.
    */
    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }
}
