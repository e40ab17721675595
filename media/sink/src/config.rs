/*!
    Sink configuration.
*/

use std::time::Duration;

/**
    Configuration for a segmenting sink.
*/
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Target duration of each media segment.
    pub segment_duration: Duration,
}

impl SinkConfig {
    /**
        Create configuration for HLS output with the given segment duration.
    */
    pub fn hls(segment_duration: Duration) -> Self {
        Self { segment_duration }
    }
}
