/*!
    Segmented media output.

    Writes finalized packets into an HLS fMP4 container: an init object,
    numbered media segments, and an event playlist.
*/

mod config;
mod sink;

pub use config::SinkConfig;
pub use sink::{segment_pattern, SegmentSink};
