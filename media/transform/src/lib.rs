/*!
    Audio frame resampling.

    Converts audio frames to a target sample rate, channel layout, and
    sample format ahead of encoding.
*/

mod audio;

pub use audio::{AudioResampler, ResampleConfig};
