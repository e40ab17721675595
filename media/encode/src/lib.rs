/*!
    Audio encoding.

    Encodes raw audio frames into compressed packets, with a sample FIFO for
    codecs that require fixed-size frames.
*/

mod audio;
mod config;
mod fifo;

pub use audio::AudioEncoder;
pub use config::AudioEncoderConfig;
pub use fifo::SampleFifo;
