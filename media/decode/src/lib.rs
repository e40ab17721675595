/*!
    Audio decoding.

    Turns encoded packets into raw audio frames, preserving the decoder's
    plane layout.
*/

mod audio;

pub use audio::AudioDecoder;
