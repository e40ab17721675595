/*!
    Opaque codec configuration for passing between crates.
*/

use ffmpeg_next::codec;

/**
    Opaque codec configuration.

    Holds an owned copy of codec parameters, extracted from a source stream
    for decoding or passthrough muxing, or from an opened encoder for the
    output stream. It's intentionally opaque to keep ffmpeg-next types out of
    the surrounding APIs, and owning the copy means it does not pin the
    context it came from.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
}

impl CodecConfig {
    /**
        Create a codec config from ffmpeg parameters.

        The parameters are deep-copied.
    */
    pub fn new(parameters: codec::Parameters) -> Self {
        Self {
            parameters: parameters.clone(),
        }
    }

    /**
        The codec these parameters describe.
    */
    pub fn id(&self) -> codec::Id {
        self.parameters.id()
    }

    /**
        Borrow the internal parameters.
    */
    pub fn parameters(&self) -> &codec::Parameters {
        &self.parameters
    }

    /**
        Take the internal parameters.
    */
    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl Clone for CodecConfig {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
        }
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("codec_id", &self.parameters.id())
            .finish_non_exhaustive()
    }
}
