/*!
    Probing functionality for extracting media metadata.
*/

use std::time::Duration;

use ffmpeg_next::{format::context::Input as InputContext, media::Type};

use media_types::{AudioStreamInfo, Error, MediaInfo, Result, VideoStreamInfo};

use crate::convert::{
    channel_layout_from_count, codec_id_from_ffmpeg, rational_from_ffmpeg,
    sample_format_from_ffmpeg,
};

/**
    Probe a media source to extract metadata.

    A lightweight operation that opens the source just long enough to read
    stream information.
*/
pub fn probe(url: &str) -> Result<MediaInfo> {
    ffmpeg_next::init().map_err(|e| Error::format(e.to_string()))?;

    let input_ctx = ffmpeg_next::format::input(&url).map_err(|e| Error::format(e.to_string()))?;
    Ok(extract_media_info(&input_ctx))
}

/**
    Extract MediaInfo from an already-opened input context.

    Streams whose parameters cannot be interpreted are simply absent from
    the result; probing is informational and never fails a run.
*/
pub(crate) fn extract_media_info(input_ctx: &InputContext) -> MediaInfo {
    let video = extract_video_stream_info(input_ctx);
    let audio = extract_audio_stream_info(input_ctx);

    let duration = if input_ctx.duration() > 0 {
        Some(Duration::from_micros(input_ctx.duration() as u64))
    } else {
        None
    };

    MediaInfo {
        duration,
        video,
        audio,
    }
}

fn extract_video_stream_info(input_ctx: &InputContext) -> Option<VideoStreamInfo> {
    let stream = input_ctx.streams().best(Type::Video)?;
    let time_base = rational_from_ffmpeg(stream.time_base());

    let decoder_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = decoder_ctx.decoder().video().ok()?;

    let codec_id = codec_id_from_ffmpeg(stream.parameters().id())?;

    Some(VideoStreamInfo {
        width: decoder.width(),
        height: decoder.height(),
        time_base,
        codec_id,
    })
}

fn extract_audio_stream_info(input_ctx: &InputContext) -> Option<AudioStreamInfo> {
    let stream = input_ctx.streams().best(Type::Audio)?;
    let time_base = rational_from_ffmpeg(stream.time_base());

    let decoder_ctx =
        ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).ok()?;
    let decoder = decoder_ctx.decoder().audio().ok()?;

    let sample_format = sample_format_from_ffmpeg(decoder.format())?;
    let channels = channel_layout_from_count(decoder.channels());
    let codec_id = codec_id_from_ffmpeg(stream.parameters().id())?;

    Some(AudioStreamInfo {
        sample_rate: decoder.rate(),
        channels,
        sample_format,
        time_base,
        codec_id,
    })
}
