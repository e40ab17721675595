use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use media_decode::AudioDecoder;
use media_encode::{AudioEncoder, AudioEncoderConfig};
use media_sink::{SegmentSink, SinkConfig};
use media_source::{Demuxer, DemuxerConfig};
use media_transform::{AudioResampler, ResampleConfig};
use media_types::{
    rescale, ChannelLayout, Error, Pts, Rational, Result, SampleFormat, StreamRebase, StreamType,
};

use super::audio::AudioStage;
use super::cancel::CancelToken;

/// Encoder rate when the input does not report one.
const FALLBACK_SAMPLE_RATE: u32 = 48000;

/**
    Everything one pipeline run needs to know.
*/
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Input URL: a file path or a registered `vproto://` source.
    pub input_url: String,
    /// Output playlist path; segments land next to it.
    pub playlist: PathBuf,
    /// Target duration of each segment, in seconds.
    pub segment_seconds: u32,
    /// Audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
    /// Stop reading input at this media time, in seconds.
    pub max_seconds: Option<u32>,
}

/**
    How a run ended.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The input was read to its natural end.
    Completed,
    /// The configured media-time cutoff was reached.
    Cutoff,
    /// Cancellation was requested and observed between packets.
    Cancelled,
}

/**
    Counters and outcome of a finished run.
*/
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub video_packets: u64,
    pub audio_packets: u64,
}

/**
    Run the pipeline to completion, cutoff, or cancellation.

    Video is passed through with its timeline rebased to zero; audio is
    decoded, resampled, and re-encoded to AAC. Whatever happens mid-run, the
    sink is given the chance to finalize so partially-written segments stay
    structurally valid; the first error encountered is the one returned.
*/
pub fn run(config: &PipelineConfig, cancel: &CancelToken) -> Result<RunSummary> {
    let mut demuxer = Demuxer::open(&config.input_url, DemuxerConfig::default())?;

    if !demuxer.has_video() && !demuxer.has_audio() {
        return Err(Error::format("no audio or video streams found"));
    }

    let media_info = demuxer.media_info();
    info!(
        duration = ?media_info.duration,
        has_video = demuxer.has_video(),
        has_audio = demuxer.has_audio(),
        transport = demuxer.uses_transport(),
        "opened input"
    );

    let mut sink = SegmentSink::create(
        &config.playlist,
        SinkConfig::hls(Duration::from_secs(config.segment_seconds as u64)),
    )?;

    // The encoder must know the muxer's global-header requirement before it
    // opens, so the audio stage is built before any stream is added.
    let mut audio = match demuxer.take_audio_codec_config() {
        Some(codec_config) => {
            let time_base = demuxer.audio_time_base().unwrap();
            let decoder = AudioDecoder::new(codec_config, time_base)?;

            let sample_rate = match decoder.sample_rate() {
                0 => FALLBACK_SAMPLE_RATE,
                rate => rate,
            };

            let encoder = AudioEncoder::new(
                AudioEncoderConfig::aac(sample_rate, ChannelLayout::Stereo)
                    .with_sample_format(SampleFormat::F32p)
                    .with_bitrate(config.audio_bitrate_kbps as u64 * 1000)
                    .with_global_header(sink.needs_global_header()),
            )?;

            let resampler = AudioResampler::new(ResampleConfig::new(
                sample_rate,
                ChannelLayout::Stereo,
                SampleFormat::F32p,
            ));

            Some(AudioStage::new(decoder, resampler, encoder))
        }
        None => None,
    };

    // Stream order matches the input: video first, then audio.
    if let Some(codec_config) = demuxer.take_video_codec_config() {
        let time_base = demuxer.video_time_base().unwrap();
        sink.add_video_passthrough(&codec_config, time_base)?;
    }

    if let Some(stage) = &audio {
        let codec_config = stage.encoder().codec_config()?;
        sink.add_audio(&codec_config, stage.encoder().time_base())?;
    }

    sink.write_header()?;

    let mut summary = RunSummary {
        outcome: RunOutcome::Completed,
        video_packets: 0,
        audio_packets: 0,
    };

    let run_result = drive(&mut demuxer, &mut sink, &mut audio, config, cancel, &mut summary);

    // The sink always gets its finalization chance, success or failure.
    let finish_result = sink.finish();

    run_result?;
    finish_result?;
    Ok(summary)
}

fn drive(
    demuxer: &mut Demuxer,
    sink: &mut SegmentSink,
    audio: &mut Option<AudioStage>,
    config: &PipelineConfig,
    cancel: &CancelToken,
    summary: &mut RunSummary,
) -> Result<()> {
    let mut video_rebase = StreamRebase::new();

    loop {
        if cancel.is_cancelled() {
            summary.outcome = RunOutcome::Cancelled;
            break;
        }

        let Some(mut packet) = demuxer.next_packet()? else {
            break; // natural end of input
        };

        if let Some(max) = config.max_seconds {
            if reached_cutoff(packet.pts, packet.time_base, max) {
                // Hard stop: the packet at the cutoff is discarded.
                summary.outcome = RunOutcome::Cutoff;
                break;
            }
        }

        match packet.stream_type {
            StreamType::Video => {
                let (pts, dts) = video_rebase.rebase(packet.pts, packet.dts);
                packet.pts = pts;
                packet.dts = dts;
                sink.write(&packet)?;
                summary.video_packets += 1;
            }
            StreamType::Audio => {
                if let Some(stage) = audio.as_mut() {
                    summary.audio_packets += stage.process_packet(&packet, sink)?;
                }
            }
        }
    }

    // Flush the audio stage: the codecs may hold several frames' worth of
    // buffered output. The cutoff path skips this and goes straight to
    // finalization.
    if summary.outcome != RunOutcome::Cutoff {
        if let Some(stage) = audio.as_mut() {
            summary.audio_packets += stage.finish(sink)?;
        }
    }

    Ok(())
}

/**
    Whether a packet's timestamp, in whole seconds of its stream's time
    base, has reached the cutoff. Undefined timestamps never trigger it.
*/
fn reached_cutoff(pts: Option<Pts>, time_base: Rational, max_seconds: u32) -> bool {
    match pts {
        Some(Pts(p)) => rescale(p, time_base, Rational::SECONDS) >= max_seconds as i64,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Rational = Rational::new(1, 1000);

    #[test]
    fn cutoff_is_a_closed_boundary() {
        // A packet at exactly N-1 seconds is written; at N it is discarded.
        assert!(!reached_cutoff(Some(Pts(599_000)), MS, 600));
        assert!(reached_cutoff(Some(Pts(600_000)), MS, 600));
        assert!(reached_cutoff(Some(Pts(600_001)), MS, 600));
    }

    #[test]
    fn cutoff_ignores_undefined_timestamps() {
        assert!(!reached_cutoff(None, MS, 1));
    }

    #[test]
    fn cutoff_uses_the_packet_time_base() {
        let tb = Rational::new(1, 90000);
        assert!(!reached_cutoff(Some(Pts(850_000)), tb, 10));
        assert!(reached_cutoff(Some(Pts(900_000)), tb, 10));
    }
}
