use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::pipeline::{self, CancelToken, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "vidslice")]
#[command(about = "Segment a media source into HLS, re-encoding audio to AAC")]
pub struct Args {
    /// Input URL: a file path or a registered vproto:// source
    pub input_url: String,

    /// Output playlist path; segments are written next to it
    pub playlist: PathBuf,

    /// Target duration of each segment, in seconds
    pub segment_seconds: u32,

    /// Audio bitrate in kbit/s
    pub audio_bitrate_kbps: u32,

    /// Stop reading input at this media time, in seconds
    pub max_seconds: Option<u32>,
}

impl Args {
    pub fn run(self) -> Result<()> {
        let config = PipelineConfig {
            input_url: self.input_url,
            playlist: self.playlist,
            segment_seconds: self.segment_seconds,
            audio_bitrate_kbps: self.audio_bitrate_kbps,
            max_seconds: self.max_seconds,
        };

        let cancel = CancelToken::new();
        let summary = pipeline::run(&config, &cancel).context("pipeline run failed")?;

        info!(
            video_packets = summary.video_packets,
            audio_packets = summary.audio_packets,
            outcome = ?summary.outcome,
            "run complete"
        );
        Ok(())
    }
}
