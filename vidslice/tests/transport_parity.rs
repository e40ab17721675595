//! Cross-run parity: reading a resource through the custom transport must
//! yield output digest-identical to reading it directly.
//!
//! These tests need a real media file; point `VIDSLICE_PARITY_INPUT` at one
//! (any container with a video and an audio stream) to enable them. Without
//! it they skip.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use media_transport::{register_source, FileSource};
use media_types::Result;

use vidslice::parity;
use vidslice::pipeline::{self, CancelToken, PipelineConfig, RunOutcome};

const INPUT_ENV: &str = "VIDSLICE_PARITY_INPUT";

fn parity_input() -> Option<String> {
    match std::env::var(INPUT_ENV) {
        Ok(path) => {
            assert!(
                Path::new(&path).exists(),
                "{INPUT_ENV} points at a missing file: {path}"
            );
            Some(path)
        }
        Err(_) => {
            eprintln!("skipping: set {INPUT_ENV} to a local media file to run");
            None
        }
    }
}

fn run_once(input_url: String, outdir: PathBuf) -> Result<pipeline::RunSummary> {
    let config = PipelineConfig {
        input_url,
        playlist: outdir.join("out.m3u8"),
        segment_seconds: 4,
        audio_bitrate_kbps: 128,
        max_seconds: Some(600),
    };
    pipeline::run(&config, &CancelToken::new())
}

#[test]
fn transport_and_direct_runs_are_digest_equal() {
    let Some(input) = parity_input() else {
        return;
    };

    let registration = register_source(Arc::new(FileSource::new(&input)));
    let transport_url = registration.url();

    let direct_dir = tempfile::tempdir().expect("direct tempdir");
    let transport_dir = tempfile::tempdir().expect("transport tempdir");

    // Two independent runs on separate threads: no shared state beyond the
    // read-only registration.
    let direct = {
        let input = input.clone();
        let outdir = direct_dir.path().to_path_buf();
        thread::spawn(move || run_once(input, outdir))
    };
    let transport = {
        let outdir = transport_dir.path().to_path_buf();
        thread::spawn(move || run_once(transport_url, outdir))
    };

    let direct_summary = direct.join().expect("join direct").expect("direct run");
    let transport_summary = transport
        .join()
        .expect("join transport")
        .expect("transport run");

    assert_eq!(direct_summary.video_packets, transport_summary.video_packets);
    assert_eq!(direct_summary.audio_packets, transport_summary.audio_packets);

    parity::compare_trees(direct_dir.path(), transport_dir.path())
        .expect("transport output diverges from direct output");
}

#[test]
fn cancelled_run_still_finalizes_output() {
    let Some(input) = parity_input() else {
        return;
    };

    let outdir = tempfile::tempdir().expect("tempdir");
    let cancel = CancelToken::new();
    cancel.cancel();

    let config = PipelineConfig {
        input_url: input,
        playlist: outdir.path().join("out.m3u8"),
        segment_seconds: 4,
        audio_bitrate_kbps: 128,
        max_seconds: None,
    };

    // A pre-cancelled run writes nothing, but still takes the normal
    // flush-and-finalize path instead of erroring out.
    let summary = pipeline::run(&config, &cancel).expect("cancelled run");
    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.video_packets, 0);
    assert_eq!(summary.audio_packets, 0);
}

#[test]
fn cutoff_bounds_written_media_time() {
    let Some(input) = parity_input() else {
        return;
    };

    let outdir = tempfile::tempdir().expect("tempdir");
    let summary = run_once(input, outdir.path().to_path_buf()).expect("run");

    // Short fixtures end naturally; long ones stop at the cutoff.
    assert!(matches!(
        summary.outcome,
        RunOutcome::Completed | RunOutcome::Cutoff
    ));
    assert!(outdir.path().join("out.m3u8").exists());
    assert!(outdir.path().join("init.mp4").exists());
}
