//! Command-line recorder: capture from one or more input devices for a few
//! seconds, then bounce to a WAV or write per-track PCM files.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use recorder_cpal::{CpalCaptureBackend, CpalDeviceRegistry, FsVault, PcmDecoder, SessionLog};
use recorder_core::{
    DeviceRegistry, LogDelegate, OutputMode, RecorderConfig, RecorderError, RecordingController,
};

#[derive(Parser)]
#[command(name = "trackrec", about = "Record microphone audio into WAV or per-track PCM files")]
struct Cli {
    /// List available input devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Seconds to record.
    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Input device name; default device when omitted.
    #[arg(long, default_value = "")]
    device: String,

    /// Output folder, relative to the current directory.
    #[arg(long, default_value = "recordings")]
    folder: String,

    /// Leading component of output file names.
    #[arg(long, default_value = "take")]
    prefix: String,

    /// Open one capture stream per track.
    #[arg(long)]
    multi_track: bool,

    /// Track count in multi-track mode (1–8).
    #[arg(long, default_value_t = 2)]
    tracks: usize,

    /// Write one native-format file per track instead of a merged WAV.
    #[arg(long)]
    separate_files: bool,

    /// Verbose diagnostics.
    #[arg(long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), RecorderError> {
    if cli.list_devices {
        for device in CpalDeviceRegistry.list_input_devices()? {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.label, marker);
        }
        return Ok(());
    }

    let mut config = RecorderConfig::default();
    config.file_prefix = cli.prefix;
    config.save_folder = cli.folder.clone();
    config.audio_device_id = cli.device;
    config.enable_multi_track = cli.multi_track;
    config.max_tracks = cli.tracks;
    config.output_mode = if cli.separate_files {
        OutputMode::Multiple
    } else {
        OutputMode::Single
    };
    config.debug = cli.debug;

    let mut controller = RecordingController::new(
        config,
        Arc::new(CpalCaptureBackend),
        Arc::new(CpalDeviceRegistry),
        Arc::new(PcmDecoder),
        Arc::new(FsVault::new(".")),
        Arc::new(SessionLog::new(format!("{}/session-log.md", cli.folder))),
    )?;
    controller.set_delegate(Arc::new(LogDelegate));

    controller.toggle_recording()?;
    println!("recording for {}s…", cli.seconds);
    thread::sleep(Duration::from_secs(cli.seconds));

    let Some(outcome) = controller.toggle_recording()? else {
        return Err(RecorderError::CaptureError("stop produced no outcome".into()));
    };

    println!(
        "saved {} file(s), {:.1}s captured",
        outcome.saved_count(),
        outcome.duration_secs
    );
    for file in &outcome.saved {
        println!("  {}", file.path);
    }
    if outcome.failed_tracks > 0 {
        eprintln!("{} track(s) failed to save", outcome.failed_tracks);
    }
    Ok(())
}
