//! `record` command implementation.

use contracts::{ContractError, FrameSource};
use ingestion::{FrameDirWriter, SynthFrameSource, SynthSourceConfig, MAX_FRAMES};
use tracing::info;

use crate::cli::RecordArgs;
use crate::commands::load_config;
use crate::error::{CliError, Result};

/// Execute the `record` command
pub fn run_record(args: &RecordArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let synth = SynthSourceConfig::from_input(&config.input);
    info!(
        out = %args.out.display(),
        frames = args.frames,
        seed = synth.seed,
        "Recording synthetic frames"
    );

    let written = record_frames(synth, args)?;
    println!("Wrote {written} frames to {}", args.out.display());
    Ok(())
}

fn record_frames(synth: SynthSourceConfig, args: &RecordArgs) -> Result<usize> {
    if args.frames > MAX_FRAMES as u64 {
        return Err(CliError::runtime(
            "invalid frame count",
            ContractError::invalid_argument(format!(
                "--frames {} exceeds the limit of {MAX_FRAMES}",
                args.frames
            )),
        ));
    }

    let mut source = SynthFrameSource::new(synth);
    source
        .open()
        .map_err(|e| CliError::runtime("failed to open synthetic source", e))?;

    let mut writer = FrameDirWriter::create(&args.out)
        .map_err(|e| CliError::runtime("failed to create frame directory", e))?;

    for _ in 0..args.frames {
        let Some(frame) = source
            .next_frame()
            .map_err(|e| CliError::runtime("failed to render frame", e))?
        else {
            break;
        };
        writer
            .write_frame(&frame)
            .map_err(|e| CliError::runtime("failed to write frame", e))?;
    }
    source.close();

    writer
        .finish()
        .map_err(|e| CliError::runtime("failed to write manifest", e))
}
