//! Frame source selection from configuration.

use contracts::{FrameSource, InputConfig, InputKind};

use crate::{FrameDirSource, FrameDirSourceConfig, SynthFrameSource, SynthSourceConfig};

/// Build the source named by `input.type`. The returned source is not open.
pub fn source_from_config(input: &InputConfig) -> Box<dyn FrameSource> {
    match input.kind {
        InputKind::Synth => Box::new(SynthFrameSource::new(SynthSourceConfig::from_input(input))),
        InputKind::FrameDir => {
            Box::new(FrameDirSource::new(FrameDirSourceConfig::from_input(input)))
        }
    }
}
