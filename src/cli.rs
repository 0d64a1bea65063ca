//! Command-line surface of the `accentor` binary.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use crate::types::ProficiencyLevel;

#[derive(Parser, Debug)]
#[command(
    name = "accentor",
    about = "Score a pronunciation attempt against a reference recording"
)]
pub struct Cli {
    /// Learner audio file to evaluate (WAV, MP3, OGG, FLAC, ...).
    #[arg(value_name = "USER_AUDIO")]
    pub user_audio: PathBuf,

    /// Directory of reference recordings named `<phrase>_ref.<ext>`.
    #[arg(long = "reference-dir", requires = "phrase")]
    pub reference_dir: Option<PathBuf>,

    /// Target phrase, resolved against the reference directory.
    #[arg(long)]
    pub phrase: Option<String>,

    /// Direct path to a reference recording, bypassing the catalog.
    #[arg(long, conflicts_with_all = ["reference_dir", "phrase"])]
    pub reference: Option<PathBuf>,

    /// Declared proficiency level; higher levels are graded more strictly.
    #[arg(long, value_enum, default_value_t = ProficiencyLevel::Beginner)]
    pub level: ProficiencyLevel,

    /// Optional engine configuration JSON overriding the built-in defaults.
    #[arg(long = "config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

impl Cli {
    /// Clap enforces pair/conflict rules; this checks that one of the two
    /// reference modes was actually selected.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.reference.is_some() || self.reference_dir.is_some(),
            "provide either --reference FILE or --reference-dir DIR with --phrase"
        );
        ensure!(
            self.user_audio.is_file(),
            "user audio file does not exist: {:?}",
            self.user_audio
        );
        Ok(())
    }
}
