use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use accentor::audio::decode_bytes;
use accentor::cli::Cli;
use accentor::config::EngineConfig;
use accentor::features::FeatureExtractor;
use accentor::{EvaluationResult, Evaluator};

// Catalog key used when a reference file is given directly.
const DIRECT_KEY: &str = "__direct_reference__";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    cli.validate()?;

    let config = match &cli.config_path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let user_bytes = fs::read(&cli.user_audio)
        .with_context(|| format!("failed to read user audio {:?}", cli.user_audio))?;
    let user_ext = extension_of(&cli.user_audio);

    let result = if let Some(reference) = &cli.reference {
        evaluate_against_file(&cli, config, reference, user_bytes, user_ext)?
    } else if let (Some(dir), Some(phrase)) = (&cli.reference_dir, &cli.phrase) {
        let evaluator = Evaluator::with_reference_dir(config, dir.clone());
        evaluator.evaluate(user_bytes, user_ext, phrase, cli.level)?
    } else {
        bail!("no reference mode selected");
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn evaluate_against_file(
    cli: &Cli,
    config: EngineConfig,
    reference: &Path,
    user_bytes: Vec<u8>,
    user_ext: Option<&str>,
) -> Result<EvaluationResult> {
    let reference_bytes = fs::read(reference)
        .with_context(|| format!("failed to read reference audio {:?}", reference))?;
    let reference_clip = decode_bytes(reference_bytes, extension_of(reference))?;
    let reference_bundle =
        FeatureExtractor::new(config.analysis.clone()).extract(&reference_clip)?;

    let parent = reference.parent().unwrap_or_else(|| Path::new("."));
    let evaluator = Evaluator::with_reference_dir(config, parent);
    evaluator.catalog().insert(DIRECT_KEY, reference_bundle);
    Ok(evaluator.evaluate(user_bytes, user_ext, DIRECT_KEY, cli.level)?)
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}
