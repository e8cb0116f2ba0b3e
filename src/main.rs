use anyhow::{Context, Result};
use clap::Parser;
use moodify::scan::collect_inputs;
use moodify::tagging::write_mood;
use moodify::{EmotionMatch, PipelineConfig, Predictor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "moodify")]
#[command(about = "Predict the emotion of music tracks from their audio", long_about = None)]
struct Args {
    /// Audio files or directories to analyze
    #[arg(required_unless_present = "validate")]
    inputs: Vec<PathBuf>,

    /// Valence network weights (.pth or .safetensors)
    #[arg(long, default_value = "~/.local/share/moodify/valence.pth")]
    valence_model: String,

    /// Arousal network weights (.pth or .safetensors)
    #[arg(long, default_value = "~/.local/share/moodify/arousal.pth")]
    arousal_model: String,

    /// Custom emotion tables (JSON)
    #[arg(long)]
    catalog: Option<String>,

    /// Print one JSON object per track instead of text
    #[arg(long)]
    json: bool,

    /// Cache the predicted emotion to the source file's MOOD tag
    #[arg(long)]
    write_mood: bool,

    /// Only load models and emotion tables, then exit
    #[arg(long)]
    validate: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn print_match(path: &std::path::Path, found: &EmotionMatch, json: bool) -> Result<()> {
    if json {
        #[derive(serde::Serialize)]
        struct Line<'a> {
            path: &'a std::path::Path,
            #[serde(flatten)]
            found: &'a EmotionMatch,
        }
        println!("{}", serde_json::to_string(&Line { path, found })?);
    } else {
        let color = found.color.map(|c| c.name()).unwrap_or("none");
        println!(
            "{}\t{}\t{}\tvalence={:.3}\tarousal={:.3}",
            path.display(),
            found.label,
            color,
            found.valence,
            found.arousal
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let valence_path = shellexpand::tilde(&args.valence_model);
    let arousal_path = shellexpand::tilde(&args.arousal_model);

    let mut config = PipelineConfig::new(
        PathBuf::from(valence_path.as_ref()),
        PathBuf::from(arousal_path.as_ref()),
    );
    if let Some(ref catalog) = args.catalog {
        config = config.with_catalog(PathBuf::from(shellexpand::tilde(catalog).as_ref()));
    }

    // Tables and models are checked once, before any file is touched
    let mapper = config
        .emotion_mapper()
        .context("Failed to load emotion tables")?;
    let predictor = Predictor::from_config(&config).context("Failed to load models")?;

    if args.validate {
        log::info!(
            "✅ Models and {} emotions loaded",
            mapper.catalog().len()
        );
        return Ok(());
    }

    let files = collect_inputs(&args.inputs);
    log::info!("Analyzing {} file(s)", files.len());

    let mut failed = 0usize;
    for path in &files {
        let result = predictor
            .predict(path)
            .and_then(|pair| mapper.map(pair));

        match result {
            Ok(found) => {
                log::info!(
                    "{:?}: {} ({}) at distance {:.3}",
                    path,
                    found.label,
                    found.color.map(|c| c.name()).unwrap_or("none"),
                    found.distance
                );
                print_match(path, &found, args.json)?;

                if args.write_mood {
                    if let Err(e) = write_mood(path, &found.label) {
                        log::warn!("Failed to cache mood for {:?}: {:#}", path, e);
                    }
                }
            }
            Err(e) => {
                log::error!("{:?}: {}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, files.len());
    }

    log::info!("Done");
    Ok(())
}
