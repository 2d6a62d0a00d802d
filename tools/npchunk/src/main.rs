//! npchunk
//!
//! Featurize POS-tagged text, train the log-linear backend, tag with the
//! greedy previous-label decoder, and score or analyze the result.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use npchunk_core::{
    AlignedFiles, ChunkScorer, Corpus, DecoderConfig, ErrorAnalysis, FeatureFamily, FeatureFile,
    FeatureMode, GreedyDecoder, InputFormat, LabelScheme, Layout, Placeholder, ScoreReport,
    TaggedFile, TemplateConfig, Templater, Trainer,
};
use npchunk_trainer::{
    FrequencyTrainer, LogLinearModel, TrainerConfig, ensure_scheme_labels, load_training_examples,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "npchunk")]
#[command(about = "Noun-group chunking with a greedy MaxEnt tagger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for parallel decoding (0 = one per core)
    #[arg(short = 'j', long, env = "NPCHUNK_THREADS", default_value_t = 0, global = true)]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a feature file from a POS or POS-chunk corpus
    Features {
        /// `train` reads WORD/POS/LABEL and appends the label; `tag` reads WORD/POS
        #[arg(short, long, default_value = "train")]
        mode: FeatureMode,
        input: PathBuf,
        output: PathBuf,
        /// Feature family to leave out (repeatable)
        #[arg(long = "disable", value_name = "FAMILY")]
        disable: Vec<FeatureFamily>,
    },
    /// Fit a model from a labeled feature file
    Train {
        features: PathBuf,
        model: PathBuf,
        /// Drop features seen fewer times than this
        #[arg(long, default_value_t = 1)]
        cutoff: usize,
        /// Additive smoothing
        #[arg(long, default_value_t = 0.1)]
        smoothing: f64,
    },
    /// Tag an unlabeled feature file
    Tag {
        features: PathBuf,
        model: PathBuf,
        output: PathBuf,
        /// Decode sentences one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// Featurize and tag a WORD/POS file in one step
    Chunk {
        input: PathBuf,
        model: PathBuf,
        output: PathBuf,
        #[arg(long = "disable", value_name = "FAMILY")]
        disable: Vec<FeatureFamily>,
        #[arg(long)]
        sequential: bool,
    },
    /// Score a response against a key
    Score {
        key: PathBuf,
        response: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Break the errors of a response down into tables
    Analyze {
        key: PathBuf,
        response: PathBuf,
        /// WORD/POS file with the same line structure as the key
        #[arg(long)]
        pos: Option<PathBuf>,
        #[arg(short, long, default_value = "analysis")]
        out_dir: PathBuf,
    },
}

fn template_config(disable: &[FeatureFamily]) -> TemplateConfig {
    disable
        .iter()
        .fold(TemplateConfig::default(), |config, &family| config.without(family))
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Write `target` through a sibling temporary file, renamed into place
/// only when `write` succeeds.
fn write_atomically<T, F>(target: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T>,
{
    let temp = temp_sibling(target);
    let result = File::create(&temp)
        .with_context(|| format!("cannot create {}", temp.display()))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let value = write(&mut writer)?;
            writer.flush()?;
            Ok(value)
        })
        .and_then(|value| {
            fs::rename(&temp, target)
                .with_context(|| format!("cannot move output into {}", target.display()))?;
            Ok(value)
        });
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_tagged(tagged: &TaggedFile, output: &Path, expected: &Layout) -> Result<()> {
    write_atomically(output, |w| {
        let written = tagged.write_to(w)?;
        expected.ensure_matches(&written, "tagged output")?;
        Ok(())
    })
    .with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), lines = expected.len(), "Wrote response");
    Ok(())
}

fn run_features(
    mode: FeatureMode,
    input: &Path,
    output: &Path,
    disable: &[FeatureFamily],
) -> Result<()> {
    let format = match mode {
        FeatureMode::Train => InputFormat::PosChunk,
        FeatureMode::Tag => InputFormat::Pos,
    };
    let corpus = Corpus::from_path(input, format)
        .with_context(|| format!("reading {}", input.display()))?;
    let templater = Templater::new(template_config(disable))?;
    let features = FeatureFile::from_corpus(&corpus, &templater, mode)?;

    let source = Layout::scan_path(input)?;
    write_atomically(output, |w| {
        let written = features.write_to(w)?;
        source.ensure_matches(&written, "feature file")?;
        Ok(())
    })
    .with_context(|| format!("writing {}", output.display()))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        sentences = corpus.sentence_count(),
        "Wrote features"
    );
    Ok(())
}

fn run_train(features: &Path, model: &Path, config: TrainerConfig) -> Result<()> {
    let file = FeatureFile::from_path(features, FeatureMode::Train)
        .with_context(|| format!("reading {}", features.display()))?;
    let examples = load_training_examples(&file, &Placeholder::default())?;
    ensure_scheme_labels(&examples, &LabelScheme::default())
        .with_context(|| format!("{} is not a labeled feature file", features.display()))?;
    let trained = FrequencyTrainer::new(config).train(&examples)?;
    write_atomically(model, |w| Ok(trained.write_to(w)?))
        .with_context(|| format!("writing {}", model.display()))?;
    info!(model = %model.display(), features = trained.feature_count(), "Saved model");
    Ok(())
}

fn decoder_config(sequential: bool) -> DecoderConfig {
    DecoderConfig::default().with_parallel(!sequential)
}

fn run_tag(features: &Path, model: &Path, output: &Path, sequential: bool) -> Result<()> {
    let file = FeatureFile::from_path(features, FeatureMode::Tag)
        .with_context(|| format!("reading {}", features.display()))?;
    let classifier = LogLinearModel::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let decoder = GreedyDecoder::new(&classifier, decoder_config(sequential))?;
    let tagged = decoder.decode_file(&file)?;
    write_tagged(&tagged, output, &Layout::scan_path(features)?)
}

fn run_chunk(
    input: &Path,
    model: &Path,
    output: &Path,
    disable: &[FeatureFamily],
    sequential: bool,
) -> Result<()> {
    let corpus = Corpus::from_path(input, InputFormat::Pos)
        .with_context(|| format!("reading {}", input.display()))?;
    let templater = Templater::new(template_config(disable))?;
    let features = FeatureFile::from_corpus(&corpus, &templater, FeatureMode::Tag)?;
    let classifier = LogLinearModel::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let decoder = GreedyDecoder::new(&classifier, decoder_config(sequential))?;
    let tagged = decoder.decode_file(&features)?;
    write_tagged(&tagged, output, &Layout::scan_path(input)?)
}

fn run_score(key: &Path, response: &Path) -> Result<ScoreReport> {
    let aligned = AlignedFiles::from_paths(key, response).with_context(|| {
        format!("aligning {} with {}", key.display(), response.display())
    })?;
    Ok(ChunkScorer::default().score_files(&aligned)?)
}

fn run_analyze(key: &Path, response: &Path, pos: Option<&Path>, out_dir: &Path) -> Result<()> {
    let mut aligned = AlignedFiles::from_paths(key, response).with_context(|| {
        format!("aligning {} with {}", key.display(), response.display())
    })?;
    if let Some(pos) = pos {
        let reader = BufReader::new(
            File::open(pos).with_context(|| format!("opening {}", pos.display()))?,
        );
        aligned = aligned
            .with_pos(reader)
            .with_context(|| format!("aligning POS file {}", pos.display()))?;
    }
    let analysis = ErrorAnalysis::analyze(&aligned, &LabelScheme::default())?;
    print!("{}", analysis.summary());

    // Stage the tables, then move each one into place.
    let staging = temp_sibling(out_dir);
    let written = analysis.write_to_dir(&staging);
    let moved = written.map_err(anyhow::Error::from).and_then(|files| {
        fs::create_dir_all(out_dir)?;
        for file in files {
            if let Some(name) = file.file_name() {
                fs::rename(&file, out_dir.join(name))?;
            }
        }
        Ok(())
    });
    let _ = fs::remove_dir_all(&staging);
    moved.with_context(|| format!("writing analysis to {}", out_dir.display()))?;
    println!("Wrote analysis to: {}", out_dir.display());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
        {
            warn!("Could not size the worker pool: {e}");
        }
    }

    match cli.command {
        Commands::Features {
            mode,
            input,
            output,
            disable,
        } => run_features(mode, &input, &output, &disable),
        Commands::Train {
            features,
            model,
            cutoff,
            smoothing,
        } => {
            let config = TrainerConfig::default()
                .with_cutoff(cutoff)
                .with_smoothing(smoothing);
            run_train(&features, &model, config)
        }
        Commands::Tag {
            features,
            model,
            output,
            sequential,
        } => run_tag(&features, &model, &output, sequential),
        Commands::Chunk {
            input,
            model,
            output,
            disable,
            sequential,
        } => run_chunk(&input, &model, &output, &disable, sequential),
        Commands::Score {
            key,
            response,
            json,
        } => {
            let report = run_score(&key, &response)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            Ok(())
        }
        Commands::Analyze {
            key,
            response,
            pos,
            out_dir,
        } => run_analyze(&key, &response, pos.as_deref(), &out_dir),
    }
}
