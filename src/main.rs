use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::{fs, process};

use examplan::allocation::build_archives;
use examplan::catalog::Catalog;
use examplan::manifest::write_manifests;
use examplan::types::{AllocConfig, ChunkLengthPolicy, RuntimePlan};

/// Examplan - training-example allocation planner
///
/// Decides which chunk of which utterance goes into which archive, and
/// writes the ranges.*, outputs.*, archive_chunk_lengths and pdf2num
/// manifests that a downstream example dumper consumes.
#[derive(Parser, Debug)]
#[command(name = "examplan")]
#[command(version = "0.1.0")]
#[command(about = "Training-example allocation planner", long_about = None)]
struct Args {
    /// utt2len table: `<utterance-id> <num-frames>` per line
    #[arg(value_name = "UTT2LEN")]
    utt2len: PathBuf,

    /// utt2lang table: `<utterance-id> <category>` per line, same
    /// utterance order as the utt2len table
    #[arg(value_name = "UTT2LANG")]
    utt2lang: PathBuf,

    /// Directory the manifests are written under (ranges/outputs go to
    /// its temp/ subdirectory)
    #[arg(value_name = "EGS_DIR")]
    egs_dir: PathBuf,

    /// Prefix added to every output file name (e.g. to distinguish train
    /// from diagnostic manifests)
    #[arg(long, default_value = "")]
    prefix: String,

    /// Minimum number of frames per chunk used for any archive
    #[arg(long, default_value_t = 50)]
    min_frames_per_chunk: u64,

    /// Maximum number of frames per chunk used for any archive
    #[arg(long, default_value_t = 300)]
    max_frames_per_chunk: u64,

    /// If true, pick each archive's chunk length uniformly at random;
    /// if false, chunk lengths follow a geometric sequence from min to max
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    randomize_chunk_length: bool,

    /// Target number of frames per archive
    #[arg(long, default_value_t = 1_000_000)]
    frames_per_iter: u64,

    /// Number of archives to plan
    #[arg(long, required_unless_present_any = ["plan_json", "plan_file"])]
    num_archives: Option<usize>,

    /// Number of jobs writing the archives; must not exceed --num-archives
    #[arg(long, required_unless_present_any = ["plan_json", "plan_file"])]
    num_jobs: Option<usize>,

    /// Seed for the random number generator
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Override for the category-histogram width (default: max category + 1)
    #[arg(long)]
    num_categories: Option<u32>,

    /// JSON plan specification (inline JSON string); overrides the tuning flags
    #[arg(long, value_name = "JSON", conflicts_with = "plan_file")]
    plan_json: Option<String>,

    /// Path to a JSON plan specification; overrides the tuning flags
    #[arg(long, value_name = "PATH", conflicts_with = "plan_json")]
    plan_file: Option<PathBuf>,
}

impl Args {
    /// Validate CLI arguments that do not belong to the allocation config.
    fn validate(&self) -> Result<()> {
        if !self.utt2len.is_file() {
            bail!("utt2len file does not exist: {:?}", self.utt2len);
        }
        if !self.utt2lang.is_file() {
            bail!("utt2lang file does not exist: {:?}", self.utt2lang);
        }
        if self.egs_dir.exists() && !self.egs_dir.is_dir() {
            bail!("egs dir path must be a directory: {:?}", self.egs_dir);
        }
        Ok(())
    }

    fn alloc_config(&self) -> Result<AllocConfig> {
        if self.plan_json.is_some() || self.plan_file.is_some() {
            let plan =
                load_plan_from_sources(self.plan_file.as_deref(), self.plan_json.as_deref())?;
            return Ok(plan.to_config()?);
        }

        let config = AllocConfig {
            min_frames_per_chunk: self.min_frames_per_chunk,
            max_frames_per_chunk: self.max_frames_per_chunk,
            chunk_length_policy: if self.randomize_chunk_length {
                ChunkLengthPolicy::Randomized
            } else {
                ChunkLengthPolicy::Geometric
            },
            frames_per_iter: self.frames_per_iter,
            // required_unless_present_any guarantees these when no plan is given
            num_archives: self.num_archives.unwrap_or(0),
            num_jobs: self.num_jobs.unwrap_or(0),
            seed: self.seed,
            num_categories: self.num_categories,
            prefix: self.prefix.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn load_plan_from_sources(path: Option<&Path>, json: Option<&str>) -> Result<RuntimePlan> {
    if let Some(p) = path {
        let data =
            fs::read_to_string(p).with_context(|| format!("Failed to read plan file {:?}", p))?;
        return parse_runtime_plan(&data);
    }

    if let Some(raw) = json {
        return parse_runtime_plan(raw);
    }

    bail!("No plan source provided"); // Should not happen due to validation
}

fn parse_runtime_plan(raw: &str) -> Result<RuntimePlan> {
    let plan: RuntimePlan = serde_json::from_str(raw).context("Failed to parse plan JSON")?;
    Ok(plan)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("examplan: {:#}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    args.validate()
        .context("Failed to validate command-line arguments")?;
    let config = args
        .alloc_config()
        .context("Failed to build allocation configuration")?;

    println!("Examplan v0.1.0 - Training-example allocation planner");
    println!("utt2len:  {:?}", args.utt2len);
    println!("utt2lang: {:?}", args.utt2lang);
    println!("egs dir:  {:?}", args.egs_dir);
    println!(
        "Planning {} archives across {} jobs (seed {})",
        config.num_archives, config.num_jobs, config.seed
    );

    let catalog = Catalog::load(&args.utt2len, &args.utt2lang)
        .context("Failed to load utterance catalog")?;
    println!(
        "Loaded {} utterances, max length {} frames, {} categories",
        catalog.num_utterances(),
        catalog.max_length(),
        catalog.distinct_categories().len()
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let archives =
        build_archives(&catalog, &config, &mut rng).context("Failed to build archives")?;

    let summary = write_manifests(&catalog, &config, &archives, &args.egs_dir)
        .context("Failed to write manifest files")?;
    println!(
        "Wrote {} manifest files covering {} chunks under {:?}",
        summary.files_written.len(),
        summary.total_chunks,
        args.egs_dir
    );
    println!(
        "Per-category chunk counts: {}",
        summary
            .category_counts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(())
}
