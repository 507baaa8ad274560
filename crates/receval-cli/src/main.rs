//! receval CLI - offline evaluation of recommender output.
//!
//! # Usage
//!
//! ```bash
//! # Split a MovieLens file into train/test folds
//! receval split ratings.dat --folds 5 --output-dir splits/
//!
//! # Score an external recommender's predictions
//! receval evaluate --train splits/train_0.tsv --test splits/test_0.tsv \
//!     --predictions recs.tsv --cutoffs 5,10 --strategy relevant_test_items
//!
//! # Split, run a baseline recommender and evaluate every fold
//! receval run ratings.dat --recommender popularity --json
//!
//! # Paired t-test between two prediction files
//! receval compare --train train.tsv --test test.tsv a.tsv b.tsv
//! ```

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use receval_core::config::EvaluationConfig;
use receval_core::data::{self, DelimitedParser, Parser as _, PreferenceStore};
use receval_core::metrics::MetricKind;
use receval_core::pipeline::Evaluator;
use receval_core::recommend::RecommenderKind;
use receval_core::stats::{bootstrap_ci, cohens_d, pair_by_user, paired_t_test};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::ProtocolArgs;
use output::{ComparisonReport, MetricComparison, SplitFile, SplitSummary};

/// Bootstrap resamples for `compare`
const BOOTSTRAP_RESAMPLES: usize = 1000;

/// Recommender used by `run` when neither flag nor config names one
const DEFAULT_RECOMMENDER: &str = "item_average";

/// Offline evaluation toolkit for recommender systems.
///
/// Splits rating data into train/test folds, restricts each user's ranking
/// to a candidate set and scores predictions with ranking and error metrics.
#[derive(Parser)]
#[command(name = "receval", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with an [evaluation] table
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Split a rating file into train/test folds
    Split {
        /// Rating file
        input: PathBuf,

        /// Directory for train_<i>.tsv / test_<i>.tsv
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Replace existing split files
        #[arg(long)]
        overwrite: bool,

        #[arg(long, value_enum, default_value_t = InputFormat::Movielens)]
        format: InputFormat,

        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// Score a predictions file against a train/test pair
    Evaluate {
        #[arg(long)]
        train: PathBuf,

        #[arg(long)]
        test: PathBuf,

        /// Tab-separated user, item, score
        #[arg(long)]
        predictions: PathBuf,

        /// Format of the train and test files
        #[arg(long, value_enum, default_value_t = InputFormat::Tsv)]
        format: InputFormat,

        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// Split, recommend with a baseline and evaluate every fold
    Run {
        /// Rating file
        input: PathBuf,

        /// Baseline recommender: item_average, popularity
        #[arg(long)]
        recommender: Option<String>,

        /// Recommendations per user (default: every unrated item)
        #[arg(long)]
        how_many: Option<usize>,

        #[arg(long, value_enum, default_value_t = InputFormat::Movielens)]
        format: InputFormat,

        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// Compare two predictions files with paired significance tests
    Compare {
        #[arg(long)]
        train: PathBuf,

        #[arg(long)]
        test: PathBuf,

        /// Predictions of system A
        a: PathBuf,

        /// Predictions of system B
        b: PathBuf,

        #[arg(long, value_enum, default_value_t = InputFormat::Tsv)]
        format: InputFormat,

        #[command(flatten)]
        protocol: ProtocolArgs,
    },
}

/// Layout of rating files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// `user::item::rating::time` or tab-separated with timestamp
    Movielens,
    /// Tab-separated `user item preference [time]`
    Tsv,
}

impl InputFormat {
    fn parser(self) -> DelimitedParser {
        match self {
            InputFormat::Movielens => DelimitedParser::movielens(),
            InputFormat::Tsv => DelimitedParser::simple(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output = match &cli.command {
        Command::Split {
            input,
            output_dir,
            overwrite,
            format,
            protocol,
        } => {
            let (file, evaluation) = config::resolve(cli.config.as_deref(), protocol)?;
            let dir = config::output_dir(output_dir.as_ref(), file.output_dir.as_ref())?;
            let summary = split(input, *format, &dir, *overwrite, evaluation)?;
            if cli.json {
                output::format_json(&summary)
            } else {
                output::format_split(&summary)
            }
        }
        Command::Evaluate {
            train,
            test,
            predictions,
            format,
            protocol,
        } => {
            let (_, evaluation) = config::resolve(cli.config.as_deref(), protocol)?;
            let evaluator = Evaluator::new(evaluation)?;
            let train = load(train, *format)?;
            let test = load(test, *format)?;
            let predictions = load(predictions, InputFormat::Tsv)?;
            let fold = evaluator.evaluate_fold(0, &train, &test, &predictions);
            let report = evaluator.report(vec![fold], Vec::new());
            if cli.json {
                output::format_json(&report)
            } else {
                output::format_human(&report)
            }
        }
        Command::Run {
            input,
            recommender,
            how_many,
            format,
            protocol,
        } => {
            let (file, evaluation) = config::resolve(cli.config.as_deref(), protocol)?;
            let name = recommender
                .as_deref()
                .or(file.recommender.as_deref())
                .unwrap_or(DEFAULT_RECOMMENDER);
            let kind = RecommenderKind::from_name(name)?;
            let store = load(input, *format)?;
            let report = run(&store, kind, *how_many, evaluation, cli.json)?;
            if cli.json {
                output::format_json(&report)
            } else {
                output::format_human(&report)
            }
        }
        Command::Compare {
            train,
            test,
            a,
            b,
            format,
            protocol,
        } => {
            let (_, evaluation) = config::resolve(cli.config.as_deref(), protocol)?;
            let report = compare(train, test, a, b, *format, evaluation)?;
            if cli.json {
                output::format_json(&report)
            } else {
                output::format_comparison(&report)
            }
        }
    };

    println!("{}", output);
    Ok(())
}

fn load(path: &Path, format: InputFormat) -> Result<PreferenceStore> {
    format
        .parser()
        .parse_data(path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn split(
    input: &Path,
    format: InputFormat,
    dir: &Path,
    overwrite: bool,
    evaluation: EvaluationConfig,
) -> Result<SplitSummary> {
    let evaluator = Evaluator::new(evaluation)?;
    let store = load(input, format)?;
    let outcome = evaluator.split(&store)?;

    let mut folds = Vec::with_capacity(outcome.folds.len());
    for fold in &outcome.folds {
        let train_path = dir.join(format!("train_{}.tsv", fold.index));
        let test_path = dir.join(format!("test_{}.tsv", fold.index));
        data::write_store(&fold.train, &train_path, overwrite)
            .with_context(|| format!("Failed to write {}", train_path.display()))?;
        data::write_store(&fold.test, &test_path, overwrite)
            .with_context(|| format!("Failed to write {}", test_path.display()))?;
        folds.push(SplitFile {
            fold: fold.index,
            train_path,
            test_path,
            train_preferences: fold.train.num_preferences(),
            test_preferences: fold.test.num_preferences(),
        });
    }
    info!("Wrote {} folds to {}", folds.len(), dir.display());

    Ok(SplitSummary {
        input: input.to_path_buf(),
        users: store.num_users(),
        preferences: store.num_preferences(),
        folds,
        warnings: outcome.warnings.len(),
    })
}

fn run(
    store: &PreferenceStore,
    recommender: RecommenderKind,
    how_many: Option<usize>,
    evaluation: EvaluationConfig,
    quiet: bool,
) -> Result<receval_core::pipeline::EvaluationReport> {
    let evaluator = Evaluator::new(evaluation)?;
    let outcome = evaluator.split(store)?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(outcome.folds.len() as u64)
    };
    pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);
    pb.set_message(format!("Evaluating {}", recommender.name()));

    let mut folds = Vec::with_capacity(outcome.folds.len());
    for fold in &outcome.folds {
        let report = evaluator.run_fold(fold, recommender, how_many);
        if report.recommendation_failures > 0 {
            warn!(
                "Fold {}: {} users without recommendations",
                fold.index, report.recommendation_failures
            );
        }
        folds.push(report);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(evaluator.report(folds, outcome.warnings))
}

fn compare(
    train: &Path,
    test: &Path,
    a: &Path,
    b: &Path,
    format: InputFormat,
    evaluation: EvaluationConfig,
) -> Result<ComparisonReport> {
    let evaluator = Evaluator::new(evaluation)?;
    let train_store = load(train, format)?;
    let test_store = load(test, format)?;
    let predictions_a = load(a, InputFormat::Tsv)?;
    let predictions_b = load(b, InputFormat::Tsv)?;

    let report_a = evaluator.evaluate_fold(0, &train_store, &test_store, &predictions_a);
    let report_b = evaluator.evaluate_fold(0, &train_store, &test_store, &predictions_b);
    let seed = evaluator.config().seed;

    let mut comparisons = Vec::new();
    for kind in evaluator.config().metric_kinds()? {
        let name = kind.name();
        let (Some(result_a), Some(result_b)) = (report_a.metrics.get(name), report_b.metrics.get(name))
        else {
            continue;
        };
        let pairs = pair_by_user(&result_a.per_user, &result_b.per_user);
        let (values_a, values_b): (Vec<f64>, Vec<f64>) =
            pairs.iter().map(|&(_, va, vb)| (va, vb)).unzip();

        comparisons.push(MetricComparison {
            metric: describe(kind),
            a: bootstrap_ci(&output::defined_values(result_a), BOOTSTRAP_RESAMPLES, seed),
            b: bootstrap_ci(&output::defined_values(result_b), BOOTSTRAP_RESAMPLES, seed),
            t_test: paired_t_test(&result_a.per_user, &result_b.per_user),
            cohens_d: cohens_d(&values_a, &values_b),
        });
    }

    Ok(ComparisonReport {
        a: a.to_path_buf(),
        b: b.to_path_buf(),
        comparisons,
    })
}

fn describe(kind: MetricKind) -> String {
    if kind.lower_is_better() {
        format!("{} (lower is better)", kind.name())
    } else {
        kind.name().to_string()
    }
}
