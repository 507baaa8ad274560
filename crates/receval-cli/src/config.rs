//! Configuration loading and path resolution for the CLI.
//!
//! The evaluation protocol is assembled in three layers, later ones winning:
//! 1. Built-in defaults (`receval_core::config`)
//! 2. An optional TOML file (`--config`)
//! 3. Command-line flags
//!
//! ```toml
//! output_dir = "splits"
//! recommender = "item_average"
//!
//! [evaluation]
//! test_fraction = 0.2
//! seed = 20
//! cutoffs = [5, 10]
//! strategy = "relevant_test_items"
//! metrics = ["precision", "ndcg", "rmse"]
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Args;
use directories::ProjectDirs;
use receval_core::config::{cutoffs_from_signed, EvaluationConfig};
use receval_core::metrics::Gain;
use receval_core::split::SplitterKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the split output directory
const OUTPUT_DIR_ENV: &str = "RECEVAL_OUTPUT_DIR";

/// Subdirectory of the platform data directory used for split files
const SPLITS_SUBDIR: &str = "splits";

/// Contents of a `--config` TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub evaluation: EvaluationConfig,
    pub output_dir: Option<PathBuf>,
    pub recommender: Option<String>,
}

/// Protocol flags shared by every subcommand. Unset flags keep the value
/// from the config file (or the default).
#[derive(Debug, Clone, Default, Args)]
pub struct ProtocolArgs {
    /// Fraction of preferences held out for testing, in (0, 1)
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Split all preferences together instead of per user
    #[arg(long)]
    pub global: bool,

    /// Use k-fold cross-validation (requires --folds >= 2)
    #[arg(long)]
    pub cross_validation: bool,

    /// Seed for every randomized step
    #[arg(long)]
    pub seed: Option<u64>,

    /// Put each user's most recent preferences in test instead of shuffling
    #[arg(long)]
    pub keep_order: bool,

    /// Number of folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Minimum test rating considered relevant
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Ranking cutoffs (comma-separated)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub cutoffs: Option<Vec<i64>>,

    /// Candidate strategy: test_items, train_items, relevant_test_items, all_items, rel_plus_n
    #[arg(long)]
    pub strategy: Option<String>,

    /// Sampled items per user for rel_plus_n
    #[arg(long)]
    pub rel_plus_n: Option<usize>,

    /// Metrics (comma-separated): precision, ndcg, recall, rmse, mae
    #[arg(long, value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    /// Use 2^rel - 1 gain for NDCG
    #[arg(long)]
    pub exponential_gain: bool,
}

impl ProtocolArgs {
    /// Applies every set flag on top of `config`.
    pub fn apply(&self, config: &mut EvaluationConfig) -> Result<()> {
        if let Some(fraction) = self.test_fraction {
            config.test_fraction = fraction;
        }
        if self.global {
            config.per_user = false;
        }
        if self.cross_validation {
            config.splitter = SplitterKind::CrossValidation;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.keep_order {
            config.keep_order = true;
        }
        if let Some(folds) = self.folds {
            config.num_folds = folds;
        }
        if let Some(threshold) = self.threshold {
            config.relevance_threshold = threshold;
        }
        if let Some(cutoffs) = &self.cutoffs {
            config.cutoffs = cutoffs_from_signed(cutoffs)?;
        }
        if let Some(strategy) = &self.strategy {
            config.strategy = strategy.clone();
        }
        if let Some(n) = self.rel_plus_n {
            config.rel_plus_n = n;
        }
        if let Some(metrics) = &self.metrics {
            config.metrics = metrics.clone();
        }
        if self.exponential_gain {
            config.ndcg_gain = Gain::Exponential;
        }
        config.validate()?;
        Ok(())
    }
}

/// Reads `path`, or returns defaults when no file was given.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Loads the file and layers the flags on top.
pub fn resolve(path: Option<&Path>, args: &ProtocolArgs) -> Result<(ConfigFile, EvaluationConfig)> {
    let file = load_config(path)?;
    let mut evaluation = file.evaluation.clone();
    args.apply(&mut evaluation)?;
    Ok((file, evaluation))
}

/// Directory for split files.
///
/// Search order:
/// 1. `--output-dir`
/// 2. `$RECEVAL_OUTPUT_DIR`
/// 3. `output_dir` from the config file
/// 4. The platform data directory
///    - Linux: `~/.local/share/receval/splits/`
///    - macOS: `~/Library/Application Support/org.receval.receval/splits/`
pub fn output_dir(cli_dir: Option<&PathBuf>, file_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = cli_dir {
        return Ok(dir.clone());
    }
    if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    if let Some(dir) = file_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("org", "receval", "receval")
        .map(|dirs| dirs.data_dir().join(SPLITS_SUBDIR))
        .ok_or_else(|| anyhow!("Could not determine data directory; pass --output-dir"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use receval_core::error::ConfigError;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let file = load_config(None).unwrap();
        assert_eq!(file.evaluation, EvaluationConfig::default());
        assert!(file.output_dir.is_none());
    }

    #[test]
    fn test_toml_file_and_overrides() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "recommender = \"popularity\"\n\n[evaluation]\nseed = 7\ncutoffs = [5]\nstrategy = \"all_items\""
        )
        .unwrap();

        let args = ProtocolArgs {
            cutoffs: Some(vec![10, 1]),
            ..ProtocolArgs::default()
        };
        let (file, config) = resolve(Some(tmp.path()), &args).unwrap();

        assert_eq!(file.recommender.as_deref(), Some("popularity"));
        assert_eq!(config.seed, 7);
        assert_eq!(config.strategy, "all_items");
        assert_eq!(config.cutoffs, [1, 10].into_iter().collect());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = ProtocolArgs {
            cutoffs: Some(vec![-3]),
            ..ProtocolArgs::default()
        };
        let err = args.apply(&mut EvaluationConfig::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidCutoff(-3))
        );

        let args = ProtocolArgs {
            strategy: Some("UserTest".to_string()),
            ..ProtocolArgs::default()
        };
        assert!(args.apply(&mut EvaluationConfig::default()).is_err());
    }

    #[test]
    fn test_unknown_toml_key_fails() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "sed = 3").unwrap();
        assert!(load_config(Some(tmp.path())).is_err());
    }

    #[test]
    fn test_unknown_evaluation_key_fails() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[evaluation]\nsed = 3\nstrategyy = \"nope\"").unwrap();
        assert!(load_config(Some(tmp.path())).is_err());
    }

    #[test]
    fn test_cli_output_dir_wins() {
        let cli = PathBuf::from("/tmp/receval-cli");
        let file = PathBuf::from("/tmp/receval-file");
        assert_eq!(output_dir(Some(&cli), Some(&file)).unwrap(), cli);
    }
}
