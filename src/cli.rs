use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tabular_logreg::training::classifier::DEFAULT_EPOCHS;
use tabular_logreg::training::matrix::ScalingSource;
use tabular_logreg::training::TrainOptions;

pub const DEFAULT_TARGET: &str = "Hogwarts House";
pub const DEFAULT_FEATURES: [&str; 3] = ["Astronomy", "Herbology", "Ancient Runes"];

/// Column statistics and one-vs-all logistic regression for tabular files
#[derive(Parser, Debug, Clone)]
#[command(name = "tabular-logreg", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print count, mean, std, min, percentiles and max of every column
    Describe(DescribeArgs),

    /// Build a model from a data file
    Train(TrainArgs),

    /// Predict the target column of a data file from a trained model
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// Data file (.csv, .json or .parquet)
    pub file: PathBuf,

    /// First column index to show
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// Column index to stop before (all remaining columns when omitted)
    #[arg(long)]
    pub to: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Training data file (.csv, .json or .parquet)
    pub file: PathBuf,

    /// The features to train on
    #[arg(short = 'X', long = "features", num_args = 1.., default_values_t = DEFAULT_FEATURES.map(String::from))]
    pub features: Vec<String>,

    /// The column to train
    #[arg(short = 'Y', long = "target", default_value = DEFAULT_TARGET)]
    pub target: String,

    /// The output model name (".mlmodel" is appended)
    #[arg(short = 'o', long = "output", default_value = "train")]
    pub output: PathBuf,

    /// The learning rate, in (0, 1]
    #[arg(short = 'l', long = "learning-rate", default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Gradient descent epochs per class
    #[arg(short = 'e', long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    /// Keep this fraction of rows for training and report accuracy on the rest
    #[arg(short = 'a', long = "accuracy-split")]
    pub accuracy_split: Option<f64>,

    /// Shuffle seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Partition the standardization statistics are fitted on
    #[arg(long, value_enum, default_value_t = ScalingArg::Training)]
    pub scaling: ScalingArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingArg {
    Training,
    HeldOut,
}

impl From<ScalingArg> for ScalingSource {
    fn from(arg: ScalingArg) -> Self {
        match arg {
            ScalingArg::Training => ScalingSource::Training,
            ScalingArg::HeldOut => ScalingSource::HeldOut,
        }
    }
}

impl TrainArgs {
    pub fn options(&self) -> TrainOptions {
        TrainOptions {
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            accuracy_split: self.accuracy_split,
            seed: self.seed,
            scaling_source: self.scaling.into(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Data file whose target column is predicted
    pub file: PathBuf,

    /// The target column where the values should be predicted
    #[arg(short = 'Y', long = "target", default_value = DEFAULT_TARGET)]
    pub target: String,

    /// The model file used to predict values
    #[arg(short = 'm', long = "model", default_value = "train.mlmodel")]
    pub model: PathBuf,

    /// The csv file name for the predicted values
    #[arg(short = 's', long = "save")]
    pub save: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_defaults() {
        let cli = Cli::try_parse_from(["tabular-logreg", "train", "data.csv"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.features, DEFAULT_FEATURES.map(String::from));
        assert_eq!(args.target, DEFAULT_TARGET);
        let options = args.options();
        assert_eq!(options.learning_rate, 0.001);
        assert_eq!(options.accuracy_split, None);
        assert_eq!(options.scaling_source, ScalingSource::Training);
    }

    #[test]
    fn train_flags() {
        let cli = Cli::try_parse_from([
            "tabular-logreg", "train", "data.csv", "-X", "Flying", "Charms", "-a", "0.8", "--seed",
            "9", "--scaling", "held-out",
        ])
        .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.features, vec!["Flying", "Charms"]);
        let options = args.options();
        assert_eq!(options.accuracy_split, Some(0.8));
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.scaling_source, ScalingSource::HeldOut);
    }

    #[test]
    fn predict_defaults() {
        let cli = Cli::try_parse_from(["tabular-logreg", "predict", "test.csv"]).unwrap();
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.model, PathBuf::from("train.mlmodel"));
        assert_eq!(args.save, None);
    }
}
