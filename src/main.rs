mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, DescribeArgs, PredictArgs, TrainArgs};
use tabular_logreg::data::loader::load_file;
use tabular_logreg::pipeline;
use tabular_logreg::stats::describe::describe_range;
use tabular_logreg::training::ModelArtifact;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Describe(args) => describe(args),
        Command::Train(args) => train(args),
        Command::Predict(args) => predict(args),
    }
}

fn describe(args: DescribeArgs) -> Result<()> {
    let mut table = load_file(&args.file)?;
    pipeline::compute_attributes(&mut table, None);
    let to = args.to.unwrap_or(table.column_count()).min(table.column_count());
    let from = if args.from > to { 0 } else { args.from };
    print!("{}", describe_range(&table, from..to));
    Ok(())
}

fn train(args: TrainArgs) -> Result<()> {
    let options = args.options();
    // Fail on configuration before reading the data file.
    options.validate()?;

    let mut table = load_file(&args.file)?;
    let outcome = pipeline::train(&mut table, &args.target, &args.features, &options)?;

    let path = outcome
        .artifact
        .save(&args.output)
        .with_context(|| format!("saving model {}", args.output.display()))?;
    println!("model saved as {}", path.display());

    if let Some(evaluation) = outcome.evaluation {
        println!("Accuracy: {}", evaluation.accuracy);
        let labels: Vec<&str> = evaluation.confusion.labels().collect();
        println!("confusion matrix (rows=true, cols=pred): {}", labels.join(", "));
        for truth in &labels {
            let row: String = labels
                .iter()
                .map(|pred| format!("{:6}", evaluation.confusion.get(truth, pred)))
                .collect();
            println!("{row}");
        }
    }
    Ok(())
}

fn predict(args: PredictArgs) -> Result<()> {
    let artifact = ModelArtifact::load(&args.model)?;
    let mut table = load_file(&args.file)?;

    pipeline::predict(&mut table, &args.target, &artifact)?;
    println!("Predicted values");

    let path = pipeline::save_predictions(&table, &args.target, args.save.as_deref())?;
    println!("Saved csv file in {}", path.display());
    Ok(())
}
