//! Developer utility writing a synthetic classification dataset.
//!
//! Four houses, each with its own grade profile across four courses, plus a
//! categorical `Best Hand` column and a few empty cells. Writes CSV, or Parquet
//! when the output ends in `.parquet`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, Int64Array, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const COURSES: [&str; 4] = ["Astronomy", "Herbology", "Ancient Runes", "Flying"];

/// (house, mean grade per course)
const HOUSES: [(&str, [f64; 4]); 4] = [
    ("Gryffindor", [-250.0, -4.0, 420.0, 60.0]),
    ("Hufflepuff", [350.0, 4.0, 380.0, -20.0]),
    ("Ravenclaw", [550.0, 5.0, 640.0, 10.0]),
    ("Slytherin", [-450.0, -6.0, 360.0, -50.0]),
];

const GRADE_SPREAD: [f64; 4] = [80.0, 1.2, 30.0, 15.0];

/// Write a synthetic dataset for the describe/train/predict commands
#[derive(Parser, Debug)]
struct Args {
    /// Output file (.csv or .parquet)
    #[arg(default_value = "sample_data.csv")]
    output: PathBuf,

    /// Number of rows
    #[arg(long, default_value_t = 400)]
    rows: usize,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fraction of course cells left empty
    #[arg(long, default_value_t = 0.02)]
    missing: f64,

    /// Leave the house column empty, as in a prediction input
    #[arg(long)]
    unlabelled: bool,
}

struct Row {
    index: i64,
    house: Option<&'static str>,
    hand: &'static str,
    grades: [Option<f64>; 4],
}

/// Box-Muller transform for normal distribution
fn gauss<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.random::<f64>().max(1e-15);
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn generate(args: &Args) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    (0..args.rows)
        .map(|i| {
            let (house, means) = HOUSES[rng.random_range(0..HOUSES.len())];
            let mut grades = [None; 4];
            for (c, grade) in grades.iter_mut().enumerate() {
                if rng.random::<f64>() >= args.missing {
                    *grade = Some(gauss(&mut rng, means[c], GRADE_SPREAD[c]));
                }
            }
            Row {
                index: i as i64,
                house: (!args.unlabelled).then_some(house),
                hand: if rng.random_bool(0.5) { "Left" } else { "Right" },
                grades,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["Index", "Hogwarts House", "Best Hand"];
    header.extend(COURSES);
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.index.to_string(),
            row.house.unwrap_or("").to_string(),
            row.hand.to_string(),
        ];
        record.extend(
            row.grades
                .iter()
                .map(|g| g.map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let mut fields = vec![
        Field::new("Index", DataType::Int64, false),
        Field::new("Hogwarts House", DataType::Utf8, true),
        Field::new("Best Hand", DataType::Utf8, false),
    ];
    fields.extend(COURSES.iter().map(|c| Field::new(*c, DataType::Float64, true)));
    let schema = Arc::new(Schema::new(fields));

    let index = Int64Array::from_iter_values(rows.iter().map(|r| r.index));
    let mut house = StringBuilder::new();
    let mut hand = StringBuilder::new();
    for row in rows {
        house.append_option(row.house);
        hand.append_value(row.hand);
    }

    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(index),
        Arc::new(house.finish()),
        Arc::new(hand.finish()),
    ];
    for c in 0..COURSES.len() {
        let mut grades = Float64Builder::new();
        for row in rows {
            grades.append_option(row.grades[c]);
        }
        arrays.push(Arc::new(grades.finish()));
    }

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let rows = generate(&args);

    let is_parquet = args
        .output
        .extension()
        .is_some_and(|ext| ext == "parquet" || ext == "pq");
    if is_parquet {
        write_parquet(&args.output, &rows)?;
    } else {
        write_csv(&args.output, &rows)?;
    }

    println!("Wrote {} rows to {}", rows.len(), args.output.display());
    Ok(())
}
