use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const ROWS: usize = 500;
const REGIONS: [(&str, f64); 4] = [
    ("north", 0.05),
    ("south", 0.15),
    ("east", 0.08),
    ("west", 0.25),
];

/// Default probability of a borrower: young, low-income and western
/// borrowers default more often.
fn default_probability(age: i64, income: f64, region_risk: f64) -> f64 {
    let age_risk = if age < 30 { 0.15 } else if age >= 60 { 0.08 } else { 0.0 };
    let income_risk = if income < 25_000.0 { 0.2 } else { 0.0 };
    (region_risk + age_risk + income_risk).min(0.9)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut ages: Vec<i64> = Vec::with_capacity(ROWS);
    let mut incomes: Vec<Option<f64>> = Vec::with_capacity(ROWS);
    let mut regions: Vec<&str> = Vec::with_capacity(ROWS);
    let mut defaults: Vec<bool> = Vec::with_capacity(ROWS);

    for _ in 0..ROWS {
        let age = rng.gauss(45.0, 15.0).clamp(18.0, 90.0).round() as i64;
        let income = rng.gauss(45_000.0, 18_000.0).max(5_000.0).round();
        let (region, region_risk) = REGIONS[(rng.next_u64() % REGIONS.len() as u64) as usize];

        ages.push(age);
        // A few incomes are unreported.
        incomes.push((rng.next_f64() >= 0.03).then_some(income));
        regions.push(region);
        defaults.push(rng.next_f64() < default_probability(age, income, region_risk));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("age", DataType::Int64, false),
        Field::new("income", DataType::Float64, true),
        Field::new("region", DataType::Utf8, false),
        Field::new("default", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ages)),
            Arc::new(Float64Array::from(incomes)),
            Arc::new(StringArray::from(regions)),
            Arc::new(BooleanArray::from(defaults.clone())),
        ],
    )
    .context("creating record batch")?;

    // Write Parquet
    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    let defaulted = defaults.iter().filter(|d| **d).count();
    println!("Wrote {ROWS} borrowers ({defaulted} defaulted) to {output_path}");
    Ok(())
}
