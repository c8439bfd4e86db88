use std::path::Path;
use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

const PORTFOLIOS: [(&str, f64, f64); 8] = [
    // (name, mean return %, spread)
    ("Carteira Dividendos", 6.0, 8.0),
    ("Small Caps", 4.0, 18.0),
    ("Carteira FIIs", 3.0, 6.0),
    ("BDR Global", 9.0, 12.0),
    ("Ações Quant", 5.0, 14.0),
    ("Renda Mensal", 2.5, 5.0),
    ("Top 10 Ações", 7.0, 10.0),
    ("Horizonte Longo", 1.0, 16.0),
];
const STATUSES: [&str; 3] = ["Ativa", "Ativa", "Pausada"];
const CLIENTS: usize = 150;
const ROWS: usize = 600;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Position {
    portfolio: &'static str,
    status: &'static str,
    client: String,
    position: f64,
    contributed: f64,
    return_pct: f64,
    entry: NaiveDate,
}

fn generate(rng: &mut SimpleRng) -> Vec<Position> {
    let first_day = NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid date");
    (0..ROWS)
        .map(|_| {
            let (portfolio, mean, spread) = PORTFOLIOS[rng.below(PORTFOLIOS.len())];
            let contributed = (rng.gauss(45_000.0, 30_000.0).abs() / 100.0).round() * 100.0 + 1_000.0;
            let return_pct = rng.gauss(mean, spread).max(-60.0);
            let position = contributed * (1.0 + return_pct / 100.0);
            Position {
                portfolio,
                status: STATUSES[rng.below(STATUSES.len())],
                client: format!("C{:04}", rng.below(CLIENTS) + 1),
                position: (position * 100.0).round() / 100.0,
                contributed,
                return_pct: (return_pct * 100.0).round() / 100.0,
                entry: first_day + Days::new(rng.below(700) as u64),
            }
        })
        .collect()
}

fn write_parquet(path: &Path, rows: &[Position]) {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");

    let schema = Arc::new(Schema::new(vec![
        Field::new("Carteira", DataType::Utf8, false),
        Field::new("Status", DataType::Utf8, false),
        Field::new("Cliente", DataType::Utf8, false),
        Field::new("Posição", DataType::Float64, false),
        Field::new("Valor aportado", DataType::Float64, false),
        Field::new("Rentabilidade", DataType::Float64, false),
        Field::new("Entrada", DataType::Date32, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.portfolio))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.status))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.client.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.position))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.contributed))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.return_pct))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| (r.entry - epoch).num_days() as i32),
            )),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn write_csv(path: &Path, rows: &[Position]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create output file");
    writer
        .write_record([
            "Carteira",
            "Status",
            "Cliente",
            "Posição",
            "Valor aportado",
            "Rentabilidade",
            "Entrada",
        ])
        .expect("Failed to write header");
    for r in rows {
        writer
            .write_record([
                r.portfolio.to_string(),
                r.status.to_string(),
                r.client.clone(),
                r.position.to_string(),
                r.contributed.to_string(),
                r.return_pct.to_string(),
                r.entry.format("%d/%m/%Y").to_string(),
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush output");
}

/// Usage: `generate_sample [output]`, where output ends in `.parquet`
/// (default `data/carteiras.parquet`) or `.csv`.
fn main() {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/carteiras.parquet".to_string());
    let path = Path::new(&output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).expect("Failed to create output directory");
    }

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(path, &rows),
        _ => write_parquet(path, &rows),
    }

    println!(
        "Wrote {} positions across {} portfolios to {output}",
        rows.len(),
        PORTFOLIOS.len()
    );
}
