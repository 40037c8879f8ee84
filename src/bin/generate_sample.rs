use std::path::PathBuf;

use anyhow::Result;
use rusty_sieve::data::{save_dataset, CellValue, Column, Dataset, SavePolicy, DEFAULT_SHEET};

/// Slow daily cycle plus a drift, the shape of a moored sensor reading.
fn baseline(t: f64) -> f64 {
    2.0 + 0.8 * (2.0 * std::f64::consts::PI * t / 288.0).sin() + 0.0005 * t
}

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

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_series.csv"));

    let mut rng = SimpleRng::new(42);
    let sondes = ["SONDE_01", "SONDE_02", "SONDE_03"];
    let rows = 2000;

    let mut time = Vec::with_capacity(rows);
    let mut sonde = Vec::with_capacity(rows);
    let mut chlorophyll = Vec::with_capacity(rows);
    let mut spikes = 0;

    for i in 0..rows {
        let t = i as f64;
        let mut value = baseline(t) + rng.gauss(0.0, 0.05);

        // Occasional sensor glitch far off the baseline.
        if rng.next_f64() < 0.01 {
            value += rng.gauss(0.0, 4.0).abs() + 2.0;
            spikes += 1;
        }

        // Occasional dropped reading.
        let cell = if rng.next_f64() < 0.005 {
            CellValue::Null
        } else {
            CellValue::Float(value)
        };

        time.push(CellValue::Integer(i as i64 * 5));
        sonde.push(CellValue::String(sondes[i * sondes.len() / rows].to_string()));
        chlorophyll.push(cell);
    }

    let dataset = Dataset::new(vec![
        Column::new("minutes", time),
        Column::new("sonde_id", sonde),
        Column::new("chlorophyll", chlorophyll),
    ])?;
    save_dataset(&dataset, &output_path, DEFAULT_SHEET, SavePolicy::Replace)?;

    println!(
        "Wrote {rows} readings with {spikes} injected spikes to {}",
        output_path.display()
    );
    Ok(())
}
