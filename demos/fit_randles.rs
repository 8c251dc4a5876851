//! Fit a Randles circuit to an impedance spectrum.
//!
//! Usage: `cargo run --example fit_randles [spectrum.csv]`
//!
//! The CSV file needs `Freq`, `Zreal` and `Zimag` columns. Without a file a
//! synthetic spectrum with 1 % noise is fitted instead.

use eisfit_rs::models::{ModelKind, Randles};
use eisfit_rs::session::{FitOutcome, FitSession};
use eisfit_rs::{ImpedanceRecord, Measurement};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn synthetic_spectrum() -> Result<Measurement, Box<dyn std::error::Error>> {
    let truth = Randles {
        rs: 12.0,
        rct: 85.0,
        cdl: 2.2e-5,
        aw: 40.0,
    };
    println!("Synthetic spectrum from {:?}\n", truth);

    let clean = Measurement::synthetic(&truth, Array1::logspace(10.0, -1.0, 5.0, 60))?;
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.01)?;
    let records: Vec<ImpedanceRecord> = clean
        .records()
        .into_iter()
        .map(|r| {
            ImpedanceRecord::new(
                r.frequency_hz,
                r.z_real_ohm * (1.0 + noise.sample(&mut rng)),
                r.z_imag_ohm * (1.0 + noise.sample(&mut rng)),
            )
        })
        .collect();

    Ok(Measurement::new(&records)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Randles circuit fit");
    println!("===================\n");

    let measurement = match std::env::args().nth(1) {
        Some(path) => {
            println!("Reading {}\n", path);
            Measurement::from_csv_path(path)?
        }
        None => synthetic_spectrum()?,
    };

    let outcome = FitSession::new(ModelKind::Randles).run(&measurement)?;
    let summary = outcome.summary();
    println!("{}", summary);

    if outcome.termination().is_failure() {
        println!("The fit failed numerically; try tighter bounds or another start.");
    } else if !summary.converged {
        println!("The fit stopped early: {}", outcome.termination());
    }

    if let FitOutcome::Randles(report) = &outcome {
        println!("Nyquist data (Re Z, -Im Z):");
        println!("{:>12} {:>12} {:>12} {:>12}", "measured", "", "fitted", "");
        let series = report.nyquist();
        for (m, f) in series.measured.iter().zip(&series.fitted).step_by(6) {
            println!("{:>12.4} {:>12.4} {:>12.4} {:>12.4}", m.0, m.1, f.0, f.1);
        }
    }

    println!("\nJSON summary:\n{}", summary.to_json()?);
    Ok(())
}
