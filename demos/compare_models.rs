//! Fit all three circuit models to one spectrum and compare the residuals.
//!
//! The spectrum is generated from a modified Randles circuit, so that model
//! should fit best. The fits run in parallel when the `parallel` feature is
//! enabled.

use eisfit_rs::models::{ImpedanceModel, ModelKind, ModifiedRandles};
use eisfit_rs::session::{FitOutcome, FitSession};
use eisfit_rs::Measurement;
use ndarray::Array1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let truth = ModifiedRandles {
        rs: 5.0,
        rsei: 8.0,
        qsei: 1e-5,
        nsei: 0.85,
        rct: 40.0,
        qdl: 1e-3,
        ndl: 0.9,
        aw: 5.0,
    };
    let measurement = Measurement::synthetic(&truth, Array1::logspace(10.0, -2.0, 5.0, 70))?;

    println!("Model comparison");
    println!("================\n");
    println!("True parameters: {:?}\n", truth.to_values());

    let outcomes: Vec<(ModelKind, eisfit_rs::Result<FitOutcome>)> = ModelKind::ALL
        .iter()
        .map(|&kind| (kind, FitSession::new(kind).run(&measurement)))
        .collect();

    println!("{:<40} {:>14} {:>8} {}", "model", "RMSE (Ω)", "nfev", "termination");
    for (kind, outcome) in &outcomes {
        match outcome {
            Ok(outcome) => {
                let summary = outcome.summary();
                println!(
                    "{:<40} {:>14.6e} {:>8} {}",
                    kind.name(),
                    summary.rmse,
                    summary.nfev,
                    summary.termination
                );
            }
            Err(e) => println!("{:<40} error: {}", kind.name(), e),
        }
    }

    for (_, outcome) in outcomes {
        if let Ok(FitOutcome::TwoRcThevenin(report)) = outcome {
            let (tau1, tau2) = report.result.parameters.time_constants();
            println!("\nThevenin time constants: τ1 = {:.3e} s, τ2 = {:.3e} s", tau1, tau2);
        }
    }

    #[cfg(feature = "parallel")]
    {
        let spectra: Vec<Measurement> = [1.0, 2.0, 4.0]
            .iter()
            .map(|&scale| {
                let model = ModifiedRandles {
                    rct: truth.rct * scale,
                    ..truth
                };
                Measurement::synthetic(&model, Array1::logspace(10.0, -2.0, 5.0, 70))
            })
            .collect::<eisfit_rs::Result<_>>()?;

        println!("\nBatch fit of {} spectra:", spectra.len());
        let session = FitSession::new(ModelKind::ModifiedRandles);
        for (i, result) in eisfit_rs::fit_batch(&session, &spectra).into_iter().enumerate() {
            let summary = result?.summary();
            println!(
                "  spectrum {}: Rct = {:.3} Ω ({})",
                i,
                summary.value("Rct").unwrap_or(f64::NAN),
                summary.termination
            );
        }
    }

    Ok(())
}
