//! Measured impedance spectra.
//!
//! A [`Measurement`] is validated once when it is built: it is non-empty,
//! every frequency is finite and strictly positive, and every impedance is
//! finite. The angular frequencies `ω = 2πf` are derived at construction and
//! never change independently of the data.

use crate::error::{ConfigurationError, EisFitError, Result};
use crate::models::ImpedanceModel;
use log::debug;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One sample of an impedance spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpedanceRecord {
    /// Frequency in Hz
    pub frequency_hz: f64,

    /// Real part of the impedance in Ω
    pub z_real_ohm: f64,

    /// Imaginary part of the impedance in Ω
    pub z_imag_ohm: f64,
}

impl ImpedanceRecord {
    pub fn new(frequency_hz: f64, z_real_ohm: f64, z_imag_ohm: f64) -> Self {
        Self {
            frequency_hz,
            z_real_ohm,
            z_imag_ohm,
        }
    }
}

/// A validated, immutable impedance spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    frequency: Array1<f64>,
    omega: Array1<f64>,
    impedance: Array1<Complex64>,
}

impl Measurement {
    /// Build a measurement from records, preserving their order.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::EmptyMeasurement`] for no records,
    /// [`ConfigurationError::InvalidFrequency`] for a zero, negative or
    /// non-finite frequency and [`ConfigurationError::NonFiniteImpedance`]
    /// for a non-finite impedance component.
    pub fn new(records: &[ImpedanceRecord]) -> Result<Self> {
        let frequency = Array1::from_iter(records.iter().map(|r| r.frequency_hz));
        let impedance = Array1::from_iter(
            records
                .iter()
                .map(|r| Complex64::new(r.z_real_ohm, r.z_imag_ohm)),
        );
        Self::from_arrays(frequency, impedance)
    }

    /// Build a measurement from frequencies (Hz) and complex impedances.
    pub fn from_arrays(frequency: Array1<f64>, impedance: Array1<Complex64>) -> Result<Self> {
        if frequency.len() != impedance.len() {
            return Err(ConfigurationError::LengthMismatch {
                expected: frequency.len(),
                actual: impedance.len(),
            }
            .into());
        }
        if frequency.is_empty() {
            return Err(ConfigurationError::EmptyMeasurement.into());
        }

        for (index, (&f, z)) in frequency.iter().zip(impedance.iter()).enumerate() {
            if !(f.is_finite() && f > 0.0) {
                return Err(ConfigurationError::InvalidFrequency {
                    index,
                    frequency: f,
                }
                .into());
            }
            if !(z.re.is_finite() && z.im.is_finite()) {
                return Err(ConfigurationError::NonFiniteImpedance {
                    index,
                    real: z.re,
                    imag: z.im,
                }
                .into());
            }
        }

        let omega = frequency.mapv(|f| 2.0 * PI * f);
        Ok(Self {
            frequency,
            omega,
            impedance,
        })
    }

    /// Noiseless synthetic spectrum of `model` at the given frequencies (Hz).
    pub fn synthetic<M: ImpedanceModel>(model: &M, frequency: Array1<f64>) -> Result<Self> {
        let omega = frequency.mapv(|f| 2.0 * PI * f);
        let impedance = model.evaluate(&omega);
        Self::from_arrays(frequency, impedance)
    }

    /// Read a spectrum from comma separated text.
    ///
    /// The header row must name `Freq`, `Zreal` and `Zimag` columns, in any
    /// order and case; other columns are ignored. A units row directly below
    /// the header, where none of the three fields is a number, is skipped.
    /// Any other row that does not parse is an [`EisFitError::Parse`] naming
    /// its line.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let [fi, ri, ii] = header_columns(&headers)?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let line = row.position().map_or(index + 2, |p| p.line() as usize);

            let field = |i: usize| {
                row.get(i).ok_or_else(|| EisFitError::Parse {
                    line,
                    message: format!("expected at least {} columns, found {}", i + 1, row.len()),
                })
            };
            let (f, re, im) = (field(fi)?, field(ri)?, field(ii)?);

            match (f.parse::<f64>(), re.parse::<f64>(), im.parse::<f64>()) {
                (Ok(f), Ok(re), Ok(im)) => records.push(ImpedanceRecord::new(f, re, im)),
                (Err(_), Err(_), Err(_)) if index == 0 => {
                    debug!("Skipping units row {}: {:?}", line, row);
                }
                _ => {
                    return Err(EisFitError::Parse {
                        line,
                        message: format!("non-numeric sample ({}, {}, {})", f, re, im),
                    })
                }
            }
        }

        Self::new(&records)
    }

    /// Read a spectrum from a CSV file; see [`Measurement::from_csv_reader`].
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    /// Always false for a constructed measurement.
    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Frequencies in Hz.
    pub fn frequency(&self) -> &Array1<f64> {
        &self.frequency
    }

    /// Angular frequencies `2πf` in rad/s.
    pub fn omega(&self) -> &Array1<f64> {
        &self.omega
    }

    /// Measured complex impedances.
    pub fn impedance(&self) -> &Array1<Complex64> {
        &self.impedance
    }

    /// The samples as records.
    pub fn records(&self) -> Vec<ImpedanceRecord> {
        self.frequency
            .iter()
            .zip(self.impedance.iter())
            .map(|(&f, z)| ImpedanceRecord::new(f, z.re, z.im))
            .collect()
    }

    /// Smallest real part of the impedance.
    pub fn min_real(&self) -> f64 {
        self.impedance
            .iter()
            .map(|z| z.re)
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest real part of the impedance.
    pub fn max_real(&self) -> f64 {
        self.impedance
            .iter()
            .map(|z| z.re)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

fn header_columns(headers: &csv::StringRecord) -> Result<[usize; 3]> {
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EisFitError::Parse {
            line: 0,
            message: "missing header row".to_string(),
        });
    }
    let line = headers.position().map_or(1, |p| p.line() as usize);
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or_else(|| EisFitError::Parse {
                line,
                message: format!("header has no '{}' column", name),
            })
    };
    Ok([find("Freq")?, find("Zreal")?, find("Zimag")?])
}
