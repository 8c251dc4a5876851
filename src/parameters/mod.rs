//! # Parameter System
//!
//! Circuit parameters are held in typed records (see [`crate::models`]); a
//! [`ParameterVector`] pairs an initial guess with lower and upper bound
//! records of the same model, so the three can never get out of step in
//! length or order. The flat array form exists only at the solver boundary.
//!
//! ## Example Usage
//!
//! ```rust
//! use eisfit_rs::models::Randles;
//! use eisfit_rs::parameters::ParameterVector;
//!
//! let guess = Randles { rs: 10.0, rct: 100.0, cdl: 1e-5, aw: 50.0 };
//! let params = ParameterVector::with_default_bounds(guess).unwrap();
//!
//! let bounds = params.box_bounds().unwrap();
//! assert_eq!(bounds.len(), 4);
//! ```

pub mod parameter;
pub mod vector;

// Re-export key types
pub use parameter::Parameter;
pub use vector::ParameterVector;
