//! Utility functions and helpers for the eisfit-rs library.

pub mod finite_difference;
pub mod matrix_convert;

pub use finite_difference::{jacobian, jacobian_central_bounded, jacobian_forward_bounded};
pub use matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
