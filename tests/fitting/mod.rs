//! End-to-end lineshape fits

mod errors;
mod polarization;
mod round_trip;
