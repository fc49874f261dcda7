//! Tests for the lineshape evaluator

mod properties;
mod symmetry;
