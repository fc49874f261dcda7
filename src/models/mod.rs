//! Models that can be fit with [`fit`](crate::model::fit).

mod deuteron;

pub use deuteron::{fit_deuteron, fit_spectrum, LineshapeModel};
