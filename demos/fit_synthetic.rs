//! Fit a synthetic 42 %-polarized deuteron spectrum and print the report.
//!
//! Run with `RUST_LOG=debug cargo run --example fit_synthetic` to follow the
//! optimizer. An optional argument names a JSON fit configuration.

use deuteron_fit::{
    asymmetry_for_polarization, fit_spectrum, FitConfig, LineshapeParams, LineshapeValues,
    ParamName, Spectrum,
};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let truth = LineshapeValues {
        a: 0.03,
        g: -3e-5,
        r: asymmetry_for_polarization(0.42),
        wq: 0.027,
        wl: 32.69,
        eta: -0.02,
        xi: -0.001,
    };
    let freqs = Array1::linspace(32.5, 32.88, 400);
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let spectrum = Spectrum::synthetic(freqs, &truth, 5e-6, &mut rng)?;

    let config = match std::env::args().nth(1) {
        Some(path) => FitConfig::from_path(path)?,
        None => FitConfig::new(
            LineshapeParams::from_values([
                ("A", 0.03),
                ("G", -0.00003),
                ("r", 1.2),
                ("wQ", 0.027),
                ("wL", 32.69),
                ("eta", -0.02),
                ("xi", -0.001),
            ])?
            .with_physical_bounds()?
            .fix(ParamName::Eta),
        ),
    };

    let result = fit_spectrum(&spectrum, config.parameters, &config.optimizer)?;

    println!("{}", result);
    match result.polarization_stderr() {
        Some(err) => println!(
            "Deuteron polarization: {:.2}% +/- {:.2}%",
            100.0 * result.polarization(),
            100.0 * err
        ),
        None => println!("Deuteron polarization: {:.2}%", 100.0 * result.polarization()),
    }
    println!("Generated with:        {:.2}%", 100.0 * truth.polarization());

    Ok(())
}
