//! Point-source pollutant diffusion on a square grid, solved with an explicit
//! finite-difference scheme.
//!
//! A run goes calibrate → initialize → sweep `n` times → sample:
//!
//! ```
//! let outcome = plume_core::run(&plume_core::SimulationConfig::default()).unwrap();
//! assert!(outcome.readings.near.concentration >= outcome.readings.far.concentration);
//! ```

pub mod calibrate;
pub mod config;
pub mod error;
pub mod grid;
pub mod sampler;
pub mod solver;

use tracing::info;

pub use calibrate::{Calibration, calibrate};
pub use config::{
    CalibrationSettings, MAX_GRID_SIZE, PhysicalParameters, SimulationConfig, SourceSpec,
    SweepDomain,
};
pub use error::{SimError, SimResult};
pub use grid::{Grid, SimulationState};
pub use sampler::{Reading, Readings, sample};
pub use solver::DiffusionSolver;

/// Everything a run hands to the presentation layer.
#[derive(Clone, Debug)]
pub struct SimulationOutcome {
    pub calibration: Calibration,
    pub coefficient: f64,
    pub readings: Readings,
    pub grid: Grid,
}

pub fn run(config: &SimulationConfig) -> SimResult<SimulationOutcome> {
    let calibration = calibrate(&config.physics, &config.calibration)?;
    let mut state = SimulationState::initialize(config)?;
    let solver = DiffusionSolver::new(config, &calibration)?;

    // Probe positions do not depend on the field, so reject them before sweeping.
    sample(state.latest(), &config.source, config.probe_offsets)?;

    solver.run(&mut state, config.iterations)?;

    let readings = sample(state.latest(), &config.source, config.probe_offsets)?;
    info!(
        steps = state.step_count(),
        h = calibration.h,
        near = readings.near.concentration,
        middle = readings.middle.concentration,
        far = readings.far.concentration,
        "simulation finished"
    );

    Ok(SimulationOutcome {
        calibration,
        coefficient: solver.coefficient(),
        readings,
        grid: state.into_latest(),
    })
}
