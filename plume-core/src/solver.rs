use std::ops::Range;

use tracing::debug;

use crate::calibrate::Calibration;
use crate::config::{SimulationConfig, SourceSpec};
use crate::error::{SimError, SimResult};
use crate::grid::SimulationState;

/// Explicit (forward Euler) stepping of the diffusion equation with a point source.
///
/// Each sweep reads only the previous layer and writes only the current one:
///
/// ```text
/// u'[i][j] = u[i][j] + λτ/(ρc) · (u[i+1][j] + u[i-1][j] + u[i][j+1] + u[i][j-1] - 4u[i][j]) / h²
/// ```
///
/// and adds `Q` (unscaled by τ) at the source cell.
#[derive(Clone, Debug)]
pub struct DiffusionSolver {
    n: usize,
    coeff: f64,
    source: SourceSpec,
    range: Range<usize>,
}

impl DiffusionSolver {
    pub fn new(config: &SimulationConfig, calibration: &Calibration) -> SimResult<DiffusionSolver> {
        let h = calibration.h;
        if h == 0.0 || !h.is_finite() {
            return Err(SimError::DegenerateStep { h });
        }
        config.validate()?;

        let coeff = config.physics.stencil_coefficient(h);
        let range = config.sweep_domain.range(config.grid_size);
        debug!(
            h,
            coeff,
            domain = config.sweep_domain.as_str(),
            "diffusion solver ready"
        );

        Ok(DiffusionSolver {
            n: config.grid_size,
            coeff,
            source: config.source,
            range,
        })
    }

    pub fn coefficient(&self) -> f64 {
        self.coeff
    }

    /// Advances the state by one time layer. A state built for a different grid
    /// size is rejected untouched.
    pub fn sweep(&self, state: &mut SimulationState) -> SimResult<()> {
        if state.n() != self.n {
            return Err(SimError::invalid(format!(
                "state grid is {0}x{0} but the solver was built for {1}x{1}",
                state.n(),
                self.n
            )));
        }

        let n = self.n;
        let c = self.coeff;
        let src = self.source.y * n + self.source.x;

        {
            let (prev, next) = state.layers_mut();
            let u = prev.cells();
            let out = next.cells_mut();

            for y in self.range.clone() {
                let row = y * n;
                for x in self.range.clone() {
                    let i = row + x;

                    let lap = (u[i + n] + u[i - n] + u[i + 1] + u[i - 1]) - 4.0 * u[i];
                    out[i] = u[i] + c * lap;
                }
            }

            out[src] += self.source.emission_rate;
        }

        state.swap_buffers();
        Ok(())
    }

    pub fn run(&self, state: &mut SimulationState, steps: usize) -> SimResult<()> {
        for _ in 0..steps {
            self.sweep(state)?;
        }
        Ok(())
    }
}
