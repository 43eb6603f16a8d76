use std::ops::Index;

use crate::config::SimulationConfig;
use crate::error::SimResult;

/// Square `n × n` concentration field, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    n: usize,
    cells: Vec<f64>,
}

impl Grid {
    pub fn filled(n: usize, value: f64) -> Grid {
        Grid {
            n,
            cells: vec![value; n * n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.n || col >= self.n {
            return None;
        }
        Some(self.cells[row * self.n + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n;
        &self.cells[start..start + self.n]
    }

    /// Border cells in a fixed order: top row, bottom row, then the left and
    /// right columns without their corners.
    pub fn border(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.n;
        let rows = (0..n).flat_map(move |x| [self.cells[x], self.cells[(n - 1) * n + x]]);
        let cols = (1..n.saturating_sub(1))
            .flat_map(move |y| [self.cells[y * n], self.cells[y * n + (n - 1)]]);
        rows.chain(cols)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [f64] {
        &mut self.cells
    }

    fn apply_dirichlet_bc(&mut self, value: f64) {
        let n = self.n;
        for x in 0..n {
            self.cells[x] = value;
            self.cells[(n - 1) * n + x] = value;
        }
        for y in 0..n {
            self.cells[y * n] = value;
            self.cells[y * n + (n - 1)] = value;
        }
    }
}

impl Index<(usize, usize)> for Grid {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.cells[row * self.n + col]
    }
}

/// The two time layers of a run. `previous` always holds the most recently
/// completed layer; `current` is scratch for the sweep in progress.
#[derive(Clone, Debug)]
pub struct SimulationState {
    current: Grid,
    previous: Grid,
    steps: usize,
}

impl SimulationState {
    /// Zero interior, `boundary_value` on the border, both layers identical.
    pub fn initialize(config: &SimulationConfig) -> SimResult<SimulationState> {
        config.validate()?;

        let mut current = Grid::filled(config.grid_size, 0.0);
        current.apply_dirichlet_bc(config.boundary_value);
        let previous = current.clone();

        Ok(SimulationState {
            current,
            previous,
            steps: 0,
        })
    }

    pub fn n(&self) -> usize {
        self.previous.n()
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn latest(&self) -> &Grid {
        &self.previous
    }

    pub fn into_latest(self) -> Grid {
        self.previous
    }

    /// Read side and write side of the next sweep.
    pub(crate) fn layers_mut(&mut self) -> (&Grid, &mut Grid) {
        (&self.previous, &mut self.current)
    }

    /// Hands the freshly written layer over to the read side. Cells a sweep skips
    /// are equal in both layers, so a swap is the same as copying the swept range back.
    pub(crate) fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSpec;

    fn config(n: usize, t: f64) -> SimulationConfig {
        SimulationConfig {
            grid_size: n,
            boundary_value: t,
            source: SourceSpec { x: n / 2, y: n / 2, emission_rate: 1.0 },
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn border_gets_boundary_value_and_interior_stays_zero() {
        let state = SimulationState::initialize(&config(6, 3.5)).unwrap();
        let g = state.latest();

        assert_eq!(g.border().count(), 4 * 6 - 4);
        assert!(g.border().all(|v| v == 3.5));
        for y in 1..5 {
            for x in 1..5 {
                assert_eq!(g[(y, x)], 0.0);
            }
        }
    }

    #[test]
    fn both_layers_start_identical() {
        let state = SimulationState::initialize(&config(7, -1.0)).unwrap();
        assert_eq!(state.current, state.previous);
        assert_eq!(state.step_count(), 0);
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(SimulationState::initialize(&config(2, 0.0)).is_err());
        assert!(SimulationState::initialize(&config(0, 0.0)).is_err());
    }

    #[test]
    fn get_is_bounds_checked() {
        let g = Grid::filled(4, 1.0);
        assert_eq!(g.get(3, 3), Some(1.0));
        assert_eq!(g.get(4, 0), None);
        assert_eq!(g.get(0, 4), None);
        assert_eq!(g.row(2).len(), 4);
    }

    #[test]
    fn swap_advances_step_count() {
        let mut state = SimulationState::initialize(&config(5, 0.0)).unwrap();
        {
            let (_, cur) = state.layers_mut();
            cur.cells_mut()[12] = 9.0;
        }
        state.swap_buffers();
        assert_eq!(state.step_count(), 1);
        assert_eq!(state.latest()[(2, 2)], 9.0);
    }
}
