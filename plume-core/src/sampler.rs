use serde::Serialize;

use crate::config::SourceSpec;
use crate::error::{SimError, SimResult};
use crate::grid::Grid;

/// One probe: where it sat and what it read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    pub row: usize,
    pub col: usize,
    pub concentration: f64,
}

/// Concentrations on the source row at three increasing distances upwind of it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Readings {
    pub near: Reading,
    pub middle: Reading,
    pub far: Reading,
}

impl Readings {
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        [&self.near, &self.middle, &self.far].into_iter()
    }
}

/// Reads `(y0, x0 - offset)` for each offset. Probes that would leave the grid are
/// an error, never clamped.
pub fn sample(grid: &Grid, source: &SourceSpec, offsets: [usize; 3]) -> SimResult<Readings> {
    let probe = |offset: usize| -> SimResult<Reading> {
        let out_of_bounds = SimError::ProbeOutOfBounds {
            row: source.y,
            column: source.x,
            offset,
            size: grid.n(),
        };
        let col = source.x.checked_sub(offset).ok_or(out_of_bounds.clone())?;
        let concentration = grid.get(source.y, col).ok_or(out_of_bounds)?;
        Ok(Reading {
            row: source.y,
            col,
            concentration,
        })
    };

    let [a, b, c] = offsets;
    Ok(Readings {
        near: probe(a)?,
        middle: probe(b)?,
        far: probe(c)?,
    })
}
