use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Material and time constants for one run (air at 30 °C by default).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalParameters {
    /// λ
    pub diffusivity: f64,
    /// ρ
    pub density: f64,
    /// c
    pub specific_heat: f64,
    /// τ
    pub time_step: f64,
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        PhysicalParameters {
            diffusivity: 0.0267,
            density: 1.165,
            specific_heat: 1005.0,
            time_step: 0.01,
        }
    }
}

impl PhysicalParameters {
    /// `ρ·c·h² / (2λ)`, the largest time step the explicit scheme tolerates at step `h`.
    pub fn stability_bound(&self, h: f64) -> f64 {
        (self.density * self.specific_heat * h * h) / (2.0 * self.diffusivity)
    }

    /// `λ·τ / (ρ·c·h²)`, the weight applied to the five-point Laplacian.
    pub fn stencil_coefficient(&self, h: f64) -> f64 {
        (self.diffusivity * self.time_step) / (self.density * self.specific_heat * h * h)
    }
}

/// Emitter cell and the amount added to it on every sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    pub emission_rate: f64,
}

impl Default for SourceSpec {
    fn default() -> Self {
        SourceSpec {
            x: 20,
            y: 20,
            emission_rate: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// δh, the spacing of candidate steps.
    pub step_increment: f64,
    /// Candidates tried before giving up.
    pub max_steps: u64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        CalibrationSettings {
            step_increment: 0.0005,
            max_steps: 100_000,
        }
    }
}

/// Which cells a sweep writes. The Dirichlet border is never written by either variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepDomain {
    /// Rows and columns `1..N-1`.
    #[default]
    Interior,
    /// Rows and columns `1..N-2`: the second-to-last row and column are also held
    /// at their initial value, widening the fixed band on the bottom and right edges.
    /// The upper extent is one short of `Interior`'s.
    Truncated,
}

impl SweepDomain {
    pub fn range(&self, n: usize) -> Range<usize> {
        match self {
            SweepDomain::Interior => 1..n.saturating_sub(1),
            SweepDomain::Truncated => 1..n.saturating_sub(2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepDomain::Interior => "interior",
            SweepDomain::Truncated => "truncated",
        }
    }
}

/// Largest accepted `grid_size`; two layers of this size already take 1 GiB.
pub const MAX_GRID_SIZE: usize = 8192;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid_size: usize,
    pub iterations: usize,
    /// Dirichlet value held on every border cell.
    pub boundary_value: f64,
    pub physics: PhysicalParameters,
    pub source: SourceSpec,
    pub calibration: CalibrationSettings,
    pub sweep_domain: SweepDomain,
    /// Probe distances, in columns, to the left of the source on its row.
    pub probe_offsets: [usize; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            grid_size: 40,
            iterations: 100,
            boundary_value: 0.0,
            physics: PhysicalParameters::default(),
            source: SourceSpec::default(),
            calibration: CalibrationSettings::default(),
            sweep_domain: SweepDomain::default(),
            probe_offsets: [3, 6, 9],
        }
    }
}

impl SimulationConfig {
    /// Rejects shapes whose swept range is empty or that cannot be allocated, and
    /// sources the sweep would never reach.
    pub fn validate(&self) -> SimResult<()> {
        let n = self.grid_size;
        if n <= 2 {
            return Err(SimError::invalid(format!("grid_size must be >= 3, got {n}")));
        }
        if n > MAX_GRID_SIZE || n.checked_mul(n).is_none() {
            return Err(SimError::invalid(format!(
                "grid_size {n} exceeds the limit of {MAX_GRID_SIZE}"
            )));
        }

        let range = self.sweep_domain.range(n);
        if range.is_empty() {
            return Err(SimError::invalid(format!(
                "grid_size {n} leaves no cells to update with the {} sweep domain",
                self.sweep_domain.as_str()
            )));
        }

        let SourceSpec { x, y, .. } = self.source;
        if !range.contains(&x) || !range.contains(&y) {
            return Err(SimError::invalid(format!(
                "source ({x}, {y}) lies outside the updated cells {}..{}",
                range.start, range.end
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_reference_run() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.grid_size, 40);
        assert_eq!(cfg.iterations, 100);
        assert_eq!(cfg.boundary_value, 0.0);
        assert_eq!(cfg.source.x, 20);
        assert_eq!(cfg.source.y, 20);
        assert_eq!(cfg.source.emission_rate, 2.0);
        assert_eq!(cfg.calibration.step_increment, 0.0005);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn derived_quantities() {
        let p = PhysicalParameters::default();
        // 1.165 * 1005 * 1e-6 / 0.0534
        assert_relative_eq!(p.stability_bound(0.001), 0.021925561797752808, epsilon = 1e-12);
        // 0.000267 / 0.001170825
        assert_relative_eq!(p.stencil_coefficient(0.001), 0.22804432771763, epsilon = 1e-10);
    }

    #[test]
    fn sweep_ranges() {
        assert_eq!(SweepDomain::Interior.range(40), 1..39);
        assert_eq!(SweepDomain::Truncated.range(40), 1..38);
        assert!(SweepDomain::Truncated.range(3).is_empty());
    }

    #[test]
    fn rejects_tiny_grids() {
        for n in [0, 1, 2] {
            let cfg = SimulationConfig {
                grid_size: n,
                ..SimulationConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(SimError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn rejects_oversized_grids() {
        for n in [MAX_GRID_SIZE + 1, usize::MAX / 2, usize::MAX] {
            let cfg = SimulationConfig {
                grid_size: n,
                ..SimulationConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(SimError::InvalidConfiguration(_))));
        }

        let cfg = SimulationConfig {
            grid_size: MAX_GRID_SIZE,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_truncated_three_by_three() {
        let cfg = SimulationConfig {
            grid_size: 3,
            sweep_domain: SweepDomain::Truncated,
            source: SourceSpec { x: 1, y: 1, emission_rate: 1.0 },
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_source_on_border() {
        let mut cfg = SimulationConfig::default();
        cfg.source.x = 39;
        assert!(cfg.validate().is_err());

        cfg.source.x = 38;
        assert!(cfg.validate().is_ok());
        cfg.sweep_domain = SweepDomain::Truncated;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SimulationConfig = serde_json::from_str(
            r#"{ "iterations": 10, "source": { "emission_rate": 0.5 }, "sweep_domain": "truncated" }"#,
        )
        .unwrap();
        assert_eq!(cfg.iterations, 10);
        assert_eq!(cfg.grid_size, 40);
        assert_eq!(cfg.source.x, 20);
        assert_eq!(cfg.source.emission_rate, 0.5);
        assert_eq!(cfg.sweep_domain, SweepDomain::Truncated);
        assert_eq!(cfg.physics, PhysicalParameters::default());
    }
}
