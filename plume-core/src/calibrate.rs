use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{CalibrationSettings, PhysicalParameters};
use crate::error::{SimError, SimResult};

/// Spatial step chosen for a run and the stability bound it reached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Calibration {
    pub h: f64,
    pub stability: f64,
}

/// Searches `h = k·δh` for `k = 0, 1, 2, ...` and stops at the first step where
/// `τ < ρ·c·h² / (2λ)`.
///
/// A δh that is not strictly positive fails before the search starts. The search is
/// capped at `settings.max_steps` candidates, so a non-positive λ (or a NaN parameter),
/// which never satisfies the bound, ends in [`SimError::Calibration`] as well.
pub fn calibrate(
    physics: &PhysicalParameters,
    settings: &CalibrationSettings,
) -> SimResult<Calibration> {
    let tau = physics.time_step;
    let dh = settings.step_increment;

    if !(dh > 0.0) {
        return Err(SimError::Calibration {
            attempts: 0,
            last_h: 0.0,
            last_stability: 0.0,
        });
    }

    let mut h = 0.0;
    let mut stability = 0.0;

    for k in 0..=settings.max_steps {
        h = k as f64 * dh;
        stability = physics.stability_bound(h);
        if tau < stability {
            debug!(k, h, stability, "calibrated spatial step");

            let coeff = physics.stencil_coefficient(h);
            if coeff > 0.25 {
                warn!(
                    coeff,
                    "stencil coefficient exceeds 1/4; the 2D explicit scheme may oscillate"
                );
            }
            return Ok(Calibration { h, stability });
        }
    }

    Err(SimError::Calibration {
        attempts: settings.max_steps.saturating_add(1),
        last_h: h,
        last_stability: stability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_parameters() {
        let cal =
            calibrate(&PhysicalParameters::default(), &CalibrationSettings::default()).unwrap();

        // h = 0.0005 gives 0.00548 < τ; h = 0.001 is the first to clear it.
        assert_relative_eq!(cal.h, 0.001, epsilon = 1e-15);
        assert_relative_eq!(cal.stability, 0.021925561797752804, epsilon = 1e-12);
        assert!(PhysicalParameters::default().time_step < cal.stability);
    }

    #[test]
    fn negative_diffusivity_is_capped() {
        // The bound is never positive, so no candidate clears it.
        let physics = PhysicalParameters {
            diffusivity: -0.0267,
            ..PhysicalParameters::default()
        };
        let settings = CalibrationSettings {
            max_steps: 1_000,
            ..CalibrationSettings::default()
        };

        match calibrate(&physics, &settings) {
            Err(SimError::Calibration { attempts, .. }) => assert_eq!(attempts, 1_001),
            other => panic!("expected calibration failure, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_increment_fails_immediately() {
        for dh in [0.0, -0.0005, f64::NAN] {
            let settings = CalibrationSettings {
                step_increment: dh,
                max_steps: 50,
            };
            let err = calibrate(&PhysicalParameters::default(), &settings).unwrap_err();
            assert!(matches!(err, SimError::Calibration { attempts: 0, .. }));
        }
    }

    #[test]
    fn step_is_aligned_to_increment() {
        let settings = CalibrationSettings {
            step_increment: 0.0001,
            max_steps: 1_000,
        };
        let cal = calibrate(&PhysicalParameters::default(), &settings).unwrap();
        // sqrt(τ·2λ/(ρc)) ≈ 0.000675, so k = 7.
        assert_relative_eq!(cal.h, 0.0007, epsilon = 1e-15);
    }

    #[test]
    fn nan_time_step_is_capped() {
        let physics = PhysicalParameters {
            time_step: f64::NAN,
            ..PhysicalParameters::default()
        };
        let settings = CalibrationSettings {
            max_steps: 10,
            ..CalibrationSettings::default()
        };
        assert!(calibrate(&physics, &settings).is_err());
    }

    #[test]
    fn negative_time_step_returns_zero_step() {
        let physics = PhysicalParameters {
            time_step: -1.0,
            ..PhysicalParameters::default()
        };
        let cal = calibrate(&physics, &CalibrationSettings::default()).unwrap();
        assert_eq!(cal.h, 0.0);
    }
}
