use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Every failure here is a deterministic configuration problem; none are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(
        "stability calibration failed after {attempts} attempts (last h = {last_h}, stability = {last_stability})"
    )]
    Calibration {
        attempts: u64,
        last_h: f64,
        last_stability: f64,
    },

    #[error("degenerate spatial step h = {h}; the stencil would divide by h^2")]
    DegenerateStep { h: f64 },

    #[error(
        "probe at row {row}, {offset} columns left of column {column}, is outside the {size}x{size} grid"
    )]
    ProbeOutOfBounds {
        row: usize,
        column: usize,
        offset: usize,
        size: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }
}
