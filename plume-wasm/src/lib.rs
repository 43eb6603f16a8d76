use plume_core::{
    Calibration, DiffusionSolver, SimError, SimulationConfig, SimulationState, calibrate, sample,
};
use wasm_bindgen::prelude::*;

/// A stepping simulation for a browser front-end. Parameters are fixed at
/// construction; `reset` starts the field over with the same parameters.
#[wasm_bindgen]
pub struct Simulation {
    config: SimulationConfig,
    calibration: Calibration,
    solver: DiffusionSolver,
    state: SimulationState,
}

#[wasm_bindgen]
impl Simulation {
    /// Reference configuration with the given grid size, source cell and emission rate.
    #[wasm_bindgen(constructor)]
    pub fn new(
        n: usize,
        source_x: usize,
        source_y: usize,
        emission_rate: f64,
    ) -> Result<Simulation, JsValue> {
        let mut config = SimulationConfig::default();
        config.grid_size = n;
        config.source.x = source_x;
        config.source.y = source_y;
        config.source.emission_rate = emission_rate;
        Self::build(config).map_err(to_js)
    }

    /// Accepts the same JSON shape as the CLI's config file.
    pub fn from_json(json: &str) -> Result<Simulation, JsValue> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("config: {e}")))?;
        Self::build(config).map_err(to_js)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.state = SimulationState::initialize(&self.config).map_err(to_js)?;
        Ok(())
    }

    pub fn n(&self) -> usize { self.state.n() }
    pub fn h(&self) -> f64 { self.calibration.h }
    pub fn stability(&self) -> f64 { self.calibration.stability }
    pub fn coefficient(&self) -> f64 { self.solver.coefficient() }
    pub fn step_count(&self) -> usize { self.state.step_count() }

    // Copy-based JS access (reliable)
    pub fn get_field(&self) -> Vec<f64> {
        self.state.latest().cells().to_vec()
    }

    /// Near, middle and far probe concentrations.
    pub fn readings(&self) -> Result<Vec<f64>, JsValue> {
        let r = sample(self.state.latest(), &self.config.source, self.config.probe_offsets)
            .map_err(to_js)?;
        Ok(r.iter().map(|p| p.concentration).collect())
    }

    // Step + timing (WASM-only)
    pub fn step(&mut self, steps: usize) -> Result<StepInfo, JsValue> {
        let t0 = now_ms();
        self.solver.run(&mut self.state, steps).map_err(to_js)?;
        let t1 = now_ms();
        Ok(StepInfo {
            steps: steps as u32,
            compute_ms: t1 - t0,
            total: self.state.step_count() as u32,
        })
    }
}

impl Simulation {
    fn build(config: SimulationConfig) -> Result<Simulation, SimError> {
        let calibration = calibrate(&config.physics, &config.calibration)?;
        let state = SimulationState::initialize(&config)?;
        let solver = DiffusionSolver::new(&config, &calibration)?;
        sample(state.latest(), &config.source, config.probe_offsets)?;
        Ok(Simulation { config, calibration, solver, state })
    }
}

#[wasm_bindgen]
pub struct StepInfo {
    steps: u32,
    compute_ms: f64,
    total: u32,
}

#[wasm_bindgen]
impl StepInfo {
    pub fn steps(&self) -> u32 { self.steps }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
    pub fn total(&self) -> u32 { self.total }
}

fn to_js(e: SimError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
