// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{PicError, PicResult};
use crate::grid::{IntVect, SpaceDim};
use serde::{Deserialize, Serialize};

/// Field solver algorithm selected in the input deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectromagneticSolverAlgo {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "yee")]
    Yee,
    #[serde(rename = "ckc")]
    Ckc,
    #[serde(rename = "psatd")]
    Psatd,
    #[serde(rename = "ect")]
    Ect,
    #[serde(rename = "hybrid_pic")]
    HybridPic,
}

/// Placement of the field components on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridType {
    #[serde(rename = "staggered")]
    Staggered,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "collocated")]
    Collocated,
}

/// Field gather flavour, which changes the gather stencil width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldGathering {
    #[serde(rename = "energy-conserving")]
    EnergyConserving,
    #[serde(rename = "momentum-conserving")]
    MomentumConserving,
}

// ──────────────────────────── nonlinear ─────────────────────────────

/// Outer iteration used by the implicit time stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NonlinearSolverType {
    #[default]
    #[serde(rename = "newton")]
    Newton,
    #[serde(rename = "picard")]
    Picard,
}

/// Outer Newton iteration parameters (`newton.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewtonParams {
    #[serde(default)]
    pub verbose: bool,
    /// Absolute tolerance (default: 0)
    #[serde(default)]
    pub absolute_tolerance: f64,
    /// Relative tolerance (default: 1e-6)
    #[serde(default = "default_newton_rtol")]
    pub relative_tolerance: f64,
    /// Maximum outer iterations (default: 100)
    #[serde(default = "default_newton_maxits")]
    pub max_iterations: usize,
    /// Abort when the iteration budget is exhausted (default: true)
    #[serde(default = "default_true")]
    pub require_convergence: bool,
}

/// Fixed-point iteration parameters (`picard.*`), same keys and
/// defaults as the Newton section.
pub type PicardParams = NewtonParams;

/// Inner linear solve parameters (`gmres.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmresParams {
    /// 0 = silent, 1 = per restart, 2+ = per iteration (default: 2)
    #[serde(default = "default_gmres_verbose")]
    pub verbose_int: u32,
    /// Krylov dimension before restart (default: 30)
    #[serde(default = "default_gmres_restart")]
    pub restart_length: usize,
    #[serde(default)]
    pub absolute_tolerance: f64,
    /// Relative tolerance (default: 1e-4)
    #[serde(default = "default_gmres_rtol")]
    pub relative_tolerance: f64,
    /// Maximum total Krylov iterations (default: 1000)
    #[serde(default = "default_gmres_maxits")]
    pub max_iterations: usize,
}

/// Matrix-free Jacobian parameters (`jfnk.*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JfnkParams {
    /// Relative perturbation size (default: 1e-6)
    #[serde(default = "default_jfnk_eps")]
    pub epsilon: f64,
    /// Use a unit perturbation, exact for residuals linear in U
    #[serde(default)]
    pub is_linear: bool,
}

fn default_true() -> bool {
    true
}
fn default_newton_rtol() -> f64 {
    1.0e-6
}
fn default_newton_maxits() -> usize {
    100
}
fn default_gmres_verbose() -> u32 {
    2
}
fn default_gmres_restart() -> usize {
    30
}
fn default_gmres_rtol() -> f64 {
    1.0e-4
}
fn default_gmres_maxits() -> usize {
    1000
}
fn default_jfnk_eps() -> f64 {
    1.0e-6
}

impl Default for NewtonParams {
    fn default() -> Self {
        NewtonParams {
            verbose: false,
            absolute_tolerance: 0.0,
            relative_tolerance: default_newton_rtol(),
            max_iterations: default_newton_maxits(),
            require_convergence: true,
        }
    }
}

impl Default for GmresParams {
    fn default() -> Self {
        GmresParams {
            verbose_int: default_gmres_verbose(),
            restart_length: default_gmres_restart(),
            absolute_tolerance: 0.0,
            relative_tolerance: default_gmres_rtol(),
            max_iterations: default_gmres_maxits(),
        }
    }
}

impl Default for JfnkParams {
    fn default() -> Self {
        JfnkParams {
            epsilon: default_jfnk_eps(),
            is_linear: false,
        }
    }
}

// ─────────────────────────── field solver ───────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSolverConfig {
    #[serde(default = "default_algorithm")]
    pub algorithm: ElectromagneticSolverAlgo,
    #[serde(default = "default_grid_type")]
    pub grid_type: GridType,
    /// Azimuthal mode count, RZ only (default: 1)
    #[serde(default = "default_n_rz_modes")]
    pub n_rz_azimuthal_modes: usize,
}

fn default_algorithm() -> ElectromagneticSolverAlgo {
    ElectromagneticSolverAlgo::Yee
}
fn default_grid_type() -> GridType {
    GridType::Staggered
}
fn default_n_rz_modes() -> usize {
    1
}

impl Default for FieldSolverConfig {
    fn default() -> Self {
        FieldSolverConfig {
            algorithm: default_algorithm(),
            grid_type: default_grid_type(),
            n_rz_azimuthal_modes: default_n_rz_modes(),
        }
    }
}

// ──────────────────────────── guard cells ───────────────────────────

/// Inputs of the guard-cell policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardCellConfig {
    pub dim: SpaceDim,
    pub dt: f64,
    pub cell_size: [f64; 3],
    #[serde(default)]
    pub do_subcycling: bool,
    #[serde(default)]
    pub do_fdtd_nci_corr: bool,
    /// Stencil length of the NCI corrector along z (default: 4)
    #[serde(default = "default_nci_stencil")]
    pub nci_corr_stencil: i32,
    #[serde(default = "default_grid_type")]
    pub grid_type: GridType,
    #[serde(default)]
    pub do_moving_window: bool,
    /// Slot (0..3) along which the window moves (default: 2)
    #[serde(default = "default_mw_dir")]
    pub moving_window_dir: usize,
    /// Window velocity (m/s)
    #[serde(default)]
    pub moving_window_v: f64,
    /// Particle shape order (1..=4)
    pub nox: i32,
    #[serde(default = "default_algorithm")]
    pub electromagnetic_solver: ElectromagneticSolverAlgo,
    #[serde(default)]
    pub max_level: usize,
    #[serde(default)]
    pub v_galilean: [f64; 3],
    #[serde(default)]
    pub v_comoving: [f64; 3],
    #[serde(default)]
    pub safe_guard_cells: bool,
    #[serde(default = "default_gathering")]
    pub field_gathering: FieldGathering,
    #[serde(default)]
    pub do_pml: bool,
    #[serde(default)]
    pub do_pml_in_domain: bool,
    #[serde(default)]
    pub pml_ncell: usize,
    /// Refinement ratio between level l and l+1
    #[serde(default)]
    pub ref_ratios: Vec<IntVect>,
    #[serde(default)]
    pub use_filter: bool,
    /// Bilinear filter stencil length per slot (default: 1 each)
    #[serde(default = "default_filter_stencil")]
    pub bilinear_filter_stencil_length: IntVect,
}

fn default_nci_stencil() -> i32 {
    4
}
fn default_mw_dir() -> usize {
    2
}
fn default_gathering() -> FieldGathering {
    FieldGathering::EnergyConserving
}
fn default_filter_stencil() -> IntVect {
    IntVect::UNIT
}

impl GuardCellConfig {
    /// Minimal configuration for a given layout and shape order.
    pub fn new(dim: SpaceDim, dt: f64, cell_size: [f64; 3], nox: i32) -> Self {
        GuardCellConfig {
            dim,
            dt,
            cell_size,
            do_subcycling: false,
            do_fdtd_nci_corr: false,
            nci_corr_stencil: default_nci_stencil(),
            grid_type: default_grid_type(),
            do_moving_window: false,
            moving_window_dir: default_mw_dir(),
            moving_window_v: 0.0,
            nox,
            electromagnetic_solver: default_algorithm(),
            max_level: 0,
            v_galilean: [0.0; 3],
            v_comoving: [0.0; 3],
            safe_guard_cells: false,
            field_gathering: default_gathering(),
            do_pml: false,
            do_pml_in_domain: false,
            pml_ncell: 0,
            ref_ratios: Vec::new(),
            use_filter: false,
            bilinear_filter_stencil_length: default_filter_stencil(),
        }
    }

    pub fn validate(&self) -> PicResult<()> {
        if !(1..=4).contains(&self.nox) {
            return Err(PicError::ConfigError(format!(
                "particle shape order nox must be in 1..=4, got {}",
                self.nox
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PicError::ConfigError(format!(
                "guard cell dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        let axes = self.dim.active_axes();
        for d in 0..3 {
            if axes[d] && (!self.cell_size[d].is_finite() || self.cell_size[d] <= 0.0) {
                return Err(PicError::ConfigError(format!(
                    "cell size along axis {d} must be finite and > 0, got {}",
                    self.cell_size[d]
                )));
            }
        }
        if self.moving_window_dir > 2 {
            return Err(PicError::ConfigError(format!(
                "moving_window_dir must be 0, 1 or 2, got {}",
                self.moving_window_dir
            )));
        }
        if self.ref_ratios.len() < self.max_level {
            return Err(PicError::ConfigError(format!(
                "max_level={} needs {} refinement ratios, got {}",
                self.max_level,
                self.max_level,
                self.ref_ratios.len()
            )));
        }
        Ok(())
    }
}

// ───────────────────────── implicit solver ──────────────────────────

/// Top-level configuration of the implicit field solve.
/// Every section may be omitted from the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplicitSolverConfig {
    #[serde(default)]
    pub nonlinear_solver: NonlinearSolverType,
    #[serde(default)]
    pub newton: NewtonParams,
    #[serde(default)]
    pub picard: PicardParams,
    #[serde(default)]
    pub gmres: GmresParams,
    #[serde(default)]
    pub jfnk: JfnkParams,
    #[serde(default)]
    pub field_solver: FieldSolverConfig,
    /// Guard-cell inputs; needed only by drivers that size particle halos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_cells: Option<GuardCellConfig>,
}

impl ImplicitSolverConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> PicResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> PicResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Override a single dotted key, e.g. `("newton.max_iterations", "20")`.
    /// The value is parsed as JSON first and as a bare string otherwise,
    /// so enum names can be given unquoted.
    pub fn apply_override(&mut self, key: &str, value: &str) -> PicResult<()> {
        let mut doc = serde_json::to_value(&*self)?;
        let mut node = &mut doc;
        for part in key.split('.') {
            node = node
                .get_mut(part)
                .ok_or_else(|| PicError::ConfigError(format!("unknown parameter '{key}'")))?;
        }
        if node.is_object() {
            return Err(PicError::ConfigError(format!(
                "parameter '{key}' names a section, not a value"
            )));
        }
        *node = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        let updated: Self = serde_json::from_value(doc).map_err(|e| {
            PicError::ConfigError(format!("invalid value '{value}' for '{key}': {e}"))
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> PicResult<()> {
        let n = &self.newton;
        if !(n.relative_tolerance >= 0.0) || !(n.absolute_tolerance >= 0.0) {
            return Err(PicError::ConfigError(
                "newton tolerances must be >= 0".to_string(),
            ));
        }
        let p = &self.picard;
        if !(p.relative_tolerance >= 0.0) || !(p.absolute_tolerance >= 0.0) {
            return Err(PicError::ConfigError(
                "picard tolerances must be >= 0".to_string(),
            ));
        }
        let g = &self.gmres;
        if !(g.relative_tolerance >= 0.0) || !(g.absolute_tolerance >= 0.0) {
            return Err(PicError::ConfigError(
                "gmres tolerances must be >= 0".to_string(),
            ));
        }
        if g.restart_length == 0 {
            return Err(PicError::ConfigError(
                "gmres.restart_length must be >= 1".to_string(),
            ));
        }
        if !self.jfnk.epsilon.is_finite() || self.jfnk.epsilon <= 0.0 {
            return Err(PicError::ConfigError(
                "jfnk.epsilon must be finite and > 0".to_string(),
            ));
        }
        if self.field_solver.n_rz_azimuthal_modes == 0 {
            return Err(PicError::ConfigError(
                "field_solver.n_rz_azimuthal_modes must be >= 1".to_string(),
            ));
        }
        if let Some(gc) = &self.guard_cells {
            gc.validate()?;
        }
        Ok(())
    }
}
