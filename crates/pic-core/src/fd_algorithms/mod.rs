// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Finite-Difference Algorithms
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Finite-difference stencils for the Maxwell update.
//!
//! Cartesian stencils are parameterised by the number of active axes
//! `DIM` (1 = z, 2 = x–z, 3 = x–y–z). Only 1, 2 and 3 compile.
//!
//! Upward derivatives read a nodal field and land on cell centres;
//! downward derivatives read a cell-centred field and land on nodes.
//! A derivative along an inactive axis is exactly zero.

pub mod cartesian_ckc;
pub mod cartesian_nodal;
pub mod cartesian_yee;
pub mod cylindrical_yee;

pub use cartesian_ckc::CartesianCkc;
pub use cartesian_nodal::CartesianNodal;
pub use cartesian_yee::CartesianYee;
pub use cylindrical_yee::CylindricalYee;

use crate::field_array::Fab;
use pic_types::grid::{active_axes, IntVect};

/// Compile-time check on the Cartesian dimensionality.
pub(crate) struct DimCheck<const DIM: usize>;

impl<const DIM: usize> DimCheck<DIM> {
    pub(crate) const OK: () = assert!(
        DIM >= 1 && DIM <= 3,
        "Cartesian stencils exist for DIM = 1, 2 or 3 only"
    );
    pub(crate) const AXES: [bool; 3] = active_axes(DIM);
}

/// Per-axis coefficient lists, x first.
pub type StencilCoefficients = [Vec<f64>; 3];

/// Stencil operations shared by the Cartesian algorithms.
pub trait CartesianAlgorithm: Sync + Send {
    fn coefficients(&self) -> &StencilCoefficients;

    /// CFL-limited time step.
    fn compute_max_dt(&self) -> f64;

    /// Ghost cells read beyond the valid region.
    fn max_guard_cells(&self) -> IntVect;

    fn upward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
    fn upward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
    fn upward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
    fn downward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
    fn downward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
    fn downward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64;
}

/// Guard cells a one-cell-wide stencil needs on the active axes.
pub(crate) fn unit_guard_cells(axes: [bool; 3]) -> IntVect {
    IntVect::UNIT.masked(axes)
}

/// `1/(c sqrt(Σ 1/dx²))` over the active axes.
pub(crate) fn courant_dt(cell_size: [f64; 3], axes: [bool; 3]) -> f64 {
    let sum: f64 = (0..3)
        .filter(|&d| axes[d])
        .map(|d| 1.0 / (cell_size[d] * cell_size[d]))
        .sum();
    1.0 / (sum.sqrt() * pic_types::constants::C)
}

/// Runtime choice among the compiled Cartesian stencils.
#[derive(Debug, Clone, PartialEq)]
pub enum CartesianStencil<const DIM: usize> {
    Yee(CartesianYee<DIM>),
    Ckc(CartesianCkc<DIM>),
    Nodal(CartesianNodal<DIM>),
}

impl<const DIM: usize> CartesianStencil<DIM> {
    pub fn name(&self) -> &'static str {
        match self {
            CartesianStencil::Yee(_) => "yee",
            CartesianStencil::Ckc(_) => "ckc",
            CartesianStencil::Nodal(_) => "nodal",
        }
    }

    pub fn compute_max_dt(&self) -> f64 {
        match self {
            CartesianStencil::Yee(a) => a.compute_max_dt(),
            CartesianStencil::Ckc(a) => a.compute_max_dt(),
            CartesianStencil::Nodal(a) => a.compute_max_dt(),
        }
    }

    pub fn max_guard_cells(&self) -> IntVect {
        match self {
            CartesianStencil::Yee(a) => a.max_guard_cells(),
            CartesianStencil::Ckc(a) => a.max_guard_cells(),
            CartesianStencil::Nodal(a) => a.max_guard_cells(),
        }
    }

    pub fn coefficients(&self) -> &StencilCoefficients {
        match self {
            CartesianStencil::Yee(a) => a.coefficients(),
            CartesianStencil::Ckc(a) => a.coefficients(),
            CartesianStencil::Nodal(a) => a.coefficients(),
        }
    }
}
