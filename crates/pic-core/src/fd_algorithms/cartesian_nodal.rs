// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Cartesian Nodal Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Centred differences for collocated grids; upward and downward
//! derivatives coincide.

use super::{courant_dt, unit_guard_cells, CartesianAlgorithm, DimCheck, StencilCoefficients};
use crate::field_array::Fab;
use pic_types::grid::IntVect;

#[derive(Debug, Clone, PartialEq)]
pub struct CartesianNodal<const DIM: usize> {
    coefs: StencilCoefficients,
    cell_size: [f64; 3],
}

impl<const DIM: usize> CartesianNodal<DIM> {
    const AXES: [bool; 3] = DimCheck::<DIM>::AXES;

    pub fn new(cell_size: [f64; 3]) -> Self {
        let () = DimCheck::<DIM>::OK;
        CartesianNodal {
            coefs: Self::initialize_stencil_coefficients(cell_size),
            cell_size,
        }
    }

    pub fn initialize_stencil_coefficients(cell_size: [f64; 3]) -> StencilCoefficients {
        [
            vec![1.0 / cell_size[0]],
            vec![1.0 / cell_size[1]],
            vec![1.0 / cell_size[2]],
        ]
    }

    /// Same bound as Yee. The centred scheme itself tolerates twice
    /// this step, so the value is conservative.
    pub fn compute_max_dt_for(cell_size: [f64; 3]) -> f64 {
        courant_dt(cell_size, Self::AXES)
    }

    #[inline]
    fn centred(&self, d: usize, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[d] {
            return 0.0;
        }
        let inv = self.coefs[d][0];
        let (hi, lo) = match d {
            0 => (f.at(i + 1, j, k, n), f.at(i - 1, j, k, n)),
            1 => (f.at(i, j + 1, k, n), f.at(i, j - 1, k, n)),
            _ => (f.at(i, j, k + 1, n), f.at(i, j, k - 1, n)),
        };
        0.5 * inv * (hi - lo)
    }
}

impl<const DIM: usize> CartesianAlgorithm for CartesianNodal<DIM> {
    fn coefficients(&self) -> &StencilCoefficients {
        &self.coefs
    }

    fn compute_max_dt(&self) -> f64 {
        Self::compute_max_dt_for(self.cell_size)
    }

    fn max_guard_cells(&self) -> IntVect {
        unit_guard_cells(Self::AXES)
    }

    fn upward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(0, f, i, j, k, n)
    }

    fn upward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(1, f, i, j, k, n)
    }

    fn upward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(2, f, i, j, k, n)
    }

    fn downward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(0, f, i, j, k, n)
    }

    fn downward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(1, f, i, j, k, n)
    }

    fn downward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.centred(2, f, i, j, k, n)
    }
}
