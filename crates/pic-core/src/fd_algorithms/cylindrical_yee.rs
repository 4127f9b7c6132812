// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Cylindrical Yee Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Yee stencil in (r, z) with azimuthal modes.
//!
//! Mode `m = 0` is stored in component 0; for `m ≥ 1` the real and
//! imaginary parts live in components `2m - 1` and `2m`. `r` uses index
//! slot 0 and `z` slot 2.

use pic_types::constants::C;
use pic_types::grid::IntVect;

use crate::field_array::Fab;

/// Empirical CFL correction for the first six mode counts.
const MULTIMODE_ALPHA: [f64; 6] = [0.2105, 1.0, 3.5234, 8.5104, 15.5059, 24.5037];

#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalYee {
    coefs_r: Vec<f64>,
    coefs_z: Vec<f64>,
    dr: f64,
    dz: f64,
    nmodes: usize,
    rmin: f64,
}

impl CylindricalYee {
    /// `cell_size` holds `dr` in slot 0 and `dz` in slot 2.
    pub fn new(cell_size: [f64; 3], nmodes: usize, rmin: f64) -> Self {
        let (coefs_r, coefs_z) = Self::initialize_stencil_coefficients(cell_size);
        CylindricalYee {
            coefs_r,
            coefs_z,
            dr: cell_size[0],
            dz: cell_size[2],
            nmodes: nmodes.max(1),
            rmin,
        }
    }

    pub fn initialize_stencil_coefficients(cell_size: [f64; 3]) -> (Vec<f64>, Vec<f64>) {
        (vec![1.0 / cell_size[0]], vec![1.0 / cell_size[2]])
    }

    pub fn compute_max_dt_for(cell_size: [f64; 3], nmodes: usize) -> f64 {
        let m = nmodes.max(1);
        let alpha = match MULTIMODE_ALPHA.get(m - 1) {
            Some(&a) => a,
            None => ((m - 1) * (m - 1)) as f64 - 0.4,
        };
        let (dr, dz) = (cell_size[0], cell_size[2]);
        let delta_t = 1.0 / ((1.0 + alpha) / (dr * dr) + 1.0 / (dz * dz)).sqrt();
        delta_t / C
    }

    pub fn compute_max_dt(&self) -> f64 {
        Self::compute_max_dt_for([self.dr, 1.0, self.dz], self.nmodes)
    }

    /// One ghost cell in r and z.
    pub fn max_guard_cells(&self) -> IntVect {
        IntVect::new(1, 0, 1)
    }

    pub fn coefs_r(&self) -> &[f64] {
        &self.coefs_r
    }

    pub fn coefs_z(&self) -> &[f64] {
        &self.coefs_z
    }

    pub fn dr(&self) -> f64 {
        self.dr
    }

    pub fn n_rz_azimuthal_modes(&self) -> usize {
        self.nmodes
    }

    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    /// Radius of the nodal point `i`.
    #[inline]
    pub fn node_radius(&self, i: i32) -> f64 {
        self.rmin + i as f64 * self.dr
    }

    #[inline]
    pub fn upward_dr(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.coefs_r[0] * (f.at(i + 1, j, k, n) - f.at(i, j, k, n))
    }

    #[inline]
    pub fn downward_dr(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.coefs_r[0] * (f.at(i, j, k, n) - f.at(i - 1, j, k, n))
    }

    #[inline]
    pub fn upward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.coefs_z[0] * (f.at(i, j, k + 1, n) - f.at(i, j, k, n))
    }

    #[inline]
    pub fn downward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.coefs_z[0] * (f.at(i, j, k, n) - f.at(i, j, k - 1, n))
    }

    /// `1/r d(rF)/dr` for a cell-centred `F`, landing on node `i` at radius `r`.
    #[inline]
    pub fn downward_drr_over_r(&self, f: &Fab, r: f64, i: i32, j: i32, k: i32, n: usize) -> f64 {
        let dr = self.dr;
        1.0 / r
            * self.coefs_r[0]
            * ((r + 0.5 * dr) * f.at(i, j, k, n) - (r - 0.5 * dr) * f.at(i - 1, j, k, n))
    }

    /// `1/r d(rF)/dr` for a nodal `F`, landing on cell `i` at radius `r`.
    #[inline]
    pub fn upward_drr_over_r(&self, f: &Fab, r: f64, i: i32, j: i32, k: i32, n: usize) -> f64 {
        let dr = self.dr;
        1.0 / r
            * self.coefs_r[0]
            * ((r + 0.5 * dr) * f.at(i + 1, j, k, n) - (r - 0.5 * dr) * f.at(i, j, k, n))
    }
}
