// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Cartesian CKC Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cole–Kärkkäinen–Cowan stencil.
//!
//! The upward derivative (used to push B) is spread over the transverse
//! neighbours so that the numerical dispersion is isotropic along the
//! grid axes and the CFL limit reaches `min(dx)/c`. The downward
//! derivative is the plain Yee difference.
//!
//! Reference: B. M. Cowan et al., Phys. Rev. ST Accel. Beams 16, 041303
//! (2013).
//!
//! Per-axis coefficient layout:
//!   x: `[inv_dx, alphax, betaxy, betaxz, gammax]`
//!   y: `[inv_dy, alphay, betayz, betayx, gammay]`
//!   z: `[inv_dz, alphaz, betazx, betazy, gammaz]`
//! with every gamma already multiplied by the inverse cell size.

use super::{unit_guard_cells, CartesianAlgorithm, DimCheck, StencilCoefficients};
use crate::field_array::Fab;
use pic_types::constants::C;
use pic_types::grid::IntVect;

#[derive(Debug, Clone, PartialEq)]
pub struct CartesianCkc<const DIM: usize> {
    coefs: StencilCoefficients,
    cell_size: [f64; 3],
}

impl<const DIM: usize> CartesianCkc<DIM> {
    const AXES: [bool; 3] = DimCheck::<DIM>::AXES;

    pub fn new(cell_size: [f64; 3]) -> Self {
        let () = DimCheck::<DIM>::OK;
        CartesianCkc {
            coefs: Self::initialize_stencil_coefficients(cell_size),
            cell_size,
        }
    }

    pub fn initialize_stencil_coefficients(cell_size: [f64; 3]) -> StencilCoefficients {
        let inv_dx = 1.0 / cell_size[0];
        let inv_dy = 1.0 / cell_size[1];
        let inv_dz = 1.0 / cell_size[2];

        let (mut alphax, mut alphay, mut alphaz) = (0.0, 0.0, 0.0);
        let (mut betaxy, mut betaxz) = (0.0, 0.0);
        let (mut betayx, mut betayz) = (0.0, 0.0);
        let (mut betazx, mut betazy) = (0.0, 0.0);
        let (mut gammax, mut gammay, mut gammaz) = (0.0, 0.0, 0.0);

        match DIM {
            3 => {
                let delta = inv_dx.max(inv_dy).max(inv_dz);
                let rx = (inv_dx / delta).powi(2);
                let ry = (inv_dy / delta).powi(2);
                let rz = (inv_dz / delta).powi(2);
                let sum = ry * rz + rz * rx + rx * ry;
                let beta = 0.125 * (1.0 - rx * ry * rz / sum);

                betaxy = ry * beta * inv_dx;
                betaxz = rz * beta * inv_dx;
                betayx = rx * beta * inv_dy;
                betayz = rz * beta * inv_dy;
                betazx = rx * beta * inv_dz;
                betazy = ry * beta * inv_dz;

                gammax = ry * rz * (1.0 / 16.0 - 0.125 * ry * rz / sum);
                gammay = rx * rz * (1.0 / 16.0 - 0.125 * rx * rz / sum);
                gammaz = rx * ry * (1.0 / 16.0 - 0.125 * rx * ry / sum);

                alphax = (1.0 - 2.0 * ry * beta - 2.0 * rz * beta - 4.0 * gammax) * inv_dx;
                alphay = (1.0 - 2.0 * rx * beta - 2.0 * rz * beta - 4.0 * gammay) * inv_dy;
                alphaz = (1.0 - 2.0 * rx * beta - 2.0 * ry * beta - 4.0 * gammaz) * inv_dz;

                gammax *= inv_dx;
                gammay *= inv_dy;
                gammaz *= inv_dz;
            }
            2 => {
                let delta = inv_dx.max(inv_dz);
                let rx = (inv_dx / delta).powi(2);
                let rz = (inv_dz / delta).powi(2);
                let beta = 0.125;

                betaxz = beta * rz * inv_dx;
                betazx = beta * rx * inv_dz;
                alphax = (1.0 - 2.0 * rz * beta) * inv_dx;
                alphaz = (1.0 - 2.0 * rx * beta) * inv_dz;
            }
            _ => {
                alphaz = inv_dz;
            }
        }

        [
            vec![inv_dx, alphax, betaxy, betaxz, gammax],
            vec![inv_dy, alphay, betayz, betayx, gammay],
            vec![inv_dz, alphaz, betazx, betazy, gammaz],
        ]
    }

    /// `min(dx)/c` over the active axes.
    pub fn compute_max_dt_for(cell_size: [f64; 3]) -> f64 {
        let min_dx = (0..3)
            .filter(|&d| Self::AXES[d])
            .map(|d| cell_size[d])
            .fold(f64::INFINITY, f64::min);
        min_dx / C
    }

    #[inline]
    fn inv(&self, d: usize) -> f64 {
        self.coefs[d][0]
    }
}

impl<const DIM: usize> CartesianAlgorithm for CartesianCkc<DIM> {
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
        let c = &self.coefs[0];
        let (alphax, betaxy, betaxz, gammax) = (c[1], c[2], c[3], c[4]);
        let a = |i: i32, j: i32, k: i32| f.at(i, j, k, n);
        match DIM {
            3 => {
                alphax * (a(i + 1, j, k) - a(i, j, k))
                    + betaxy
                        * (a(i + 1, j + 1, k) - a(i, j + 1, k) + a(i + 1, j - 1, k)
                            - a(i, j - 1, k))
                    + betaxz
                        * (a(i + 1, j, k + 1) - a(i, j, k + 1) + a(i + 1, j, k - 1)
                            - a(i, j, k - 1))
                    + gammax
                        * (a(i + 1, j + 1, k + 1) - a(i, j + 1, k + 1)
                            + a(i + 1, j - 1, k + 1)
                            - a(i, j - 1, k + 1)
                            + a(i + 1, j + 1, k - 1)
                            - a(i, j + 1, k - 1)
                            + a(i + 1, j - 1, k - 1)
                            - a(i, j - 1, k - 1))
            }
            2 => {
                alphax * (a(i + 1, j, k) - a(i, j, k))
                    + betaxz
                        * (a(i + 1, j, k + 1) - a(i, j, k + 1) + a(i + 1, j, k - 1)
                            - a(i, j, k - 1))
            }
            _ => 0.0,
        }
    }

    fn upward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if DIM != 3 {
            return 0.0;
        }
        let c = &self.coefs[1];
        let (alphay, betayz, betayx, gammay) = (c[1], c[2], c[3], c[4]);
        let a = |i: i32, j: i32, k: i32| f.at(i, j, k, n);
        alphay * (a(i, j + 1, k) - a(i, j, k))
            + betayx * (a(i + 1, j + 1, k) - a(i + 1, j, k) + a(i - 1, j + 1, k) - a(i - 1, j, k))
            + betayz * (a(i, j + 1, k + 1) - a(i, j, k + 1) + a(i, j + 1, k - 1) - a(i, j, k - 1))
            + gammay
                * (a(i + 1, j + 1, k + 1) - a(i + 1, j, k + 1) + a(i - 1, j + 1, k + 1)
                    - a(i - 1, j, k + 1)
                    + a(i + 1, j + 1, k - 1)
                    - a(i + 1, j, k - 1)
                    + a(i - 1, j + 1, k - 1)
                    - a(i - 1, j, k - 1))
    }

    fn upward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        let c = &self.coefs[2];
        let (alphaz, betazx, betazy, gammaz) = (c[1], c[2], c[3], c[4]);
        let a = |i: i32, j: i32, k: i32| f.at(i, j, k, n);
        match DIM {
            3 => {
                alphaz * (a(i, j, k + 1) - a(i, j, k))
                    + betazx
                        * (a(i + 1, j, k + 1) - a(i + 1, j, k) + a(i - 1, j, k + 1)
                            - a(i - 1, j, k))
                    + betazy
                        * (a(i, j + 1, k + 1) - a(i, j + 1, k) + a(i, j - 1, k + 1)
                            - a(i, j - 1, k))
                    + gammaz
                        * (a(i + 1, j + 1, k + 1) - a(i + 1, j + 1, k)
                            + a(i - 1, j + 1, k + 1)
                            - a(i - 1, j + 1, k)
                            + a(i + 1, j - 1, k + 1)
                            - a(i + 1, j - 1, k)
                            + a(i - 1, j - 1, k + 1)
                            - a(i - 1, j - 1, k))
            }
            2 => {
                alphaz * (a(i, j, k + 1) - a(i, j, k))
                    + betazx
                        * (a(i + 1, j, k + 1) - a(i + 1, j, k) + a(i - 1, j, k + 1)
                            - a(i - 1, j, k))
            }
            _ => alphaz * (a(i, j, k + 1) - a(i, j, k)),
        }
    }

    fn downward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[0] {
            return 0.0;
        }
        self.inv(0) * (f.at(i, j, k, n) - f.at(i - 1, j, k, n))
    }

    fn downward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[1] {
            return 0.0;
        }
        self.inv(1) * (f.at(i, j, k, n) - f.at(i, j - 1, k, n))
    }

    fn downward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.inv(2) * (f.at(i, j, k, n) - f.at(i, j, k - 1, n))
    }
}
