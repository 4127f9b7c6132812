// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Cartesian Yee Stencil
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Standard staggered Yee differences.

use super::{courant_dt, unit_guard_cells, CartesianAlgorithm, DimCheck, StencilCoefficients};
use crate::field_array::Fab;
use pic_types::grid::IntVect;

#[derive(Debug, Clone, PartialEq)]
pub struct CartesianYee<const DIM: usize> {
    coefs: StencilCoefficients,
}

impl<const DIM: usize> CartesianYee<DIM> {
    const AXES: [bool; 3] = DimCheck::<DIM>::AXES;

    pub fn new(cell_size: [f64; 3]) -> Self {
        let () = DimCheck::<DIM>::OK;
        CartesianYee {
            coefs: Self::initialize_stencil_coefficients(cell_size),
        }
    }

    /// `[1/dx]`, `[1/dy]`, `[1/dz]`
    pub fn initialize_stencil_coefficients(cell_size: [f64; 3]) -> StencilCoefficients {
        [
            vec![1.0 / cell_size[0]],
            vec![1.0 / cell_size[1]],
            vec![1.0 / cell_size[2]],
        ]
    }

    pub fn compute_max_dt_for(cell_size: [f64; 3]) -> f64 {
        courant_dt(cell_size, Self::AXES)
    }

    #[inline]
    fn inv(&self, d: usize) -> f64 {
        self.coefs[d][0]
    }

    #[inline]
    fn shifted(d: usize, i: i32, j: i32, k: i32, s: i32) -> (i32, i32, i32) {
        match d {
            0 => (i + s, j, k),
            1 => (i, j + s, k),
            _ => (i, j, k + s),
        }
    }

    #[inline]
    fn upward(&self, d: usize, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[d] {
            return 0.0;
        }
        let (a, b, c) = Self::shifted(d, i, j, k, 1);
        self.inv(d) * (f.at(a, b, c, n) - f.at(i, j, k, n))
    }

    #[inline]
    fn downward(&self, d: usize, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[d] {
            return 0.0;
        }
        let (a, b, c) = Self::shifted(d, i, j, k, -1);
        self.inv(d) * (f.at(i, j, k, n) - f.at(a, b, c, n))
    }

    #[inline]
    fn second(&self, d: usize, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        if !Self::AXES[d] {
            return 0.0;
        }
        let inv = self.inv(d);
        let (a0, b0, c0) = Self::shifted(d, i, j, k, -1);
        let (a1, b1, c1) = Self::shifted(d, i, j, k, 1);
        inv * inv * (f.at(a0, b0, c0, n) - 2.0 * f.at(i, j, k, n) + f.at(a1, b1, c1, n))
    }

    pub fn dxx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.second(0, f, i, j, k, n)
    }

    pub fn dyy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.second(1, f, i, j, k, n)
    }

    pub fn dzz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.second(2, f, i, j, k, n)
    }
}

impl<const DIM: usize> CartesianAlgorithm for CartesianYee<DIM> {
    fn coefficients(&self) -> &StencilCoefficients {
        &self.coefs
    }

    fn compute_max_dt(&self) -> f64 {
        let cell_size = [1.0 / self.inv(0), 1.0 / self.inv(1), 1.0 / self.inv(2)];
        Self::compute_max_dt_for(cell_size)
    }

    fn max_guard_cells(&self) -> IntVect {
        unit_guard_cells(Self::AXES)
    }

    fn upward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.upward(0, f, i, j, k, n)
    }

    fn upward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.upward(1, f, i, j, k, n)
    }

    fn upward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.upward(2, f, i, j, k, n)
    }

    fn downward_dx(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.downward(0, f, i, j, k, n)
    }

    fn downward_dy(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.downward(1, f, i, j, k, n)
    }

    fn downward_dz(&self, f: &Fab, i: i32, j: i32, k: i32, n: usize) -> f64 {
        self.downward(2, f, i, j, k, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pic_types::constants::C;
    use pic_types::grid::IndexBox;

    fn quadratic_fab() -> Fab {
        let valid = IndexBox::new(IntVect::new(0, 0, 0), IntVect::new(4, 4, 4));
        let mut fab = Fab::new(valid, IntVect::UNIT, 1);
        let grown = fab.grown_box();
        grown.for_each(|i, j, k| {
            let (x, y, z) = (i as f64, j as f64, k as f64);
            fab.set(i, j, k, 0, x * x + 2.0 * y + 3.0 * z * z);
        });
        fab
    }

    #[test]
    fn test_coefficients_are_inverse_cell_sizes() {
        let yee = CartesianYee::<3>::new([0.5, 0.25, 2.0]);
        let c = yee.coefficients();
        assert_eq!(c[0], vec![2.0]);
        assert_eq!(c[1], vec![4.0]);
        assert_eq!(c[2], vec![0.5]);
    }

    #[test]
    fn test_differences_on_quadratic() {
        let yee = CartesianYee::<3>::new([1.0; 3]);
        let f = quadratic_fab();
        // x²: forward difference at i=2 is 5, backward is 3
        assert_eq!(yee.upward_dx(&f, 2, 1, 1, 0), 5.0);
        assert_eq!(yee.downward_dx(&f, 2, 1, 1, 0), 3.0);
        assert_eq!(yee.upward_dy(&f, 2, 1, 1, 0), 2.0);
        assert_eq!(yee.downward_dz(&f, 2, 1, 3, 0), 15.0);
        assert_eq!(yee.dxx(&f, 2, 2, 2, 0), 2.0);
        assert_eq!(yee.dyy(&f, 2, 2, 2, 0), 0.0);
        assert_eq!(yee.dzz(&f, 2, 2, 2, 0), 6.0);
    }

    #[test]
    fn test_inactive_axes_give_zero() {
        let valid = IndexBox::new(IntVect::new(0, 0, 0), IntVect::new(3, 0, 3));
        let mut f = Fab::new(valid, IntVect::new(1, 0, 1), 1);
        f.set(1, 0, 1, 0, 7.0);
        let yee = CartesianYee::<2>::new([0.1, 1.0, 0.1]);
        assert_eq!(yee.upward_dy(&f, 1, 0, 1, 0), 0.0);
        assert_eq!(yee.downward_dy(&f, 1, 0, 1, 0), 0.0);
        assert_eq!(yee.max_guard_cells(), IntVect::new(1, 0, 1));

        let yee1 = CartesianYee::<1>::new([1.0, 1.0, 0.1]);
        assert_eq!(yee1.upward_dx(&f, 1, 0, 1, 0), 0.0);
        assert_eq!(yee1.max_guard_cells(), IntVect::new(0, 0, 1));
    }

    #[test]
    fn test_max_dt_uses_active_axes_only() {
        let dz = 1.0e-3;
        let dt1 = CartesianYee::<1>::new([5.0, 5.0, dz]).compute_max_dt();
        assert!((dt1 - dz / C).abs() < 1e-12 * dz / C);

        let dt2 = CartesianYee::<2>::new([dz, 5.0, dz]).compute_max_dt();
        let expected = dz / (C * 2f64.sqrt());
        assert!((dt2 - expected).abs() < 1e-12 * expected);

        let dt3 = CartesianYee::<3>::compute_max_dt_for([dz; 3]);
        let expected = dz / (C * 3f64.sqrt());
        assert!((dt3 - expected).abs() < 1e-12 * expected);
    }
}
