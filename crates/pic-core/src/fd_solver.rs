// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Finite-Difference Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Runtime dispatch from the configured algorithm to a compiled stencil.
//!
//! The stencil is chosen once at construction. Every operation then
//! matches on it once and runs a monomorphised kernel over all boxes,
//! one rayon task per box. Inputs must have had their guard cells
//! exchanged (`MultiFab::fill_boundary`) beforehand.

use crate::fd_algorithms::{
    CartesianAlgorithm, CartesianCkc, CartesianNodal, CartesianStencil, CartesianYee,
    CylindricalYee,
};
use crate::field_array::MultiFab;
use pic_types::config::{ElectromagneticSolverAlgo, GridType};
use pic_types::constants::{C, EP0};
use pic_types::error::{PicError, PicResult};
use pic_types::grid::IntVect;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Stencil<const DIM: usize> {
    Cartesian(CartesianStencil<DIM>),
    Cylindrical(CylindricalYee),
}

/// Field-update operators for one mesh level.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteDifferenceSolver<const DIM: usize> {
    algo: ElectromagneticSolverAlgo,
    grid_type: GridType,
    stencil: Stencil<DIM>,
}

impl<const DIM: usize> FiniteDifferenceSolver<DIM> {
    /// Collocated grids always use the nodal stencil; otherwise Yee and
    /// hybrid-PIC map to Yee and CKC to CKC.
    pub fn new(
        algo: ElectromagneticSolverAlgo,
        grid_type: GridType,
        cell_size: [f64; 3],
    ) -> PicResult<Self> {
        let stencil = if grid_type == GridType::Collocated {
            CartesianStencil::Nodal(CartesianNodal::new(cell_size))
        } else {
            match algo {
                ElectromagneticSolverAlgo::Yee | ElectromagneticSolverAlgo::HybridPic => {
                    CartesianStencil::Yee(CartesianYee::new(cell_size))
                }
                ElectromagneticSolverAlgo::Ckc => {
                    CartesianStencil::Ckc(CartesianCkc::new(cell_size))
                }
                other => {
                    return Err(PicError::UnknownAlgorithm(format!(
                        "ComputeDivE: no finite-difference stencil for {other:?}"
                    )))
                }
            }
        };
        log::debug!(
            "FiniteDifferenceSolver<{}>: {} stencil for {algo:?} on {grid_type:?} grid, dt_max = {:e}",
            DIM,
            stencil.name(),
            stencil.compute_max_dt()
        );
        Ok(FiniteDifferenceSolver {
            algo,
            grid_type,
            stencil: Stencil::Cartesian(stencil),
        })
    }

    pub fn algorithm(&self) -> ElectromagneticSolverAlgo {
        self.algo
    }

    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    pub fn is_cylindrical(&self) -> bool {
        matches!(self.stencil, Stencil::Cylindrical(_))
    }

    /// Name of the stencil in use.
    pub fn stencil_name(&self) -> &'static str {
        match &self.stencil {
            Stencil::Cartesian(s) => s.name(),
            Stencil::Cylindrical(_) => "cylindrical_yee",
        }
    }

    pub fn compute_max_dt(&self) -> f64 {
        match &self.stencil {
            Stencil::Cartesian(s) => s.compute_max_dt(),
            Stencil::Cylindrical(s) => s.compute_max_dt(),
        }
    }

    pub fn max_guard_cells(&self) -> IntVect {
        match &self.stencil {
            Stencil::Cartesian(s) => s.max_guard_cells(),
            Stencil::Cylindrical(s) => s.max_guard_cells(),
        }
    }

    /// `divE = ∇·E` on the valid region of `div_e`.
    pub fn compute_div_e(&self, efield: &[MultiFab; 3], div_e: &mut MultiFab) {
        for e in efield {
            assert_same_boxes(e, div_e, "compute_div_e");
        }
        match &self.stencil {
            Stencil::Cartesian(CartesianStencil::Yee(a)) => div_e_cartesian(a, efield, div_e),
            Stencil::Cartesian(CartesianStencil::Ckc(a)) => div_e_cartesian(a, efield, div_e),
            Stencil::Cartesian(CartesianStencil::Nodal(a)) => div_e_cartesian(a, efield, div_e),
            Stencil::Cylindrical(a) => div_e_cylindrical(a, efield, div_e),
        }
    }

    /// `B -= dt ∇×E`
    pub fn evolve_b(&self, bfield: &mut [MultiFab; 3], efield: &[MultiFab; 3], dt: f64) -> PicResult<()> {
        for (b, e) in bfield.iter().zip(efield) {
            assert_same_boxes(e, b, "evolve_b");
        }
        match &self.stencil {
            Stencil::Cartesian(CartesianStencil::Yee(a)) => evolve_b_cartesian(a, bfield, efield, dt),
            Stencil::Cartesian(CartesianStencil::Ckc(a)) => evolve_b_cartesian(a, bfield, efield, dt),
            Stencil::Cartesian(CartesianStencil::Nodal(a)) => evolve_b_cartesian(a, bfield, efield, dt),
            Stencil::Cylindrical(_) => return Err(cylindrical_unsupported("evolve_b")),
        }
        Ok(())
    }

    /// `E += c² dt ∇×B - dt J/ε0`
    pub fn evolve_e(
        &self,
        efield: &mut [MultiFab; 3],
        bfield: &[MultiFab; 3],
        current: Option<&[MultiFab; 3]>,
        dt: f64,
    ) -> PicResult<()> {
        for (e, b) in efield.iter().zip(bfield) {
            assert_same_boxes(b, e, "evolve_e");
        }
        match &self.stencil {
            Stencil::Cartesian(CartesianStencil::Yee(a)) => {
                evolve_e_cartesian(a, efield, bfield, current, dt)
            }
            Stencil::Cartesian(CartesianStencil::Ckc(a)) => {
                evolve_e_cartesian(a, efield, bfield, current, dt)
            }
            Stencil::Cartesian(CartesianStencil::Nodal(a)) => {
                evolve_e_cartesian(a, efield, bfield, current, dt)
            }
            Stencil::Cylindrical(_) => return Err(cylindrical_unsupported("evolve_e")),
        }
        Ok(())
    }

    /// `curl = ∇×B`, staggered like E.
    pub fn compute_curl_b(&self, bfield: &[MultiFab; 3], curl: &mut [MultiFab; 3]) -> PicResult<()> {
        for (c, b) in curl.iter().zip(bfield) {
            assert_same_boxes(b, c, "compute_curl_b");
        }
        match &self.stencil {
            Stencil::Cartesian(CartesianStencil::Yee(a)) => curl_b_cartesian(a, bfield, curl),
            Stencil::Cartesian(CartesianStencil::Ckc(a)) => curl_b_cartesian(a, bfield, curl),
            Stencil::Cartesian(CartesianStencil::Nodal(a)) => curl_b_cartesian(a, bfield, curl),
            Stencil::Cylindrical(_) => return Err(cylindrical_unsupported("compute_curl_b")),
        }
        Ok(())
    }
}

impl FiniteDifferenceSolver<2> {
    /// RZ solver; only the Yee family has a cylindrical stencil.
    pub fn new_cylindrical(
        algo: ElectromagneticSolverAlgo,
        cell_size: [f64; 3],
        n_rz_azimuthal_modes: usize,
        rmin: f64,
    ) -> PicResult<Self> {
        match algo {
            ElectromagneticSolverAlgo::Yee | ElectromagneticSolverAlgo::HybridPic => {}
            other => {
                return Err(PicError::UnknownAlgorithm(format!(
                    "ComputeDivE: no cylindrical stencil for {other:?}"
                )))
            }
        }
        let stencil = CylindricalYee::new(cell_size, n_rz_azimuthal_modes, rmin);
        log::debug!(
            "FiniteDifferenceSolver<RZ>: cylindrical Yee, {} mode(s), rmin = {rmin}, dt_max = {:e}",
            stencil.n_rz_azimuthal_modes(),
            stencil.compute_max_dt()
        );
        Ok(FiniteDifferenceSolver {
            algo,
            grid_type: GridType::Staggered,
            stencil: Stencil::Cylindrical(stencil),
        })
    }
}

fn cylindrical_unsupported(op: &str) -> PicError {
    PicError::UnknownAlgorithm(format!("{op} is not available for the cylindrical stencil"))
}

fn assert_same_boxes(src: &MultiFab, dst: &MultiFab, op: &str) {
    assert!(
        src.box_array() == dst.box_array(),
        "FiniteDifferenceSolver::{op} called with arrays on different box arrays"
    );
}

/// Evaluate `kernel(fab, i, j, k, comp)` at every valid point of `dst`
/// and either store or add the result.
fn apply_kernel<K>(dst: &mut MultiFab, accumulate: bool, kernel: K)
where
    K: Fn(usize, i32, i32, i32, usize) -> f64 + Sync,
{
    let ncomp = dst.ncomp();
    dst.fabs_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(ifab, fab)| {
            let valid = fab.valid_box();
            valid.for_each(|i, j, k| {
                for n in 0..ncomp {
                    let v = kernel(ifab, i, j, k, n);
                    if accumulate {
                        fab.add(i, j, k, n, v);
                    } else {
                        fab.set(i, j, k, n, v);
                    }
                }
            });
        });
}

fn div_e_cartesian<A: CartesianAlgorithm>(a: &A, efield: &[MultiFab; 3], div_e: &mut MultiFab) {
    let [ex, ey, ez] = efield;
    apply_kernel(div_e, false, |f, i, j, k, n| {
        a.downward_dx(&ex.fabs()[f], i, j, k, n)
            + a.downward_dy(&ey.fabs()[f], i, j, k, n)
            + a.downward_dz(&ez.fabs()[f], i, j, k, n)
    });
}

fn div_e_cylindrical(a: &CylindricalYee, efield: &[MultiFab; 3], div_e: &mut MultiFab) {
    // Mode 0 plus (real, imaginary) for every higher mode
    let ncomp = 2 * a.n_rz_azimuthal_modes() - 1;
    assert!(
        div_e.ncomp() == ncomp,
        "FiniteDifferenceSolver::compute_div_e: divE has {} components, {} azimuthal modes need {}",
        div_e.ncomp(),
        a.n_rz_azimuthal_modes(),
        ncomp
    );
    for (d, e) in efield.iter().enumerate() {
        assert!(
            e.ncomp() == ncomp,
            "FiniteDifferenceSolver::compute_div_e: E component {d} has {} components, {} azimuthal modes need {}",
            e.ncomp(),
            a.n_rz_azimuthal_modes(),
            ncomp
        );
    }
    let [er, et, ez] = efield;
    let dr = a.dr();
    apply_kernel(div_e, false, |f, i, j, k, n| {
        let (fr, ft, fz) = (&er.fabs()[f], &et.fabs()[f], &ez.fabs()[f]);
        let r = a.node_radius(i);
        if r != 0.0 {
            let radial = a.downward_drr_over_r(fr, r, i, j, k, n) + a.downward_dz(fz, i, j, k, n);
            if n == 0 {
                radial
            } else if n % 2 == 1 {
                // real part of mode m = (n + 1) / 2
                let m = ((n + 1) / 2) as f64;
                radial + m * ft.at(i, j, k, n + 1) / r
            } else {
                let m = (n / 2) as f64;
                radial - m * ft.at(i, j, k, n - 1) / r
            }
        } else if n == 0 {
            // Er(r) ~ r on axis, so (1/r) d(r Er)/dr -> 2 Er'(0) = 4 Er(dr/2)/dr
            4.0 * fr.at(i, j, k, 0) / dr + a.downward_dz(fz, i, j, k, 0)
        } else {
            0.0
        }
    });
}

fn evolve_b_cartesian<A: CartesianAlgorithm>(
    a: &A,
    bfield: &mut [MultiFab; 3],
    efield: &[MultiFab; 3],
    dt: f64,
) {
    let [bx, by, bz] = bfield;
    let [ex, ey, ez] = efield;
    apply_kernel(bx, true, |f, i, j, k, n| {
        dt * (a.upward_dz(&ey.fabs()[f], i, j, k, n) - a.upward_dy(&ez.fabs()[f], i, j, k, n))
    });
    apply_kernel(by, true, |f, i, j, k, n| {
        dt * (a.upward_dx(&ez.fabs()[f], i, j, k, n) - a.upward_dz(&ex.fabs()[f], i, j, k, n))
    });
    apply_kernel(bz, true, |f, i, j, k, n| {
        dt * (a.upward_dy(&ex.fabs()[f], i, j, k, n) - a.upward_dx(&ey.fabs()[f], i, j, k, n))
    });
}

fn evolve_e_cartesian<A: CartesianAlgorithm>(
    a: &A,
    efield: &mut [MultiFab; 3],
    bfield: &[MultiFab; 3],
    current: Option<&[MultiFab; 3]>,
    dt: f64,
) {
    let c2dt = C * C * dt;
    let j_coef = dt / EP0;
    let [ex, ey, ez] = efield;
    let [bx, by, bz] = bfield;
    let jat = |d: usize, f: usize, i: i32, j: i32, k: i32, n: usize| -> f64 {
        current.map_or(0.0, |jf| jf[d].fabs()[f].at(i, j, k, n))
    };
    apply_kernel(ex, true, |f, i, j, k, n| {
        c2dt * (a.downward_dy(&bz.fabs()[f], i, j, k, n) - a.downward_dz(&by.fabs()[f], i, j, k, n))
            - j_coef * jat(0, f, i, j, k, n)
    });
    apply_kernel(ey, true, |f, i, j, k, n| {
        c2dt * (a.downward_dz(&bx.fabs()[f], i, j, k, n) - a.downward_dx(&bz.fabs()[f], i, j, k, n))
            - j_coef * jat(1, f, i, j, k, n)
    });
    apply_kernel(ez, true, |f, i, j, k, n| {
        c2dt * (a.downward_dx(&by.fabs()[f], i, j, k, n) - a.downward_dy(&bx.fabs()[f], i, j, k, n))
            - j_coef * jat(2, f, i, j, k, n)
    });
}

fn curl_b_cartesian<A: CartesianAlgorithm>(a: &A, bfield: &[MultiFab; 3], curl: &mut [MultiFab; 3]) {
    let [bx, by, bz] = bfield;
    let [cx, cy, cz] = curl;
    apply_kernel(cx, false, |f, i, j, k, n| {
        a.downward_dy(&bz.fabs()[f], i, j, k, n) - a.downward_dz(&by.fabs()[f], i, j, k, n)
    });
    apply_kernel(cy, false, |f, i, j, k, n| {
        a.downward_dz(&bx.fabs()[f], i, j, k, n) - a.downward_dx(&bz.fabs()[f], i, j, k, n)
    });
    apply_kernel(cz, false, |f, i, j, k, n| {
        a.downward_dx(&by.fabs()[f], i, j, k, n) - a.downward_dy(&bx.fabs()[f], i, j, k, n)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoxArray;
    use pic_types::grid::{Geometry, IndexType, SpaceDim};

    fn geom_3d(n: i32, dx: f64) -> Geometry {
        Geometry::new(SpaceDim::ThreeD, [n; 3], [0.0; 3], [dx; 3], [true; 3])
    }

    fn e_staggering(d: usize) -> IndexType {
        let mut ix = [true; 3];
        ix[d] = false;
        IndexType(ix)
    }

    fn b_staggering(d: usize) -> IndexType {
        let mut ix = [false; 3];
        ix[d] = true;
        IndexType(ix)
    }

    fn alloc(ba: &BoxArray, stag: fn(usize) -> IndexType) -> [MultiFab; 3] {
        [0, 1, 2].map(|d| MultiFab::new(ba, stag(d), 1, IntVect::UNIT))
    }

    #[test]
    fn test_dispatch_by_algorithm_and_grid() {
        let cell = [0.1; 3];
        let s = FiniteDifferenceSolver::<3>::new(ElectromagneticSolverAlgo::Yee, GridType::Staggered, cell)
            .unwrap();
        assert_eq!(s.stencil_name(), "yee");
        let s = FiniteDifferenceSolver::<3>::new(
            ElectromagneticSolverAlgo::HybridPic,
            GridType::Staggered,
            cell,
        )
        .unwrap();
        assert_eq!(s.stencil_name(), "yee");
        let s = FiniteDifferenceSolver::<3>::new(ElectromagneticSolverAlgo::Ckc, GridType::Hybrid, cell)
            .unwrap();
        assert_eq!(s.stencil_name(), "ckc");
        let s = FiniteDifferenceSolver::<3>::new(
            ElectromagneticSolverAlgo::Psatd,
            GridType::Collocated,
            cell,
        )
        .unwrap();
        assert_eq!(s.stencil_name(), "nodal");

        let err = FiniteDifferenceSolver::<3>::new(
            ElectromagneticSolverAlgo::Psatd,
            GridType::Staggered,
            cell,
        )
        .unwrap_err();
        assert!(matches!(err, PicError::UnknownAlgorithm(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_cylindrical_accepts_only_yee_family() {
        let cell = [0.1, 1.0, 0.1];
        assert!(FiniteDifferenceSolver::<2>::new_cylindrical(ElectromagneticSolverAlgo::Yee, cell, 2, 0.0).is_ok());
        assert!(
            FiniteDifferenceSolver::<2>::new_cylindrical(ElectromagneticSolverAlgo::HybridPic, cell, 1, 0.0)
                .is_ok()
        );
        let err = FiniteDifferenceSolver::<2>::new_cylindrical(ElectromagneticSolverAlgo::Ckc, cell, 1, 0.0)
            .unwrap_err();
        assert!(matches!(err, PicError::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_div_e_of_linear_field_is_constant() {
        let dx = 0.5;
        let geom = geom_3d(4, dx);
        let ba = BoxArray::decompose(&geom, IntVect::splat(2)).unwrap();
        let mut e = alloc(&ba, e_staggering);
        // E = (x, 2y, -z) with positions at the staggered points
        for (d, scale) in [(0usize, 1.0), (1, 2.0), (2, -1.0)] {
            let ix = e[d].ixtype();
            for fab in e[d].fabs_mut() {
                let grown = fab.grown_box();
                grown.for_each(|i, j, k| {
                    let p = [i, j, k][d] as f64 + if ix.is_nodal(d) { 0.0 } else { 0.5 };
                    fab.set(i, j, k, 0, scale * p * dx);
                });
            }
        }
        let mut div = MultiFab::new(&ba, IndexType::NODE, 1, IntVect::ZERO);
        for algo in [ElectromagneticSolverAlgo::Yee, ElectromagneticSolverAlgo::Ckc] {
            let s = FiniteDifferenceSolver::<3>::new(algo, GridType::Staggered, geom.cell_size).unwrap();
            s.compute_div_e(&e, &mut div);
            for fab in div.fabs() {
                fab.valid_box().for_each(|i, j, k| {
                    assert!((fab.at(i, j, k, 0) - 2.0).abs() < 1e-12);
                });
            }
        }
    }

    #[test]
    fn test_div_of_evolved_b_stays_zero() {
        // Discrete ∇·∇× = 0 for Yee on a periodic 3-D grid
        let dx = 1.0e-2;
        let geom = geom_3d(6, dx);
        let ba = BoxArray::decompose(&geom, IntVect::splat(3)).unwrap();
        let mut e = alloc(&ba, e_staggering);
        for (d, mf) in e.iter_mut().enumerate() {
            for fab in mf.fabs_mut() {
                let valid = fab.valid_box();
                valid.for_each(|i, j, k| {
                    let v = ((i * 7 + j * 3 + k * 5 + d as i32 * 11) % 13) as f64 - 6.0;
                    fab.set(i, j, k, 0, v);
                });
            }
            mf.fill_boundary(&geom);
        }
        {
            let s = FiniteDifferenceSolver::<3>::new(
                ElectromagneticSolverAlgo::Yee,
                GridType::Staggered,
                geom.cell_size,
            )
            .unwrap();
            let mut b = alloc(&ba, b_staggering);
            s.evolve_b(&mut b, &e, 1.0e-11).unwrap();
            for mf in b.iter_mut() {
                mf.fill_boundary(&geom);
            }
            // div B on cell centres with Yee downward differences from the face values
            let yee = CartesianYee::<3>::new(geom.cell_size);
            let mut max_div = 0.0_f64;
            let mut max_b = 0.0_f64;
            for f in 0..ba.len() {
                let cell = ba.get(f);
                cell.for_each(|i, j, k| {
                    let div = yee.upward_dx(&b[0].fabs()[f], i, j, k, 0)
                        + yee.upward_dy(&b[1].fabs()[f], i, j, k, 0)
                        + yee.upward_dz(&b[2].fabs()[f], i, j, k, 0);
                    max_div = max_div.max(div.abs());
                });
            }
            for mf in &b {
                max_b = max_b.max(mf.max_abs(0));
            }
            assert!(max_b > 0.0);
            assert!(max_div < 1e-9 * max_b / dx, "div B = {max_div}");
        }
    }

    #[test]
    fn test_curl_b_matches_evolve_e_without_current() {
        let dx = 0.1;
        let geom = geom_3d(4, dx);
        let ba = BoxArray::single(&geom);
        let s = FiniteDifferenceSolver::<3>::new(ElectromagneticSolverAlgo::Yee, GridType::Staggered, geom.cell_size)
            .unwrap();
        let mut b = alloc(&ba, b_staggering);
        for (d, mf) in b.iter_mut().enumerate() {
            for fab in mf.fabs_mut() {
                let valid = fab.valid_box();
                valid.for_each(|i, j, k| fab.set(i, j, k, 0, (i + 2 * j - k + d as i32) as f64 * 1e-9));
            }
            mf.fill_boundary(&geom);
        }
        let mut curl = alloc(&ba, e_staggering);
        s.compute_curl_b(&b, &mut curl).unwrap();

        let dt = 1.0e-12;
        let mut e = alloc(&ba, e_staggering);
        s.evolve_e(&mut e, &b, None, dt).unwrap();
        for d in 0..3 {
            let (fe, fc) = (&e[d].fabs()[0], &curl[d].fabs()[0]);
            fe.valid_box().for_each(|i, j, k| {
                let expected = C * C * dt * fc.at(i, j, k, 0);
                assert!((fe.at(i, j, k, 0) - expected).abs() <= 1e-12 * expected.abs().max(1e-30));
            });
        }
    }

    #[test]
    fn test_evolve_e_current_term() {
        let geom = geom_3d(2, 0.1);
        let ba = BoxArray::single(&geom);
        let s = FiniteDifferenceSolver::<3>::new(ElectromagneticSolverAlgo::Yee, GridType::Staggered, geom.cell_size)
            .unwrap();
        let b = alloc(&ba, b_staggering);
        let mut j = alloc(&ba, e_staggering);
        j[2].set_val(3.0);
        let mut e = alloc(&ba, e_staggering);
        let dt = 1.0e-12;
        s.evolve_e(&mut e, &b, Some(&j), dt).unwrap();
        assert_eq!(e[0].max_abs(0), 0.0);
        let expected = 3.0 * dt / EP0;
        assert!((e[2].max_abs(0) - expected).abs() < 1e-12 * expected);
    }

    #[test]
    fn test_cylindrical_evolve_is_rejected() {
        let geom = Geometry::new(SpaceDim::Rz, [4, 1, 4], [0.0; 3], [0.1, 1.0, 0.1], [false, false, true]);
        let ba = BoxArray::single(&geom);
        let s = FiniteDifferenceSolver::<2>::new_cylindrical(ElectromagneticSolverAlgo::Yee, geom.cell_size, 1, 0.0)
            .unwrap();
        let axes = geom.active_axes();
        let mut b = [0, 1, 2].map(|d| MultiFab::new(&ba, b_staggering(d).masked(axes), 1, IntVect::ZERO));
        let e = [0, 1, 2].map(|d| MultiFab::new(&ba, e_staggering(d).masked(axes), 1, IntVect::ZERO));
        assert!(s.evolve_b(&mut b, &e, 1e-12).is_err());
    }

    fn rz_fields(ncomp_e: usize, ncomp_div: usize) -> ([MultiFab; 3], MultiFab) {
        let geom = Geometry::new(SpaceDim::Rz, [4, 1, 4], [0.0; 3], [0.1, 1.0, 0.1], [false, false, true]);
        let ba = BoxArray::single(&geom);
        let axes = geom.active_axes();
        let e = [0, 1, 2].map(|d| MultiFab::new(&ba, e_staggering(d).masked(axes), ncomp_e, IntVect::new(1, 0, 1)));
        let div = MultiFab::new(&ba, IndexType([true, false, true]), ncomp_div, IntVect::ZERO);
        (e, div)
    }

    fn two_mode_solver() -> FiniteDifferenceSolver<2> {
        FiniteDifferenceSolver::<2>::new_cylindrical(ElectromagneticSolverAlgo::Yee, [0.1, 1.0, 0.1], 2, 0.0)
            .unwrap()
    }

    #[test]
    #[should_panic(expected = "divE has 2 components, 2 azimuthal modes need 3")]
    fn test_cylindrical_div_e_rejects_even_component_count() {
        let (e, mut div) = rz_fields(3, 2);
        two_mode_solver().compute_div_e(&e, &mut div);
    }

    #[test]
    #[should_panic(expected = "E component 0 has 1 components, 2 azimuthal modes need 3")]
    fn test_cylindrical_div_e_rejects_missing_modes_in_e() {
        let (e, mut div) = rz_fields(1, 3);
        two_mode_solver().compute_div_e(&e, &mut div);
    }

    #[test]
    fn test_cylindrical_div_e_of_zero_field_with_matching_modes() {
        let (e, mut div) = rz_fields(3, 3);
        two_mode_solver().compute_div_e(&e, &mut div);
        for n in 0..3 {
            assert_eq!(div.max_abs(n), 0.0);
        }
    }
}
