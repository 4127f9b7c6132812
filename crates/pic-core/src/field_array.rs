// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Field Arrays
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Box-decomposed mesh arrays with ghost regions.
//!
//! A [`Fab`] holds one box worth of data (valid region plus `ngrow`
//! ghost layers) as an `Array4<f64>` shaped `[nx, ny, nz, ncomp]` and is
//! addressed with global `(i, j, k)` indices. A [`MultiFab`] is one fab
//! per box of a [`BoxArray`], all sharing the same staggering.
//!
//! Arithmetic runs over whole arrays (ghosts included) with one rayon
//! task per fab. `dot` sums owned points only, so nodal points shared by
//! two boxes, or by both ends of a periodic axis, count once.

use crate::domain::BoxArray;
use ndarray::{Array4, Zip};
use pic_types::grid::{Geometry, IndexBox, IndexType, IntVect};
use rayon::prelude::*;

/// Data for one box.
#[derive(Debug, Clone, PartialEq)]
pub struct Fab {
    valid: IndexBox,
    grown: IndexBox,
    data: Array4<f64>,
}

impl Fab {
    /// `valid` is already expressed in the staggered index space.
    pub fn new(valid: IndexBox, ngrow: IntVect, ncomp: usize) -> Self {
        let grown = valid.grow(ngrow);
        let [nx, ny, nz] = grown.shape();
        Fab {
            valid,
            grown,
            data: Array4::zeros((nx, ny, nz, ncomp)),
        }
    }

    pub fn valid_box(&self) -> IndexBox {
        self.valid
    }

    /// Valid box plus ghost layers.
    pub fn grown_box(&self) -> IndexBox {
        self.grown
    }

    pub fn ncomp(&self) -> usize {
        self.data.dim().3
    }

    #[inline]
    fn offset(&self, i: i32, j: i32, k: i32) -> [usize; 3] {
        debug_assert!(
            self.grown.contains(IntVect::new(i, j, k)),
            "index ({i}, {j}, {k}) outside fab {:?}",
            self.grown
        );
        [
            (i - self.grown.lo[0]) as usize,
            (j - self.grown.lo[1]) as usize,
            (k - self.grown.lo[2]) as usize,
        ]
    }

    #[inline]
    pub fn at(&self, i: i32, j: i32, k: i32, n: usize) -> f64 {
        let [a, b, c] = self.offset(i, j, k);
        self.data[[a, b, c, n]]
    }

    #[inline]
    pub fn set(&mut self, i: i32, j: i32, k: i32, n: usize, v: f64) {
        let [a, b, c] = self.offset(i, j, k);
        self.data[[a, b, c, n]] = v;
    }

    #[inline]
    pub fn add(&mut self, i: i32, j: i32, k: i32, n: usize, v: f64) {
        let [a, b, c] = self.offset(i, j, k);
        self.data[[a, b, c, n]] += v;
    }

    pub fn data(&self) -> &Array4<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array4<f64> {
        &mut self.data
    }
}

/// One fab per box, common staggering, component count and ghost width.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFab {
    boxes: BoxArray,
    ixtype: IndexType,
    ncomp: usize,
    ngrow: IntVect,
    fabs: Vec<Fab>,
}

impl MultiFab {
    pub fn new(boxes: &BoxArray, ixtype: IndexType, ncomp: usize, ngrow: IntVect) -> Self {
        let fabs = boxes
            .boxes()
            .iter()
            .map(|bx| Fab::new(bx.convert(ixtype), ngrow, ncomp))
            .collect();
        MultiFab {
            boxes: boxes.clone(),
            ixtype,
            ncomp,
            ngrow,
            fabs,
        }
    }

    /// Zero-filled array with the layout of `self`.
    pub fn new_like(&self) -> Self {
        MultiFab::new(&self.boxes, self.ixtype, self.ncomp, self.ngrow)
    }

    pub fn box_array(&self) -> &BoxArray {
        &self.boxes
    }

    pub fn ixtype(&self) -> IndexType {
        self.ixtype
    }

    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    pub fn n_grow(&self) -> IntVect {
        self.ngrow
    }

    pub fn fabs(&self) -> &[Fab] {
        &self.fabs
    }

    pub fn fabs_mut(&mut self) -> &mut [Fab] {
        &mut self.fabs
    }

    /// Same boxes, staggering, components and ghost width.
    pub fn same_layout(&self, other: &MultiFab) -> bool {
        self.ixtype == other.ixtype
            && self.ncomp == other.ncomp
            && self.ngrow == other.ngrow
            && self.boxes == other.boxes
    }

    fn assert_layout(&self, other: &MultiFab, op: &str) {
        assert!(
            self.same_layout(other),
            "MultiFab::{op} called with incompatible layouts"
        );
    }

    // ───── arithmetic ─────

    pub fn set_val(&mut self, val: f64) {
        self.fabs.par_iter_mut().for_each(|f| f.data.fill(val));
    }

    pub fn copy_from(&mut self, src: &MultiFab) {
        self.assert_layout(src, "copy_from");
        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(d, s)| d.data.assign(&s.data));
    }

    /// Copy valid regions only; ghost widths of the two arrays may differ.
    pub fn copy_valid_from(&mut self, src: &MultiFab) {
        assert!(
            self.ixtype == src.ixtype && self.ncomp == src.ncomp && self.boxes == src.boxes,
            "MultiFab::copy_valid_from called with incompatible layouts"
        );
        let ncomp = self.ncomp;
        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(d, s)| {
                let valid = d.valid;
                valid.for_each(|i, j, k| {
                    for n in 0..ncomp {
                        d.set(i, j, k, n, s.at(i, j, k, n));
                    }
                });
            });
    }

    /// `self += src`
    pub fn plus(&mut self, src: &MultiFab) {
        self.assert_layout(src, "plus");
        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(d, s)| d.data.zip_mut_with(&s.data, |a, &b| *a += b));
    }

    /// `self -= src`
    pub fn minus(&mut self, src: &MultiFab) {
        self.assert_layout(src, "minus");
        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(d, s)| d.data.zip_mut_with(&s.data, |a, &b| *a -= b));
    }

    /// `self *= a`
    pub fn mult(&mut self, a: f64) {
        self.fabs
            .par_iter_mut()
            .for_each(|f| f.data.mapv_inplace(|v| v * a));
    }

    /// `self = a*x + b*y`
    pub fn lin_comb(&mut self, a: f64, x: &MultiFab, b: f64, y: &MultiFab) {
        self.assert_layout(x, "lin_comb");
        self.assert_layout(y, "lin_comb");
        self.fabs
            .par_iter_mut()
            .zip(x.fabs.par_iter().zip(y.fabs.par_iter()))
            .for_each(|(d, (fx, fy))| {
                Zip::from(&mut d.data)
                    .and(&fx.data)
                    .and(&fy.data)
                    .for_each(|s, &xv, &yv| *s = a * xv + b * yv);
            });
    }

    /// `self += a*x`
    pub fn saxpy(&mut self, a: f64, x: &MultiFab) {
        self.assert_layout(x, "saxpy");
        self.fabs
            .par_iter_mut()
            .zip(x.fabs.par_iter())
            .for_each(|(d, s)| d.data.scaled_add(a, &s.data));
    }

    // ───── reductions ─────

    /// Part of `valid` owned by this fab: nodal upper faces belong to
    /// the neighbour unless they sit on a non-periodic domain boundary.
    fn owned_box(&self, valid: IndexBox, geom: &Geometry) -> IndexBox {
        let nodal_domain = geom.domain.convert(self.ixtype);
        let mut owned = valid;
        for d in 0..3 {
            if self.ixtype.is_nodal(d)
                && !(valid.hi[d] == nodal_domain.hi[d] && !geom.is_periodic(d))
            {
                owned.hi[d] -= 1;
            }
        }
        owned
    }

    /// Inner product over owned points and all components. Partial sums
    /// are combined in fab order.
    pub fn dot(&self, other: &MultiFab, geom: &Geometry) -> f64 {
        self.assert_layout(other, "dot");
        let ncomp = self.ncomp;
        let partial: Vec<f64> = self
            .fabs
            .par_iter()
            .zip(other.fabs.par_iter())
            .map(|(a, b)| {
                let owned = self.owned_box(a.valid, geom);
                let mut sum = 0.0;
                owned.for_each(|i, j, k| {
                    for n in 0..ncomp {
                        sum += a.at(i, j, k, n) * b.at(i, j, k, n);
                    }
                });
                sum
            })
            .collect();
        partial.iter().sum()
    }

    /// Largest `|value|` of component `n` over valid regions.
    pub fn max_abs(&self, n: usize) -> f64 {
        self.fabs
            .par_iter()
            .map(|f| {
                let mut m = 0.0_f64;
                f.valid.for_each(|i, j, k| m = m.max(f.at(i, j, k, n).abs()));
                m
            })
            .reduce(|| 0.0, f64::max)
    }

    // ───── ghost exchange ─────

    /// Fill ghost points from the valid data of neighbouring fabs,
    /// including periodic images. Ghosts with no source (outside a
    /// non-periodic boundary) are left untouched.
    pub fn fill_boundary(&mut self, geom: &Geometry) {
        if self.ngrow == IntVect::ZERO {
            return;
        }
        let ncomp = self.ncomp;
        let period = [
            geom.domain.length(0),
            geom.domain.length(1),
            geom.domain.length(2),
        ];
        let shift_range = |d: usize| -> &'static [i32] {
            if geom.is_periodic(d) {
                &[-1, 0, 1]
            } else {
                &[0]
            }
        };

        // Gather (point, values) per destination fab from immutable views.
        let fabs = &self.fabs;
        let updates: Vec<(Vec<IntVect>, Vec<f64>)> = fabs
            .par_iter()
            .map(|dst| {
                let mut points = Vec::new();
                let mut values = Vec::new();
                for &sx in shift_range(0) {
                    for &sy in shift_range(1) {
                        for &sz in shift_range(2) {
                            let shift = IntVect::new(sx * period[0], sy * period[1], sz * period[2]);
                            for src in fabs {
                                let image = IndexBox::new(src.valid.lo + shift, src.valid.hi + shift);
                                let Some(region) = dst.grown.intersect(&image) else {
                                    continue;
                                };
                                region.for_each(|i, j, k| {
                                    let p = IntVect::new(i, j, k);
                                    if dst.valid.contains(p) {
                                        return;
                                    }
                                    let q = p - shift;
                                    points.push(p);
                                    for n in 0..ncomp {
                                        values.push(src.at(q[0], q[1], q[2], n));
                                    }
                                });
                            }
                        }
                    }
                }
                (points, values)
            })
            .collect();

        self.fabs
            .par_iter_mut()
            .zip(updates.into_par_iter())
            .for_each(|(dst, (points, values))| {
                for (m, p) in points.iter().enumerate() {
                    for n in 0..ncomp {
                        dst.set(p[0], p[1], p[2], n, values[m * ncomp + n]);
                    }
                }
            });
    }
}
