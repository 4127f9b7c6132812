// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Solver-State Vector
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Unknowns of the implicit solve: an optional three-component array
//! field and an optional scalar field, one of each per mesh level.
//!
//! A `SolverVec` is either undefined (no storage) or defined with a
//! fixed pair of field kinds. Every binary operation requires both
//! operands to be defined with the same kinds; violating that is a
//! programming error and panics. The arrays carry no ghost cells.
//!
//! `Clone` is not implemented: deep copies go through [`SolverVec::copy_from`]
//! and [`SolverVec::take`] moves the storage out, leaving `self` undefined.

use crate::field_array::MultiFab;
use crate::fields::{FieldRegistry, FieldType};
use pic_math::vector::SolverVector;
use pic_types::grid::{Geometry, IntVect};
use std::ops::{AddAssign, SubAssign};

/// Number of mesh levels carried by a solver vector.
pub const NUM_AMR_LEVELS: usize = 1;

#[derive(Debug, Default)]
pub struct SolverVec {
    defined: bool,
    array_kind: FieldType,
    scalar_kind: FieldType,
    array_vec: Vec<[MultiFab; 3]>,
    scalar_vec: Vec<MultiFab>,
    geom: Option<Geometry>,
}

impl SolverVec {
    /// Allocate storage shaped like the registry fields `array_kind` and
    /// `scalar_kind` (either may be [`FieldType::None`]). Re-defining a
    /// defined vector reallocates it.
    pub fn define(&mut self, ctx: &FieldRegistry, array_kind: FieldType, scalar_kind: FieldType) {
        assert!(
            array_kind == FieldType::None || array_kind.is_field_array(),
            "SolverVec::define() called with array_kind {array_kind}, which is not an array field"
        );
        assert!(
            scalar_kind == FieldType::None || !scalar_kind.is_field_array(),
            "SolverVec::define() called with scalar_kind {scalar_kind}, which is an array field"
        );
        assert!(
            array_kind != FieldType::None || scalar_kind != FieldType::None,
            "SolverVec::define() called with no field kinds"
        );

        let mut array_vec = Vec::new();
        let mut scalar_vec = Vec::new();
        for lev in 0..NUM_AMR_LEVELS {
            if array_kind != FieldType::None {
                let Some(src) = ctx.array(array_kind, lev) else {
                    panic!("SolverVec::define() called with {array_kind}, not allocated at level {lev}");
                };
                array_vec.push([
                    Self::unguarded_like(&src[0]),
                    Self::unguarded_like(&src[1]),
                    Self::unguarded_like(&src[2]),
                ]);
            }
            if scalar_kind != FieldType::None {
                let Some(src) = ctx.scalar(scalar_kind, lev) else {
                    panic!("SolverVec::define() called with {scalar_kind}, not allocated at level {lev}");
                };
                scalar_vec.push(Self::unguarded_like(src));
            }
        }

        self.array_kind = array_kind;
        self.scalar_kind = scalar_kind;
        self.array_vec = array_vec;
        self.scalar_vec = scalar_vec;
        self.geom = Some(ctx.geom().clone());
        self.defined = true;
    }

    /// Allocate zero-filled storage with the kinds and layout of `other`.
    pub fn define_like(&mut self, other: &SolverVec) {
        Self::assert_is_defined(other);
        self.array_kind = other.array_kind;
        self.scalar_kind = other.scalar_kind;
        self.array_vec = other
            .array_vec
            .iter()
            .map(|a| [a[0].new_like(), a[1].new_like(), a[2].new_like()])
            .collect();
        self.scalar_vec = other.scalar_vec.iter().map(MultiFab::new_like).collect();
        self.geom = other.geom.clone();
        self.defined = true;
    }

    fn unguarded_like(mf: &MultiFab) -> MultiFab {
        MultiFab::new(mf.box_array(), mf.ixtype(), mf.ncomp(), IntVect::ZERO)
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn array_kind(&self) -> FieldType {
        self.array_kind
    }

    pub fn scalar_kind(&self) -> FieldType {
        self.scalar_kind
    }

    pub fn array_vec(&self) -> &[[MultiFab; 3]] {
        &self.array_vec
    }

    pub fn array_vec_mut(&mut self) -> &mut [[MultiFab; 3]] {
        &mut self.array_vec
    }

    pub fn scalar_vec(&self) -> &[MultiFab] {
        &self.scalar_vec
    }

    pub fn scalar_vec_mut(&mut self) -> &mut [MultiFab] {
        &mut self.scalar_vec
    }

    /// Move the storage out, leaving `self` undefined.
    pub fn take(&mut self) -> SolverVec {
        std::mem::take(self)
    }

    fn assert_is_defined(x: &SolverVec) {
        assert!(
            x.is_defined(),
            "SolverVec::function(X) called with undefined SolverVec X"
        );
    }

    fn assert_same_type(&self, x: &SolverVec) {
        assert!(
            x.array_kind == self.array_kind && x.scalar_kind == self.scalar_kind,
            "SolverVec::function(X) called with SolverVec X of different type"
        );
    }

    fn assert_self_defined(&self, op: &str) {
        assert!(
            self.is_defined(),
            "SolverVec::{op}() called on undefined SolverVec"
        );
    }

    /// Apply `f` to every (self, other) array pair, components and scalar.
    fn for_each_pair(&mut self, other: &SolverVec, mut f: impl FnMut(&mut MultiFab, &MultiFab)) {
        for (mine, theirs) in self.array_vec.iter_mut().zip(&other.array_vec) {
            for n in 0..3 {
                f(&mut mine[n], &theirs[n]);
            }
        }
        for (mine, theirs) in self.scalar_vec.iter_mut().zip(&other.scalar_vec) {
            f(mine, theirs);
        }
    }

    fn for_each_mut(&mut self, mut f: impl FnMut(&mut MultiFab)) {
        for arr in self.array_vec.iter_mut() {
            arr.iter_mut().for_each(&mut f);
        }
        self.scalar_vec.iter_mut().for_each(f);
    }

    /// Deep copy; defines `self` like `other` when undefined.
    pub fn copy_from(&mut self, other: &SolverVec) {
        Self::assert_is_defined(other);
        if self.is_defined() {
            self.assert_same_type(other);
        } else {
            self.define_like(other);
        }
        self.for_each_pair(other, |d, s| d.copy_from(s));
    }

    /// Load the valid regions of the registry fields.
    pub fn copy_from_fields(&mut self, ctx: &FieldRegistry, array_kind: FieldType, scalar_kind: FieldType) {
        if !self.is_defined() {
            self.define(ctx, array_kind, scalar_kind);
        }
        assert!(
            self.array_kind == array_kind && self.scalar_kind == scalar_kind,
            "SolverVec::copy_from_fields() called with kinds ({array_kind}, {scalar_kind}) on a \
             ({}, {}) SolverVec",
            self.array_kind,
            self.scalar_kind
        );
        for lev in 0..self.array_vec.len() {
            if let Some(src) = ctx.array(array_kind, lev) {
                for n in 0..3 {
                    self.array_vec[lev][n].copy_valid_from(&src[n]);
                }
            }
        }
        for lev in 0..self.scalar_vec.len() {
            if let Some(src) = ctx.scalar(scalar_kind, lev) {
                self.scalar_vec[lev].copy_valid_from(src);
            }
        }
    }

    /// Store the contents into the valid regions of the registry fields
    /// of the same kinds. Ghost cells of the targets are not refreshed.
    pub fn copy_to_fields(&self, ctx: &mut FieldRegistry) {
        self.assert_self_defined("copy_to_fields");
        for (lev, arr) in self.array_vec.iter().enumerate() {
            let Some(dst) = ctx.array_mut(self.array_kind, lev) else {
                panic!("SolverVec::copy_to_fields() target {} missing", self.array_kind);
            };
            for n in 0..3 {
                dst[n].copy_valid_from(&arr[n]);
            }
        }
        for (lev, mf) in self.scalar_vec.iter().enumerate() {
            let Some(dst) = ctx.scalar_mut(self.scalar_kind, lev) else {
                panic!("SolverVec::copy_to_fields() target {} missing", self.scalar_kind);
            };
            dst.copy_valid_from(mf);
        }
    }

    /// `self = a*x + b*y`
    pub fn lin_comb(&mut self, a: f64, x: &SolverVec, b: f64, y: &SolverVec) {
        Self::assert_is_defined(x);
        Self::assert_is_defined(y);
        self.assert_same_type(x);
        self.assert_same_type(y);
        for (lev, arr) in self.array_vec.iter_mut().enumerate() {
            for n in 0..3 {
                arr[n].lin_comb(a, &x.array_vec[lev][n], b, &y.array_vec[lev][n]);
            }
        }
        for (lev, mf) in self.scalar_vec.iter_mut().enumerate() {
            mf.lin_comb(a, &x.scalar_vec[lev], b, &y.scalar_vec[lev]);
        }
    }

    /// `self += a*x`
    pub fn increment(&mut self, x: &SolverVec, a: f64) {
        Self::assert_is_defined(x);
        self.assert_same_type(x);
        self.for_each_pair(x, |d, s| d.saxpy(a, s));
    }

    /// `self *= a`
    pub fn scale(&mut self, a: f64) {
        self.assert_self_defined("scale");
        self.for_each_mut(|mf| mf.mult(a));
    }

    pub fn zero(&mut self) {
        self.set_val(0.0);
    }

    pub fn set_val(&mut self, val: f64) {
        self.assert_self_defined("set_val");
        self.for_each_mut(|mf| mf.set_val(val));
    }

    /// Sum over owned points of every component and level.
    pub fn dot_product(&self, x: &SolverVec) -> f64 {
        Self::assert_is_defined(x);
        self.assert_self_defined("dot_product");
        self.assert_same_type(x);
        let Some(geom) = self.geom.as_ref() else {
            unreachable!("defined SolverVec always carries its geometry");
        };
        let mut result = 0.0;
        for (mine, theirs) in self.array_vec.iter().zip(&x.array_vec) {
            for n in 0..3 {
                result += mine[n].dot(&theirs[n], geom);
            }
        }
        for (mine, theirs) in self.scalar_vec.iter().zip(&x.scalar_vec) {
            result += mine.dot(theirs, geom);
        }
        result
    }

    pub fn norm2(&self) -> f64 {
        self.dot_product(self).sqrt()
    }
}

impl AddAssign<&SolverVec> for SolverVec {
    fn add_assign(&mut self, rhs: &SolverVec) {
        Self::assert_is_defined(rhs);
        self.assert_same_type(rhs);
        self.for_each_pair(rhs, |d, s| d.plus(s));
    }
}

impl SubAssign<&SolverVec> for SolverVec {
    fn sub_assign(&mut self, rhs: &SolverVec) {
        Self::assert_is_defined(rhs);
        self.assert_same_type(rhs);
        self.for_each_pair(rhs, |d, s| d.minus(s));
    }
}

impl SolverVector for SolverVec {
    fn create_like(&self) -> Self {
        let mut v = SolverVec::default();
        v.define_like(self);
        v
    }

    fn copy_from(&mut self, other: &Self) {
        SolverVec::copy_from(self, other);
    }

    fn lin_comb(&mut self, a: f64, x: &Self, b: f64, y: &Self) {
        SolverVec::lin_comb(self, a, x, b, y);
    }

    fn increment(&mut self, x: &Self, a: f64) {
        SolverVec::increment(self, x, a);
    }

    fn scale(&mut self, a: f64) {
        SolverVec::scale(self, a);
    }

    fn set_val(&mut self, val: f64) {
        SolverVec::set_val(self, val);
    }

    fn dot_product(&self, x: &Self) -> f64 {
        SolverVec::dot_product(self, x)
    }
}
