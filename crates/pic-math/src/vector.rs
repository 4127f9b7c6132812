// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Vector Space Contract
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Operations a state vector must support to be driven by the Krylov
//! and Newton solvers, and the operator contract GMRES is written
//! against.
//!
//! `Array1<f64>` implements [`SolverVector`] so the solvers can be used
//! (and tested) on plain dense vectors.

use ndarray::{Array1, Zip};

/// Real vector-space primitives.
pub trait SolverVector {
    /// Allocate a zero-filled vector with the same layout as `self`.
    fn create_like(&self) -> Self;
    /// Deep copy `other` into `self`.
    fn copy_from(&mut self, other: &Self);
    /// `self = a*x + b*y`
    fn lin_comb(&mut self, a: f64, x: &Self, b: f64, y: &Self);
    /// `self += a*x`
    fn increment(&mut self, x: &Self, a: f64);
    /// `self *= a`
    fn scale(&mut self, a: f64);
    fn set_val(&mut self, val: f64);
    fn dot_product(&self, x: &Self) -> f64;

    fn zero(&mut self) {
        self.set_val(0.0);
    }

    fn norm2(&self) -> f64 {
        self.dot_product(self).sqrt()
    }
}

/// Linear operator consumed by [`crate::gmres::Gmres`].
///
/// Only `apply` and `make_vec_lhs` are required; the vector primitives
/// default to the [`SolverVector`] implementation so that an operator
/// may override them (e.g. to restrict a dot product to a subspace).
pub trait LinearOperator<V: SolverVector> {
    /// `out = A x`
    fn apply(&mut self, out: &mut V, x: &V);

    /// `out = M⁻¹ x`; identity by default.
    fn precond(&mut self, out: &mut V, x: &V) {
        out.copy_from(x);
    }

    fn make_vec_lhs(&self) -> V;

    fn make_vec_rhs(&self) -> V {
        self.make_vec_lhs()
    }

    fn assign(&self, y: &mut V, x: &V) {
        y.copy_from(x);
    }

    fn increment(&self, y: &mut V, x: &V, a: f64) {
        y.increment(x, a);
    }

    fn scale(&self, y: &mut V, a: f64) {
        y.scale(a);
    }

    fn lin_comb(&self, y: &mut V, a: f64, x: &V, b: f64, z: &V) {
        y.lin_comb(a, x, b, z);
    }

    fn set_to_zero(&self, y: &mut V) {
        y.zero();
    }

    fn dot_product(&self, x: &V, y: &V) -> f64 {
        x.dot_product(y)
    }

    fn norm2(&self, x: &V) -> f64 {
        x.norm2()
    }
}

// ───────────────────────── dense implementation ─────────────────────

impl SolverVector for Array1<f64> {
    fn create_like(&self) -> Self {
        Array1::zeros(self.len())
    }

    fn copy_from(&mut self, other: &Self) {
        assert_eq!(
            self.len(),
            other.len(),
            "copy_from between vectors of different length"
        );
        self.assign(other);
    }

    fn lin_comb(&mut self, a: f64, x: &Self, b: f64, y: &Self) {
        Zip::from(self)
            .and(x)
            .and(y)
            .for_each(|s, &xi, &yi| *s = a * xi + b * yi);
    }

    fn increment(&mut self, x: &Self, a: f64) {
        self.scaled_add(a, x);
    }

    fn scale(&mut self, a: f64) {
        self.mapv_inplace(|v| v * a);
    }

    fn set_val(&mut self, val: f64) {
        self.fill(val);
    }

    fn dot_product(&self, x: &Self) -> f64 {
        self.dot(x)
    }
}

/// Dense matrix operator `A x`, mostly useful for tests and benches.
#[derive(Debug, Clone)]
pub struct DenseOperator {
    pub matrix: ndarray::Array2<f64>,
}

impl DenseOperator {
    pub fn new(matrix: ndarray::Array2<f64>) -> Self {
        assert_eq!(
            matrix.nrows(),
            matrix.ncols(),
            "DenseOperator requires a square matrix"
        );
        DenseOperator { matrix }
    }
}

impl LinearOperator<Array1<f64>> for DenseOperator {
    fn apply(&mut self, out: &mut Array1<f64>, x: &Array1<f64>) {
        out.assign(&self.matrix.dot(x));
    }

    fn make_vec_lhs(&self) -> Array1<f64> {
        Array1::zeros(self.matrix.ncols())
    }
}
