// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Property-Based Tests (proptest) for pic-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for pic-math using proptest.
//!
//! Covers: vector-space primitives, GMRES on diagonally dominant systems,
//! matrix-free Jacobian on linear right-hand sides.

use ndarray::{Array1, Array2};
use pic_math::gmres::{Gmres, GmresConfig};
use pic_math::jfnk::JacobianFunctionMf;
use pic_math::newton::Ops;
use pic_math::vector::{DenseOperator, LinearOperator, SolverVector};
use pic_types::config::JfnkParams;
use proptest::prelude::*;

fn vec_strategy(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-10.0f64..10.0, n)
}

// ── Vector Primitives ────────────────────────────────────────────────

proptest! {
    /// lin_comb agrees with increment + scale.
    #[test]
    fn lin_comb_matches_increment(
        (x, y) in (1usize..40).prop_flat_map(|n| (vec_strategy(n), vec_strategy(n))),
        a in -3.0f64..3.0,
        b in -3.0f64..3.0,
    ) {
        let x = Array1::from(x);
        let y = Array1::from(y);
        let mut z = x.create_like();
        z.lin_comb(a, &x, b, &y);

        let mut w = x.create_like();
        w.copy_from(&x);
        w.scale(a);
        w.increment(&y, b);
        for i in 0..x.len() {
            prop_assert!((z[i] - w[i]).abs() < 1e-12);
        }
    }

    /// Dot product is symmetric and the norm is non-negative.
    #[test]
    fn dot_symmetric_norm_nonneg(
        (x, y) in (1usize..40).prop_flat_map(|n| (vec_strategy(n), vec_strategy(n))),
    ) {
        let x = Array1::from(x);
        let y = Array1::from(y);
        prop_assert!((x.dot_product(&y) - y.dot_product(&x)).abs() < 1e-12);
        prop_assert!(x.norm2() >= 0.0);
        prop_assert!(x.dot_product(&y).abs() <= x.norm2() * y.norm2() + 1e-9);
    }

    /// Scaling scales the norm by |a|.
    #[test]
    fn scale_is_homogeneous(x in vec_strategy(16), a in -5.0f64..5.0) {
        let x = Array1::from(x);
        let mut y = x.clone();
        y.scale(a);
        prop_assert!((y.norm2() - a.abs() * x.norm2()).abs() < 1e-9 * (1.0 + x.norm2()));
    }
}

// ── GMRES ────────────────────────────────────────────────────────────

fn dominant_matrix(n: usize, off: &[f64]) -> Array2<f64> {
    let mut m = Array2::zeros((n, n));
    for i in 0..n {
        m[[i, i]] = 4.0;
        if i > 0 {
            m[[i, i - 1]] = off[i % off.len()];
        }
        if i + 1 < n {
            m[[i, i + 1]] = -off[(i + 1) % off.len()];
        }
    }
    m
}

proptest! {
    /// GMRES solves strictly diagonally dominant nonsymmetric systems and
    /// reports the true residual.
    #[test]
    fn gmres_solves_dominant_systems(
        n in 2usize..30,
        off in prop::collection::vec(-1.5f64..1.5, 1..6),
        rhs in vec_strategy(30),
    ) {
        let m = dominant_matrix(n, &off);
        let b = Array1::from(rhs[..n].to_vec());
        let mut op = DenseOperator::new(m.clone());
        let mut gmres = Gmres::new(GmresConfig { restart: 10, max_iter: 500, verbose: 0 });
        let mut x = op.make_vec_lhs();
        let res = gmres.solve(&mut op, &mut x, &b, 1e-10, 0.0);

        let r = &b - &m.dot(&x);
        let true_res = r.dot(&r).sqrt();
        prop_assert!(res.converged, "GMRES failed: {:?}", res);
        prop_assert!(true_res <= 1e-9 * (1.0 + b.dot(&b).sqrt()));
        prop_assert!((res.residual - true_res).abs() <= 1e-8 * (1.0 + true_res));
    }

    /// Iterations never exceed the budget.
    #[test]
    fn gmres_respects_budget(n in 5usize..25, budget in 1usize..4) {
        let m = dominant_matrix(n, &[1.0, -0.7, 0.3]);
        let b = Array1::from_elem(n, 1.0);
        let mut op = DenseOperator::new(m);
        let mut gmres = Gmres::new(GmresConfig { restart: 2, max_iter: budget, verbose: 0 });
        let mut x = op.make_vec_lhs();
        let res = gmres.solve(&mut op, &mut x, &b, 1e-14, 0.0);
        prop_assert!(res.iterations <= budget);
    }
}

// ── Matrix-Free Jacobian ─────────────────────────────────────────────

struct AffineOps {
    m: Array2<f64>,
    c: Array1<f64>,
}

impl Ops<Array1<f64>> for AffineOps {
    fn compute_rhs(
        &mut self,
        rhs: &mut Array1<f64>,
        u: &Array1<f64>,
        _time: f64,
        _dt: f64,
        _iteration: i32,
        _from_jacobian: bool,
    ) {
        rhs.assign(&(&self.m.dot(u) + &self.c));
    }
}

proptest! {
    /// For an affine R the finite difference recovers (I - M) dU.
    #[test]
    fn jfnk_exact_for_affine_rhs(
        u0 in vec_strategy(6),
        du in prop::collection::vec(-1.0f64..1.0, 6),
        is_linear in any::<bool>(),
    ) {
        let n = 6;
        let m = dominant_matrix(n, &[0.5, -0.25]);
        let mut ops = AffineOps { m: m.clone(), c: Array1::from_elem(n, 0.5) };
        let u0 = Array1::from(u0);
        let du = Array1::from(du);
        prop_assume!(du.norm2() > 1e-3);

        let mut jac = JacobianFunctionMf::new(&u0, &JfnkParams { epsilon: 1e-6, is_linear });
        let mut r0 = u0.create_like();
        ops.compute_rhs(&mut r0, &u0, 0.0, 1.0, 0, false);
        jac.set_base_solution(&u0);
        jac.set_base_rhs(&r0);

        let mut df = u0.create_like();
        jac.apply(&mut ops, &mut df, &du);
        let exact = &du - &m.dot(&du);
        for i in 0..n {
            prop_assert!((df[i] - exact[i]).abs() < 1e-4 * (1.0 + exact[i].abs()),
                "df[{}] = {}, exact = {}", i, df[i], exact[i]);
        }
    }
}
