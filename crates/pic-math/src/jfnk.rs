// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Matrix-Free Jacobian
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Jacobian-free action of `dF/dU` for residuals `F(U) = U - b - R(U)`.
//!
//! The Jacobian is never formed. Its action on a direction `dU` is the
//! forward difference of the residual around the base state `Y0`:
//!
//! ```text
//! eps = 1                            if R is linear in U
//! eps = epsJFNK · ||R0|| / ||dU||    if ||Y0|| = 0
//! eps = epsJFNK · ||Y0|| / ||dU||    otherwise
//! dF  = dU - (R(Y0 + eps·dU) - R0) / eps
//! ```
//!
//! The perturbation scaling follows NITSOL (Pernice & Walker, SIAM J.
//! Sci. Comput. 19 (1998) 302): it balances truncation error against
//! cancellation without problem-specific scaling.

use crate::newton::Ops;
use crate::vector::{LinearOperator, SolverVector};
use pic_types::config::JfnkParams;
use pic_types::constants::JFNK_ZERO_NORM;

/// Iteration index passed to [`Ops::compute_rhs`] for Jacobian probes.
pub const JACOBIAN_PROBE_ITERATION: i32 = -1;

/// Approximate inverse of the Jacobian, applied on the right inside GMRES.
pub trait Preconditioner<V> {
    /// `out = M⁻¹ x`
    fn apply(&mut self, out: &mut V, x: &V);

    /// Rebuild from the current Newton iterate. No-op by default.
    fn update(&mut self, _u: &V, _time: f64, _dt: f64) {}
}

/// `M = I`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl<V: SolverVector> Preconditioner<V> for IdentityPreconditioner {
    fn apply(&mut self, out: &mut V, x: &V) {
        out.copy_from(x);
    }
}

/// Matrix-free Jacobian operator. Owns its scratch vectors (`Z`, `Y0`,
/// `R0`, `R`); they are allocated once from a template vector.
pub struct JacobianFunctionMf<V> {
    z: V,
    y0: V,
    r0: V,
    r: V,
    norm_y0: f64,
    eps_jfnk: f64,
    is_linear: bool,
    cur_time: f64,
    dt: f64,
    pc: Option<Box<dyn Preconditioner<V>>>,
}

impl<V: SolverVector> JacobianFunctionMf<V> {
    pub fn new(template: &V, params: &JfnkParams) -> Self {
        JacobianFunctionMf {
            z: template.create_like(),
            y0: template.create_like(),
            r0: template.create_like(),
            r: template.create_like(),
            norm_y0: 0.0,
            eps_jfnk: params.epsilon,
            is_linear: params.is_linear,
            cur_time: 0.0,
            dt: 0.0,
            pc: None,
        }
    }

    /// Store the Newton iterate `Y0` and its norm.
    pub fn set_base_solution(&mut self, u: &V) {
        self.y0.copy_from(u);
        self.norm_y0 = self.y0.norm2();
    }

    /// Store `R0 = R(Y0)`.
    pub fn set_base_rhs(&mut self, r: &V) {
        self.r0.copy_from(r);
    }

    pub fn set_jfnk_eps(&mut self, eps: f64) {
        self.eps_jfnk = eps;
    }

    pub fn set_is_linear(&mut self, is_linear: bool) {
        self.is_linear = is_linear;
    }

    pub fn is_linear(&self) -> bool {
        self.is_linear
    }

    pub fn cur_time(&mut self, time: f64) {
        self.cur_time = time;
    }

    pub fn cur_time_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    pub fn time(&self) -> f64 {
        self.cur_time
    }

    pub fn time_step(&self) -> f64 {
        self.dt
    }

    pub fn base_solution(&self) -> &V {
        &self.y0
    }

    pub fn base_rhs(&self) -> &V {
        &self.r0
    }

    pub fn set_preconditioner(&mut self, pc: Box<dyn Preconditioner<V>>) {
        self.pc = Some(pc);
    }

    pub fn update_precond_mat(&mut self, u: &V) {
        if let Some(pc) = self.pc.as_mut() {
            pc.update(u, self.cur_time, self.dt);
        }
    }

    /// `out = M⁻¹ x`, a plain copy when no preconditioner is installed.
    pub fn precond(&mut self, out: &mut V, x: &V) {
        match self.pc.as_mut() {
            Some(pc) => pc.apply(out, x),
            None => out.copy_from(x),
        }
    }

    /// Finite-difference step for a direction of norm `norm_du`.
    ///
    /// When both `Y0` and `R0` vanish the scaled step degenerates to 0;
    /// the unscaled `epsJFNK / ||dU||` is used instead.
    pub fn perturbation_size(&self, norm_du: f64) -> f64 {
        if self.is_linear {
            return 1.0;
        }
        let eps = if self.norm_y0 == 0.0 {
            self.eps_jfnk * self.r0.norm2() / norm_du
        } else {
            self.eps_jfnk * self.norm_y0 / norm_du
        };
        if eps > 0.0 && eps.is_finite() {
            eps
        } else {
            self.eps_jfnk / norm_du
        }
    }

    /// `dF = J dU`. Directions with `||dU|| < 1e-15` give `dF = 0`
    /// without evaluating `R`.
    pub fn apply<O: Ops<V>>(&mut self, ops: &mut O, df: &mut V, du: &V) {
        let norm_du = du.norm2();
        if norm_du < JFNK_ZERO_NORM {
            df.zero();
            return;
        }
        let eps = self.perturbation_size(norm_du);
        let eps_inv = 1.0 / eps;

        // Z = Y0 + eps dU
        self.z.lin_comb(1.0, &self.y0, eps, du);
        ops.compute_rhs(
            &mut self.r,
            &self.z,
            self.cur_time,
            self.dt,
            JACOBIAN_PROBE_ITERATION,
            true,
        );

        // dF = dU - (R(Z) - R0)/eps
        df.lin_comb(1.0, du, eps_inv, &self.r0);
        df.increment(&self.r, -eps_inv);
    }

    /// Pair the Jacobian with the physics plug-in so GMRES can drive it.
    pub fn bind<'a, O: Ops<V>>(&'a mut self, ops: &'a mut O) -> JfnkOperator<'a, V, O> {
        JfnkOperator { jac: self, ops }
    }

    // ───────────────────────── vector primitives ─────────────────────

    pub fn create(&self, template: &V) -> V {
        template.create_like()
    }

    pub fn make_vec_lhs(&self) -> V {
        self.r.create_like()
    }

    pub fn make_vec_rhs(&self) -> V {
        self.r.create_like()
    }

    pub fn assign(&self, z: &mut V, u: &V) {
        z.copy_from(u);
    }

    pub fn increment(&self, z: &mut V, u: &V, scale: f64) {
        z.increment(u, scale);
    }

    pub fn scale(&self, u: &mut V, scale: f64) {
        u.scale(scale);
    }

    pub fn lin_comb(&self, u: &mut V, a: f64, x: &V, b: f64, y: &V) {
        u.lin_comb(a, x, b, y);
    }

    pub fn set_to_zero(&self, u: &mut V) {
        u.zero();
    }

    pub fn set_val(&self, u: &mut V, val: f64) {
        u.set_val(val);
    }

    pub fn dot_product(&self, x: &V, y: &V) -> f64 {
        x.dot_product(y)
    }

    pub fn norm2(&self, u: &V) -> f64 {
        u.norm2()
    }
}

/// [`JacobianFunctionMf`] bound to an [`Ops`] for the duration of one
/// linear solve.
pub struct JfnkOperator<'a, V, O> {
    jac: &'a mut JacobianFunctionMf<V>,
    ops: &'a mut O,
}

impl<V: SolverVector, O: Ops<V>> LinearOperator<V> for JfnkOperator<'_, V, O> {
    fn apply(&mut self, out: &mut V, x: &V) {
        self.jac.apply(&mut *self.ops, out, x);
    }

    fn precond(&mut self, out: &mut V, x: &V) {
        self.jac.precond(out, x);
    }

    fn make_vec_lhs(&self) -> V {
        self.jac.make_vec_lhs()
    }

    fn make_vec_rhs(&self) -> V {
        self.jac.make_vec_rhs()
    }
}
