// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — GMRES
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Restarted GMRES(m) over any [`LinearOperator`].
//!
//! GMRES (Generalised Minimal RESidual) builds an orthonormal Krylov
//! basis via Arnoldi iteration with modified Gram-Schmidt, then solves
//! the projected least-squares problem using Givens rotations on the
//! upper Hessenberg matrix.  When the basis reaches size `m` without
//! convergence the solver restarts from the current approximate
//! solution.
//!
//! A right preconditioner is applied: we solve `A M⁻¹ y = b` and set
//! `x = M⁻¹ y`, so the monitored residual is the true residual of the
//! unpreconditioned system.
//!
//! All vector work goes through the operator's primitives, so the
//! solver never needs to know the layout of `V`.

use crate::vector::{LinearOperator, SolverVector};

// ───────────────────────────── configuration ─────────────────────────

/// Configuration for the GMRES(m) solver.
#[derive(Debug, Clone)]
pub struct GmresConfig {
    /// Krylov subspace dimension before restart (default: 30).
    pub restart: usize,
    /// Maximum number of Krylov iterations summed over restarts
    /// (default: 1000).
    pub max_iter: usize,
    /// 0 = silent, 1 = log every restart, 2+ = log every iteration
    /// (default: 2).
    pub verbose: u32,
}

impl Default for GmresConfig {
    fn default() -> Self {
        GmresConfig {
            restart: 30,
            max_iter: 1000,
            verbose: 2,
        }
    }
}

impl From<&pic_types::config::GmresParams> for GmresConfig {
    fn from(p: &pic_types::config::GmresParams) -> Self {
        GmresConfig {
            restart: p.restart_length,
            max_iter: p.max_iterations,
            verbose: p.verbose_int,
        }
    }
}

/// Result of a GMRES solve.
#[derive(Debug, Clone)]
pub struct GmresResult {
    /// Total number of operator applications (inner iterations summed
    /// over all restarts).
    pub iterations: usize,
    /// Final L2 norm of the true residual `b - A x`.
    pub residual: f64,
    /// Whether `residual <= max(rtol·||r0||, atol)` was reached.
    pub converged: bool,
}

// ───────────────────── Givens rotation helpers ──────────────────────

/// A single Givens rotation storing (c, s) such that
/// ```text
/// | c  -s | | a |   | r |
/// | s   c | | b | = | 0 |
/// ```
#[derive(Clone, Copy)]
struct GivensRotation {
    c: f64,
    s: f64,
}

impl GivensRotation {
    /// Compute the rotation that zeroes `b` in (a, b).
    fn compute(a: f64, b: f64) -> Self {
        if b.abs() < 1e-300 {
            GivensRotation { c: 1.0, s: 0.0 }
        } else if b.abs() > a.abs() {
            let tau = -a / b;
            let s = 1.0 / (1.0 + tau * tau).sqrt();
            GivensRotation { c: s * tau, s }
        } else {
            let tau = -b / a;
            let c = 1.0 / (1.0 + tau * tau).sqrt();
            GivensRotation { c, s: c * tau }
        }
    }

    #[inline]
    fn apply(&self, a: &mut f64, b: &mut f64) {
        let (ta, tb) = (*a, *b);
        *a = self.c * ta - self.s * tb;
        *b = self.s * ta + self.c * tb;
    }
}

// ───────────────────────────── workspace ─────────────────────────────

struct Workspace<V> {
    basis: Vec<V>,
    r: V,
    w: V,
    z: V,
}

impl<V: SolverVector> Workspace<V> {
    fn new<O: LinearOperator<V>>(op: &O, m: usize) -> Self {
        Workspace {
            basis: (0..=m).map(|_| op.make_vec_lhs()).collect(),
            r: op.make_vec_rhs(),
            w: op.make_vec_rhs(),
            z: op.make_vec_lhs(),
        }
    }
}

// ─────────────────────────── main solver ─────────────────────────────

/// Restarted GMRES(m) solver. Krylov vectors are allocated on the first
/// solve (or by [`Gmres::define`]) and reused afterwards.
pub struct Gmres<V> {
    config: GmresConfig,
    work: Option<Workspace<V>>,
}

impl<V: SolverVector> Gmres<V> {
    pub fn new(config: GmresConfig) -> Self {
        Gmres { config, work: None }
    }

    /// Allocate the Krylov basis using the operator's vector factory.
    pub fn define<O: LinearOperator<V>>(&mut self, op: &O) {
        self.work = Some(Workspace::new(op, self.config.restart.max(1)));
    }

    pub fn set_verbose(&mut self, v: u32) {
        self.config.verbose = v;
    }

    pub fn set_restart_length(&mut self, m: usize) {
        self.config.restart = m.max(1);
        self.work = None;
    }

    pub fn set_max_iters(&mut self, n: usize) {
        self.config.max_iter = n;
    }

    pub fn config(&self) -> &GmresConfig {
        &self.config
    }

    /// Solve `A x = b`. `x` is the initial guess on entry and the
    /// solution on exit.
    ///
    /// # Algorithm
    ///
    /// ```text
    /// r = b - A·x
    /// while iterations < max_iter:
    ///   beta = ||r||₂,  V[0] = r / beta
    ///   for j = 0 .. m-1:              (Arnoldi)
    ///     w = A M⁻¹ V[j]
    ///     for i = 0 .. j:              (modified Gram-Schmidt)
    ///       H[i,j] = <w, V[i]>
    ///       w -= H[i,j] V[i]
    ///     H[j+1,j] = ||w||₂,  V[j+1] = w / H[j+1,j]
    ///     apply previous Givens to H[:,j], zero H[j+1,j]
    ///     if |g[j+1]| <= target: break
    ///   solve H y = g,  x += M⁻¹ (V·y)
    ///   r = b - A·x
    /// ```
    pub fn solve<O: LinearOperator<V>>(
        &mut self,
        op: &mut O,
        x: &mut V,
        b: &V,
        rtol: f64,
        atol: f64,
    ) -> GmresResult {
        let m = self.config.restart.max(1);
        let verbose = self.config.verbose;
        let max_iter = self.config.max_iter;

        if self.work.as_ref().map_or(true, |w| w.basis.len() != m + 1) {
            self.work = Some(Workspace::new(op, m));
        }
        let Some(work) = self.work.as_mut() else {
            unreachable!("GMRES workspace allocated above");
        };
        let Workspace { basis, r, w, z } = work;

        // r = b - A x
        op.apply(w, x);
        op.lin_comb(r, 1.0, b, -1.0, w);
        let initial_res_norm = op.norm2(r);
        let target = (rtol * initial_res_norm).max(atol);

        if initial_res_norm <= target || initial_res_norm < 1e-300 {
            if verbose >= 1 {
                log::debug!(
                    "GMRES: converged on entry, residual = {:.5e}",
                    initial_res_norm
                );
            }
            return GmresResult {
                iterations: 0,
                residual: initial_res_norm,
                converged: true,
            };
        }

        // Upper Hessenberg matrix H[(m+1) x m] stored column-major
        // H[i][j] => h_store[j * (m+1) + i]
        let h_rows = m + 1;
        let mut h_store = vec![0.0; h_rows * m];
        let mut g = vec![0.0; m + 1];
        let mut y = vec![0.0; m];
        let mut givens: Vec<GivensRotation> = Vec::with_capacity(m);

        let mut total_iters = 0usize;
        let mut residual = initial_res_norm;
        let mut restart = 0usize;

        // ───── outer restart loop ─────
        while total_iters < max_iter {
            let beta = residual;
            op.lin_comb(&mut basis[0], 1.0 / beta, r, 0.0, r);

            h_store.iter_mut().for_each(|h| *h = 0.0);
            g.iter_mut().for_each(|v| *v = 0.0);
            g[0] = beta;
            givens.clear();

            let mut inner_iters = 0usize;
            let mut converged_inner = false;

            // ───── Arnoldi iteration ─────
            for j in 0..m {
                if total_iters >= max_iter {
                    break;
                }
                inner_iters = j + 1;
                total_iters += 1;

                // w = A M⁻¹ V[j]
                op.precond(z, &basis[j]);
                op.apply(w, z);

                // Modified Gram-Schmidt orthogonalisation
                for (i, vi) in basis.iter().enumerate().take(j + 1) {
                    let h_ij = op.dot_product(w, vi);
                    h_store[j * h_rows + i] = h_ij;
                    op.increment(w, vi, -h_ij);
                }

                let h_jp1_j = op.norm2(w);
                h_store[j * h_rows + (j + 1)] = h_jp1_j;

                if h_jp1_j > 1e-300 {
                    op.lin_comb(&mut basis[j + 1], 1.0 / h_jp1_j, w, 0.0, w);
                } else {
                    op.set_to_zero(&mut basis[j + 1]);
                }

                // Apply all previous Givens rotations to column j of H
                for (i, rot) in givens.iter().enumerate() {
                    let (mut ha, mut hb) = (h_store[j * h_rows + i], h_store[j * h_rows + i + 1]);
                    rot.apply(&mut ha, &mut hb);
                    h_store[j * h_rows + i] = ha;
                    h_store[j * h_rows + i + 1] = hb;
                }

                // New rotation zeroing H[j+1, j], also applied to g
                let rot =
                    GivensRotation::compute(h_store[j * h_rows + j], h_store[j * h_rows + j + 1]);
                {
                    let (mut ha, mut hb) = (h_store[j * h_rows + j], h_store[j * h_rows + j + 1]);
                    rot.apply(&mut ha, &mut hb);
                    h_store[j * h_rows + j] = ha;
                    h_store[j * h_rows + j + 1] = hb;
                    let (mut ga, mut gb) = (g[j], g[j + 1]);
                    rot.apply(&mut ga, &mut gb);
                    g[j] = ga;
                    g[j + 1] = gb;
                }
                givens.push(rot);

                let res_est = g[j + 1].abs();
                if verbose >= 2 {
                    log::trace!(
                        "GMRES: iteration = {:4}, residual estimate = {:.5e}",
                        total_iters,
                        res_est
                    );
                }

                if res_est <= target || h_jp1_j < 1e-300 {
                    converged_inner = true;
                    break;
                }
            }

            if inner_iters == 0 {
                break;
            }

            // ───── back-substitution: H y = g ─────
            let k = inner_iters;
            for i in (0..k).rev() {
                let mut sum = g[i];
                for jj in (i + 1)..k {
                    sum -= h_store[jj * h_rows + i] * y[jj];
                }
                let diag = h_store[i * h_rows + i];
                y[i] = if diag.abs() > 1e-300 { sum / diag } else { 0.0 };
            }

            // ───── update solution: x += M⁻¹ (V y) ─────
            op.set_to_zero(w);
            for (vi, &yi) in basis.iter().zip(y.iter()).take(k) {
                op.increment(w, vi, yi);
            }
            op.precond(z, w);
            op.increment(x, z, 1.0);

            // True residual for the restart / exit decision
            op.apply(w, x);
            op.lin_comb(r, 1.0, b, -1.0, w);
            residual = op.norm2(r);
            restart += 1;

            if verbose >= 1 {
                log::debug!(
                    "GMRES: restart {:3}, iterations = {:4}, residual = {:.5e}, target = {:.5e}",
                    restart,
                    total_iters,
                    residual,
                    target
                );
            }

            if residual <= target || (converged_inner && residual < 1e-300) {
                return GmresResult {
                    iterations: total_iters,
                    residual,
                    converged: true,
                };
            }
        }

        if verbose >= 1 {
            log::debug!(
                "GMRES: iteration budget {} exhausted, residual = {:.5e}",
                max_iter,
                residual
            );
        }
        GmresResult {
            iterations: total_iters,
            residual,
            converged: residual <= target,
        }
    }
}

// ═══════════════════════════════ tests ═══════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DenseOperator;
    use ndarray::{Array1, Array2};

    /// 1-D Laplacian with Dirichlet ends plus a shift, non-symmetric
    /// through an upwind advection term.
    fn advection_diffusion(n: usize, shift: f64, adv: f64) -> Array2<f64> {
        let mut a = Array2::zeros((n, n));
        for i in 0..n {
            a[[i, i]] = 2.0 + shift + adv;
            if i > 0 {
                a[[i, i - 1]] = -1.0 - adv;
            }
            if i + 1 < n {
                a[[i, i + 1]] = -1.0;
            }
        }
        a
    }

    fn residual_norm(a: &Array2<f64>, x: &Array1<f64>, b: &Array1<f64>) -> f64 {
        (b - &a.dot(x)).dot(&(b - &a.dot(x))).sqrt()
    }

    /// Diagonal (Jacobi) right preconditioner around a dense matrix.
    struct JacobiOperator {
        inner: DenseOperator,
        inv_diag: Array1<f64>,
    }

    impl LinearOperator<Array1<f64>> for JacobiOperator {
        fn apply(&mut self, out: &mut Array1<f64>, x: &Array1<f64>) {
            self.inner.apply(out, x);
        }
        fn precond(&mut self, out: &mut Array1<f64>, x: &Array1<f64>) {
            out.assign(&(x * &self.inv_diag));
        }
        fn make_vec_lhs(&self) -> Array1<f64> {
            self.inner.make_vec_lhs()
        }
    }

    #[test]
    fn test_gmres_solves_nonsymmetric_system() {
        let n = 40;
        let a = advection_diffusion(n, 0.1, 0.5);
        let b = Array1::from_iter((0..n).map(|i| (i as f64 * 0.3).sin()));
        let mut op = DenseOperator::new(a.clone());
        let mut x = Array1::zeros(n);

        let mut gmres = Gmres::new(GmresConfig {
            restart: 50,
            max_iter: 500,
            verbose: 0,
        });
        let result = gmres.solve(&mut op, &mut x, &b, 1e-10, 0.0);

        assert!(
            result.converged,
            "GMRES should converge: residual = {}, iters = {}",
            result.residual, result.iterations
        );
        let true_res = residual_norm(&a, &x, &b);
        assert!(
            true_res <= 1e-10 * b.dot(&b).sqrt() * 1.01,
            "True residual {true_res} exceeds requested tolerance"
        );
        assert!(
            (true_res - result.residual).abs() < 1e-12,
            "Reported residual must be the true residual"
        );
    }

    #[test]
    fn test_gmres_restart_still_converges() {
        let n = 60;
        let a = advection_diffusion(n, 0.5, 0.2);
        let b = Array1::from_elem(n, 1.0);
        let mut op = DenseOperator::new(a.clone());
        let mut x = Array1::zeros(n);

        let mut gmres = Gmres::new(GmresConfig {
            restart: 5,
            max_iter: 5000,
            verbose: 0,
        });
        let result = gmres.solve(&mut op, &mut x, &b, 1e-8, 0.0);

        assert!(result.converged, "GMRES(5) should converge: {result:?}");
        assert!(
            result.iterations > 5,
            "Small restart length must force at least one restart"
        );
        assert!(residual_norm(&a, &x, &b) < 1e-8 * (n as f64).sqrt() * 1.01);
    }

    #[test]
    fn test_gmres_zero_rhs() {
        let mut op = DenseOperator::new(advection_diffusion(10, 0.0, 0.0));
        let b = Array1::zeros(10);
        let mut x = Array1::zeros(10);
        let mut gmres = Gmres::new(GmresConfig::default());
        let result = gmres.solve(&mut op, &mut x, &b, 1e-4, 0.0);

        assert!(result.converged, "Zero rhs should converge immediately");
        assert_eq!(result.iterations, 0);
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_gmres_identity_converges_in_one_iteration() {
        let n = 12;
        let mut op = DenseOperator::new(Array2::eye(n) * 3.0);
        let b = Array1::from_iter((0..n).map(|i| i as f64 - 4.0));
        let mut x = Array1::zeros(n);
        let mut gmres = Gmres::new(GmresConfig::default());
        let result = gmres.solve(&mut op, &mut x, &b, 1e-12, 0.0);

        assert!(result.converged);
        assert_eq!(result.iterations, 1, "Scaled identity has a 1-D Krylov space");
        for i in 0..n {
            assert!((x[i] - b[i] / 3.0).abs() < 1e-13);
        }
    }

    #[test]
    fn test_gmres_absolute_tolerance_stops_early() {
        let n = 40;
        let a = advection_diffusion(n, 0.01, 0.0);
        let b = Array1::from_elem(n, 1.0);
        let mut op = DenseOperator::new(a);

        let mut x_tight = Array1::zeros(n);
        let mut gmres = Gmres::new(GmresConfig {
            restart: 50,
            max_iter: 1000,
            verbose: 0,
        });
        let tight = gmres.solve(&mut op, &mut x_tight, &b, 1e-12, 0.0);

        // The residual of this weakly shifted Laplacian only drops below
        // one a few iterations before the Krylov space is exhausted.
        let mut x_loose = Array1::zeros(n);
        let loose = gmres.solve(&mut op, &mut x_loose, &b, 1e-12, 1.0);

        assert!(tight.converged && loose.converged);
        assert!(loose.residual <= 1.0);
        assert!(
            loose.iterations < tight.iterations,
            "atol should cut iterations: {} vs {}",
            loose.iterations,
            tight.iterations
        );
    }

    #[test]
    fn test_gmres_reports_budget_exhaustion() {
        let n = 50;
        let mut op = DenseOperator::new(advection_diffusion(n, 0.0, 0.0));
        let b = Array1::from_elem(n, 1.0);
        let mut x = Array1::zeros(n);
        let mut gmres = Gmres::new(GmresConfig {
            restart: 3,
            max_iter: 4,
            verbose: 0,
        });
        let result = gmres.solve(&mut op, &mut x, &b, 1e-14, 0.0);

        assert!(!result.converged, "4 iterations cannot solve a 50x50 Laplacian");
        assert_eq!(result.iterations, 4);
        assert!(result.residual < (n as f64).sqrt(), "Residual should still drop");
    }

    #[test]
    fn test_right_preconditioner_reduces_iterations() {
        let n = 80;
        let mut a = advection_diffusion(n, 0.0, 0.0);
        // Badly scaled diagonal
        for i in 0..n {
            let s = 1.0 + 50.0 * (i as f64 / n as f64);
            a[[i, i]] *= s;
        }
        let b = Array1::from_elem(n, 1.0);
        let inv_diag = Array1::from_iter((0..n).map(|i| 1.0 / a[[i, i]]));

        let config = GmresConfig {
            restart: 80,
            max_iter: 1000,
            verbose: 0,
        };
        let mut plain = DenseOperator::new(a.clone());
        let mut x_plain = Array1::zeros(n);
        let r_plain = Gmres::new(config.clone()).solve(&mut plain, &mut x_plain, &b, 1e-10, 0.0);

        let mut jacobi = JacobiOperator {
            inner: DenseOperator::new(a.clone()),
            inv_diag,
        };
        let mut x_pc = Array1::zeros(n);
        let r_pc = Gmres::new(config).solve(&mut jacobi, &mut x_pc, &b, 1e-10, 0.0);

        assert!(r_plain.converged && r_pc.converged);
        assert!(
            r_pc.iterations <= r_plain.iterations,
            "Jacobi preconditioning should not slow down: {} vs {}",
            r_pc.iterations,
            r_plain.iterations
        );
        assert!(residual_norm(&a, &x_pc, &b) < 1e-10 * (n as f64).sqrt() * 1.01);
    }
}
