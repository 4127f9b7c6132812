// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Picard Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-point iteration `U ← b + R(U)` for `U - b - R(U) = 0`.
//!
//! Converges when `R` is a contraction. Every iteration costs a single
//! residual evaluation and no Krylov solve. The norms are those of the
//! update `ΔU`; the exit tests mirror [`crate::newton::NewtonSolver`]:
//!   1. `||ΔU|| < atol`
//!   2. `||ΔU|| / ||ΔU_0|| < rtol`

use crate::newton::{NewtonReport, NonlinearSolver, Ops};
use crate::vector::SolverVector;
use pic_types::config::{ImplicitSolverConfig, PicardParams};
use pic_types::error::{PicError, PicResult};

struct PicardWork<V> {
    u_prev: V,
    r: V,
}

pub struct PicardSolver<V> {
    params: PicardParams,
    work: Option<PicardWork<V>>,
}

impl<V: SolverVector> PicardSolver<V> {
    pub fn new(config: &ImplicitSolverConfig) -> Self {
        Self::with_params(config.picard.clone())
    }

    pub fn with_params(params: PicardParams) -> Self {
        PicardSolver { params, work: None }
    }

    pub fn params(&self) -> &PicardParams {
        &self.params
    }
}

impl<V: SolverVector> NonlinearSolver<V> for PicardSolver<V> {
    fn define(&mut self, u: &V) {
        assert!(
            self.work.is_none(),
            "Picard nonlinear solver object is already defined!"
        );
        self.work = Some(PicardWork {
            u_prev: u.create_like(),
            r: u.create_like(),
        });
    }

    fn is_defined(&self) -> bool {
        self.work.is_some()
    }

    fn solve<O: Ops<V>>(
        &mut self,
        u: &mut V,
        b: &V,
        time: f64,
        dt: f64,
        ops: &mut O,
    ) -> PicResult<NewtonReport> {
        let PicardParams {
            verbose,
            absolute_tolerance: atol,
            relative_tolerance: rtol,
            max_iterations: maxits,
            require_convergence,
        } = self.params.clone();

        let Some(work) = self.work.as_mut() else {
            panic!("PicardSolver::solve() called on undefined object");
        };

        let mut norm_abs = 0.0;
        let mut norm0 = 1.0;
        let mut norm_rel = 0.0;
        let mut converged = false;

        let mut iter = 0usize;
        while iter < maxits {
            work.u_prev.copy_from(u);
            ops.compute_rhs(&mut work.r, u, time, dt, iter as i32, false);
            u.lin_comb(1.0, b, 1.0, &work.r);

            work.u_prev.increment(u, -1.0);
            norm_abs = work.u_prev.norm2();
            if iter == 0 {
                norm0 = if norm_abs > 0.0 { norm_abs } else { 1.0 };
            }
            norm_rel = norm_abs / norm0;
            iter += 1;

            if verbose || iter == maxits {
                log::info!(
                    "Picard: iter = {:3}, norm = {:.5e} (abs.), {:.5e} (rel.)",
                    iter,
                    norm_abs,
                    norm_rel
                );
            }

            if norm_abs < atol {
                log::info!(
                    "Picard: exiting at iter = {:3}. Satisfied absolute tolerance {:e}",
                    iter,
                    atol
                );
                converged = true;
                break;
            }
            if norm_rel < rtol {
                log::info!(
                    "Picard: exiting at iter = {:3}. Satisfied relative tolerance {:e}",
                    iter,
                    rtol
                );
                converged = true;
                break;
            }
            if iter >= maxits {
                log::info!(
                    "Picard: exiting at iter = {:3}. Maximum iteration reached: iter = {}",
                    iter,
                    maxits
                );
            }
        }

        let mut warning = None;
        if rtol > 0.0 && iter == maxits && !converged {
            let message = format!(
                "Picard solver failed to converge after {iter} iterations. Relative norm is {norm_rel:e} \
                 and the relative tolerance is {rtol:e}. Absolute norm is {norm_abs:e} \
                 and the absolute tolerance is {atol:e}"
            );
            if require_convergence {
                log::error!("{message}");
                return Err(PicError::NotConverged {
                    iterations: iter,
                    message,
                });
            }
            log::warn!("PicardSolver: {message}");
            warning = Some(message);
        }

        Ok(NewtonReport {
            iterations: iter,
            norm_abs,
            norm_rel,
            converged,
            linear_iterations: 0,
            warning,
        })
    }

    fn solver_params(&self) -> (f64, f64, usize) {
        (
            self.params.relative_tolerance,
            self.params.absolute_tolerance,
            self.params.max_iterations,
        )
    }

    fn print_params(&self) {
        let p = &self.params;
        log::info!("Picard verbose:             {}", p.verbose);
        log::info!("Picard max iterations:      {}", p.max_iterations);
        log::info!("Picard relative tolerance:  {:e}", p.relative_tolerance);
        log::info!("Picard absolute tolerance:  {:e}", p.absolute_tolerance);
        log::info!("Picard require convergence: {}", p.require_convergence);
    }
}
