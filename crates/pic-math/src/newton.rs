// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Newton Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Newton-Krylov solver for `F(U) = U - b - R(U) = 0`.
//!
//! `R(U)` is supplied by the physics plug-in through [`Ops`]. Each
//! outer iteration evaluates the residual, refreshes the matrix-free
//! Jacobian around the current iterate and solves `J dU = F` with
//! restarted GMRES.
//!
//! Exit conditions, checked in this order at every iteration:
//!   1. `||F|| < rtol`            (absolute check, compared to rtol)
//!   2. `||F|| / ||F0|| < rtol`   (relative check)
//!   3. `||F|| > 100 ||F0||`      → [`PicError::SolverDiverged`]
//!
//! Exhausting `max_iterations` is an error when `require_convergence`
//! is set, otherwise a logged warning carried in [`NewtonReport`].

use crate::gmres::{Gmres, GmresConfig};
use crate::jfnk::JacobianFunctionMf;
use crate::vector::SolverVector;
use pic_types::config::{GmresParams, ImplicitSolverConfig, JfnkParams, NewtonParams};
use pic_types::constants::NEWTON_DIVERGENCE_FACTOR;
use pic_types::error::{PicError, PicResult};

/// Physics plug-in evaluating the nonlinear right-hand side `R(U)`.
pub trait Ops<V> {
    /// Write `R(u)` into `rhs`. `iteration` is the Newton iteration for
    /// residual evaluations and `-1` for Jacobian probes, in which case
    /// `from_jacobian` is true.
    fn compute_rhs(
        &mut self,
        rhs: &mut V,
        u: &V,
        time: f64,
        dt: f64,
        iteration: i32,
        from_jacobian: bool,
    );
}

/// Outcome of a completed nonlinear solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonReport {
    /// Updates applied to `U`.
    pub iterations: usize,
    /// Final `||F||` (Newton) or `||ΔU||` (Picard).
    pub norm_abs: f64,
    /// Final norm relative to the first one.
    pub norm_rel: f64,
    /// Whether a tolerance test was satisfied.
    pub converged: bool,
    /// Krylov iterations summed over all Newton steps; zero for Picard.
    pub linear_iterations: usize,
    /// Non-convergence message when `require_convergence` is off.
    pub warning: Option<String>,
}

/// Common interface of the nonlinear solvers.
pub trait NonlinearSolver<V> {
    /// Allocate internal vectors shaped like `u`. Panics if called twice.
    fn define(&mut self, u: &V);

    fn is_defined(&self) -> bool;

    /// Solve `U - b - R(U) = 0`; `u` holds the initial guess on entry.
    fn solve<O: Ops<V>>(
        &mut self,
        u: &mut V,
        b: &V,
        time: f64,
        dt: f64,
        ops: &mut O,
    ) -> PicResult<NewtonReport>;

    /// `(rtol, atol, max_iterations)`
    fn solver_params(&self) -> (f64, f64, usize);

    fn print_params(&self);
}

struct NewtonWork<V> {
    du: V,
    f: V,
    r: V,
    jfnk: JacobianFunctionMf<V>,
    gmres: Gmres<V>,
}

pub struct NewtonSolver<V> {
    params: NewtonParams,
    gmres_params: GmresParams,
    jfnk_params: JfnkParams,
    update_pc: bool,
    work: Option<NewtonWork<V>>,
}

impl<V: SolverVector> NewtonSolver<V> {
    pub fn new(config: &ImplicitSolverConfig) -> Self {
        Self::with_params(
            config.newton.clone(),
            config.gmres.clone(),
            config.jfnk.clone(),
        )
    }

    pub fn with_params(params: NewtonParams, gmres_params: GmresParams, jfnk_params: JfnkParams) -> Self {
        NewtonSolver {
            params,
            gmres_params,
            jfnk_params,
            update_pc: false,
            work: None,
        }
    }

    pub fn params(&self) -> &NewtonParams {
        &self.params
    }

    /// Rebuild the preconditioner at every residual evaluation.
    pub fn set_update_preconditioner(&mut self, update: bool) {
        self.update_pc = update;
    }

    /// Access the Jacobian operator, e.g. to install a preconditioner.
    pub fn jacobian_mut(&mut self) -> Option<&mut JacobianFunctionMf<V>> {
        self.work.as_mut().map(|w| &mut w.jfnk)
    }

    /// Residual `F(U) = U - b - R(U)`; refreshes the Jacobian base state.
    #[allow(clippy::too_many_arguments)]
    fn eval_residual<O: Ops<V>>(
        work: &mut NewtonWork<V>,
        u: &V,
        b: &V,
        time: f64,
        dt: f64,
        iter: usize,
        update_pc: bool,
        ops: &mut O,
    ) {
        ops.compute_rhs(&mut work.r, u, time, dt, iter as i32, false);

        work.jfnk.set_base_solution(u);
        work.jfnk.set_base_rhs(&work.r);
        if update_pc {
            work.jfnk.update_precond_mat(u);
        }

        work.f.copy_from(u);
        work.f.increment(&work.r, -1.0);
        work.f.increment(b, -1.0);
    }
}

impl<V: SolverVector> NonlinearSolver<V> for NewtonSolver<V> {
    fn define(&mut self, u: &V) {
        assert!(
            self.work.is_none(),
            "Newton nonlinear solver object is already defined!"
        );
        let mut jfnk = JacobianFunctionMf::new(u, &self.jfnk_params);
        let mut gmres = Gmres::new(GmresConfig::from(&self.gmres_params));
        gmres.define(&jfnk.bind(&mut NoOps));
        self.work = Some(NewtonWork {
            du: u.create_like(),
            f: u.create_like(),
            r: u.create_like(),
            jfnk,
            gmres,
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
        let NewtonParams {
            verbose,
            absolute_tolerance: atol,
            relative_tolerance: rtol,
            max_iterations: maxits,
            require_convergence,
        } = self.params.clone();
        let (gmres_rtol, gmres_atol) = (
            self.gmres_params.relative_tolerance,
            self.gmres_params.absolute_tolerance,
        );
        let update_pc = self.update_pc;

        let Some(work) = self.work.as_mut() else {
            panic!("NewtonSolver::solve() called on undefined object");
        };
        work.jfnk.cur_time(time);
        work.jfnk.cur_time_step(dt);

        let mut norm_abs = 0.0;
        let mut norm0 = 1.0;
        let mut norm_rel = 0.0;
        let mut converged = false;
        let mut linear_iterations = 0usize;

        let mut iter = 0usize;
        while iter < maxits {
            Self::eval_residual(work, u, b, time, dt, iter, update_pc, ops);

            norm_abs = work.f.norm2();
            if iter == 0 {
                norm0 = if norm_abs > 0.0 { norm_abs } else { 1.0 };
            }
            norm_rel = norm_abs / norm0;

            if verbose {
                log::info!(
                    "Newton: iteration = {:3}, norm = {:.5e} (abs.), {:.5e} (rel.)",
                    iter,
                    norm_abs,
                    norm_rel
                );
            }

            // The absolute test compares against rtol; atol is reported only.
            if norm_abs < rtol {
                log::info!(
                    "Newton: exiting at iteration = {:3}. Satisfied absolute tolerance {:e}",
                    iter,
                    atol
                );
                converged = true;
                break;
            }
            if norm_rel < rtol {
                log::info!(
                    "Newton: exiting at iteration = {:3}. Satisfied relative tolerance {:e}",
                    iter,
                    rtol
                );
                converged = true;
                break;
            }
            if norm_abs > NEWTON_DIVERGENCE_FACTOR * norm0 {
                let message = format!(
                    "Newton: exiting at iteration {iter:3}. SOLVER DIVERGED! absolute norm = {norm_abs:e} \
                     has increased by 100X from that after first iteration."
                );
                log::error!("{message}");
                return Err(PicError::SolverDiverged {
                    iteration: iter,
                    message,
                });
            }

            // Newton step: J dU = F
            work.du.zero();
            let result = {
                let mut op = work.jfnk.bind(&mut *ops);
                work.gmres
                    .solve(&mut op, &mut work.du, &work.f, gmres_rtol, gmres_atol)
            };
            linear_iterations += result.iterations;
            if !result.converged {
                log::debug!(
                    "Newton: GMRES stopped after {} iterations with residual {:.5e}",
                    result.iterations,
                    result.residual
                );
            }

            u.increment(&work.du, -1.0);
            iter += 1;
            if iter >= maxits {
                log::info!(
                    "Newton: exiting at iter = {:3}. Maximum iteration reached: iter = {}",
                    iter,
                    maxits
                );
                break;
            }
        }

        let mut warning = None;
        if rtol > 0.0 && iter == maxits {
            let message = format!(
                "Newton solver failed to converge after {iter} iterations. Relative norm is {norm_rel:e} \
                 and the relative tolerance is {rtol:e}. Absolute norm is {norm_abs:e} \
                 and the absolute tolerance is {atol:e}"
            );
            if verbose {
                log::info!("{message}");
            }
            if require_convergence {
                log::error!("{message}");
                return Err(PicError::NotConverged {
                    iterations: iter,
                    message,
                });
            }
            log::warn!("NewtonSolver: {message}");
            warning = Some(message);
        }

        Ok(NewtonReport {
            iterations: iter,
            norm_abs,
            norm_rel,
            converged,
            linear_iterations,
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
        let g = &self.gmres_params;
        log::info!("Newton verbose:             {}", p.verbose);
        log::info!("Newton max iterations:      {}", p.max_iterations);
        log::info!("Newton relative tolerance:  {:e}", p.relative_tolerance);
        log::info!("Newton absolute tolerance:  {:e}", p.absolute_tolerance);
        log::info!("Newton require convergence: {}", p.require_convergence);
        log::info!("GMRES verbose:              {}", g.verbose_int);
        log::info!("GMRES restart length:       {}", g.restart_length);
        log::info!("GMRES max iterations:       {}", g.max_iterations);
        log::info!("GMRES relative tolerance:   {:e}", g.relative_tolerance);
        log::info!("GMRES absolute tolerance:   {:e}", g.absolute_tolerance);
    }
}

/// Placeholder plug-in used only to size the Krylov basis at define time.
struct NoOps;

impl<V> Ops<V> for NoOps {
    fn compute_rhs(&mut self, _: &mut V, _: &V, _: f64, _: f64, _: i32, _: bool) {}
}
