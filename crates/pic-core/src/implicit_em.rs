// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Semi-Implicit EM Plug-in
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Semi-implicit Maxwell update in an ohmic medium.
//!
//! One step of length `dt`:
//!   1. `B^{n+1/2} = B^{n-1/2} - dt ∇×E^n`
//!   2. Newton or Picard solve of `E^{n+1/2} = E^n + R(E^{n+1/2})` at
//!      `t + dt/2` with
//!      `R(E) = (dt/2) (c² ∇×B^{n+1/2} - (σE + J)/ε0)`
//!   3. `E^{n+1} = 2 E^{n+1/2} - E^n`
//!
//! With `σ = 0` and `J = 0` this is the explicit Yee leapfrog; the
//! conduction term is treated implicitly, so stiff `σ dt/ε0` is stable.
//! `R` is affine in E and the Jacobian is flagged linear.

use crate::domain::BoxArray;
use crate::fd_solver::FiniteDifferenceSolver;
use crate::field_array::MultiFab;
use crate::fields::{FieldRegistry, FieldType};
use crate::solver_vec::SolverVec;
use pic_math::newton::{NewtonReport, NonlinearSolver, Ops};
use pic_math::nonlinear::ConfiguredSolver;
use pic_types::config::ImplicitSolverConfig;
use pic_types::constants::{C, EP0};
use pic_types::error::{PicError, PicResult};
use pic_types::grid::{Geometry, IntVect, SpaceDim};

/// Mesh state seen by the nonlinear residual.
pub struct EmFieldState<const DIM: usize> {
    fields: FieldRegistry,
    solver: FiniteDifferenceSolver<DIM>,
    sigma: f64,
    /// `∇×B^{n+1/2}`, refreshed once per step.
    curl_b: [MultiFab; 3],
    rhs_evals: usize,
    rhs_time: f64,
}

impl<const DIM: usize> EmFieldState<DIM> {
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn solver(&self) -> &FiniteDifferenceSolver<DIM> {
        &self.solver
    }

    /// Residual evaluations so far, Jacobian probes included.
    pub fn rhs_evals(&self) -> usize {
        self.rhs_evals
    }

    /// Time passed to the most recent residual evaluation.
    pub fn rhs_time(&self) -> f64 {
        self.rhs_time
    }
}

impl<const DIM: usize> Ops<SolverVec> for EmFieldState<DIM> {
    fn compute_rhs(
        &mut self,
        rhs: &mut SolverVec,
        u: &SolverVec,
        time: f64,
        dt: f64,
        _iteration: i32,
        _from_jacobian: bool,
    ) {
        self.rhs_evals += 1;
        self.rhs_time = time;
        let half = 0.5 * dt;
        let e = &u.array_vec()[0];
        let out = &mut rhs.array_vec_mut()[0];
        let current = self.fields.array(FieldType::CurrentFp, 0);
        for d in 0..3 {
            out[d].lin_comb(C * C * half, &self.curl_b[d], -half * self.sigma / EP0, &e[d]);
            if let Some(j) = current {
                out[d].saxpy(-half / EP0, &j[d]);
            }
        }
    }
}

pub struct SemiImplicitEm<const DIM: usize> {
    state: EmFieldState<DIM>,
    nlsolver: ConfiguredSolver<SolverVec>,
    e: SolverVec,
    e_old: SolverVec,
    step: usize,
}

impl<const DIM: usize> SemiImplicitEm<DIM> {
    /// Allocate E, B and J on `boxes` and set up the nonlinear solver
    /// named by `config.nonlinear_solver`.
    /// `sigma` is the conductivity in S/m.
    pub fn new(
        geom: Geometry,
        boxes: BoxArray,
        config: &ImplicitSolverConfig,
        sigma: f64,
    ) -> PicResult<Self> {
        let matches_dim = match geom.dim {
            SpaceDim::OneD => DIM == 1,
            SpaceDim::TwoD => DIM == 2,
            SpaceDim::ThreeD => DIM == 3,
            SpaceDim::Rz => false,
        };
        if !matches_dim {
            return Err(PicError::ConfigError(format!(
                "semi-implicit EM solver built for DIM = {DIM} cannot run on a {:?} geometry",
                geom.dim
            )));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(PicError::PhysicsViolation(format!(
                "conductivity must be finite and >= 0, got {sigma}"
            )));
        }
        config.validate()?;

        let fs = &config.field_solver;
        let solver = FiniteDifferenceSolver::<DIM>::new(fs.algorithm, fs.grid_type, geom.cell_size)?;
        let ng = solver.max_guard_cells();

        let mut fields = FieldRegistry::new(geom, boxes, fs.grid_type, 1);
        fields.alloc(FieldType::EfieldFp, 0, ng);
        fields.alloc(FieldType::BfieldFp, 0, ng);
        fields.alloc(FieldType::CurrentFp, 0, IntVect::ZERO);

        let mut e = SolverVec::default();
        e.define(&fields, FieldType::EfieldFp, FieldType::None);
        let mut e_old = SolverVec::default();
        e_old.define_like(&e);

        let curl_b = {
            let layout = &e.array_vec()[0];
            [layout[0].new_like(), layout[1].new_like(), layout[2].new_like()]
        };

        let mut nlsolver = ConfiguredSolver::from_config(config);
        nlsolver.define(&e);
        if let Some(jac) = nlsolver.jacobian_mut() {
            jac.set_is_linear(true);
        }

        log::debug!(
            "SemiImplicitEm<{}>: {:?} solver, sigma = {sigma:e} S/m, explicit dt limit = {:e} s",
            DIM,
            nlsolver.kind(),
            solver.compute_max_dt()
        );

        Ok(SemiImplicitEm {
            state: EmFieldState {
                fields,
                solver,
                sigma,
                curl_b,
                rhs_evals: 0,
                rhs_time: 0.0,
            },
            nlsolver,
            e,
            e_old,
            step: 0,
        })
    }

    pub fn state(&self) -> &EmFieldState<DIM> {
        &self.state
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.state.fields
    }

    /// Mutable registry, for setting initial fields and the source current.
    pub fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.state.fields
    }

    pub fn nonlinear_solver(&self) -> &ConfiguredSolver<SolverVec> {
        &self.nlsolver
    }

    pub fn sigma(&self) -> f64 {
        self.state.sigma
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// Advance E and B by `dt`.
    pub fn one_step(&mut self, time: f64, dt: f64) -> PicResult<NewtonReport> {
        let state = &mut self.state;

        // E^n
        self.e.copy_from_fields(&state.fields, FieldType::EfieldFp, FieldType::None);
        self.e_old.copy_from(&self.e);

        // B^{n+1/2} and its curl
        state.fields.fill_boundary_array(FieldType::EfieldFp, 0);
        {
            let (b, e) = state.fields.array_pair_mut(FieldType::BfieldFp, FieldType::EfieldFp, 0);
            state.solver.evolve_b(b, e, dt)?;
        }
        state.fields.fill_boundary_array(FieldType::BfieldFp, 0);
        let b = state
            .fields
            .array(FieldType::BfieldFp, 0)
            .ok_or_else(|| PicError::GridMismatch("B field not allocated".to_string()))?;
        state.solver.compute_curl_b(b, &mut state.curl_b)?;

        // E^{n+1/2}
        let half_time = time + 0.5 * dt;
        let report = self
            .nlsolver
            .solve(&mut self.e, &self.e_old, half_time, dt, &mut self.state)?;

        // E^{n+1}
        self.e.scale(2.0);
        self.e -= &self.e_old;
        self.e.copy_to_fields(&mut self.state.fields);
        self.state.fields.fill_boundary_array(FieldType::EfieldFp, 0);

        self.step += 1;
        log::debug!(
            "SemiImplicitEm: step {} at t = {:e}, {} nonlinear / {} GMRES iterations, |F| = {:.3e}",
            self.step,
            time + dt,
            report.iterations,
            report.linear_iterations,
            report.norm_abs
        );
        Ok(report)
    }
}
