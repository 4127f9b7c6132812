// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Nonlinear Solver Selection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Runtime choice between the Newton and Picard iterations.

use crate::jfnk::JacobianFunctionMf;
use crate::newton::{NewtonReport, NewtonSolver, NonlinearSolver, Ops};
use crate::picard::PicardSolver;
use crate::vector::SolverVector;
use pic_types::config::{ImplicitSolverConfig, NonlinearSolverType};
use pic_types::error::PicResult;

pub enum ConfiguredSolver<V> {
    Newton(NewtonSolver<V>),
    Picard(PicardSolver<V>),
}

impl<V: SolverVector> ConfiguredSolver<V> {
    /// Build the solver named by `config.nonlinear_solver`.
    pub fn from_config(config: &ImplicitSolverConfig) -> Self {
        match config.nonlinear_solver {
            NonlinearSolverType::Newton => ConfiguredSolver::Newton(NewtonSolver::new(config)),
            NonlinearSolverType::Picard => ConfiguredSolver::Picard(PicardSolver::new(config)),
        }
    }

    pub fn kind(&self) -> NonlinearSolverType {
        match self {
            ConfiguredSolver::Newton(_) => NonlinearSolverType::Newton,
            ConfiguredSolver::Picard(_) => NonlinearSolverType::Picard,
        }
    }

    /// Matrix-free Jacobian; `None` for Picard or before `define`.
    pub fn jacobian_mut(&mut self) -> Option<&mut JacobianFunctionMf<V>> {
        match self {
            ConfiguredSolver::Newton(s) => s.jacobian_mut(),
            ConfiguredSolver::Picard(_) => None,
        }
    }
}

impl<V: SolverVector> NonlinearSolver<V> for ConfiguredSolver<V> {
    fn define(&mut self, u: &V) {
        match self {
            ConfiguredSolver::Newton(s) => s.define(u),
            ConfiguredSolver::Picard(s) => s.define(u),
        }
    }

    fn is_defined(&self) -> bool {
        match self {
            ConfiguredSolver::Newton(s) => s.is_defined(),
            ConfiguredSolver::Picard(s) => s.is_defined(),
        }
    }

    fn solve<O: Ops<V>>(
        &mut self,
        u: &mut V,
        b: &V,
        time: f64,
        dt: f64,
        ops: &mut O,
    ) -> PicResult<NewtonReport> {
        match self {
            ConfiguredSolver::Newton(s) => s.solve(u, b, time, dt, ops),
            ConfiguredSolver::Picard(s) => s.solve(u, b, time, dt, ops),
        }
    }

    fn solver_params(&self) -> (f64, f64, usize) {
        match self {
            ConfiguredSolver::Newton(s) => s.solver_params(),
            ConfiguredSolver::Picard(s) => s.solver_params(),
        }
    }

    fn print_params(&self) {
        match self {
            ConfiguredSolver::Newton(s) => {
                log::info!("Nonlinear solver type:      Newton");
                s.print_params();
            }
            ConfiguredSolver::Picard(s) => {
                log::info!("Nonlinear solver type:      Picard");
                s.print_params();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_selection_follows_config() {
        let mut cfg = ImplicitSolverConfig::default();
        let mut solver: ConfiguredSolver<Array1<f64>> = ConfiguredSolver::from_config(&cfg);
        assert_eq!(solver.kind(), NonlinearSolverType::Newton);
        assert!(solver.jacobian_mut().is_none());
        solver.define(&Array1::zeros(3));
        assert!(solver.jacobian_mut().is_some());

        cfg.apply_override("nonlinear_solver", "picard").unwrap();
        cfg.apply_override("picard.max_iterations", "9").unwrap();
        let mut solver: ConfiguredSolver<Array1<f64>> = ConfiguredSolver::from_config(&cfg);
        assert_eq!(solver.kind(), NonlinearSolverType::Picard);
        assert_eq!(solver.solver_params().2, 9);
        solver.define(&Array1::zeros(3));
        assert!(solver.is_defined());
        assert!(solver.jacobian_mut().is_none());
        solver.print_params();
    }
}
