// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Guard Cell Manager
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Guard-cell counts for allocation and for each exchange of the PIC loop.
//!
//! Every count is the componentwise maximum of what the active features
//! need: particle shape, field stencil, moving window, NCI corrector and
//! current filter. Inactive axes always get zero.

use crate::fd_solver::FiniteDifferenceSolver;
use pic_types::config::{ElectromagneticSolverAlgo, FieldGathering, GridType, GuardCellConfig};
use pic_types::error::{PicError, PicResult};
use pic_types::grid::{IntVect, SpaceDim};
use serde::{Deserialize, Serialize};

/// Gather stencil half-width per particle shape order.
const FG_CELL: [i32; 5] = [0, 1, 1, 2, 2];

/// Guard cells per purpose, one entry per (x, y, z) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuardCellCounts {
    /// Allocated for E and B
    pub ng_alloc_eb: IntVect,
    /// Allocated for J
    pub ng_alloc_j: IntVect,
    /// Allocated for rho
    pub ng_alloc_rho: IntVect,
    /// Allocated for the F cleaning scalar
    pub ng_alloc_f: IntVect,
    /// Allocated for the G cleaning scalar
    pub ng_alloc_g: IntVect,
    /// E and B exchanged before the field solve
    pub ng_field_solver: IntVect,
    pub ng_field_solver_f: IntVect,
    pub ng_field_solver_g: IntVect,
    /// E and B exchanged before the field gather
    pub ng_field_gather: IntVect,
    /// E and B exchanged before the auxiliary-grid update
    pub ng_update_aux: IntVect,
    /// All fields exchanged before the moving window shift
    pub ng_moving_window: IntVect,
    /// Local current deposition width
    pub ng_depos_j: IntVect,
    /// Local charge deposition width
    pub ng_depos_rho: IntVect,
}

impl GuardCellCounts {
    /// Every exchange count must fit in the allocation it reads.
    pub fn check_invariants(&self) -> PicResult<()> {
        let pairs = [
            ("ng_field_solver", self.ng_field_solver, "ng_alloc_eb", self.ng_alloc_eb),
            ("ng_field_solver_f", self.ng_field_solver_f, "ng_alloc_f", self.ng_alloc_f),
            ("ng_field_solver_g", self.ng_field_solver_g, "ng_alloc_g", self.ng_alloc_g),
            ("ng_field_gather", self.ng_field_gather, "ng_alloc_eb", self.ng_alloc_eb),
            ("ng_update_aux", self.ng_update_aux, "ng_alloc_eb", self.ng_alloc_eb),
            ("ng_moving_window", self.ng_moving_window, "ng_alloc_eb", self.ng_alloc_eb),
            ("ng_depos_j", self.ng_depos_j, "ng_alloc_j", self.ng_alloc_j),
            ("ng_depos_rho", self.ng_depos_rho, "ng_alloc_rho", self.ng_alloc_rho),
        ];
        for (name, ng, alloc_name, alloc) in pairs {
            if !ng.all_le(alloc) {
                return Err(PicError::ConfigError(format!(
                    "{name} = {:?} exceeds {alloc_name} = {:?}",
                    ng.0, alloc.0
                )));
            }
        }
        Ok(())
    }
}

pub struct GuardCellManager;

impl GuardCellManager {
    /// Compute all counts from scratch. Call again whenever the inputs
    /// change (e.g. new refinement ratios after regridding).
    pub fn init(cfg: &GuardCellConfig) -> PicResult<GuardCellCounts> {
        cfg.validate()?;
        let axes = cfg.dim.active_axes();

        // Particle shape plus the extra pushes that can move particles further
        let mut ng_tmp = cfg.nox;
        if cfg.do_subcycling && cfg.max_level > 0 {
            ng_tmp += 1;
        }
        if cfg.v_galilean.iter().any(|&v| v != 0.0) || cfg.v_comoving.iter().any(|&v| v != 0.0) {
            ng_tmp += 1;
        }

        let mut ng_alloc_eb = IntVect::splat(round_up_even(ng_tmp));
        if cfg.do_fdtd_nci_corr {
            ng_alloc_eb[2] = round_up_even(ng_tmp + cfg.nci_corr_stencil);
        }
        let mut ng_alloc_j = IntVect::splat(ng_tmp);
        let mut ng_alloc_rho = IntVect::splat(ng_tmp + 1);

        let mut ng_moving_window = IntVect::ZERO;
        if cfg.do_moving_window {
            let dir = cfg.moving_window_dir;
            let max_ratio = cfg
                .ref_ratios
                .iter()
                .take(cfg.max_level)
                .map(|r| r[dir])
                .max()
                .unwrap_or(1);
            let shift = (cfg.moving_window_v.abs() * cfg.dt / cfg.cell_size[dir]).ceil() as i32;
            let needed = max_ratio.max(shift);
            for ng in [&mut ng_alloc_eb, &mut ng_alloc_j, &mut ng_alloc_rho] {
                ng[dir] = ng[dir].max(needed);
            }
        }

        let mut alloc_fg = if cfg.do_moving_window { 2 } else { 0 };
        if cfg.electromagnetic_solver == ElectromagneticSolverAlgo::Ckc {
            alloc_fg = alloc_fg.max(1);
        }
        let ng_alloc_f = IntVect::splat(alloc_fg).masked(axes);
        let ng_alloc_g = ng_alloc_f;

        let ng_alloc_eb = ng_alloc_eb.masked(axes);

        let stencil = solver_guard_cells(cfg)?.masked(axes);
        let mut ng_field_solver = stencil.min(ng_alloc_eb);
        let mut ng_field_solver_f = stencil.min(ng_alloc_f);
        let mut ng_field_solver_g = stencil.min(ng_alloc_g);

        let mut gather_no_nci = IntVect::splat(FG_CELL[cfg.nox as usize]);
        if cfg.field_gathering == FieldGathering::MomentumConserving
            && cfg.grid_type == GridType::Staggered
        {
            gather_no_nci = gather_no_nci + IntVect::UNIT;
        }
        if cfg.max_level > 0 {
            gather_no_nci = gather_no_nci + IntVect::UNIT;
        }
        let gather_no_nci = gather_no_nci.masked(axes).min(ng_alloc_eb);

        let mut nci_filter = IntVect::ZERO;
        if cfg.do_fdtd_nci_corr {
            nci_filter[2] = cfg.nci_corr_stencil / 2;
        }
        let nci_filter = nci_filter.masked(axes);

        let mut ng_field_gather = (gather_no_nci + nci_filter).min(ng_alloc_eb);
        ng_field_gather = ng_field_gather.max(ng_field_solver);
        let mut ng_update_aux = (gather_no_nci + gather_no_nci + nci_filter).min(ng_alloc_eb);

        if cfg.do_moving_window {
            let dir = cfg.moving_window_dir;
            ng_moving_window[dir] = ng_alloc_eb[dir];
        }
        let mut ng_moving_window = ng_moving_window.masked(axes);

        let mut ng_alloc_j = ng_alloc_j.masked(axes);
        let mut ng_alloc_rho = ng_alloc_rho.masked(axes);
        let mut ng_depos_j = ng_alloc_j;
        let mut ng_depos_rho = ng_alloc_rho;
        if cfg.use_filter {
            let widen = (cfg.bilinear_filter_stencil_length - IntVect::UNIT)
                .max(IntVect::ZERO)
                .masked(axes);
            ng_depos_j = ng_depos_j + widen;
            ng_depos_rho = ng_depos_rho + widen;
            ng_alloc_j = ng_alloc_j.max(ng_depos_j);
            ng_alloc_rho = ng_alloc_rho.max(ng_depos_rho);
        }

        if cfg.safe_guard_cells {
            ng_field_solver = ng_alloc_eb;
            ng_field_solver_f = ng_alloc_f;
            ng_field_solver_g = ng_alloc_g;
            ng_field_gather = ng_alloc_eb;
            ng_update_aux = ng_alloc_eb;
            if cfg.do_moving_window {
                ng_moving_window = ng_alloc_eb;
            }
        }

        if cfg.do_pml || cfg.do_pml_in_domain {
            log::debug!(
                "GuardCellManager: PML settings (pml_ncell = {}) do not affect finite-difference guard cells",
                cfg.pml_ncell
            );
        }

        let counts = GuardCellCounts {
            ng_alloc_eb,
            ng_alloc_j,
            ng_alloc_rho,
            ng_alloc_f,
            ng_alloc_g,
            ng_field_solver,
            ng_field_solver_f,
            ng_field_solver_g,
            ng_field_gather,
            ng_update_aux,
            ng_moving_window,
            ng_depos_j,
            ng_depos_rho,
        };
        counts.check_invariants()?;
        log::debug!("GuardCellManager: {counts:?}");
        Ok(counts)
    }
}

fn round_up_even(n: i32) -> i32 {
    if n % 2 == 0 {
        n
    } else {
        n + 1
    }
}

/// Stencil width of the field solver the configuration selects.
fn solver_guard_cells(cfg: &GuardCellConfig) -> PicResult<IntVect> {
    if cfg.electromagnetic_solver == ElectromagneticSolverAlgo::None {
        return Ok(IntVect::ZERO);
    }
    let axes = cfg.dim.active_axes();
    let mut cell_size = cfg.cell_size;
    for d in 0..3 {
        if !axes[d] {
            cell_size[d] = 1.0;
        }
    }
    let algo = cfg.electromagnetic_solver;
    let ng = match cfg.dim {
        SpaceDim::OneD => FiniteDifferenceSolver::<1>::new(algo, cfg.grid_type, cell_size)?
            .max_guard_cells(),
        SpaceDim::TwoD => FiniteDifferenceSolver::<2>::new(algo, cfg.grid_type, cell_size)?
            .max_guard_cells(),
        SpaceDim::ThreeD => FiniteDifferenceSolver::<3>::new(algo, cfg.grid_type, cell_size)?
            .max_guard_cells(),
        SpaceDim::Rz => FiniteDifferenceSolver::<2>::new_cylindrical(algo, cell_size, 1, 0.0)?
            .max_guard_cells(),
    };
    Ok(ng)
}
