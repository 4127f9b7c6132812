// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Semi-Implicit EM Integration Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end runs of the Newton–JFNK–GMRES stack on mesh fields.

use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use pic_core::checkpoint::{read_solver_vec, write_solver_vec};
use pic_core::domain::BoxArray;
use pic_core::fd_solver::FiniteDifferenceSolver;
use pic_core::fields::{FieldRegistry, FieldType};
use pic_core::implicit_em::SemiImplicitEm;
use pic_core::solver_vec::SolverVec;
use pic_math::newton::NonlinearSolver;
use pic_types::config::{GridType, ImplicitSolverConfig, NonlinearSolverType};
use pic_types::grid::{Geometry, IntVect, SpaceDim};

const N: i32 = 8;
const DX: f64 = 1.0e-3;

fn deck_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("decks")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn geometry() -> Geometry {
    Geometry::new(SpaceDim::TwoD, [N, 1, N], [0.0; 3], [DX; 3], [true; 3])
}

fn boxes(geom: &Geometry) -> BoxArray {
    BoxArray::decompose(geom, IntVect::splat(4)).unwrap()
}

/// One standing-wave period across the box in x and z.
fn seed_ey(reg: &mut FieldRegistry) {
    let geom = reg.geom().clone();
    for fab in reg.array_mut(FieldType::EfieldFp, 0).unwrap()[1].fabs_mut() {
        let valid = fab.valid_box();
        valid.for_each(|i, j, k| {
            let x = i as f64 * geom.cell_size[0];
            let z = k as f64 * geom.cell_size[2];
            let lx = N as f64 * DX;
            fab.set(i, j, k, 0, (2.0 * PI * x / lx).sin() * (2.0 * PI * z / lx).cos());
        });
    }
    reg.fill_boundary_array(FieldType::EfieldFp, 0);
}

fn max_abs_diff(a: &FieldRegistry, b: &FieldRegistry, kind: FieldType) -> f64 {
    let fa = a.array(kind, 0).unwrap();
    let fb = b.array(kind, 0).unwrap();
    let mut worst: f64 = 0.0;
    for d in 0..3 {
        for (x, y) in fa[d].fabs().iter().zip(fb[d].fabs()) {
            x.valid_box().for_each(|i, j, k| {
                worst = worst.max((x.at(i, j, k, 0) - y.at(i, j, k, 0)).abs());
            });
        }
    }
    worst
}

fn temp_path(tag: &str) -> PathBuf {
    let epoch_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "pic_implicit_em_{tag}_{}_{}.npz",
        std::process::id(),
        epoch_ns
    ))
}

fn lossless_update_reproduces_explicit_leapfrog(kind: NonlinearSolverType) {
    let mut cfg = ImplicitSolverConfig::from_file(&deck_path("semi_implicit_em.json")).unwrap();
    cfg.nonlinear_solver = kind;
    let geom = geometry();
    let ba = boxes(&geom);

    let mut em = SemiImplicitEm::<2>::new(geom.clone(), ba.clone(), &cfg, 0.0).unwrap();
    seed_ey(em.fields_mut());

    let solver = FiniteDifferenceSolver::<2>::new(
        cfg.field_solver.algorithm,
        cfg.field_solver.grid_type,
        geom.cell_size,
    )
    .unwrap();
    let mut reference = FieldRegistry::new(geom, ba, GridType::Staggered, 1);
    reference.alloc(FieldType::EfieldFp, 0, IntVect::UNIT);
    reference.alloc(FieldType::BfieldFp, 0, IntVect::UNIT);
    seed_ey(&mut reference);

    let dt = 0.5 * solver.compute_max_dt();
    for n in 0..5 {
        let report = em.one_step(n as f64 * dt, dt).unwrap();
        assert!(report.converged, "step {n}: {report:?}");
        assert!(report.warning.is_none());

        {
            let (b, e) = reference.array_pair_mut(FieldType::BfieldFp, FieldType::EfieldFp, 0);
            solver.evolve_b(b, e, dt).unwrap();
        }
        reference.fill_boundary_array(FieldType::BfieldFp, 0);
        {
            let (e, b) = reference.array_pair_mut(FieldType::EfieldFp, FieldType::BfieldFp, 0);
            solver.evolve_e(e, b, None, dt).unwrap();
        }
        reference.fill_boundary_array(FieldType::EfieldFp, 0);
    }

    let e_scale = reference.array(FieldType::EfieldFp, 0).unwrap()[1].max_abs(0);
    assert!(e_scale > 0.1);
    let de = max_abs_diff(em.fields(), &reference, FieldType::EfieldFp);
    assert!(de < 1e-9 * e_scale, "E differs by {de}");

    let b_scale = reference.array(FieldType::BfieldFp, 0).unwrap()[0].max_abs(0);
    assert!(b_scale > 0.0);
    let db = max_abs_diff(em.fields(), &reference, FieldType::BfieldFp);
    assert!(db < 1e-9 * b_scale, "B differs by {db}");

    // The residual was evaluated at least once per step.
    assert!(em.state().rhs_evals() >= 5);
    assert!(em.nonlinear_solver().is_defined());
    assert_eq!(em.nonlinear_solver().kind(), kind);
}

#[test]
fn lossless_newton_reproduces_explicit_leapfrog() {
    lossless_update_reproduces_explicit_leapfrog(NonlinearSolverType::Newton);
}

#[test]
fn lossless_picard_reproduces_explicit_leapfrog() {
    lossless_update_reproduces_explicit_leapfrog(NonlinearSolverType::Picard);
}

#[test]
fn restart_from_checkpoint_continues_the_run() {
    let cfg = ImplicitSolverConfig::from_file(&deck_path("semi_implicit_em.json")).unwrap();
    let geom = geometry();
    let ba = boxes(&geom);
    // Moderately lossy medium: sigma dt / eps0 of order one.
    let dt = 1.0e-12;
    let sigma = 5.0;

    let mut run = SemiImplicitEm::<2>::new(geom.clone(), ba.clone(), &cfg, sigma).unwrap();
    seed_ey(run.fields_mut());
    for n in 0..2 {
        run.one_step(n as f64 * dt, dt).unwrap();
    }

    let mut saved = Vec::new();
    for kind in [FieldType::EfieldFp, FieldType::BfieldFp] {
        let mut v = SolverVec::default();
        v.define(run.fields(), kind, FieldType::None);
        v.copy_from_fields(run.fields(), kind, FieldType::None);
        let path = temp_path(kind.name());
        write_solver_vec(&path, &v).unwrap();
        saved.push((kind, path));
    }

    let mut restarted = SemiImplicitEm::<2>::new(geom, ba, &cfg, sigma).unwrap();
    for (kind, path) in &saved {
        let mut v = SolverVec::default();
        v.define(restarted.fields(), *kind, FieldType::None);
        read_solver_vec(path, &mut v).unwrap();
        v.copy_to_fields(restarted.fields_mut());
        restarted.fields_mut().fill_boundary_array(*kind, 0);
        let _ = std::fs::remove_file(path);
    }

    for n in 2..4 {
        run.one_step(n as f64 * dt, dt).unwrap();
        restarted.one_step(n as f64 * dt, dt).unwrap();
    }
    let scale = run.fields().array(FieldType::EfieldFp, 0).unwrap()[1].max_abs(0);
    let de = max_abs_diff(run.fields(), restarted.fields(), FieldType::EfieldFp);
    assert!(de <= 1e-12 * scale, "E differs by {de}");
    let db = max_abs_diff(run.fields(), restarted.fields(), FieldType::BfieldFp);
    assert!(db == 0.0 || db < 1e-12 * run.fields().array(FieldType::BfieldFp, 0).unwrap()[0].max_abs(0));
}
