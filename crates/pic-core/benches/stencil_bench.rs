use criterion::{criterion_group, criterion_main, Criterion};
use pic_core::domain::BoxArray;
use pic_core::fd_solver::FiniteDifferenceSolver;
use pic_core::field_array::MultiFab;
use pic_core::fields::{FieldRegistry, FieldType};
use pic_core::implicit_em::SemiImplicitEm;
use pic_types::config::{ElectromagneticSolverAlgo, GridType, ImplicitSolverConfig};
use pic_types::grid::{Geometry, IndexType, IntVect, SpaceDim};
use rand::Rng;
use std::hint::black_box;

fn random_fields(n: i32) -> (FieldRegistry, MultiFab) {
    let geom = Geometry::new(SpaceDim::ThreeD, [n; 3], [0.0; 3], [1.0e-3; 3], [true; 3]);
    let ba = BoxArray::decompose(&geom, IntVect::splat(16)).unwrap();
    let mut reg = FieldRegistry::new(geom, ba.clone(), GridType::Staggered, 1);
    reg.alloc(FieldType::EfieldFp, 0, IntVect::UNIT);
    let mut rng = rand::thread_rng();
    for mf in reg.array_mut(FieldType::EfieldFp, 0).unwrap().iter_mut() {
        for fab in mf.fabs_mut() {
            fab.data_mut().mapv_inplace(|_| rng.gen_range(-1.0..1.0));
        }
    }
    reg.fill_boundary_array(FieldType::EfieldFp, 0);
    let div = MultiFab::new(&ba, IndexType([true; 3]), 1, IntVect::ZERO);
    (reg, div)
}

fn bench_div_e(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_div_e");
    for algo in [ElectromagneticSolverAlgo::Yee, ElectromagneticSolverAlgo::Ckc] {
        let (reg, mut div) = random_fields(32);
        let solver =
            FiniteDifferenceSolver::<3>::new(algo, GridType::Staggered, reg.geom().cell_size).unwrap();
        let efield = reg.array(FieldType::EfieldFp, 0).unwrap();
        group.bench_function(solver.stencil_name(), |bench| {
            bench.iter(|| {
                solver.compute_div_e(efield, &mut div);
                black_box(div.max_abs(0));
            })
        });
    }
    group.finish();
}

fn bench_semi_implicit_step(c: &mut Criterion) {
    let geom = Geometry::new(SpaceDim::TwoD, [64, 1, 64], [0.0; 3], [1.0e-3; 3], [true; 3]);
    let ba = BoxArray::decompose(&geom, IntVect::splat(32)).unwrap();
    let mut cfg = ImplicitSolverConfig::default();
    cfg.newton.relative_tolerance = 1e-10;
    cfg.newton.require_convergence = false;
    cfg.gmres.verbose_int = 0;
    let mut em = SemiImplicitEm::<2>::new(geom, ba, &cfg, 1.0).unwrap();
    em.fields_mut().array_mut(FieldType::EfieldFp, 0).unwrap()[1].set_val(1.0);
    let dt = 1.0e-12;

    let mut group = c.benchmark_group("semi_implicit_em");
    group.sample_size(20);
    let mut step = 0usize;
    group.bench_function("step_64x64", |bench| {
        bench.iter(|| {
            let report = em.one_step(step as f64 * dt, dt);
            step += 1;
            black_box(report.map(|r| r.linear_iterations).unwrap_or(0));
        })
    });
    group.finish();
}

criterion_group!(benches, bench_div_e, bench_semi_implicit_step);
criterion_main!(benches);
