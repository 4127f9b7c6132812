// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Particle Position Update
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Position advance for explicit and implicit particle pushes.
//!
//! Positions are `[x, y, z]` and momenta `u = γv`. 1-D pushes only z,
//! 2-D pushes x and z; 3-D and RZ push all three (RZ particles move in
//! Cartesian space).

use pic_types::constants::INV_C2;
use pic_types::grid::SpaceDim;
use rayon::prelude::*;

fn pushed_components(dim: SpaceDim) -> [bool; 3] {
    match dim {
        SpaceDim::OneD => [false, false, true],
        SpaceDim::TwoD => [true, false, true],
        SpaceDim::ThreeD | SpaceDim::Rz => [true, true, true],
    }
}

#[inline]
fn gamma(u: [f64; 3]) -> f64 {
    (1.0 + (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]) * INV_C2).sqrt()
}

/// Leapfrog: `x^{n+1} = x^n + dt u^{n+1/2} / γ^{n+1/2}`.
#[inline]
pub fn update_position(dim: SpaceDim, pos: &mut [f64; 3], u: [f64; 3], dt: f64) {
    let inv_gamma = 1.0 / gamma(u);
    for (d, active) in pushed_components(dim).into_iter().enumerate() {
        if active {
            pos[d] += u[d] * inv_gamma * dt;
        }
    }
}

/// Crank–Nicolson: `x^{n+1} = x^n + dt u^{n+1/2} / γ̄` with
/// `γ̄ = (γ^n + γ^{n+1})/2` and `u^{n+1} = 2u^{n+1/2} - u^n`
/// (Chen et al., JCP 407 (2020) 109228, Eqs. 15 and 17).
#[inline]
pub fn update_position_implicit(
    dim: SpaceDim,
    pos: &mut [f64; 3],
    u_n: [f64; 3],
    u: [f64; 3],
    dt: f64,
) {
    let u_np1 = [2.0 * u[0] - u_n[0], 2.0 * u[1] - u_n[1], 2.0 * u[2] - u_n[2]];
    let inv_gamma = 2.0 / (gamma(u_n) + gamma(u_np1));
    for (d, active) in pushed_components(dim).into_iter().enumerate() {
        if active {
            pos[d] += u[d] * inv_gamma * dt;
        }
    }
}

/// Change of the particle displacement between two Picard iterations,
/// in units of the cell size. Returns 1 on iteration 0. The current
/// displacement `dp` is stored in `saved` for the next call.
///
/// `inv_cell2` holds `1/dx²` per slot; in RZ the y displacement is
/// scaled by `1/dr²`.
pub fn position_norm(
    dim: SpaceDim,
    dp: [f64; 3],
    saved: &mut [f64; 3],
    inv_cell2: [f64; 3],
    iteration: usize,
) -> f64 {
    let pushed = pushed_components(dim);
    let norm = if iteration == 0 {
        1.0
    } else {
        let scale = match dim {
            SpaceDim::Rz => [inv_cell2[0], inv_cell2[0], inv_cell2[2]],
            _ => inv_cell2,
        };
        (0..3)
            .filter(|&d| pushed[d])
            .map(|d| (dp[d] - saved[d]).powi(2) * scale[d])
            .sum::<f64>()
            .sqrt()
    };
    for d in 0..3 {
        if pushed[d] {
            saved[d] = dp[d];
        }
    }
    norm
}

/// Leapfrog push for a whole particle tile.
pub fn push_positions(dim: SpaceDim, positions: &mut [[f64; 3]], momenta: &[[f64; 3]], dt: f64) {
    assert_eq!(
        positions.len(),
        momenta.len(),
        "push_positions: {} positions but {} momenta",
        positions.len(),
        momenta.len()
    );
    positions
        .par_iter_mut()
        .zip(momenta.par_iter())
        .for_each(|(p, &u)| update_position(dim, p, u, dt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pic_types::constants::C;

    #[test]
    fn test_nonrelativistic_limit_moves_by_v_dt() {
        let mut pos = [0.0; 3];
        let u = [1.0, 2.0, 3.0];
        update_position(SpaceDim::ThreeD, &mut pos, u, 0.5);
        for d in 0..3 {
            assert!((pos[d] - 0.5 * u[d]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reduced_dims_leave_unpushed_components() {
        let u = [C, C, C];
        let mut pos = [1.0, 1.0, 1.0];
        update_position(SpaceDim::OneD, &mut pos, u, 1e-9);
        assert_eq!(pos[0], 1.0);
        assert_eq!(pos[1], 1.0);
        assert!(pos[2] > 1.0);

        let mut pos = [1.0, 1.0, 1.0];
        update_position(SpaceDim::TwoD, &mut pos, u, 1e-9);
        assert!(pos[0] > 1.0);
        assert_eq!(pos[1], 1.0);

        let mut pos = [1.0, 1.0, 1.0];
        update_position(SpaceDim::Rz, &mut pos, u, 1e-9);
        assert!(pos[1] > 1.0);
    }

    #[test]
    fn test_speed_never_exceeds_c() {
        let mut pos = [0.0; 3];
        let u = [0.0, 0.0, 1.0e6 * C];
        let dt = 1.0e-9;
        update_position(SpaceDim::ThreeD, &mut pos, u, dt);
        assert!(pos[2] < C * dt);
        assert!(pos[2] > 0.999 * C * dt);
    }

    #[test]
    fn test_implicit_matches_explicit_for_constant_momentum() {
        let u = [0.3 * C, -0.2 * C, 0.9 * C];
        let dt = 1.0e-12;
        let mut a = [0.0; 3];
        let mut b = [0.0; 3];
        update_position(SpaceDim::ThreeD, &mut a, u, dt);
        update_position_implicit(SpaceDim::ThreeD, &mut b, u, u, dt);
        for d in 0..3 {
            assert!((a[d] - b[d]).abs() <= 1e-12 * a[d].abs());
        }
    }

    #[test]
    fn test_implicit_uses_averaged_gamma() {
        let u_n = [0.0, 0.0, 0.0];
        let u_half = [0.0, 0.0, C];
        let dt = 1.0e-12;
        let mut pos = [0.0; 3];
        update_position_implicit(SpaceDim::ThreeD, &mut pos, u_n, u_half, dt);
        // u^{n+1} = 2c gives γ = sqrt(5)
        let expected = C * 2.0 / (1.0 + 5f64.sqrt()) * dt;
        assert!((pos[2] - expected).abs() < 1e-12 * expected);
    }

    #[test]
    fn test_position_norm_sequence() {
        let inv2 = [100.0, 1.0, 400.0];
        let mut saved = [0.0; 3];
        let n0 = position_norm(SpaceDim::TwoD, [0.1, 5.0, 0.2], &mut saved, inv2, 0);
        assert_eq!(n0, 1.0);
        assert_eq!(saved, [0.1, 0.0, 0.2]);

        let n1 = position_norm(SpaceDim::TwoD, [0.2, 7.0, 0.25], &mut saved, inv2, 1);
        let expected = (0.01_f64 * 100.0 + 0.0025 * 400.0).sqrt();
        assert!((n1 - expected).abs() < 1e-12);

        // RZ scales the y change by 1/dr²
        let mut saved = [0.0; 3];
        position_norm(SpaceDim::Rz, [0.0; 3], &mut saved, inv2, 0);
        let n = position_norm(SpaceDim::Rz, [0.0, 0.1, 0.0], &mut saved, inv2, 1);
        assert!((n - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_push_positions_tile() {
        let mut pos = vec![[0.0; 3]; 64];
        let mom: Vec<[f64; 3]> = (0..64).map(|i| [0.0, 0.0, i as f64]).collect();
        push_positions(SpaceDim::OneD, &mut pos, &mom, 2.0);
        for (i, p) in pos.iter().enumerate() {
            assert!((p[2] - 2.0 * i as f64).abs() < 1e-9);
        }
    }
}
