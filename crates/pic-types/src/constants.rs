// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light in vacuum (m/s)
pub const C: f64 = 299_792_458.0;

/// Vacuum permeability (H/m), CODATA 2018
pub const MU0: f64 = 1.256_637_062_12e-6;

/// Vacuum permittivity (F/m), derived as 1/(mu0 c²)
pub const EP0: f64 = 1.0 / (MU0 * C * C);

/// Elementary charge (C)
pub const Q_E: f64 = 1.602_176_634e-19;

/// Electron mass (kg)
pub const M_E: f64 = 9.109_383_701_5e-31;

/// 1/c², used by the Lorentz-factor evaluations in the pusher.
pub const INV_C2: f64 = 1.0 / (C * C);

/// Perturbation-norm floor below which the Jacobian action is treated as zero.
pub const JFNK_ZERO_NORM: f64 = 1.0e-15;

/// Residual growth factor (relative to the first Newton residual) that
/// is reported as divergence.
pub const NEWTON_DIVERGENCE_FACTOR: f64 = 100.0;
