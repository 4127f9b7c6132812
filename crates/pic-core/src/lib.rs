// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — PIC Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
pub mod checkpoint;
pub mod domain;
pub mod fd_algorithms;
pub mod fd_solver;
pub mod field_array;
pub mod fields;
pub mod guard_cells;
pub mod implicit_em;
pub mod pusher;
pub mod solver_vec;
