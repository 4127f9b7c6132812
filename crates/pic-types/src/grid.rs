// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Index Space
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Integer index space shared by every mesh-based component.
//!
//! All arrays are stored with three index slots `(i, j, k)` mapped to
//! `(x, y, z)`. Reduced-dimension builds keep the unused slots at a
//! single cell with no guard cells:
//!   - 1-D: only `z` (slot 2) is active
//!   - 2-D: `x` and `z` (slots 0 and 2)
//!   - RZ: `r` in slot 0, `z` in slot 2
//!   - 3-D: all slots

use serde::{Deserialize, Serialize};
use std::ops::{Add, Index, IndexMut, Sub};

/// Spatial layout of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceDim {
    #[serde(rename = "1d")]
    OneD,
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "rz")]
    Rz,
}

impl SpaceDim {
    /// Number of mesh axes.
    pub fn n_axes(self) -> usize {
        match self {
            SpaceDim::OneD => 1,
            SpaceDim::TwoD | SpaceDim::Rz => 2,
            SpaceDim::ThreeD => 3,
        }
    }

    /// Which of the (x, y, z) slots carry mesh cells.
    pub fn active_axes(self) -> [bool; 3] {
        active_axes(self.n_axes())
    }
}

/// Active slots for a Cartesian dimensionality `dim ∈ {1, 2, 3}`.
pub const fn active_axes(dim: usize) -> [bool; 3] {
    match dim {
        1 => [false, false, true],
        2 => [true, false, true],
        _ => [true, true, true],
    }
}

// ───────────────────────────── IntVect ──────────────────────────────

/// Integer vector with one entry per (x, y, z) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntVect(pub [i32; 3]);

impl IntVect {
    pub const ZERO: IntVect = IntVect([0, 0, 0]);
    pub const UNIT: IntVect = IntVect([1, 1, 1]);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        IntVect([x, y, z])
    }

    pub const fn splat(v: i32) -> Self {
        IntVect([v, v, v])
    }

    /// Unit vector along `dir`.
    pub fn basis(dir: usize) -> Self {
        let mut v = [0; 3];
        v[dir] = 1;
        IntVect(v)
    }

    pub fn max(self, other: IntVect) -> IntVect {
        IntVect([
            self.0[0].max(other.0[0]),
            self.0[1].max(other.0[1]),
            self.0[2].max(other.0[2]),
        ])
    }

    pub fn min(self, other: IntVect) -> IntVect {
        IntVect([
            self.0[0].min(other.0[0]),
            self.0[1].min(other.0[1]),
            self.0[2].min(other.0[2]),
        ])
    }

    /// Componentwise `self <= other`.
    pub fn all_le(self, other: IntVect) -> bool {
        (0..3).all(|d| self.0[d] <= other.0[d])
    }

    /// Zero the slots that are not active in `axes`.
    pub fn masked(self, axes: [bool; 3]) -> IntVect {
        let mut out = self;
        for d in 0..3 {
            if !axes[d] {
                out.0[d] = 0;
            }
        }
        out
    }

    pub fn max_component(self) -> i32 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

impl Index<usize> for IntVect {
    type Output = i32;
    fn index(&self, d: usize) -> &i32 {
        &self.0[d]
    }
}

impl IndexMut<usize> for IntVect {
    fn index_mut(&mut self, d: usize) -> &mut i32 {
        &mut self.0[d]
    }
}

impl Add for IntVect {
    type Output = IntVect;
    fn add(self, o: IntVect) -> IntVect {
        IntVect([self.0[0] + o.0[0], self.0[1] + o.0[1], self.0[2] + o.0[2]])
    }
}

impl Sub for IntVect {
    type Output = IntVect;
    fn sub(self, o: IntVect) -> IntVect {
        IntVect([self.0[0] - o.0[0], self.0[1] - o.0[1], self.0[2] - o.0[2]])
    }
}

// ──────────────────────────── IndexType ─────────────────────────────

/// Staggering of a field component: `true` = nodal along that slot,
/// `false` = cell-centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexType(pub [bool; 3]);

impl IndexType {
    pub const CELL: IndexType = IndexType([false, false, false]);
    pub const NODE: IndexType = IndexType([true, true, true]);

    pub fn is_nodal(self, d: usize) -> bool {
        self.0[d]
    }

    /// Clear the flags on inactive slots so that reduced-dimension
    /// boxes keep a single point there.
    pub fn masked(self, axes: [bool; 3]) -> IndexType {
        IndexType([
            self.0[0] && axes[0],
            self.0[1] && axes[1],
            self.0[2] && axes[2],
        ])
    }
}

// ───────────────────────────── IndexBox ─────────────────────────────

/// Inclusive index box `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexBox {
    pub lo: IntVect,
    pub hi: IntVect,
}

impl IndexBox {
    pub fn new(lo: IntVect, hi: IntVect) -> Self {
        IndexBox { lo, hi }
    }

    /// Cell-centred box with `n[d]` cells starting at the origin.
    pub fn from_size(n: [i32; 3]) -> Self {
        IndexBox {
            lo: IntVect::ZERO,
            hi: IntVect([n[0] - 1, n[1] - 1, n[2] - 1]),
        }
    }

    pub fn length(&self, d: usize) -> i32 {
        self.hi[d] - self.lo[d] + 1
    }

    pub fn shape(&self) -> [usize; 3] {
        [
            self.length(0).max(0) as usize,
            self.length(1).max(0) as usize,
            self.length(2).max(0) as usize,
        ]
    }

    pub fn num_pts(&self) -> usize {
        let s = self.shape();
        s[0] * s[1] * s[2]
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|d| self.hi[d] < self.lo[d])
    }

    pub fn contains(&self, p: IntVect) -> bool {
        (0..3).all(|d| p[d] >= self.lo[d] && p[d] <= self.hi[d])
    }

    pub fn grow(&self, ng: IntVect) -> IndexBox {
        IndexBox {
            lo: self.lo - ng,
            hi: self.hi + ng,
        }
    }

    /// Convert a cell-centred box into the index space of `ixtype`:
    /// every nodal slot gains the point on its upper face.
    pub fn convert(&self, ixtype: IndexType) -> IndexBox {
        let mut hi = self.hi;
        for d in 0..3 {
            if ixtype.is_nodal(d) {
                hi[d] += 1;
            }
        }
        IndexBox { lo: self.lo, hi }
    }

    pub fn intersect(&self, other: &IndexBox) -> Option<IndexBox> {
        let b = IndexBox {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        };
        if b.is_empty() {
            None
        } else {
            Some(b)
        }
    }

    /// Visit every point in (i, j, k) order with `k` fastest.
    pub fn for_each(&self, mut f: impl FnMut(i32, i32, i32)) {
        for i in self.lo[0]..=self.hi[0] {
            for j in self.lo[1]..=self.hi[1] {
                for k in self.lo[2]..=self.hi[2] {
                    f(i, j, k);
                }
            }
        }
    }
}

// ───────────────────────────── Geometry ─────────────────────────────

/// Physical description of a uniform mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub dim: SpaceDim,
    /// Cell-centred problem domain.
    pub domain: IndexBox,
    /// Physical coordinate of the lower domain corner.
    pub prob_lo: [f64; 3],
    /// Cell size per slot; inactive slots hold 1.0.
    pub cell_size: [f64; 3],
    pub periodic: [bool; 3],
}

impl Geometry {
    /// Build a geometry with `n_cell` cells per active axis and the
    /// given cell sizes. Inactive slots are collapsed to a single cell.
    pub fn new(
        dim: SpaceDim,
        n_cell: [i32; 3],
        prob_lo: [f64; 3],
        cell_size: [f64; 3],
        periodic: [bool; 3],
    ) -> Self {
        let axes = dim.active_axes();
        let mut n = n_cell;
        let mut dx = cell_size;
        let mut per = periodic;
        for d in 0..3 {
            if !axes[d] {
                n[d] = 1;
                dx[d] = 1.0;
                per[d] = false;
            }
        }
        Geometry {
            dim,
            domain: IndexBox::from_size(n),
            prob_lo,
            cell_size: dx,
            periodic: per,
        }
    }

    pub fn inv_cell_size(&self) -> [f64; 3] {
        [
            1.0 / self.cell_size[0],
            1.0 / self.cell_size[1],
            1.0 / self.cell_size[2],
        ]
    }

    pub fn active_axes(&self) -> [bool; 3] {
        self.dim.active_axes()
    }

    pub fn is_periodic(&self, d: usize) -> bool {
        self.periodic[d]
    }
}
