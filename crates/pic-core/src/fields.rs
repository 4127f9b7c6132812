// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Field Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Named mesh fields and the simulation context that owns them.
//!
//! Fields are looked up by `(FieldType, level)`. Vector-valued kinds hold
//! three `MultiFab`s (one per component); the rest hold one. The
//! registry is passed explicitly to whatever needs it.

use crate::domain::BoxArray;
use crate::field_array::MultiFab;
use pic_types::config::GridType;
use pic_types::grid::{Geometry, IndexType, IntVect};
use std::fmt;

/// Registry names of the mesh fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    #[default]
    None,
    EfieldFp,
    BfieldFp,
    CurrentFp,
    RhoFp,
    PhiFp,
}

/// Kinds stored as three component arrays.
pub const ARRAY_FIELD_TYPES: [FieldType; 3] =
    [FieldType::EfieldFp, FieldType::BfieldFp, FieldType::CurrentFp];

const ALL_FIELD_TYPES: [FieldType; 6] = [
    FieldType::None,
    FieldType::EfieldFp,
    FieldType::BfieldFp,
    FieldType::CurrentFp,
    FieldType::RhoFp,
    FieldType::PhiFp,
];

/// Where the components of a kind sit on the staggered mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Centering {
    /// Edge-centred like E: component `d` is cell-centred along `d`.
    Edge,
    /// Face-centred like B: component `d` is nodal along `d` only.
    Face,
    Node,
}

impl FieldType {
    pub fn is_field_array(self) -> bool {
        ARRAY_FIELD_TYPES.contains(&self)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::None => "None",
            FieldType::EfieldFp => "Efield_fp",
            FieldType::BfieldFp => "Bfield_fp",
            FieldType::CurrentFp => "current_fp",
            FieldType::RhoFp => "rho_fp",
            FieldType::PhiFp => "phi_fp",
        }
    }

    pub fn from_name(name: &str) -> Option<FieldType> {
        ALL_FIELD_TYPES.iter().copied().find(|f| f.name() == name)
    }

    fn centering(self) -> Centering {
        match self {
            FieldType::EfieldFp | FieldType::CurrentFp => Centering::Edge,
            FieldType::BfieldFp => Centering::Face,
            FieldType::None | FieldType::RhoFp | FieldType::PhiFp => Centering::Node,
        }
    }

    /// Index type of component `comp` (ignored for scalar kinds) on a
    /// mesh with the given active axes.
    pub fn ix_type(self, comp: usize, axes: [bool; 3], grid_type: GridType) -> IndexType {
        if grid_type == GridType::Collocated {
            return IndexType::NODE.masked(axes);
        }
        let mut nodal = match self.centering() {
            Centering::Node | Centering::Edge => [true; 3],
            Centering::Face => [false; 3],
        };
        match self.centering() {
            Centering::Edge => nodal[comp] = false,
            Centering::Face => nodal[comp] = true,
            Centering::Node => {}
        }
        IndexType(nodal).masked(axes)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage behind one registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Array(Box<[MultiFab; 3]>),
    Scalar(MultiFab),
}

#[derive(Debug, Clone)]
struct FieldSlot {
    kind: FieldType,
    level: usize,
    data: FieldData,
}

/// Mesh description plus every allocated field.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    geom: Geometry,
    boxes: BoxArray,
    grid_type: GridType,
    ncomp: usize,
    slots: Vec<FieldSlot>,
}

impl FieldRegistry {
    /// `ncomp` is the component count of every field (1 in Cartesian,
    /// `2·modes - 1` in RZ).
    pub fn new(geom: Geometry, boxes: BoxArray, grid_type: GridType, ncomp: usize) -> Self {
        FieldRegistry {
            geom,
            boxes,
            grid_type,
            ncomp,
            slots: Vec::new(),
        }
    }

    pub fn geom(&self) -> &Geometry {
        &self.geom
    }

    pub fn box_array(&self) -> &BoxArray {
        &self.boxes
    }

    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    pub fn finest_level(&self) -> usize {
        self.slots.iter().map(|s| s.level).max().unwrap_or(0)
    }

    /// Allocate a zero-filled field. Ghost widths along inactive axes
    /// are dropped. Re-allocating an existing entry replaces it.
    pub fn alloc(&mut self, kind: FieldType, level: usize, ngrow: IntVect) {
        assert!(kind != FieldType::None, "cannot allocate FieldType::None");
        let axes = self.geom.active_axes();
        let ngrow = ngrow.masked(axes);
        let data = if kind.is_field_array() {
            let mk = |d: usize| {
                MultiFab::new(
                    &self.boxes,
                    kind.ix_type(d, axes, self.grid_type),
                    self.ncomp,
                    ngrow,
                )
            };
            FieldData::Array(Box::new([mk(0), mk(1), mk(2)]))
        } else {
            FieldData::Scalar(MultiFab::new(
                &self.boxes,
                kind.ix_type(0, axes, self.grid_type),
                self.ncomp,
                ngrow,
            ))
        };
        log::debug!("FieldRegistry: allocated {kind} at level {level} with ngrow {:?}", ngrow.0);
        match self.position(kind, level) {
            Some(pos) => self.slots[pos].data = data,
            None => self.slots.push(FieldSlot { kind, level, data }),
        }
    }

    fn position(&self, kind: FieldType, level: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.kind == kind && s.level == level)
    }

    pub fn has(&self, kind: FieldType, level: usize) -> bool {
        self.position(kind, level).is_some()
    }

    pub fn get(&self, kind: FieldType, level: usize) -> Option<&FieldData> {
        self.position(kind, level).map(|p| &self.slots[p].data)
    }

    pub fn array(&self, kind: FieldType, level: usize) -> Option<&[MultiFab; 3]> {
        match self.get(kind, level)? {
            FieldData::Array(a) => Some(&**a),
            FieldData::Scalar(_) => None,
        }
    }

    pub fn array_mut(&mut self, kind: FieldType, level: usize) -> Option<&mut [MultiFab; 3]> {
        let pos = self.position(kind, level)?;
        match &mut self.slots[pos].data {
            FieldData::Array(a) => Some(&mut **a),
            FieldData::Scalar(_) => None,
        }
    }

    pub fn scalar(&self, kind: FieldType, level: usize) -> Option<&MultiFab> {
        match self.get(kind, level)? {
            FieldData::Scalar(s) => Some(s),
            FieldData::Array(_) => None,
        }
    }

    pub fn scalar_mut(&mut self, kind: FieldType, level: usize) -> Option<&mut MultiFab> {
        let pos = self.position(kind, level)?;
        match &mut self.slots[pos].data {
            FieldData::Scalar(s) => Some(s),
            FieldData::Array(_) => None,
        }
    }

    /// Mutable access to `dst` together with shared access to `src`.
    /// Panics if either is missing or both name the same entry.
    pub fn array_pair_mut(
        &mut self,
        dst: FieldType,
        src: FieldType,
        level: usize,
    ) -> (&mut [MultiFab; 3], &[MultiFab; 3]) {
        let (Some(d), Some(s)) = (self.position(dst, level), self.position(src, level)) else {
            panic!("FieldRegistry::array_pair_mut: {dst} or {src} not allocated at level {level}");
        };
        assert_ne!(d, s, "FieldRegistry::array_pair_mut: {dst} requested twice");
        let (dst_slot, src_slot) = if d < s {
            let (lo, hi) = self.slots.split_at_mut(s);
            (&mut lo[d], &hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(d);
            (&mut hi[0], &lo[s])
        };
        match (&mut dst_slot.data, &src_slot.data) {
            (FieldData::Array(a), FieldData::Array(b)) => (&mut **a, &**b),
            _ => panic!("FieldRegistry::array_pair_mut: {dst} and {src} must be array fields"),
        }
    }

    /// Exchange ghost cells of every component of an array field.
    pub fn fill_boundary_array(&mut self, kind: FieldType, level: usize) {
        let geom = self.geom.clone();
        if let Some(arr) = self.array_mut(kind, level) {
            for mf in arr.iter_mut() {
                mf.fill_boundary(&geom);
            }
        }
    }
}
