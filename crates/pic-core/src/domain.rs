// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Domain Decomposition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Deterministic split of the cell-centred problem domain into disjoint
//! boxes. Every box is owned by exactly one fab of a `MultiFab`.

use pic_types::error::{PicError, PicResult};
use pic_types::grid::{Geometry, IndexBox, IntVect};

/// Ordered list of disjoint cell-centred boxes covering the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxArray {
    boxes: Vec<IndexBox>,
}

impl BoxArray {
    /// Chop `geom.domain` so that no box exceeds `max_grid_size` cells
    /// along any active axis. Boxes are ordered with z fastest.
    pub fn decompose(geom: &Geometry, max_grid_size: IntVect) -> PicResult<Self> {
        let axes = geom.active_axes();
        let domain = geom.domain;
        let mut splits: [Vec<(i32, i32)>; 3] = Default::default();
        for d in 0..3 {
            let n = domain.length(d);
            if n < 1 {
                return Err(PicError::GridMismatch(format!(
                    "domain has {n} cells along axis {d}"
                )));
            }
            let chunk = if axes[d] { max_grid_size[d] } else { n };
            if chunk < 1 {
                return Err(PicError::ConfigError(format!(
                    "max_grid_size along axis {d} must be >= 1, got {chunk}"
                )));
            }
            let nchunks = ((n + chunk - 1) / chunk) as usize;
            let mut cursor = domain.lo[d];
            for len in balanced_split(n as usize, nchunks) {
                let lo = cursor;
                cursor += len as i32;
                splits[d].push((lo, cursor - 1));
            }
        }

        let mut boxes = Vec::with_capacity(splits[0].len() * splits[1].len() * splits[2].len());
        for &(xlo, xhi) in &splits[0] {
            for &(ylo, yhi) in &splits[1] {
                for &(zlo, zhi) in &splits[2] {
                    boxes.push(IndexBox::new(
                        IntVect::new(xlo, ylo, zlo),
                        IntVect::new(xhi, yhi, zhi),
                    ));
                }
            }
        }
        Ok(BoxArray { boxes })
    }

    /// A single box covering the whole domain.
    pub fn single(geom: &Geometry) -> Self {
        BoxArray {
            boxes: vec![geom.domain],
        }
    }

    pub fn from_boxes(boxes: Vec<IndexBox>) -> Self {
        BoxArray { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[IndexBox] {
        &self.boxes
    }

    pub fn get(&self, i: usize) -> IndexBox {
        self.boxes[i]
    }

    pub fn num_pts(&self) -> usize {
        self.boxes.iter().map(IndexBox::num_pts).sum()
    }
}

/// Split `n` items across `k` buckets as evenly as possible.
fn balanced_split(n: usize, k: usize) -> Vec<usize> {
    let base = n / k;
    let rem = n % k;
    (0..k).map(|i| base + usize::from(i < rem)).collect()
}
