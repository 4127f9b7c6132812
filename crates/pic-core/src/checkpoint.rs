// ─────────────────────────────────────────────────────────────────────
// SCPN PIC Core — Solver-Vector Checkpoints
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Save and restore a [`SolverVec`] as a NumPy `.npz` archive.
//!
//! Every box is stored as one 4-D array including its ghost cells, under
//! `<field>_lev<L>_<x|y|z>_box<B>.npy` for array fields and
//! `<field>_lev<L>_box<B>.npy` for scalars.

use std::fs::File;
use std::path::Path;

use ndarray::{Array4, Ix4, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use pic_types::error::{PicError, PicResult};

use crate::field_array::MultiFab;
use crate::fields::FieldType;
use crate::solver_vec::SolverVec;

const COMPONENT_LABELS: [&str; 3] = ["x", "y", "z"];

fn array_key(kind: FieldType, lev: usize, comp: usize, ibox: usize) -> String {
    format!("{}_lev{lev}_{}_box{ibox}", kind.name(), COMPONENT_LABELS[comp])
}

fn scalar_key(kind: FieldType, lev: usize, ibox: usize) -> String {
    format!("{}_lev{lev}_box{ibox}", kind.name())
}

fn store(
    npz: &mut NpzWriter<File>,
    mf: &MultiFab,
    key: impl Fn(usize) -> String,
) -> PicResult<usize> {
    for (b, fab) in mf.fabs().iter().enumerate() {
        let name = format!("{}.npy", key(b));
        npz.add_array(name.as_str(), fab.data())
            .map_err(|e| PicError::Checkpoint(format!("failed to write '{name}': {e}")))?;
    }
    Ok(mf.fabs().len())
}

pub fn write_solver_vec<P: AsRef<Path>>(path: P, v: &SolverVec) -> PicResult<()> {
    if !v.is_defined() {
        return Err(PicError::Checkpoint(
            "cannot write an undefined solver vector".to_string(),
        ));
    }
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut npz = NpzWriter::new(file);
    let mut count = 0usize;

    let array_kind = v.array_kind();
    for (lev, arr) in v.array_vec().iter().enumerate() {
        for (comp, mf) in arr.iter().enumerate() {
            count += store(&mut npz, mf, |b| array_key(array_kind, lev, comp, b))?;
        }
    }
    let scalar_kind = v.scalar_kind();
    for (lev, mf) in v.scalar_vec().iter().enumerate() {
        count += store(&mut npz, mf, |b| scalar_key(scalar_kind, lev, b))?;
    }

    npz.finish()
        .map_err(|e| PicError::Checkpoint(format!("failed to finish '{}': {e}", path.display())))?;
    log::debug!("checkpoint: wrote {count} arrays to {}", path.display());
    Ok(())
}

fn read_array4(npz: &mut NpzReader<File>, key: &str) -> PicResult<Array4<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix4>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix4>(key))
        .map_err(|e| PicError::Checkpoint(format!("failed to read '{key}': {e}")))
}

/// Restore `v` from an archive written by [`write_solver_vec`]. `v` must
/// already be defined with the layout that was saved.
pub fn read_solver_vec<P: AsRef<Path>>(path: P, v: &mut SolverVec) -> PicResult<()> {
    if !v.is_defined() {
        return Err(PicError::Checkpoint(
            "read_solver_vec needs a defined target vector".to_string(),
        ));
    }
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut npz = NpzReader::new(file).map_err(|e| {
        PicError::Checkpoint(format!("failed to open '{}': {e}", path.display()))
    })?;

    let array_kind = v.array_kind();
    for (lev, arr) in v.array_vec_mut().iter_mut().enumerate() {
        for (comp, mf) in arr.iter_mut().enumerate() {
            restore(&mut npz, mf, |b| array_key(array_kind, lev, comp, b))?;
        }
    }
    let scalar_kind = v.scalar_kind();
    for (lev, mf) in v.scalar_vec_mut().iter_mut().enumerate() {
        restore(&mut npz, mf, |b| scalar_key(scalar_kind, lev, b))?;
    }
    Ok(())
}

fn restore(
    npz: &mut NpzReader<File>,
    mf: &mut MultiFab,
    key: impl Fn(usize) -> String,
) -> PicResult<()> {
    for (b, fab) in mf.fabs_mut().iter_mut().enumerate() {
        let name = key(b);
        let data = read_array4(npz, &name)?;
        if data.shape() != fab.data().shape() {
            return Err(PicError::Checkpoint(format!(
                "'{name}' has shape {:?}, expected {:?}",
                data.shape(),
                fab.data().shape()
            )));
        }
        fab.data_mut().assign(&data);
    }
    Ok(())
}
