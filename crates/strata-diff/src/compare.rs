//! Node equality: attributes first, then structure, then values.
//!
//! The checks short-circuit in a fixed order so that cheap structural
//! mismatches never force a body read. Bodies are read one dataset at a time
//! and dropped as soon as the verdict is known.

use strata_store::TreeStore;
use strata_types::{Attributes, Data, NodeKind, NodePath, Value};

use crate::config::CompareOptions;
use crate::error::{DiffError, DiffResult};

/// `|a - b| <= atol + rtol * |b|`. Equal values (infinities included) are
/// close; NaN is never close to anything.
pub fn is_close(a: f64, b: f64, atol: f64, rtol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= atol + rtol * b.abs()
}

fn all_close(a: &[f64], b: &[f64], options: &CompareOptions) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| is_close(*x, *y, options.atol, options.rtol))
}

fn as_f64(data: &Data) -> Option<Vec<f64>> {
    match data {
        Data::Float(v) => Some(v.clone()),
        Data::Int(v) => Some(v.iter().map(|x| *x as f64).collect()),
        Data::UInt(v) => Some(v.iter().map(|x| *x as f64).collect()),
        Data::Bool(_) | Data::Str(_) | Data::Opaque(_) => None,
    }
}

fn numeric_close(a: &Data, b: &Data, options: &CompareOptions) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => all_close(&x, &y, options),
        _ => false,
    }
}

fn signed_eq_unsigned(signed: &[i64], unsigned: &[u64]) -> bool {
    signed.len() == unsigned.len()
        && signed
            .iter()
            .zip(unsigned)
            .all(|(s, u)| u64::try_from(*s).is_ok_and(|s| s == *u))
}

/// Compare two values by category.
///
/// Shapes must match. Floats are always compared by closeness. Integers
/// (signed and unsigned mix freely) and booleans are exact, except that
/// `tolerant` lets integers, and integer/float pairs, be close instead.
/// Strings and opaque elements are compared exactly and never equal a
/// value of another category.
pub fn values_equal(a: &Value, b: &Value, options: &CompareOptions) -> bool {
    if a.size() != b.size() || a.shape() != b.shape() {
        return false;
    }

    match (a.data(), b.data()) {
        (Data::Str(x), Data::Str(y)) => x == y,
        (Data::Str(_), _) | (_, Data::Str(_)) => false,

        (Data::Float(x), Data::Float(y)) => all_close(x, y, options),
        (Data::Float(_), Data::Int(_) | Data::UInt(_))
        | (Data::Int(_) | Data::UInt(_), Data::Float(_)) => {
            options.tolerant && numeric_close(a.data(), b.data(), options)
        }

        (Data::Int(_) | Data::UInt(_), Data::Int(_) | Data::UInt(_)) if options.tolerant => {
            numeric_close(a.data(), b.data(), options)
        }
        (Data::Int(x), Data::Int(y)) => x == y,
        (Data::UInt(x), Data::UInt(y)) => x == y,
        (Data::Int(x), Data::UInt(y)) | (Data::UInt(y), Data::Int(x)) => signed_eq_unsigned(x, y),

        (Data::Bool(x), Data::Bool(y)) => x == y,
        (Data::Bool(_), _) | (_, Data::Bool(_)) => false,

        (Data::Opaque(x), Data::Opaque(y)) => x == y,
        (Data::Opaque(_), _) | (_, Data::Opaque(_)) => false,
    }
}

fn attributes_equal(a: &Attributes, b: &Attributes, options: &CompareOptions) -> bool {
    if a.len() != b.len() || a.keys().any(|k| !b.contains_key(k)) {
        return false;
    }
    a.iter().all(|(name, va)| {
        let Some(vb) = b.get(name) else {
            return false;
        };
        if options.require_matching_dtype && va.dtype() != vb.dtype() {
            return false;
        }
        options.shallow || values_equal(va, vb, options)
    })
}

/// Decide whether `path_a` in `a` and `path_b` in `b` hold equal content.
///
/// In order:
/// 1. Attributes (if compared): same names; same dtypes if required; equal
///    values unless `shallow`.
/// 2. Two groups: equal.
/// 3. A group and a dataset: [`DiffError::InvalidComparison`].
/// 4. Dataset dtypes, if required (checked even when `shallow`).
/// 5. `shallow`: equal.
/// 6. Bodies, by [`values_equal`].
pub fn nodes_equal(
    a: &dyn TreeStore,
    path_a: &NodePath,
    b: &dyn TreeStore,
    path_b: &NodePath,
    options: &CompareOptions,
) -> DiffResult<bool> {
    let kind_a = a
        .node_kind(path_a)?
        .ok_or_else(|| DiffError::NotFound(path_a.clone()))?;
    let kind_b = b
        .node_kind(path_b)?
        .ok_or_else(|| DiffError::NotFound(path_b.clone()))?;

    if options.compare_attrs {
        let attrs_a = a.read_attributes(path_a)?;
        let attrs_b = b.read_attributes(path_b)?;
        if !attributes_equal(&attrs_a, &attrs_b, options) {
            return Ok(false);
        }
    }

    match (kind_a, kind_b) {
        (NodeKind::Group, NodeKind::Group) => return Ok(true),
        (NodeKind::Dataset, NodeKind::Dataset) => {}
        _ => {
            return Err(DiffError::InvalidComparison {
                path_a: path_a.clone(),
                path_b: path_b.clone(),
            })
        }
    }

    if options.require_matching_dtype {
        let meta_a = a.dataset_meta(path_a)?;
        let meta_b = b.dataset_meta(path_b)?;
        if meta_a.dtype != meta_b.dtype {
            return Ok(false);
        }
    }

    if options.shallow {
        return Ok(true);
    }

    let body_a = a.read_dataset_body(path_a)?;
    let body_b = b.read_dataset_body(path_b)?;
    Ok(values_equal(&body_a, &body_b, options))
}

/// Check that one node is equal in both stores.
///
/// `path_b` defaults to `path_a`; `dest_root` is prefixed to it. Both paths
/// must exist.
pub fn equal(
    a: &dyn TreeStore,
    b: &dyn TreeStore,
    path_a: &NodePath,
    path_b: Option<&NodePath>,
    dest_root: Option<&NodePath>,
    options: &CompareOptions,
) -> DiffResult<bool> {
    let mut target = path_b.unwrap_or(path_a).clone();
    if let Some(root) = dest_root {
        target = root.join(target.as_str());
    }

    if !a.exists(path_a)? {
        return Err(DiffError::NotFound(path_a.clone()));
    }
    if !b.exists(&target)? {
        return Err(DiffError::NotFound(target));
    }

    nodes_equal(a, path_a, b, &target, options)
}

/// Check that every listed node is equal in both stores.
///
/// Pairs `paths_a` with `paths_b` (or with `paths_a` again) position by
/// position and stops at the first unequal pair.
pub fn all_equal(
    a: &dyn TreeStore,
    b: &dyn TreeStore,
    paths_a: &[NodePath],
    paths_b: Option<&[NodePath]>,
    dest_root: Option<&NodePath>,
    options: &CompareOptions,
) -> DiffResult<bool> {
    let paths_b = paths_b.unwrap_or(paths_a);
    for (path_a, path_b) in paths_a.iter().zip(paths_b) {
        if !equal(a, b, path_a, Some(path_b), dest_root, options)? {
            return Ok(false);
        }
    }
    Ok(true)
}
