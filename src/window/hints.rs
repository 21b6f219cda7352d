//! Hints Module
//!
//! Geometry hints derived from the server's `size-constraints` metadata.
//! Only the constraints the server actually sent are populated.

use area_remote_proto::{Metadata, MetadataValue};
use tracing::{debug, warn};

use crate::error::{Result, WindowError};

/// Geometry hints (XSizeHints equivalent, sparse)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryHints {
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub base_width: Option<i32>,
    pub base_height: Option<i32>,
    pub width_inc: Option<i32>,
    pub height_inc: Option<i32>,
    pub min_aspect: Option<f64>,
    pub max_aspect: Option<f64>,
}

/// Size pairs: (metadata key, setter)
const SIZE_PAIRS: [(&str, fn(&mut GeometryHints, i32, i32)); 4] = [
    ("maximum-size", |h, w, ht| {
        h.max_width = Some(w);
        h.max_height = Some(ht);
    }),
    ("minimum-size", |h, w, ht| {
        h.min_width = Some(w);
        h.min_height = Some(ht);
    }),
    ("base-size", |h, w, ht| {
        h.base_width = Some(w);
        h.base_height = Some(ht);
    }),
    ("increment", |h, w, ht| {
        h.width_inc = Some(w);
        h.height_inc = Some(ht);
    }),
];

/// Aspect ratios: (metadata key, setter)
const ASPECT_RATIOS: [(&str, fn(&mut GeometryHints, f64)); 2] = [
    ("minimum-aspect-ratio", |h, v| h.min_aspect = Some(v)),
    ("maximum-aspect-ratio", |h, v| h.max_aspect = Some(v)),
];

impl GeometryHints {
    /// Parse a `size-constraints` value
    ///
    /// Fails only when the value is not a mapping at all. A bad individual
    /// constraint is logged and skipped, leaving the rest in place.
    pub fn from_size_constraints(value: &MetadataValue) -> Result<Self> {
        let constraints = value
            .as_map()
            .ok_or_else(|| WindowError::malformed("size-constraints", "expected a mapping"))?;

        let mut hints = Self::default();

        for (key, set) in SIZE_PAIRS {
            match read_size_pair(constraints, key) {
                Ok(Some((w, h))) => set(&mut hints, w, h),
                Ok(None) => {}
                Err(e) => warn!("Ignoring size constraint: {}", e),
            }
        }

        for (key, set) in ASPECT_RATIOS {
            match read_ratio(constraints, key) {
                Ok(Some(ratio)) => set(&mut hints, ratio),
                Ok(None) => {}
                Err(e) => warn!("Ignoring size constraint: {}", e),
            }
        }

        debug!("Geometry hints: {:?}", hints);
        Ok(hints)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Falsy or missing values mean "not set"
fn present<'a>(constraints: &'a Metadata, key: &str) -> Option<&'a MetadataValue> {
    constraints.get(key).filter(|v| v.is_truthy())
}

fn pair_of_numbers(value: &MetadataValue, key: &str) -> Result<(f64, f64)> {
    let (a, b) = value
        .as_pair()
        .ok_or_else(|| WindowError::malformed(key, "expected a pair"))?;
    match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(WindowError::malformed(key, format!("non numeric pair {:?}", value))),
    }
}

fn to_dimension(value: f64, key: &str) -> Result<i32> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return Err(WindowError::malformed(key, format!("{} out of range", value)));
    }
    Ok(truncated as i32)
}

fn read_size_pair(constraints: &Metadata, key: &str) -> Result<Option<(i32, i32)>> {
    let Some(value) = present(constraints, key) else {
        return Ok(None);
    };
    let (w, h) = pair_of_numbers(value, key)?;
    Ok(Some((to_dimension(w, key)?, to_dimension(h, key)?)))
}

fn read_ratio(constraints: &Metadata, key: &str) -> Result<Option<f64>> {
    let Some(value) = present(constraints, key) else {
        return Ok(None);
    };
    let (num, den) = pair_of_numbers(value, key)?;
    if den == 0.0 {
        return Err(WindowError::malformed(key, "zero denominator"));
    }
    Ok(Some(num / den))
}
