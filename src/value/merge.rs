//! Deep merge of an overlay onto an accumulated value.
//!
//! Mappings merge key by key, recursively. Anything else is replaced whole by
//! the overlay, sequences included. A `null` on either side is compatible with
//! every shape; any other shape change is reported as a [`MergeConflict`].

use std::fmt;

use super::{ConfigValue, Shape};

/// Location of a value inside a merged tree, as a list of mapping keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[String]> for KeyPath {
    fn from(segments: &[String]) -> Self {
        KeyPath(segments.to_vec())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// An overlay tried to replace a value with one of an incompatible shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub path: KeyPath,
    /// Kind of the value already present.
    pub base: &'static str,
    /// Kind of the value the overlay provided.
    pub overlay: &'static str,
}

/// Merges `overlay` on top of `base`; values in `overlay` win.
///
/// On error `base` may be partially merged, so callers merge into a scratch
/// copy when they need to keep the original.
pub fn deep_merge(base: &mut ConfigValue, overlay: &ConfigValue) -> Result<(), MergeConflict> {
    let mut path = Vec::new();
    merge_at(base, overlay, &mut path)
}

fn merge_at(
    base: &mut ConfigValue,
    overlay: &ConfigValue,
    path: &mut Vec<String>,
) -> Result<(), MergeConflict> {
    if let (ConfigValue::Mapping(base_map), ConfigValue::Mapping(overlay_map)) =
        (&mut *base, overlay)
    {
        for (key, value) in overlay_map {
            match base_map.get_mut(key) {
                Some(existing) => {
                    path.push(key.clone());
                    merge_at(existing, value, path)?;
                    path.pop();
                }
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        return Ok(());
    }

    if !compatible(base.shape(), overlay.shape()) {
        return Err(MergeConflict {
            path: KeyPath::from(path.as_slice()),
            base: base.kind(),
            overlay: overlay.kind(),
        });
    }
    *base = overlay.clone();
    Ok(())
}

fn compatible(base: Shape, overlay: Shape) -> bool {
    match (base, overlay) {
        (Shape::Null, _) | (_, Shape::Null) => true,
        (base, overlay) => base == overlay,
    }
}
