//! Bidirectional mapping between image basenames and row identifiers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::primitive::table::RowId;

/// Maps an image's basename to the ordered row ids that referenced it, and
/// back. Duplicate basenames accumulate — two rows pointing at identically
/// named files must both stay retrievable, whether they are two objects in
/// one image or the same filename in different directories. The latter
/// case is ambiguous (detections for either file resolve to both rows) and
/// is logged, not dropped.
#[derive(Debug, Clone, Default)]
pub struct IndexMapping {
    by_basename: HashMap<String, Vec<RowId>>,
    by_row: HashMap<RowId, Vec<String>>,
}

impl IndexMapping {
    /// Build the mapping from `(row_id, resolved path)` entries, in table
    /// order.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RowId, &'a Path)>,
    {
        let mut mapping = Self::default();
        // First full path seen per basename, for collision detection only.
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        for (row_id, path) in entries {
            let base = basename(path);
            match sources.entry(base.clone()) {
                Entry::Occupied(seen) => {
                    if seen.get().as_path() != path {
                        warn!(
                            basename = %base,
                            first = %seen.get().display(),
                            second = %path.display(),
                            "basename collision across directories; detections will resolve to every matching row"
                        );
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(path.to_path_buf());
                }
            }

            mapping.by_basename.entry(base.clone()).or_default().push(row_id);
            mapping.by_row.entry(row_id).or_default().push(base);
        }

        mapping
    }

    /// Row ids referencing a basename; empty when unknown.
    pub fn lookup(&self, basename: &str) -> &[RowId] {
        self.by_basename
            .get(basename)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Basenames a row resolved to (one per file column); empty when the
    /// row id was never indexed.
    pub fn basenames_of(&self, row_id: RowId) -> &[String] {
        self.by_row.get(&row_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All indexed row ids, in no particular order.
    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.by_row.keys().copied()
    }

    /// Number of distinct basenames.
    pub fn len(&self) -> usize {
        self.by_basename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_basename.is_empty()
    }
}

/// Final path component as a lossy string; the key detector output is
/// matched back on.
pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
