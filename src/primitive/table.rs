//! Typed stand-ins for the pipeline framework's tabular interface.

use std::fmt;
use std::path::PathBuf;

use crate::primitive::error::Error;

/// Opaque row identifier correlating input and output rows
/// (the `d3mIndex` column value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// An image-filename column together with the base directory from its
/// file-location metadata. Filenames in this column resolve against
/// `base_dir`.
#[derive(Debug, Clone)]
pub struct FileColumn {
    pub name: String,
    pub base_dir: PathBuf,
}

impl FileColumn {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
        }
    }
}

/// One labeled object: filenames (index-aligned with the table's file
/// columns) plus a packed 8-coordinate bounding-box string.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub row_id: RowId,
    pub filenames: Vec<String>,
    pub bounding_box: String,
}

/// Training input: one row per labeled object. Multiple rows may point at
/// the same image (one per object).
#[derive(Debug, Clone, Default)]
pub struct TrainingTable {
    pub file_columns: Vec<FileColumn>,
    pub rows: Vec<TrainingRow>,
}

impl TrainingTable {
    /// Resolve a row's filenames against the per-column base directories,
    /// one path entry per file column.
    pub fn resolve_row(&self, row: &TrainingRow) -> Result<Vec<PathBuf>, Error> {
        resolve_paths(&self.file_columns, row.row_id, &row.filenames)
    }
}

/// Prediction input row: identifier and filenames, no bounding box.
#[derive(Debug, Clone)]
pub struct ScoringRow {
    pub row_id: RowId,
    pub filenames: Vec<String>,
}

/// Prediction input: one row per expected output row.
#[derive(Debug, Clone, Default)]
pub struct ScoringTable {
    pub file_columns: Vec<FileColumn>,
    pub rows: Vec<ScoringRow>,
}

impl ScoringTable {
    pub fn resolve_row(&self, row: &ScoringRow) -> Result<Vec<PathBuf>, Error> {
        resolve_paths(&self.file_columns, row.row_id, &row.filenames)
    }

    /// Row ids in table order; the set the reconciler must cover.
    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().map(|row| row.row_id)
    }
}

/// Join each file column's base directory with the row's filename for that
/// column. Build time and lookup time both go through here so the two
/// sides of the index mapping always agree.
fn resolve_paths(
    columns: &[FileColumn],
    row_id: RowId,
    filenames: &[String],
) -> Result<Vec<PathBuf>, Error> {
    if filenames.len() != columns.len() {
        return Err(Error::TableShape {
            row: row_id,
            expected: columns.len(),
            found: filenames.len(),
        });
    }

    Ok(columns
        .iter()
        .zip(filenames)
        .map(|(column, filename)| column.base_dir.join(filename))
        .collect())
}
