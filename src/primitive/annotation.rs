//! Conversion from the tabular training input into the per-image
//! annotation structure the detector engine consumes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::primitive::bbox::BoundingBox;
use crate::primitive::classes::{ClassRegistry, DEFAULT_CLASS};
use crate::primitive::error::Error;
use crate::primitive::table::TrainingTable;

/// One ground-truth object on an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledBox {
    pub bbox: BoundingBox,
    pub class_id: u32,
}

/// Per-image annotation lists, in first-seen image order.
///
/// Every bounding box belongs to exactly one image path; images labeled by
/// several rows accumulate several boxes.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    entries: Vec<(PathBuf, Vec<LabeledBox>)>,
    by_path: HashMap<PathBuf, usize>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a labeled box to an image, creating the image entry on first
    /// sight.
    pub fn push(&mut self, path: PathBuf, label: LabeledBox) {
        match self.by_path.get(&path) {
            Some(&index) => self.entries[index].1.push(label),
            None => {
                self.by_path.insert(path.clone(), self.entries.len());
                self.entries.push((path, vec![label]));
            }
        }
    }

    pub fn labels_for(&self, path: &Path) -> &[LabeledBox] {
        self.by_path
            .get(path)
            .map(|&index| self.entries[index].1.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate images and their boxes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[LabeledBox])> + '_ {
        self.entries
            .iter()
            .map(|(path, labels)| (path.as_path(), labels.as_slice()))
    }

    /// Number of distinct images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of ground-truth boxes across all images.
    pub fn total_boxes(&self) -> usize {
        self.entries.iter().map(|(_, labels)| labels.len()).sum()
    }
}

/// Immutable product of annotation building, handed to fit and produce.
#[derive(Debug, Clone)]
pub struct TrainingContext {
    pub annotations: AnnotationSet,
    pub classes: ClassRegistry,
}

/// Build the detector's annotation structure from a training table.
///
/// Each row contributes one box per file column; the box comes from the
/// packed 8-coordinate string and the class is the fixed single-class
/// policy (the source data has no class column). A row whose bounding-box
/// field does not decode fails the whole build with that row's id — rows
/// are never dropped silently.
pub fn build_annotations(table: &TrainingTable) -> Result<TrainingContext, Error> {
    let mut classes = ClassRegistry::new();
    let class_id = classes.register(DEFAULT_CLASS);

    let mut annotations = AnnotationSet::new();
    for row in &table.rows {
        let paths = table.resolve_row(row)?;
        let bbox = BoundingBox::from_polygon_str(&row.bounding_box).map_err(|source| {
            Error::MalformedBoundingBox {
                row: row.row_id,
                source,
            }
        })?;

        for path in paths {
            annotations.push(path, LabeledBox { bbox, class_id });
        }
    }

    debug!(
        images = annotations.len(),
        boxes = annotations.total_boxes(),
        "annotation set built"
    );

    Ok(TrainingContext {
        annotations,
        classes,
    })
}
