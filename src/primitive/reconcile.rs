//! Merges detector output, the index mapping and placeholder rows into a
//! full-coverage prediction set.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::engine::Detection;
use crate::primitive::bbox::BoundingBox;
use crate::primitive::index_map::{IndexMapping, basename};
use crate::primitive::table::RowId;

/// Minimum confidence for a detection to produce a prediction row.
pub const SCORE_THRESHOLD: f32 = 0.5;

/// One reconciled prediction, still carrying the structured box.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub row_id: RowId,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// Produce at least one row per expected row id.
///
/// Detections per image are walked in the engine's descending-score order
/// and cut at the first score below [`SCORE_THRESHOLD`] (a score exactly
/// at the threshold qualifies); the engine's ordering is trusted, never
/// re-sorted. Each qualifying detection fans out over every row id its
/// basename resolves to, so a row may receive several rows (multi-object
/// images) — downstream scoring matches by row id and box overlap, not by
/// row cardinality. Row ids left uncovered get the zero-box placeholder at
/// confidence 0.0. The result is stably sorted by row id, restoring input
/// order while preserving detector order within a row.
pub fn reconcile(
    per_image: &[(PathBuf, Vec<Detection>)],
    index: &IndexMapping,
    expected: &[RowId],
) -> Vec<ReconciledRow> {
    let mut rows = Vec::new();

    for (path, detections) in per_image {
        let base = basename(path);
        let targets = index.lookup(&base);

        for detection in detections
            .iter()
            .take_while(|d| d.score >= SCORE_THRESHOLD)
        {
            for &row_id in targets {
                rows.push(ReconciledRow {
                    row_id,
                    bbox: detection.bbox,
                    confidence: detection.score,
                });
            }
        }
    }

    // Coverage gap: expected rows with zero emitted predictions.
    let covered: HashSet<RowId> = rows.iter().map(|row| row.row_id).collect();
    let mut gaps = 0usize;
    for &row_id in expected {
        if !covered.contains(&row_id) {
            rows.push(ReconciledRow {
                row_id,
                bbox: BoundingBox::ZERO,
                confidence: 0.0,
            });
            gaps += 1;
        }
    }
    if gaps > 0 {
        debug!(gaps, "patched placeholder rows for uncovered inputs");
    }

    rows.sort_by_key(|row| row.row_id);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(u64, &str)]) -> IndexMapping {
        let paths: Vec<(RowId, PathBuf)> = entries
            .iter()
            .map(|&(id, path)| (RowId(id), PathBuf::from(path)))
            .collect();
        IndexMapping::build(paths.iter().map(|(id, path)| (*id, path.as_path())))
    }

    fn det(score: f32) -> Detection {
        Detection::new(10.0, 20.0, 50.0, 80.0, score)
    }

    #[test]
    fn test_zero_detections_still_cover_every_row() {
        let idx = index(&[(0, "/d/a.jpg"), (1, "/d/b.jpg")]);
        let per_image = vec![
            (PathBuf::from("/d/a.jpg"), vec![]),
            (PathBuf::from("/d/b.jpg"), vec![]),
        ];

        let rows = reconcile(&per_image, &idx, &[RowId(0), RowId(1)]);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.bbox, BoundingBox::ZERO);
            assert_eq!(row.confidence, 0.0);
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let idx = index(&[(0, "/d/a.jpg")]);

        let accepted = reconcile(
            &[(PathBuf::from("/d/a.jpg"), vec![det(0.5)])],
            &idx,
            &[RowId(0)],
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].confidence, 0.5);

        let rejected = reconcile(
            &[(PathBuf::from("/d/a.jpg"), vec![det(0.4999)])],
            &idx,
            &[RowId(0)],
        );
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].confidence, 0.0);
        assert_eq!(rejected[0].bbox, BoundingBox::ZERO);
    }

    #[test]
    fn test_cut_at_first_subthreshold_score() {
        // Engine order is descending; everything after the first
        // below-threshold score is discarded even if a later score (from a
        // misbehaving engine) would qualify.
        let idx = index(&[(0, "/d/a.jpg")]);
        let detections = vec![det(0.9), det(0.45), det(0.8)];

        let rows = reconcile(
            &[(PathBuf::from("/d/a.jpg"), detections)],
            &idx,
            &[RowId(0)],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].confidence, 0.9);
    }

    #[test]
    fn test_multiple_detections_per_row_all_kept() {
        let idx = index(&[(0, "/d/a.jpg")]);
        let rows = reconcile(
            &[(PathBuf::from("/d/a.jpg"), vec![det(0.9), det(0.7)])],
            &idx,
            &[RowId(0)],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].confidence, 0.9);
        assert_eq!(rows[1].confidence, 0.7);
    }

    #[test]
    fn test_duplicate_basename_fans_out() {
        // One detection for a basename shared by two rows: both covered.
        let idx = index(&[(0, "/cam_a/a.jpg"), (1, "/cam_b/a.jpg")]);
        let rows = reconcile(
            &[
                (PathBuf::from("/cam_a/a.jpg"), vec![det(0.9)]),
                (PathBuf::from("/cam_b/a.jpg"), vec![]),
            ],
            &idx,
            &[RowId(0), RowId(1)],
        );

        // The detection resolves to both rows; no placeholders needed.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_id, RowId(0));
        assert_eq!(rows[1].row_id, RowId(1));
        assert!(rows.iter().all(|r| r.confidence == 0.9));
    }

    #[test]
    fn test_output_sorted_by_row_id() {
        let idx = index(&[(5, "/d/b.jpg"), (2, "/d/a.jpg")]);
        let rows = reconcile(
            &[
                (PathBuf::from("/d/b.jpg"), vec![det(0.8)]),
                (PathBuf::from("/d/a.jpg"), vec![det(0.6)]),
            ],
            &idx,
            &[RowId(5), RowId(2)],
        );

        let ids: Vec<RowId> = rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![RowId(2), RowId(5)]);
    }

    #[test]
    fn test_unknown_image_contributes_nothing() {
        let idx = index(&[(0, "/d/a.jpg")]);
        let rows = reconcile(
            &[(PathBuf::from("/d/stray.jpg"), vec![det(0.99)])],
            &idx,
            &[RowId(0)],
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_id, RowId(0));
        assert_eq!(rows[0].confidence, 0.0);
    }

    #[test]
    fn test_scenario_one_hit_one_miss() {
        let idx = index(&[(1, "/d/a.jpg"), (2, "/d/b.jpg")]);
        let rows = reconcile(
            &[
                (PathBuf::from("/d/a.jpg"), vec![det(0.9)]),
                (PathBuf::from("/d/b.jpg"), vec![]),
            ],
            &idx,
            &[RowId(1), RowId(2)],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_id, RowId(1));
        assert_eq!(rows[0].confidence, 0.9);
        assert_eq!(rows[0].bbox, BoundingBox::new(10.0, 20.0, 50.0, 80.0));
        assert_eq!(rows[1].row_id, RowId(2));
        assert_eq!(rows[1].confidence, 0.0);
        assert_eq!(rows[1].bbox, BoundingBox::ZERO);
    }
}
