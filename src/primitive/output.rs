//! Final output table assembly: fixed three-column schema with the
//! semantic role tags the consuming framework requires.

use std::fmt::Write as _;

use crate::primitive::reconcile::ReconciledRow;
use crate::primitive::table::RowId;

/// One output row: identifier, encoded polygon, confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub row_id: RowId,
    pub bounding_box: String,
    pub confidence: f32,
}

/// Structural type tag of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralType {
    Integer,
    Text,
    Float,
}

impl StructuralType {
    pub fn uri(&self) -> &'static str {
        match self {
            StructuralType::Integer => "http://schema.org/Integer",
            StructuralType::Text => "http://schema.org/Text",
            StructuralType::Float => "http://schema.org/Float",
        }
    }
}

/// Semantic role tag of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticRole {
    PrimaryKey,
    PredictedTarget,
    BoundingPolygon,
    Score,
}

impl SemanticRole {
    pub fn uri(&self) -> &'static str {
        match self {
            SemanticRole::PrimaryKey => {
                "https://metadata.datadrivendiscovery.org/types/PrimaryKey"
            }
            SemanticRole::PredictedTarget => {
                "https://metadata.datadrivendiscovery.org/types/PredictedTarget"
            }
            SemanticRole::BoundingPolygon => {
                "https://metadata.datadrivendiscovery.org/types/BoundingPolygon"
            }
            SemanticRole::Score => "https://metadata.datadrivendiscovery.org/types/Score",
        }
    }
}

/// Column metadata for the output table. This is an external-interface
/// contract: name, order and role tags must match what the consuming
/// framework expects byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub structural: StructuralType,
    pub roles: &'static [SemanticRole],
}

/// The prediction output table: exactly three columns in fixed order, one
/// or more rows per input row id.
#[derive(Debug, Clone, Default)]
pub struct PredictionTable {
    rows: Vec<PredictionRow>,
}

impl PredictionTable {
    /// The fixed output schema.
    pub const SCHEMA: [ColumnSpec; 3] = [
        ColumnSpec {
            name: "d3mIndex",
            structural: StructuralType::Integer,
            roles: &[SemanticRole::PrimaryKey],
        },
        ColumnSpec {
            name: "bounding_box",
            structural: StructuralType::Text,
            roles: &[SemanticRole::PredictedTarget, SemanticRole::BoundingPolygon],
        },
        ColumnSpec {
            name: "confidence",
            structural: StructuralType::Float,
            roles: &[SemanticRole::Score],
        },
    ];

    /// Serialize reconciled rows, encoding each box as its 8-coordinate
    /// polygon string.
    pub fn from_reconciled(rows: Vec<ReconciledRow>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| PredictionRow {
                    row_id: row.row_id,
                    bounding_box: row.bbox.to_polygon_string(),
                    confidence: row.confidence,
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV with the schema's header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<&str> = Self::SCHEMA.iter().map(|column| column.name).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in &self.rows {
            // The polygon string contains commas, so it is quoted.
            let _ = writeln!(
                out,
                "{},\"{}\",{}",
                row.row_id, row.bounding_box, row.confidence
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::bbox::BoundingBox;

    #[test]
    fn test_schema_contract() {
        let names: Vec<&str> = PredictionTable::SCHEMA.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["d3mIndex", "bounding_box", "confidence"]);

        assert_eq!(
            PredictionTable::SCHEMA[0].roles,
            &[SemanticRole::PrimaryKey]
        );
        assert_eq!(
            PredictionTable::SCHEMA[1].roles,
            &[SemanticRole::PredictedTarget, SemanticRole::BoundingPolygon]
        );
        assert_eq!(PredictionTable::SCHEMA[2].roles, &[SemanticRole::Score]);
        assert_eq!(
            PredictionTable::SCHEMA[1].structural.uri(),
            "http://schema.org/Text"
        );
        assert_eq!(
            SemanticRole::BoundingPolygon.uri(),
            "https://metadata.datadrivendiscovery.org/types/BoundingPolygon"
        );
    }

    #[test]
    fn test_from_reconciled_encodes_polygon() {
        let table = PredictionTable::from_reconciled(vec![ReconciledRow {
            row_id: RowId(1),
            bbox: BoundingBox::new(10.0, 20.0, 50.0, 80.0),
            confidence: 0.9,
        }]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].bounding_box, "10,20,10,80,50,80,50,20");
        assert_eq!(table.rows()[0].confidence, 0.9);
    }

    #[test]
    fn test_csv_rendering() {
        let table = PredictionTable::from_reconciled(vec![ReconciledRow {
            row_id: RowId(2),
            bbox: BoundingBox::ZERO,
            confidence: 0.0,
        }]);

        let csv = table.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("d3mIndex,bounding_box,confidence"));
        assert_eq!(lines.next(), Some("2,\"0,0,0,0,0,0,0,0\",0"));
    }
}
