//! Read flat BOM tables from disk and write requirement tables.
//!
//! Tables are CSV or JSON (an array of row objects), chosen by file extension.
//! Column names match the material master, BOM and production order tables;
//! unrecognised columns are ignored.

use crate::aggregate::RawRequirement;
use crate::explode::ProductionOrder;
use crate::graph::{BomEdge, BomGraph, Material};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

/// On-disk table encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => anyhow::bail!(
                "cannot infer table format of {} (expected .csv or .json)",
                path.display()
            ),
        }
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let mut rows = Vec::new();
            for (i, row) in reader.deserialize().enumerate() {
                // +2: one for the header, one for 1-based numbering
                let row = row
                    .with_context(|| format!("malformed row {} in {}", i + 2, path.display()))?;
                rows.push(row);
            }
            Ok(rows)
        }
        TableFormat::Json => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("failed to parse {}", path.display()))
        }
    }
}

/// Load the material catalog.
pub fn load_materials(path: &Path) -> Result<Vec<Material>> {
    read_table(path)
}

/// Load the flat edge list.
pub fn load_edges(path: &Path) -> Result<Vec<BomEdge>> {
    read_table(path)
}

/// Load a production order book.
pub fn load_orders(path: &Path) -> Result<Vec<ProductionOrder>> {
    read_table(path)
}

/// Load both tables and build the graph.
pub fn load_graph(edges_path: &Path, materials_path: &Path) -> Result<BomGraph> {
    let materials = load_materials(materials_path)?;
    let edges = load_edges(edges_path)?;
    let graph = BomGraph::load(edges, materials)
        .with_context(|| format!("invalid BOM in {}", edges_path.display()))?;
    Ok(graph)
}

/// Write requirement rows as CSV (with header) or pretty JSON.
pub fn write_requirements<W: Write>(
    writer: W,
    rows: &[RawRequirement],
    format: TableFormat,
) -> Result<()> {
    match format {
        TableFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            if rows.is_empty() {
                csv_writer.write_record(["RawMaterial", "TotalQty"])?;
            }
            for row in rows {
                csv_writer.serialize(row)?;
            }
            csv_writer.flush().context("failed to write CSV")?;
        }
        TableFormat::Json => {
            serde_json::to_writer_pretty(writer, rows).context("failed to write JSON")?;
        }
    }
    Ok(())
}

/// Save requirement rows to `path`, format chosen by extension.
pub fn save_requirements(path: &Path, rows: &[RawRequirement]) -> Result<()> {
    let format = TableFormat::from_path(path)?;
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_requirements(std::io::BufWriter::new(file), rows, format)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("out/bom_table.CSV")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("edges.json")).unwrap(),
            TableFormat::Json
        );
        assert!(TableFormat::from_path(Path::new("edges.xlsx")).is_err());
        assert!(TableFormat::from_path(Path::new("edges")).is_err());
    }

    #[test]
    fn test_csv_output_has_header_when_empty() {
        let mut buf = Vec::new();
        write_requirements(&mut buf, &[], TableFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "RawMaterial,TotalQty\n");
    }

    #[test]
    fn test_csv_output_rows() {
        let rows = vec![
            RawRequirement {
                raw_material: "RAW1".into(),
                total_qty: 11,
            },
            RawRequirement {
                raw_material: "RAW2".into(),
                total_qty: 2,
            },
        ];
        let mut buf = Vec::new();
        write_requirements(&mut buf, &rows, TableFormat::Csv).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "RawMaterial,TotalQty\nRAW1,11\nRAW2,2\n"
        );
    }
}
