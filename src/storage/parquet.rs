//! Parquet I/O for graph persistence
//!
//! # Format
//!
//! Graphs are stored as three Parquet files:
//! - `{path}_vertices.parquet`: (`vertex_id`)
//! - `{path}_edges.parquet`: (source, target, weight), in edge-list order
//! - `{path}_keywords.parquet`: (vertex, keyword); the graph's keyword count
//!   is stored under the `keyword_count` key-value metadata entry

use super::{SparseGraph, VertexId, DEFAULT_KEYWORD_COUNT};
use crate::error::GraphError;
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const KEYWORD_COUNT_KEY: &str = "keyword_count";

fn file_path(base_path: &Path, table: &str) -> String {
    format!("{}_{table}.parquet", base_path.display())
}

#[allow(clippy::cast_possible_truncation)] // Ids are at most u32
fn column<T: VertexId>(ids: impl Iterator<Item = T>) -> ArrayRef {
    Arc::new(UInt32Array::from_iter_values(ids.map(|id| id.index() as u32)))
}

fn write_table(
    path: &str,
    columns: Vec<(&str, ArrayRef)>,
    metadata: Option<Vec<KeyValue>>,
) -> Result<()> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::UInt32, false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .with_context(|| format!("Failed to create RecordBatch for {path}"))?;

    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::ZSTD(
            parquet::basic::ZstdLevel::try_new(3)?,
        ))
        .set_key_value_metadata(metadata)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// Rows of a `u32` table plus its key-value metadata
struct Table {
    rows: Vec<Vec<u32>>,
    metadata: Vec<KeyValue>,
}

impl Table {
    fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|kv| kv.key == key)
            .and_then(|kv| kv.value.as_deref())
    }
}

fn read_table(path: &str, width: usize) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let metadata = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .cloned()
        .unwrap_or_default();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch: RecordBatch = batch_result?;

        let columns = (0..width)
            .map(|i| {
                batch
                    .column(i)
                    .as_any()
                    .downcast_ref::<UInt32Array>()
                    .with_context(|| format!("Invalid column {i} type in {path}"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|c| c.value(row)).collect());
        }
    }

    Ok(Table { rows, metadata })
}

fn id<T: VertexId>(raw: u32) -> Result<T> {
    T::from_index(raw as usize).ok_or_else(|| GraphError::IdOverflow(raw as usize).into())
}

impl<T: VertexId> SparseGraph<T> {
    /// Write graph to Parquet files
    ///
    /// Creates `{path}_vertices.parquet`, `{path}_edges.parquet` and
    /// `{path}_keywords.parquet`.
    ///
    /// # Errors
    ///
    /// Returns error if file I/O fails or Arrow conversion fails
    #[allow(clippy::unused_async)] // Async API for future I/O operations
    pub async fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let base_path = path.as_ref();

        write_table(
            &file_path(base_path, "vertices"),
            vec![("vertex_id", column(self.iter_vertices()))],
            None,
        )?;

        let weights: ArrayRef = Arc::new(UInt32Array::from_iter_values(
            self.iter_edges().map(|(_, edge)| edge.weight),
        ));
        write_table(
            &file_path(base_path, "edges"),
            vec![
                ("source", column(self.iter_edges().map(|(src, _)| src))),
                ("target", column(self.iter_edges().map(|(_, edge)| edge.end))),
                ("weight", weights),
            ],
            None,
        )?;

        let memberships = || {
            self.iter_vertices()
                .flat_map(|v| self.keywords_of(v).into_iter().map(move |k| (v, k)))
        };
        write_table(
            &file_path(base_path, "keywords"),
            vec![
                ("vertex", column(memberships().map(|(v, _)| v))),
                ("keyword", column(memberships().map(|(_, k)| k))),
            ],
            Some(vec![KeyValue::new(
                KEYWORD_COUNT_KEY.to_string(),
                self.keyword_count().to_string(),
            )]),
        )?;

        Ok(())
    }

    /// Read graph from Parquet files
    ///
    /// # Errors
    ///
    /// Returns error if files don't exist, Arrow conversion fails or the
    /// stored graph violates a graph invariant (e.g. an edge to a missing
    /// vertex, an id wider than `T`)
    #[allow(clippy::unused_async)] // Async API for future I/O operations
    pub async fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref();

        let keywords_path = file_path(base_path, "keywords");
        let keywords = read_table(&keywords_path, 2)?;
        let keyword_count = match keywords.metadata_value(KEYWORD_COUNT_KEY) {
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid {KEYWORD_COUNT_KEY} in {keywords_path}"))?,
            None => DEFAULT_KEYWORD_COUNT,
        };

        let mut graph = Self::with_keyword_count(keyword_count);

        for row in read_table(&file_path(base_path, "vertices"), 1)?.rows {
            graph.add_vertex(id(row[0])?)?;
        }

        for row in read_table(&file_path(base_path, "edges"), 3)?.rows {
            graph.add_edge(id(row[0])?, id(row[1])?, row[2])?;
        }

        for row in keywords.rows {
            graph.add_keyword(id(row[0])?, id(row[1])?)?;
        }

        Ok(graph)
    }
}
