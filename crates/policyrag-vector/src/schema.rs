//! Arrow schema for the LanceDB collection.

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Build the collection schema for a given embedding dimension. The
/// dimension is fixed per index lifetime and recorded in the manifest.
pub fn build_arrow_schema(dimension: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("doc_path", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("total_chunks", DataType::Int32, false),
        Field::new("chunk_size", DataType::Int32, false),
        Field::new("chunk_overlap", DataType::Int32, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            true,
        ),
    ]))
}
