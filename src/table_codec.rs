//! # Parquet persistence of cached tables
//!
//! Cache files are **Apache Parquet** tables (gzip-compressed column chunks) written with
//! [`ArrowWriter`] and read back with [`ParquetRecordBatchReaderBuilder`]. Two codecs implement
//! the [`TableCodec`] trait used by [`crate::cache_store::CacheStore`]:
//!
//! * [`CatalogParquet`] – one typed column per entry of [`CATALOG_FIELDS`].
//! * [`ObservationParquet`] – the raw observation batch of one object, one `Utf8` column of JSON
//!   text per entry key.
//!
//! ## Catalog table
//! -----------------
//! | Kind                          | Arrow type | Nullable |
//! |-------------------------------|------------|----------|
//! | `Float`                       | `Float64`  | yes (`NaN` is stored as null) |
//! | `Int`                         | `Int64`    | no       |
//! | `Bool`                        | `Boolean`  | no       |
//! | `Text`                        | `Utf8`     | no       |
//! | `NullableText` / `Flexible`   | `Utf8`     | yes      |
//!
//! ## Observation table
//! -----------------
//! The upstream observation payload has no fixed shape. The codec keeps that shape in the
//! Arrow schema metadata (key `shape`) so that a cache hit hands the matcher exactly what the
//! original fetch did:
//!
//! * `sequence` – a JSON array of entry objects, one row per entry.
//! * `record` – a single entry object returned as a scalar, one row.
//! * `literal` – anything else (`null`, a boolean, an array of non-objects...). The table is
//!   empty and the JSON text is stored under the metadata key `literal`.
//!
//! Columns are `observatory` first, then every other key in first-seen order. Each cell holds
//! the JSON text of the entry value (`704`, `"C51"`, `null`...), so numbers, booleans and
//! explicit nulls come back with their JSON type. A key absent from an entry is stored as a
//! Parquet null and stays absent in the rebuilt entry object.
use std::{collections::HashMap, fs::File, sync::Arc};

use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use camino::Utf8Path;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{Compression, GzipLevel},
    file::properties::WriterProperties,
};
use serde_json::{Map, Value};

use crate::{
    catalog_record::{CatalogRecord, FieldKind, CATALOG_FIELDS},
    observation::{ObservationBatch, OBSERVATORY_FIELD},
    xmatch_errors::XmatchError,
};

const SHAPE_KEY: &str = "shape";
const LITERAL_KEY: &str = "literal";

static NULL: Value = Value::Null;

/// Encode/decode a value of type `T` to/from a single table file.
pub trait TableCodec<T> {
    /// Write `value` as a new table file at `path`.
    fn write(&self, path: &Utf8Path, value: &T) -> Result<(), XmatchError>;

    /// Read back a table file previously produced by [`TableCodec::write`].
    fn read(&self, path: &Utf8Path) -> Result<T, XmatchError>;
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::GZIP(GzipLevel::default()))
        .build()
}

fn write_batch(path: &Utf8Path, batch: &RecordBatch) -> Result<(), XmatchError> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn corrupt(path: &Utf8Path, reason: impl Into<String>) -> XmatchError {
    XmatchError::CorruptCacheFile {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn downcast<'a, A: 'static>(
    path: &Utf8Path,
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, XmatchError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| corrupt(path, format!("column '{name}' not found")))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| corrupt(path, format!("column '{name}' has an unexpected type")))
}

// -------------------------------------------------------------------------------------------------
// Catalog
// -------------------------------------------------------------------------------------------------

/// Parquet codec of the normalized distant-object catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogParquet;

impl CatalogParquet {
    fn arrow_field(name: &str, kind: FieldKind) -> Field {
        match kind {
            FieldKind::Float => Field::new(name, DataType::Float64, true),
            FieldKind::Int => Field::new(name, DataType::Int64, false),
            FieldKind::Bool => Field::new(name, DataType::Boolean, false),
            FieldKind::Text => Field::new(name, DataType::Utf8, false),
            FieldKind::NullableText | FieldKind::Flexible => Field::new(name, DataType::Utf8, true),
        }
    }

    pub fn schema() -> Schema {
        Schema::new(
            CATALOG_FIELDS
                .iter()
                .map(|(name, kind)| Self::arrow_field(name, *kind))
                .collect::<Vec<_>>(),
        )
    }

    fn column(rows: &[Map<String, Value>], name: &str, kind: FieldKind) -> ArrayRef {
        let cells = rows.iter().map(|row| row.get(name).unwrap_or(&NULL));
        match kind {
            FieldKind::Float => Arc::new(cells.map(Value::as_f64).collect::<Float64Array>()),
            FieldKind::Int => Arc::new(cells.map(Value::as_i64).collect::<Int64Array>()),
            FieldKind::Bool => Arc::new(cells.map(Value::as_bool).collect::<BooleanArray>()),
            FieldKind::Text | FieldKind::NullableText | FieldKind::Flexible => {
                Arc::new(cells.map(Value::as_str).collect::<StringArray>())
            }
        }
    }

    fn cell(
        path: &Utf8Path,
        batch: &RecordBatch,
        name: &str,
        kind: FieldKind,
        row: usize,
    ) -> Result<Value, XmatchError> {
        let value = match kind {
            FieldKind::Float => {
                let col = downcast::<Float64Array>(path, batch, name)?;
                if col.is_null(row) {
                    Value::Null
                } else {
                    serde_json::Number::from_f64(col.value(row)).map_or(Value::Null, Value::Number)
                }
            }
            FieldKind::Int => {
                let col = downcast::<Int64Array>(path, batch, name)?;
                if col.is_null(row) {
                    return Err(corrupt(path, format!("null in integer column '{name}'")));
                }
                Value::Number(col.value(row).into())
            }
            FieldKind::Bool => {
                let col = downcast::<BooleanArray>(path, batch, name)?;
                Value::Bool(!col.is_null(row) && col.value(row))
            }
            FieldKind::Text | FieldKind::NullableText | FieldKind::Flexible => {
                let col = downcast::<StringArray>(path, batch, name)?;
                if col.is_null(row) {
                    Value::Null
                } else {
                    Value::String(col.value(row).to_string())
                }
            }
        };
        Ok(value)
    }
}

impl TableCodec<Vec<CatalogRecord>> for CatalogParquet {
    fn write(&self, path: &Utf8Path, value: &Vec<CatalogRecord>) -> Result<(), XmatchError> {
        let rows = value
            .iter()
            .map(|record| match serde_json::to_value(record)? {
                Value::Object(map) => Ok(map),
                other => Err(XmatchError::UpstreamPayload(format!(
                    "catalog record serialized as {other}"
                ))),
            })
            .collect::<Result<Vec<_>, XmatchError>>()?;

        let columns = CATALOG_FIELDS
            .iter()
            .map(|(name, kind)| Self::column(&rows, name, *kind))
            .collect::<Vec<_>>();

        let batch = RecordBatch::try_new(Arc::new(Self::schema()), columns)?;
        write_batch(path, &batch)
    }

    fn read(&self, path: &Utf8Path) -> Result<Vec<CatalogRecord>, XmatchError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;

        let mut records = Vec::new();
        for maybe_batch in reader {
            let batch = maybe_batch?;
            for row in 0..batch.num_rows() {
                let mut map = Map::with_capacity(CATALOG_FIELDS.len());
                for (name, kind) in CATALOG_FIELDS {
                    map.insert(
                        (*name).to_string(),
                        Self::cell(path, &batch, name, *kind, row)?,
                    );
                }
                let record = serde_json::from_value(Value::Object(map))
                    .map_err(|e| corrupt(path, e.to_string()))?;
                records.push(record);
            }
        }
        Ok(records)
    }
}

// -------------------------------------------------------------------------------------------------
// Observations
// -------------------------------------------------------------------------------------------------

/// Parquet codec of a raw observation batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservationParquet;

impl ObservationParquet {
    fn entries(batch: &ObservationBatch) -> Option<(&'static str, Vec<&Map<String, Value>>)> {
        match batch {
            Value::Object(entry) => Some(("record", vec![entry])),
            Value::Array(items) => items
                .iter()
                .map(Value::as_object)
                .collect::<Option<Vec<_>>>()
                .map(|entries| ("sequence", entries)),
            _ => None,
        }
    }

    fn column_names(entries: &[&Map<String, Value>]) -> Vec<String> {
        let mut names = vec![OBSERVATORY_FIELD.to_string()];
        for entry in entries {
            for key in entry.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }
}

impl TableCodec<ObservationBatch> for ObservationParquet {
    fn write(&self, path: &Utf8Path, value: &ObservationBatch) -> Result<(), XmatchError> {
        let (shape, entries) = Self::entries(value).unwrap_or(("literal", Vec::new()));

        let mut metadata = HashMap::from([(SHAPE_KEY.to_string(), shape.to_string())]);
        if shape == "literal" {
            metadata.insert(LITERAL_KEY.to_string(), serde_json::to_string(value)?);
        }

        let names = Self::column_names(&entries);
        let fields = names
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>();
        let columns = names
            .iter()
            .map(|name| {
                Arc::new(
                    entries
                        .iter()
                        .map(|entry| entry.get(name).map(Value::to_string))
                        .collect::<StringArray>(),
                ) as ArrayRef
            })
            .collect::<Vec<_>>();

        let schema = Arc::new(Schema::new_with_metadata(fields, metadata));
        let batch = RecordBatch::try_new(schema, columns)?;
        write_batch(path, &batch)
    }

    fn read(&self, path: &Utf8Path) -> Result<ObservationBatch, XmatchError> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let metadata = builder.schema().metadata().clone();

        let shape = metadata
            .get(SHAPE_KEY)
            .ok_or_else(|| corrupt(path, "missing shape metadata"))?
            .clone();
        if shape == "literal" {
            let literal = metadata
                .get(LITERAL_KEY)
                .ok_or_else(|| corrupt(path, "missing literal metadata"))?;
            return Ok(serde_json::from_str(literal)?);
        }

        let mut entries = Vec::new();
        for maybe_batch in builder.build()? {
            let batch = maybe_batch?;
            let schema = batch.schema();
            for row in 0..batch.num_rows() {
                let mut entry = Map::new();
                for field in schema.fields() {
                    let col = downcast::<StringArray>(path, &batch, field.name())?;
                    if col.is_valid(row) {
                        let cell = serde_json::from_str(col.value(row))
                            .map_err(|e| corrupt(path, format!("{}: {e}", field.name())))?;
                        entry.insert(field.name().clone(), cell);
                    }
                }
                entries.push(Value::Object(entry));
            }
        }

        match shape.as_str() {
            "sequence" => Ok(Value::Array(entries)),
            "record" => entries
                .pop()
                .filter(|_| entries.is_empty())
                .ok_or_else(|| corrupt(path, "a record table must hold exactly one row")),
            other => Err(corrupt(path, format!("unknown shape '{other}'"))),
        }
    }
}

#[cfg(test)]
mod table_codec_test {
    use super::*;
    use crate::normalize::{normalize_row, normalize_test::raw_row};
    use camino::Utf8PathBuf;
    use serde_json::json;
    use tempfile::TempDir;

    fn tmp_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_catalog_round_trip_keeps_nulls() {
        let dir = TempDir::new().unwrap();
        let path = tmp_path(&dir, "distant_objects.parquet");

        let chiron = normalize_row(&raw_row(json!("2060"), json!("Chiron"))).unwrap();
        let unnamed = normalize_row(&raw_row(json!(null), json!("None"))).unwrap();

        CatalogParquet
            .write(&path, &vec![chiron.clone(), unnamed.clone()])
            .unwrap();
        let back = CatalogParquet.read(&path).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].number.as_deref(), Some("2060"));
        assert_eq!(back[0].earth_moid, chiron.earth_moid);
        assert_eq!(back[0].mercury_moid, None);
        assert_eq!(back[0].observations, chiron.observations);
        assert!(back[0].delta_v.is_nan());
        assert_eq!(back[1].number, None);
        assert_eq!(back[1].name, None);
        assert_eq!(back[1].designation, unnamed.designation);
    }

    #[test]
    fn test_observation_shapes_survive() {
        let dir = TempDir::new().unwrap();

        let cases = [
            json!([{ "observatory": "C51", "ra": 12.5 }, { "observatory": 704, "mag": null }]),
            json!({ "observatory": "C51" }),
            json!([]),
            json!(null),
            json!(true),
        ];

        for (idx, batch) in cases.iter().enumerate() {
            let path = tmp_path(&dir, &format!("{idx}.parquet"));
            ObservationParquet.write(&path, batch).unwrap();
            assert_eq!(&ObservationParquet.read(&path).unwrap(), batch, "case {idx}");
        }
    }

    #[test]
    fn test_observation_cells_keep_json_types() {
        let dir = TempDir::new().unwrap();
        let path = tmp_path(&dir, "704.parquet");
        let batch = json!([
            { "observatory": 704, "mag": null, "ra": 12.5 },
            { "observatory": "C51", "flag": true, "note": "s" },
            { "ra": "01 02 03.4" }
        ]);

        ObservationParquet.write(&path, &batch).unwrap();
        let back = ObservationParquet.read(&path).unwrap();

        assert_eq!(back, batch);
        assert_eq!(back[0]["observatory"], json!(704));
        assert!(back[0].as_object().unwrap().contains_key("mag"));
        assert!(!back[2].as_object().unwrap().contains_key("observatory"));
    }
}
