use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// One named output column. The Arrow type comes from the array itself, so
/// table writers only state the name and whether nulls are allowed.
pub(super) struct Column {
    name: &'static str,
    nullable: bool,
    data: ArrayRef,
}

impl Column {
    pub(super) fn new(name: &'static str, data: impl Array + 'static) -> Self {
        Self {
            name,
            nullable: false,
            data: Arc::new(data),
        }
    }

    pub(super) fn nullable(name: &'static str, data: impl Array + 'static) -> Self {
        Self {
            name,
            nullable: true,
            data: Arc::new(data),
        }
    }
}

/// Write the columns as a single-batch Parquet file.
pub(super) fn write_columns<P: AsRef<Path>>(
    path: P,
    columns: Vec<Column>,
) -> Result<(), Box<dyn Error>> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|column| Field::new(column.name, column.data.data_type().clone(), column.nullable))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|column| column.data).collect();
    let batch = RecordBatch::try_new(Arc::clone(&schema), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
