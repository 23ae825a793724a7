use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, UInt64Array},
    csv::WriterBuilder,
    datatypes::{DataType, Field, FieldRef, Schema},
    record_batch::RecordBatch,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};
use tracing::{info, instrument};

/// Prefix `table` with an unnamed, 0-based row-index column.
pub fn with_row_index(table: &RecordBatch) -> Result<RecordBatch> {
    let index: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        0..table.num_rows() as u64,
    ));

    let mut fields: Vec<FieldRef> = Vec::with_capacity(table.num_columns() + 1);
    fields.push(Arc::new(Field::new("", DataType::UInt64, false)));
    fields.extend(table.schema().fields().iter().cloned());

    let mut columns = Vec::with_capacity(table.num_columns() + 1);
    columns.push(index);
    columns.extend(table.columns().iter().cloned());

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("adding row index")
}

/// Write `table` as CSV to `path`, replacing any existing file.
///
/// The first column is the row index with an empty header; nulls are
/// written as empty fields.
#[instrument(level = "info", skip(table), fields(path = %path.display()))]
pub fn write_table(table: &RecordBatch, path: &Path) -> Result<()> {
    let indexed = with_row_index(table)?;

    let file =
        File::create(path).with_context(|| format!("creating file {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_delimiter(b',')
        .build(BufWriter::new(file));

    writer
        .write(&indexed)
        .with_context(|| format!("writing CSV to {}", path.display()))?;

    let mut inner = writer.into_inner();
    inner
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;

    info!(rows = table.num_rows(), "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::aggregate::{concat_tables, load_csv_table};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_index_then_columns() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let first = load_csv_table(b"X,Y\na,1\nb,2\n", "first.csv")?;
        let second = load_csv_table(b"X,Y\nc,3\n", "second.csv")?;

        write_table(&concat_tables(&[first, second])?, &path)?;

        assert_eq!(fs::read_to_string(&path)?, ",X,Y\n0,a,1\n1,b,2\n2,c,3\n");
        Ok(())
    }

    #[test]
    fn nulls_and_quotes_round_out() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let table = load_csv_table(b"Name,Note\n\"Acme, Inc.\",\nBeta,ok\n", "q.csv")?;

        write_table(&table, &path)?;

        assert_eq!(
            fs::read_to_string(&path)?,
            ",Name,Note\n0,\"Acme, Inc.\",\n1,Beta,ok\n"
        );
        Ok(())
    }

    #[test]
    fn header_only_table_writes_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");

        write_table(&load_csv_table(b"id,value\n", "e.csv")?, &path)?;

        assert_eq!(fs::read_to_string(&path)?, ",id,value\n");
        Ok(())
    }

    #[test]
    fn overwrites_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale contents from a previous run\n")?;

        write_table(&load_csv_table(b"id\n7\n", "one.csv")?, &path)?;

        assert_eq!(fs::read_to_string(&path)?, ",id\n0,7\n");
        Ok(())
    }

    #[test]
    fn unwritable_path_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("no_such_dir").join("out.csv");
        let table = load_csv_table(b"id\n7\n", "one.csv")?;

        let err = write_table(&table, &path).expect_err("parent directory is missing");
        assert!(err.to_string().contains("creating file"));
        Ok(())
    }
}
