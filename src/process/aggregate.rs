use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{new_null_array, ArrayRef},
    compute::concat_batches,
    csv::ReaderBuilder,
    datatypes::{DataType, Field, FieldRef, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::{collections::HashSet, io::Cursor, sync::Arc};
use tracing::{debug, info, instrument};

use crate::fetch::ArchiveReader;
use crate::process::utils::{normalize_headers, strip_bom};

/// Rows per Arrow batch while parsing a single member.
const BATCH_ROWS: usize = 65_536;

/// Load every member in `file_names` and stack them into one table.
///
/// Row order is file order, then row order within each file. Columns are the
/// union of all member columns in order of first appearance; members lacking
/// a column contribute nulls for it.
#[instrument(level = "info", skip(file_names, archive), fields(files = file_names.len()))]
pub fn aggregate(file_names: &[String], archive: &mut ArchiveReader) -> Result<RecordBatch> {
    if file_names.is_empty() {
        bail!("no objects to concatenate");
    }

    let mut tables = Vec::with_capacity(file_names.len());
    for name in file_names {
        let data = archive.read_member(name)?;
        let table = load_csv_table(&data, name).with_context(|| format!("loading {}", name))?;
        debug!(
            file = %name,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "loaded member"
        );
        tables.push(table);
    }

    let combined = concat_tables(&tables)?;
    info!(
        rows = combined.num_rows(),
        columns = combined.num_columns(),
        "aggregated tables"
    );
    Ok(combined)
}

/// Parse one CSV member with every column read as nullable text.
///
/// Undecodable bytes are replaced rather than rejected. Empty fields, and
/// trailing fields missing from a short row, become nulls.
pub fn load_csv_table(data: &[u8], file_name: &str) -> Result<RecordBatch> {
    let text = String::from_utf8_lossy(data);
    let text = strip_bom(&text);

    let headers = read_header_row(text.as_bytes())?
        .ok_or_else(|| anyhow!("no columns to parse from {}", file_name))?;
    let fields: Vec<Field> = normalize_headers(headers)
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema: SchemaRef = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_ROWS)
        .with_quote(b'"')
        .with_delimiter(b',')
        .with_truncated_rows(true)
        .build(Cursor::new(text.as_bytes()))
        .context("creating CSV reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("CSV parse error in {}", file_name))?;

    concat_batches(&schema, &batches).context("combining CSV batches")
}

/// First record of `data`, or `None` when there is nothing to read.
fn read_header_row(data: &[u8]) -> Result<Option<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut record = csv::StringRecord::new();
    if !rdr.read_record(&mut record).context("reading header row")? {
        return Ok(None);
    }
    Ok(Some(record.iter().map(str::to_string).collect()))
}

/// Stack tables row-wise over the union of their columns.
pub fn concat_tables(tables: &[RecordBatch]) -> Result<RecordBatch> {
    if tables.is_empty() {
        bail!("no objects to concatenate");
    }

    let mut seen = HashSet::new();
    let mut fields: Vec<FieldRef> = Vec::new();
    for table in tables {
        for field in table.schema().fields() {
            if seen.insert(field.name().clone()) {
                fields.push(field.clone());
            }
        }
    }
    let schema: SchemaRef = Arc::new(Schema::new(fields));

    let aligned = tables
        .iter()
        .map(|t| align_to_schema(t, &schema))
        .collect::<Result<Vec<_>>>()?;

    concat_batches(&schema, &aligned).context("concatenating tables")
}

fn align_to_schema(table: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    if table.schema() == *schema {
        return Ok(table.clone());
    }

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|f| match table.column_by_name(f.name()) {
            Some(col) => col.clone(),
            None => new_null_array(f.data_type(), table.num_rows()),
        })
        .collect();

    RecordBatch::try_new(schema.clone(), columns).context("aligning table to combined columns")
}
