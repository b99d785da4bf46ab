//! Flat-file readers and writers: IMDb TSV dumps, the CSV cache copies and
//! the gzip CSV exports. Every reader loads all columns as text; typing is
//! left to [`crate::data::conform`].

use crate::error::Result;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Leading row-index column carried by cache files.
pub const INDEX_COLUMN: &str = "index";

/// IMDb marks missing cells with `\N`.
const IMDB_NULL: &str = "\\N";

fn text_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

fn gunzip(compressed: impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    GzDecoder::new(compressed).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Parses a gzip-compressed IMDb dump: tab separated, unquoted, `\N` nulls.
pub fn read_imdb_tsv_gz(compressed: &[u8]) -> Result<DataFrame> {
    let bytes = gunzip(compressed)?;
    let df = text_options()
        .map_parse_options(|opts| {
            opts.with_separator(b'\t')
                .with_quote_char(None)
                .with_null_values(Some(NullValues::AllColumnsSingle(IMDB_NULL.into())))
        })
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Reads a cache copy and strips its row-index column.
pub fn read_indexed_csv(path: &Path) -> Result<DataFrame> {
    let df = text_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    if df.width() == 0 {
        return Err(PolarsError::NoData("empty cache file".into()).into());
    }
    if df.get_column_index(INDEX_COLUMN).is_some() {
        Ok(df.drop(INDEX_COLUMN)?)
    } else {
        Ok(df)
    }
}

/// Sibling file a cache copy is written to before it is moved into place.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `df` as CSV with a leading row-index column, creating the parent
/// directory when needed. The file only appears at `path` once fully
/// written; a failed write leaves nothing there.
pub fn write_indexed_csv(df: &DataFrame, path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut indexed = df.with_row_index(INDEX_COLUMN.into(), None)?;
    let staging = staging_path(path);
    if let Err(err) = write_csv(&mut indexed, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path)?;
    Ok(())
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    file.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

pub fn write_csv_gz(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    CsvWriter::new(&mut encoder).include_header(true).finish(df)?;
    encoder.finish()?.flush()?;
    Ok(())
}

pub fn read_csv_gz(path: &Path) -> Result<DataFrame> {
    let bytes = gunzip(File::open(path)?)?;
    let df = text_options()
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
