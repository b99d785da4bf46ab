use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote fetch failed: connection, TLS or non-success status.
    #[error("remote fetch of {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("table {table} is missing required column {column}")]
    Schema { table: String, column: String },

    #[error("power analysis error: {0}")]
    Power(String),

    #[error("plot rendering error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
