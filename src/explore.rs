//! Exploration of the augmented titles table: primary genre, complete-row
//! filter, genre-balanced sampling over time, summaries and correlations.

use crate::aggregate::{MEAN_RATING_PREFIX, mean_rating_columns};
use crate::config::{Config, YearOrdering};
use crate::data::{AVERAGE_RATING, Dataset, GENRES, START_YEAR, conform};
use crate::error::Result;
use crate::tabular;
use ahash::{HashMap, HashMapExt};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

pub const PRIMARY_GENRE: &str = "primary_genre";
const YEAR_SORT_KEY: &str = "start_year_sort_key";

/// Measures always eligible for the numeric projection, besides every
/// `mean_rating_*` column.
pub const MEASURE_COLUMNS: [&str; 5] = [
    "isAdult",
    START_YEAR,
    "endYear",
    "runtimeMinutes",
    AVERAGE_RATING,
];

/// Reads an exported titles table and restores column types.
pub fn load_augmented_titles(path: &Path) -> Result<DataFrame> {
    let df = conform(Dataset::TitleBasics, tabular::read_csv_gz(path)?)?;
    let mut ratings = vec![col(AVERAGE_RATING).cast(DataType::Float64)];
    ratings.extend(
        mean_rating_columns(&df)
            .iter()
            .map(|c| col(c.as_str()).cast(DataType::Float64)),
    );
    Ok(df.lazy().with_columns(ratings).collect()?)
}

/// First entry of a comma separated genre list, trimmed.
pub fn primary_genre(genres: Option<&str>) -> Option<&str> {
    let genres = genres?;
    let first = genres.split_once(',').map_or(genres, |(first, _)| first).trim();
    (!first.is_empty()).then_some(first)
}

pub fn with_primary_genre(df: &DataFrame) -> Result<DataFrame> {
    let genres: Vec<Option<&str>> = df
        .column(GENRES)?
        .str()?
        .into_iter()
        .map(primary_genre)
        .collect();
    let mut out = df.clone();
    out.with_column(Series::new(PRIMARY_GENRE.into(), genres))?;
    Ok(out)
}

/// Columns that must all be non-null for a row to be kept.
pub fn required_columns(df: &DataFrame) -> Vec<String> {
    let mut required = vec![PRIMARY_GENRE.to_string(), AVERAGE_RATING.to_string()];
    required.extend(mean_rating_columns(df));
    required
}

pub fn complete_rows(df: &DataFrame) -> Result<DataFrame> {
    let predicate = required_columns(df)
        .iter()
        .map(|c| col(c.as_str()).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or(lit(true));
    Ok(df.clone().lazy().filter(predicate).collect()?)
}

fn year_sort_key(ordering: YearOrdering) -> Expr {
    let year = col(START_YEAR);
    match ordering {
        YearOrdering::Lexicographic => year.cast(DataType::String),
        YearOrdering::Numeric => year.cast(DataType::Int64),
    }
    .alias(YEAR_SORT_KEY)
}

/// Genre-balanced, time-spread subsample.
///
/// `target` is split evenly over the distinct primary genres. Each genre's
/// rows are ordered by `startYear` and every k-th row is taken, with
/// `k = rows / per_genre`. A genre with fewer rows than `per_genre` has
/// `k == 0` and contributes nothing.
pub fn balanced_sample(df: &DataFrame, target: usize, ordering: YearOrdering) -> Result<DataFrame> {
    let genres: BTreeSet<&str> = df.column(PRIMARY_GENRE)?.str()?.into_iter().flatten().collect();
    let mut sample = df.clear();
    if genres.is_empty() {
        return Ok(sample);
    }
    let per_genre = target / genres.len();
    if per_genre == 0 {
        return Ok(sample);
    }

    for genre in genres {
        let stratum = df
            .clone()
            .lazy()
            .filter(col(PRIMARY_GENRE).eq(lit(genre)))
            .with_column(year_sort_key(ordering))
            .sort(
                [YEAR_SORT_KEY],
                SortMultipleOptions::default()
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )
            .collect()?
            .drop(YEAR_SORT_KEY)?;

        let stride = stratum.height() / per_genre;
        if stride == 0 {
            debug!(genre, rows = stratum.height(), per_genre, "too few rows, genre skipped");
            continue;
        }
        let picks: Vec<IdxSize> = (0..stratum.height())
            .step_by(stride)
            .map(|i| i as IdxSize)
            .collect();
        let picked = stratum.take(&IdxCa::from_vec("idx".into(), picks))?;
        debug!(genre, stride, rows = picked.height(), "sampled");
        sample.vstack_mut(&picked)?;
    }

    Ok(sample)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    /// `non_null / rows`; 0 for an empty table.
    pub completeness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

pub fn summarize(df: &DataFrame) -> Summary {
    let rows = df.height();
    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            let non_null = c.len() - c.null_count();
            ColumnSummary {
                name: c.name().to_string(),
                non_null,
                completeness: if rows == 0 { 0.0 } else { non_null as f64 / rows as f64 },
            }
        })
        .collect();
    Summary { rows, columns }
}

/// Rows per primary genre, sorted by genre.
pub fn genre_counts(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let counts: HashMap<&str, usize> = df
        .column(PRIMARY_GENRE)?
        .str()?
        .into_iter()
        .flatten()
        .fold(HashMap::new(), |mut acc, genre| {
            *acc.entry(genre).or_insert(0) += 1;
            acc
        });
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(genre, n)| (genre.to_string(), n))
        .collect();
    counts.sort();
    Ok(counts)
}

pub fn is_measure(name: &str) -> bool {
    MEASURE_COLUMNS.contains(&name) || name.starts_with(MEAN_RATING_PREFIX)
}

/// Allow-listed measure columns only, cast to `Float64`.
pub fn numeric_projection(df: &DataFrame) -> Result<DataFrame> {
    let measures: Vec<Expr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| is_measure(name.as_str()))
        .map(|name| col(name.as_str()).cast(DataType::Float64))
        .collect();
    Ok(df.clone().lazy().select(measures).collect()?)
}

#[derive(Debug, Clone)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

pub fn numeric_columns(projection: &DataFrame) -> Result<Vec<NumericColumn>> {
    projection
        .get_columns()
        .iter()
        .map(|c| -> Result<NumericColumn> {
            let values = c.cast(&DataType::Float64)?;
            Ok(NumericColumn {
                name: c.name().to_string(),
                values: values.f64()?.into_iter().collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where fewer than two paired values exist or a
    /// side has zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pearson correlation over the rows where both values are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

pub fn correlation(columns: &[NumericColumn]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(&a.values, &b.values)).collect())
        .collect();
    CorrelationMatrix {
        columns: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

pub struct Exploration {
    pub summary: Summary,
    pub genres: Vec<String>,
    pub complete: usize,
    pub sample: DataFrame,
    pub sample_genres: Vec<(String, usize)>,
    pub measures: Vec<NumericColumn>,
    pub correlation: CorrelationMatrix,
}

/// Runs every exploration step over an augmented titles table.
pub fn explore(titles: &DataFrame, config: &Config) -> Result<Exploration> {
    let summary = summarize(titles);
    info!(rows = summary.rows, columns = summary.columns.len(), "titles loaded");

    let titles = with_primary_genre(titles)?;
    let genres: Vec<String> = genre_counts(&titles)?.into_iter().map(|(g, _)| g).collect();
    info!(genres = ?genres, "primary genres");

    let complete = complete_rows(&titles)?;
    info!(rows = complete.height(), "complete rows");

    let sample = balanced_sample(&complete, config.sample_target, config.year_ordering)?;
    let sample_genres = genre_counts(&sample)?;
    info!(rows = sample.height(), genres = sample_genres.len(), "balanced sample drawn");

    let measures = numeric_columns(&numeric_projection(&sample)?)?;
    let correlation = correlation(&measures);

    Ok(Exploration {
        summary,
        genres,
        complete: complete.height(),
        sample,
        sample_genres,
        measures,
        correlation,
    })
}
