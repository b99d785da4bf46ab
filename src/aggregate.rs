//! Rating aggregates joined back onto the name and title tables.
//!
//! Every join here is a left join against a right side that has already
//! been reduced to one row per key, so the left table never gains or
//! loses rows.

use crate::data::{AVERAGE_RATING, CATEGORY, ImdbData, NCONST, TCONST};
use crate::error::Result;
use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, warn};

/// Per-person mean before it is renamed onto the names table.
pub const MEAN_RATING: &str = "mean_rating";
/// A person's mean rating over every title they are a principal on.
pub const PRINCIPAL_MEAN_RATING: &str = "mean_rating_principal";
pub const MEAN_RATING_PREFIX: &str = "mean_rating_";

pub struct Augmented {
    pub names: DataFrame,
    pub titles: DataFrame,
}

pub fn augment(db: &ImdbData) -> Result<Augmented> {
    let start = Instant::now();

    info!("merging ratings into principals");
    let rated = principal_ratings(&db.principals, &db.ratings)?;

    info!("computing mean rating per name");
    let names = left_join(&db.names, &mean_rating_by_name(&rated)?, NCONST)?;

    info!("computing mean rating per name and category");
    let names = left_join(&names, &category_mean_matrix(&rated)?, NCONST)?
        .lazy()
        .rename([MEAN_RATING], [PRINCIPAL_MEAN_RATING], true)
        .collect()?;

    info!("merging ratings into titles");
    let titles = left_join(&db.titles, &db.ratings.select([TCONST, AVERAGE_RATING])?, TCONST)?;

    let rating_columns = mean_rating_columns(&names);
    info!(columns = rating_columns.len(), "merging principal mean ratings into titles");
    let per_title = title_mean_ratings(&db.principals, &names, &rating_columns)?;
    let titles = left_join(&titles, &per_title, TCONST)?;

    info!(
        names = names.height(),
        titles = titles.height(),
        elapsed = ?start.elapsed(),
        "aggregation complete"
    );
    Ok(Augmented { names, titles })
}

/// Principals (`tconst`, `nconst`, `category`) with the title's
/// `averageRating`; principals of unrated titles keep a null rating.
pub fn principal_ratings(principals: &DataFrame, ratings: &DataFrame) -> Result<DataFrame> {
    let rated = principals
        .clone()
        .lazy()
        .select([col(TCONST), col(NCONST), col(CATEGORY)])
        .join(
            ratings.clone().lazy().select([col(TCONST), col(AVERAGE_RATING)]),
            [col(TCONST)],
            [col(TCONST)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(rated)
}

/// One row per `nconst` with the mean rating of all linked titles. Null
/// ratings are skipped; a person with none gets null.
pub fn mean_rating_by_name(rated: &DataFrame) -> Result<DataFrame> {
    let means = rated
        .clone()
        .lazy()
        .group_by([col(NCONST)])
        .agg([col(AVERAGE_RATING).mean().alias(MEAN_RATING)])
        .collect()?;
    Ok(means)
}

/// Column holding the mean rating for `category`, or `None` when the
/// generated name would shadow a reserved column.
pub fn category_column(category: &str) -> Option<String> {
    if category.is_empty() || category == NCONST {
        return None;
    }
    let name = format!("{MEAN_RATING_PREFIX}{category}");
    (name != PRINCIPAL_MEAN_RATING).then_some(name)
}

/// Distinct non-null categories, sorted.
pub fn categories(rated: &DataFrame) -> Result<BTreeSet<String>> {
    Ok(rated
        .column(CATEGORY)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

/// Wide table: `nconst` plus one `mean_rating_<category>` column per
/// category observed in `rated`, in sorted category order.
pub fn category_mean_matrix(rated: &DataFrame) -> Result<DataFrame> {
    let mut pivoted = Vec::new();
    let mut renamed = vec![col(NCONST)];
    for category in categories(rated)? {
        match category_column(&category) {
            Some(column) => {
                renamed.push(col(category.as_str()).alias(column.as_str()));
                pivoted.push(category);
            }
            None => warn!(category = %category, "category collides with a reserved column, skipped"),
        }
    }
    if pivoted.is_empty() {
        let keys = rated.column(NCONST)?.unique()?;
        return Ok(DataFrame::new(vec![keys])?);
    }

    let kept = Series::new(CATEGORY.into(), &pivoted);
    let by_category = rated
        .clone()
        .lazy()
        .filter(col(CATEGORY).is_in(lit(kept).implode(), false))
        .group_by([col(NCONST), col(CATEGORY)])
        .agg([col(AVERAGE_RATING).mean().alias(MEAN_RATING)])
        .collect()?;

    // One row per (nconst, category) after the group-by, so no aggregation
    // is needed while pivoting.
    let wide = pivot_stable(
        &by_category,
        [CATEGORY],
        Some([NCONST]),
        Some([MEAN_RATING]),
        true,
        None,
        None,
    )?;
    Ok(wide.lazy().select(renamed).collect()?)
}

/// Every `mean_rating_*` column of the augmented names table, in table order.
pub fn mean_rating_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.starts_with(MEAN_RATING_PREFIX))
        .map(|name| name.to_string())
        .collect()
}

/// One row per `tconst` with, for each of `columns`, the mean of that
/// column over the title's principals.
pub fn title_mean_ratings(
    principals: &DataFrame,
    names: &DataFrame,
    columns: &[String],
) -> Result<DataFrame> {
    let mut right = vec![col(NCONST)];
    right.extend(columns.iter().map(|c| col(c.as_str())));
    let means: Vec<Expr> = columns.iter().map(|c| col(c.as_str()).mean()).collect();

    let per_title = principals
        .clone()
        .lazy()
        .select([col(TCONST), col(NCONST)])
        .join(
            names.clone().lazy().select(right),
            [col(NCONST)],
            [col(NCONST)],
            JoinArgs::new(JoinType::Left),
        )
        .group_by([col(TCONST)])
        .agg(means)
        .collect()?;
    Ok(per_title)
}

fn left_join(left: &DataFrame, right: &DataFrame, key: &str) -> Result<DataFrame> {
    let joined = left
        .clone()
        .lazy()
        .join(
            right.clone().lazy(),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(joined)
}
