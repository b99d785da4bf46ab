use crate::error::{Error, Result};
use crate::source::{DatasetSource, Remote};
use polars::prelude::*;
use tracing::info;

pub const NCONST: &str = "nconst";
pub const TCONST: &str = "tconst";
pub const CATEGORY: &str = "category";
pub const AVERAGE_RATING: &str = "averageRating";
pub const GENRES: &str = "genres";
pub const START_YEAR: &str = "startYear";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    NameBasics,
    TitleBasics,
    TitlePrincipals,
    TitleRatings,
}

impl Dataset {
    /// File stem used both for the cache copy and the remote resource.
    pub fn name(self) -> &'static str {
        match self {
            Dataset::NameBasics => "name.basics",
            Dataset::TitleBasics => "title.basics",
            Dataset::TitlePrincipals => "title.principals",
            Dataset::TitleRatings => "title.ratings",
        }
    }

    pub fn schema(self) -> &'static [Field] {
        match self {
            Dataset::NameBasics => NAME_BASICS,
            Dataset::TitleBasics => TITLE_BASICS,
            Dataset::TitlePrincipals => TITLE_PRINCIPALS,
            Dataset::TitleRatings => TITLE_RATINGS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Integer,
    Real,
}

impl Kind {
    fn dtype(self) -> DataType {
        match self {
            Kind::Text => DataType::String,
            Kind::Integer => DataType::Int64,
            Kind::Real => DataType::Float64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    /// Required fields must be present; optional ones are typed when found.
    pub required: bool,
}

const fn field(name: &'static str, kind: Kind, required: bool) -> Field {
    Field {
        name,
        kind,
        required,
    }
}

// name.basics
//     nconst             text NOT NULL PRIMARY KEY
//     primaryName        text
//     birthYear          integer
//     deathYear          integer
//     primaryProfession  text (comma separated)
//     knownForTitles     text (comma separated tconst)

const NAME_BASICS: &[Field] = &[
    field(NCONST, Kind::Text, true),
    field("primaryName", Kind::Text, false),
    field("birthYear", Kind::Integer, false),
    field("deathYear", Kind::Integer, false),
    field("primaryProfession", Kind::Text, false),
    field("knownForTitles", Kind::Text, false),
];

// title.basics
//     tconst          text NOT NULL PRIMARY KEY
//     titleType       text
//     primaryTitle    text
//     originalTitle   text
//     isAdult         integer (0/1)
//     startYear       integer
//     endYear         integer
//     runtimeMinutes  integer
//     genres          text (comma separated, up to three)

const TITLE_BASICS: &[Field] = &[
    field(TCONST, Kind::Text, true),
    field("titleType", Kind::Text, false),
    field("primaryTitle", Kind::Text, false),
    field("originalTitle", Kind::Text, false),
    field("isAdult", Kind::Integer, false),
    field(START_YEAR, Kind::Integer, false),
    field("endYear", Kind::Integer, false),
    field("runtimeMinutes", Kind::Integer, false),
    field(GENRES, Kind::Text, false),
];

// title.principals
//     tconst      text NOT NULL
//     ordering    integer
//     nconst      text NOT NULL
//     category    text
//     job         text
//     characters  text

const TITLE_PRINCIPALS: &[Field] = &[
    field(TCONST, Kind::Text, true),
    field("ordering", Kind::Integer, false),
    field(NCONST, Kind::Text, true),
    field(CATEGORY, Kind::Text, true),
    field("job", Kind::Text, false),
    field("characters", Kind::Text, false),
];

// title.ratings
//     tconst         text NOT NULL PRIMARY KEY
//     averageRating  real
//     numVotes       integer

const TITLE_RATINGS: &[Field] = &[
    field(TCONST, Kind::Text, true),
    field(AVERAGE_RATING, Kind::Real, true),
    field("numVotes", Kind::Integer, false),
];

/// Checks that `df` carries every required column of `dataset` and casts
/// the known columns to their declared types. Cells that do not parse
/// become null. Unknown columns pass through untouched.
pub fn conform(dataset: Dataset, df: DataFrame) -> Result<DataFrame> {
    let mut casts = Vec::new();
    for field in dataset.schema() {
        if df.get_column_index(field.name).is_none() {
            if field.required {
                return Err(Error::Schema {
                    table: dataset.name().to_string(),
                    column: field.name.to_string(),
                });
            }
            continue;
        }
        casts.push(col(field.name).cast(field.kind.dtype()));
    }
    Ok(df.lazy().with_columns(casts).collect()?)
}

pub struct ImdbData {
    pub names: DataFrame,
    pub titles: DataFrame,
    pub principals: DataFrame,
    pub ratings: DataFrame,
}

impl ImdbData {
    pub fn load<R: Remote>(source: &DatasetSource<R>) -> Result<Self> {
        let load = |dataset: Dataset| -> Result<DataFrame> {
            let df = conform(dataset, source.fetch(dataset.name())?)?;
            info!(dataset = dataset.name(), rows = df.height(), "loaded");
            Ok(df)
        };

        Ok(ImdbData {
            names: load(Dataset::NameBasics)?,
            titles: load(Dataset::TitleBasics)?,
            principals: load(Dataset::TitlePrincipals)?,
            ratings: load(Dataset::TitleRatings)?,
        })
    }
}

#[cfg(test)]
mod test_data {
    use super::*;

    #[test]
    fn test_conform_types_known_columns() -> Result<()> {
        let raw = df!(
            TCONST => ["tt0000001", "tt0000002"],
            AVERAGE_RATING => [Some("5.7"), None],
            "numVotes" => ["2000", "oops"],
        )?;
        let typed = conform(Dataset::TitleRatings, raw)?;

        assert_eq!(typed.column(AVERAGE_RATING)?.dtype(), &DataType::Float64);
        assert_eq!(typed.column("numVotes")?.dtype(), &DataType::Int64);
        assert_eq!(typed.column(AVERAGE_RATING)?.f64()?.get(0), Some(5.7));
        assert_eq!(typed.column("numVotes")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_conform_rejects_missing_required_column() -> Result<()> {
        let raw = df!(TCONST => ["tt0000001"], NCONST => ["nm0000001"])?;
        let err = conform(Dataset::TitlePrincipals, raw).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema { ref table, ref column } if table == "title.principals" && column == CATEGORY
        ));
        Ok(())
    }

    #[test]
    fn test_conform_skips_absent_optional_columns() -> Result<()> {
        let raw = df!(NCONST => ["nm0000001"])?;
        let typed = conform(Dataset::NameBasics, raw)?;
        assert_eq!(typed.width(), 1);
        Ok(())
    }
}
