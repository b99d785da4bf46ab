use std::path::PathBuf;

/// Order used when spreading a genre's sample across `startYear`.
///
/// `Lexicographic` compares the year as text, which matches numeric order
/// only while every year has the same number of digits. `Numeric` sorts
/// by the parsed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearOrdering {
    #[default]
    Lexicographic,
    Numeric,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub remote_base_url: String,
    pub remote_extension: String,
    pub titles_export: PathBuf,
    pub names_export: PathBuf,
    pub plots_dir: PathBuf,
    /// Total rows wanted from the genre-balanced sample.
    pub sample_target: usize,
    pub year_ordering: YearOrdering,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_dir: PathBuf::from(".data"),
            remote_base_url: "https://datasets.imdbws.com".to_string(),
            remote_extension: "tsv.gz".to_string(),
            titles_export: PathBuf::from("title.augmented.csv.gz"),
            names_export: PathBuf::from("name.augmented.csv.gz"),
            plots_dir: PathBuf::from("plots"),
            sample_target: 1000,
            year_ordering: YearOrdering::Lexicographic,
        }
    }
}

impl Config {
    pub fn pair_plot_path(&self) -> PathBuf {
        self.plots_dir.join("pairplot.png")
    }

    pub fn correlation_plot_path(&self) -> PathBuf {
        self.plots_dir.join("correlation.png")
    }
}
