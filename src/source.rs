//! Dataset acquisition with a local cache.
//!
//! A dataset is read from `<cache_dir>/<name>.csv` when that copy exists and
//! parses. Otherwise the gzip TSV dump `<base_url>/<name>.<ext>` is fetched,
//! parsed and written to the cache before being returned. Failures on the
//! remote path are returned to the caller; nothing partial is cached.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::tabular;
use polars::prelude::DataFrame;
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Transport for the remote dumps.
pub trait Remote {
    /// Returns the full response body of a GET on `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self> {
        // The principals dump is several hundred megabytes, so no request timeout.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|source| Error::Http {
                url: String::new(),
                source,
            })?;
        Ok(HttpRemote { client })
    }
}

impl Remote for HttpRemote {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let http = |source| Error::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http)?;
        Ok(response.bytes().map_err(http)?.to_vec())
    }
}

pub struct DatasetSource<R: Remote = HttpRemote> {
    cache_dir: PathBuf,
    base_url: String,
    extension: String,
    remote: R,
}

impl DatasetSource<HttpRemote> {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(DatasetSource::with_remote(config, HttpRemote::new()?))
    }
}

impl<R: Remote> DatasetSource<R> {
    pub fn with_remote(config: &Config, remote: R) -> Self {
        DatasetSource {
            cache_dir: config.cache_dir.clone(),
            base_url: config.remote_base_url.trim_end_matches('/').to_string(),
            extension: config.remote_extension.clone(),
            remote,
        }
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.csv"))
    }

    pub fn remote_url(&self, name: &str) -> String {
        format!("{}/{}.{}", self.base_url, name, self.extension)
    }

    pub fn fetch(&self, name: &str) -> Result<DataFrame> {
        let path = self.cache_path(name);
        match tabular::read_indexed_csv(&path) {
            Ok(df) => {
                debug!(dataset = name, path = %path.display(), "cache hit");
                return Ok(df);
            }
            Err(err) => {
                info!(dataset = name, %err, "local copy not found, sourcing from the web");
            }
        }

        let url = self.remote_url(name);
        let start = Instant::now();
        let compressed = self.remote.get(&url)?;
        let df = tabular::read_imdb_tsv_gz(&compressed)?;
        info!(
            dataset = name,
            rows = df.height(),
            elapsed = ?start.elapsed(),
            "fetched"
        );

        tabular::write_indexed_csv(&df, &path)?;
        Ok(df)
    }
}

#[cfg(test)]
mod test_source {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::cell::{Cell, RefCell};
    use std::io::{self, Write};

    const RATINGS_TSV: &str = "tconst\taverageRating\tnumVotes\n\
                               tt0000001\t5.7\t2000\n\
                               tt0000002\t\\N\t10\n";

    struct FakeRemote {
        body: Vec<u8>,
        calls: Cell<usize>,
        urls: RefCell<Vec<String>>,
    }

    impl FakeRemote {
        fn serving(tsv: &str) -> Self {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(tsv.as_bytes()).unwrap();
            FakeRemote {
                body: encoder.finish().unwrap(),
                calls: Cell::new(0),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Remote for FakeRemote {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            self.urls.borrow_mut().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    struct DownRemote;

    impl Remote for DownRemote {
        fn get(&self, _url: &str) -> Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "down").into())
        }
    }

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            cache_dir: dir.join(".data"),
            remote_base_url: "https://datasets.example/".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_cache_miss_fetches_once_then_hits() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = DatasetSource::with_remote(&config_in(dir.path()), FakeRemote::serving(RATINGS_TSV));

        let first = source.fetch("title.ratings")?;
        assert_eq!(source.remote.calls.get(), 1);
        assert_eq!(
            source.remote.urls.borrow()[0],
            "https://datasets.example/title.ratings.tsv.gz"
        );
        assert!(source.cache_path("title.ratings").exists());

        let second = source.fetch("title.ratings")?;
        assert_eq!(source.remote.calls.get(), 1);
        assert_eq!(first.get_column_names(), second.get_column_names());
        assert_eq!(second.height(), 2);
        assert_eq!(second.column("averageRating")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_unreadable_cache_falls_back_to_remote() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = DatasetSource::with_remote(&config_in(dir.path()), FakeRemote::serving(RATINGS_TSV));
        let path = source.cache_path("title.ratings");
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(&path, b"")?;

        let df = source.fetch("title.ratings")?;
        assert_eq!(source.remote.calls.get(), 1);
        assert_eq!(df.height(), 2);

        let rewritten = tabular::read_indexed_csv(&path)?;
        assert_eq!(rewritten.height(), 2);
        assert_eq!(rewritten.get_column_names(), df.get_column_names());
        Ok(())
    }

    #[test]
    fn test_failed_cache_write_is_fatal_and_leaves_no_cache() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = DatasetSource::with_remote(&config_in(dir.path()), FakeRemote::serving(RATINGS_TSV));
        let path = source.cache_path("title.ratings");
        std::fs::create_dir_all(tabular::staging_path(&path))?;

        assert!(source.fetch("title.ratings").is_err());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_remote_failure_propagates_without_cache() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = DatasetSource::with_remote(&config_in(dir.path()), DownRemote);

        assert!(matches!(source.fetch("title.ratings"), Err(Error::Io(_))));
        assert!(!source.cache_path("title.ratings").exists());
        Ok(())
    }

    #[test]
    fn test_corrupt_download_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let remote = FakeRemote {
            body: b"not gzip".to_vec(),
            calls: Cell::new(0),
            urls: RefCell::new(Vec::new()),
        };
        let source = DatasetSource::with_remote(&config_in(dir.path()), remote);

        assert!(source.fetch("name.basics").is_err());
        assert!(!source.cache_path("name.basics").exists());
        Ok(())
    }
}
