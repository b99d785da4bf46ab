use principal_ratings::config::Config;
use principal_ratings::data::ImdbData;
use principal_ratings::source::DatasetSource;
use principal_ratings::*;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let config = Config::default();

    info!("sourcing data from IMDb");
    let source = DatasetSource::new(&config)?;
    let db = ImdbData::load(&source)?;

    let mut augmented = aggregate::augment(&db)?;
    drop(db);

    info!("exporting datasets");
    tabular::write_csv_gz(&mut augmented.titles, &config.titles_export)?;
    info!(path = %config.titles_export.display(), "exported");
    tabular::write_csv_gz(&mut augmented.names, &config.names_export)?;
    info!(path = %config.names_export.display(), "exported");
    Ok(())
}
