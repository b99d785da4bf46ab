use principal_ratings::config::Config;
use principal_ratings::*;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let config = Config::default();

    let titles = explore::load_augmented_titles(&config.titles_export)?;
    let result = explore::explore(&titles, &config)?;

    for column in &result.summary.columns {
        info!(
            column = %column.name,
            count = column.non_null,
            completeness = column.completeness,
            "column"
        );
    }
    for (genre, count) in &result.sample_genres {
        info!(genre = %genre, count, "samples per primary genre");
    }

    plots::pair_plot(&result.measures, &config.pair_plot_path())?;
    plots::correlation_heatmap(&result.correlation, &config.correlation_plot_path())?;
    info!(dir = %config.plots_dir.display(), "plots written");
    Ok(())
}
