//! PNG renderings of the exploration results.

use crate::error::{Error, Result};
use crate::explore::{CorrelationMatrix, NumericColumn};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Pixel side of one pair-plot cell.
const CELL: u32 = 240;
const HISTOGRAM_BINS: usize = 20;

fn plot_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Plot(err.to_string())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Value range of the present values, widened when degenerate.
fn extent<'a>(values: impl Iterator<Item = &'a f64>) -> Option<Range<f64>> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    });
    if lo > hi {
        return None;
    }
    if lo == hi {
        return Some(lo - 0.5..hi + 0.5);
    }
    Some(lo..hi)
}

fn histogram<DB: DrawingBackend>(area: &DrawingArea<DB, plotters::coord::Shift>, column: &NumericColumn) -> Result<()> {
    let present: Vec<f64> = column.values.iter().flatten().copied().collect();
    let Some(range) = extent(present.iter()) else {
        return Ok(());
    };
    let width = (range.end - range.start) / HISTOGRAM_BINS as f64;
    let mut counts = [0usize; HISTOGRAM_BINS];
    for v in &present {
        let bin = (((v - range.start) / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }
    let tallest = counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(&column.name, ("sans-serif", 14))
        .margin(6)
        .x_label_area_size(20)
        .y_label_area_size(30)
        .build_cartesian_2d(range.clone(), 0.0..tallest)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(4)
        .y_labels(4)
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, n)| {
            let x0 = range.start + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, *n as f64)], BLUE.mix(0.5).filled())
        }))
        .map_err(plot_err)?;
    Ok(())
}

fn scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    x: &NumericColumn,
    y: &NumericColumn,
) -> Result<()> {
    let points: Vec<(f64, f64)> = x
        .values
        .iter()
        .zip(&y.values)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    let (Some(xs), Some(ys)) = (
        extent(points.iter().map(|p| &p.0)),
        extent(points.iter().map(|p| &p.1)),
    ) else {
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} / {}", y.name, x.name), ("sans-serif", 12))
        .margin(6)
        .x_label_area_size(20)
        .y_label_area_size(30)
        .build_cartesian_2d(xs, ys)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(4)
        .y_labels(4)
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|p| Circle::new(*p, 2, BLUE.mix(0.4).filled())),
        )
        .map_err(plot_err)?;
    Ok(())
}

/// Grid of pairwise distributions: histograms on the diagonal, scatter
/// plots elsewhere.
pub fn pair_plot(columns: &[NumericColumn], path: &Path) -> Result<()> {
    create_parent(path)?;
    let n = columns.len().max(1);
    let side = CELL * n as u32;
    let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    for (i, cell) in root.split_evenly((n, n)).iter().enumerate() {
        let (row, col) = (i / n, i % n);
        let (Some(y), Some(x)) = (columns.get(row), columns.get(col)) else {
            continue;
        };
        if row == col {
            histogram(cell, x)?;
        } else {
            scatter(cell, x, y)?;
        }
    }
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Diverging blue-white-red scale over [-1, 1].
fn coolwarm(r: f64) -> RGBColor {
    let blend = |from: (f64, f64, f64), to: (f64, f64, f64), t: f64| {
        RGBColor(
            (from.0 + (to.0 - from.0) * t) as u8,
            (from.1 + (to.1 - from.1) * t) as u8,
            (from.2 + (to.2 - from.2) * t) as u8,
        )
    };
    let cold = (59.0, 76.0, 192.0);
    let neutral = (221.0, 221.0, 221.0);
    let warm = (180.0, 4.0, 38.0);
    let r = r.clamp(-1.0, 1.0);
    if r < 0.0 {
        blend(neutral, cold, -r)
    } else {
        blend(neutral, warm, r)
    }
}

pub fn correlation_heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    create_parent(path)?;
    let n = matrix.columns.len() as i32;
    let label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => matrix
            .columns
            .get(*i as usize)
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    let root = BitMapBackend::new(path, (1000, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    if n == 0 {
        root.present().map_err(plot_err)?;
        return Ok(());
    }
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Matrix of Average Ratings Columns", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(160)
        .y_label_area_size(200)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&label)
        .y_label_formatter(&label)
        .draw()
        .map_err(plot_err)?;

    let cells = matrix.values.iter().enumerate().flat_map(|(row, values)| {
        values
            .iter()
            .enumerate()
            .map(move |(col, r)| (row as i32, col as i32, *r))
    });
    for (row, col, r) in cells {
        let fill = r.map(coolwarm).unwrap_or(RGBColor(240, 240, 240));
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(col), SegmentValue::Exact(row)),
                    (SegmentValue::Exact(col + 1), SegmentValue::Exact(row + 1)),
                ],
                fill.filled(),
            )))
            .map_err(plot_err)?;
        if let Some(r) = r {
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{r:.2}"),
                    (SegmentValue::CenterOf(col), SegmentValue::CenterOf(row)),
                    ("sans-serif", 14).into_font().color(&BLACK),
                )))
                .map_err(plot_err)?;
        }
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod test_plots {
    use super::*;
    use crate::explore::correlation;

    #[test]
    fn test_plots_written_into_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let plots = dir.path().join("plots");
        let columns = vec![
            NumericColumn {
                name: "averageRating".into(),
                values: vec![Some(7.0), Some(6.5), None, Some(8.0)],
            },
            NumericColumn {
                name: "mean_rating_actor".into(),
                values: vec![Some(6.8), Some(6.0), Some(5.5), Some(7.9)],
            },
        ];

        pair_plot(&columns, &plots.join("pairplot.png"))?;
        correlation_heatmap(&correlation(&columns), &plots.join("correlation.png"))?;

        assert!(plots.join("pairplot.png").is_file());
        assert!(plots.join("correlation.png").is_file());
        Ok(())
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent([1.0, 3.0, 2.0].iter()), Some(1.0..3.0));
        assert_eq!(extent([2.0].iter()), Some(1.5..2.5));
        assert_eq!(extent(std::iter::empty()), None);
    }

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
    }
}
