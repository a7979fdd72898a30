use crate::domain::series::PriceSeries;
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use plotters::prelude::*;
use std::ops::Range;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 450;

/// Renders the close prices as an inline SVG line chart.
pub fn render_price_chart(symbol: &str, series: &PriceSeries) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let (x_range, y_range) = bounds(series);

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{symbol} Stock Price"),
                ("sans-serif", 24.0).into_font(),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;

        // The date axis needs at least one key point; an empty frame just hides its text.
        let empty = series.is_empty();
        let x_labels = if empty { 1 } else { 8 };
        let date_label = |d: &DateTime<Utc>| {
            if empty {
                String::new()
            } else {
                d.format("%b %d").to_string()
            }
        };
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price (USD)")
            .x_labels(x_labels)
            .x_label_formatter(&date_label)
            .y_label_formatter(&|v: &f64| format!("{v:.2}"))
            .draw()
            .map_err(draw_err)?;

        if !series.is_empty() {
            chart
                .draw_series(LineSeries::new(
                    series.points().iter().map(|p| (midnight(p.date), p.close)),
                    &BLUE,
                ))
                .map_err(draw_err)?
                .label("Close Price")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

fn bounds(series: &PriceSeries) -> (Range<DateTime<Utc>>, Range<f64>) {
    let points = series.points();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        let origin = DateTime::<Utc>::UNIX_EPOCH;
        return (origin..origin + Duration::days(30), 0.0..1.0);
    };

    let mut x_min = midnight(first.date);
    let mut x_max = midnight(last.date);
    if x_min == x_max {
        x_min -= Duration::days(1);
        x_max += Duration::days(1);
    }

    let min = points.iter().map(|p| p.close).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|p| p.close)
        .fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;
    let padding = if spread > 0.0 {
        spread * 0.1
    } else {
        (max.abs() * 0.05).max(1.0)
    };

    (x_min..x_max, (min - padding).max(0.0)..max + padding)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn draw_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("failed to draw chart: {e:?}")
}
