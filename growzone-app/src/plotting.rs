//! This module is responsible for generating all visualizations from simulation log data.

use anyhow::Result;
use growzone_core::analysis::read_log;
use growzone_core::logger::LogEntry;
use growzone_schemas::event::{EventLevel, SimulationEvent};
use plotters::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

const COLORS: [RGBColor; 6] = [RED, GREEN, BLUE, MAGENTA, CYAN, BLACK];

/// Rows of one zone, in tick order.
struct ZoneSeries {
    zone_id: String,
    rows: Vec<LogEntry>,
}

/// The main function to generate and save all plots for a simulation run.
pub fn generate_all_plots(output_dir: &str, log_path: &str) -> Result<()> {
    info!("generating charts from simulation log");

    let zones = group_by_zone(read_log(log_path)?);
    if zones.is_empty() {
        warn!("no data to plot");
        return Ok(());
    }

    plot_temperature(output_dir, &zones)?;
    plot_humidity_and_vpd(output_dir, &zones)?;
    plot_biomass_growth(output_dir, &zones)?;
    plot_health(output_dir, &zones)?;
    plot_event_timeline(output_dir, &zones)?;

    info!(output_dir, "charts saved");
    Ok(())
}

fn group_by_zone(entries: Vec<LogEntry>) -> Vec<ZoneSeries> {
    let mut grouped: BTreeMap<String, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.zone_id.clone()).or_default().push(entry);
    }
    grouped
        .into_iter()
        .map(|(zone_id, mut rows)| {
            rows.sort_by_key(|r| r.tick);
            ZoneSeries { zone_id, rows }
        })
        .collect()
}

fn max_tick(zones: &[ZoneSeries]) -> u64 {
    zones
        .iter()
        .filter_map(|z| z.rows.last().map(|r| r.tick))
        .max()
        .unwrap_or(1)
        .max(1)
}

fn value_range(zones: &[ZoneSeries], value: impl Fn(&LogEntry) -> f64) -> (f64, f64) {
    let (min, max) = zones
        .iter()
        .flat_map(|z| z.rows.iter().map(&value))
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        (0.0, 1.0)
    } else if (max - min).abs() < 1e-9 {
        (min - 1.0, max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

/// Draws one line per zone of `value` over time.
fn plot_zone_lines(
    path: &str,
    caption: &str,
    y_desc: &str,
    zones: &[ZoneSeries],
    value: impl Fn(&LogEntry) -> f64,
) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = value_range(zones, &value);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 50).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0u64..max_tick(zones), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Tick")
        .y_desc(y_desc)
        .draw()?;

    for (i, zone) in zones.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                zone.rows.iter().map(|r| (r.tick, value(r))),
                color.stroke_width(2),
            ))?
            .label(zone.zone_id.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn plot_temperature(output_dir: &str, zones: &[ZoneSeries]) -> Result<()> {
    plot_zone_lines(
        &format!("{}/1_temperature.png", output_dir),
        "Air Temperature",
        "Temperature (°C)",
        zones,
        |r| r.temperature_c,
    )
}

/// Relative humidity and VPD share one chart per zone, on a common 0..max scale.
fn plot_humidity_and_vpd(output_dir: &str, zones: &[ZoneSeries]) -> Result<()> {
    let path = format!("{}/2_humidity_vpd.png", output_dir);
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = zones
        .iter()
        .flat_map(|z| z.rows.iter().map(|r| r.vpd_kpa.max(r.relative_humidity)))
        .fold(1.0, f64::max);
    let mut chart = ChartBuilder::on(&root)
        .caption("Humidity and Vapour-Pressure Deficit", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0u64..max_tick(zones), 0f64..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Tick")
        .y_desc("RH (fraction) / VPD (kPa)")
        .draw()?;

    for (i, zone) in zones.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                zone.rows.iter().map(|r| (r.tick, r.relative_humidity)),
                color.stroke_width(2),
            ))?
            .label(format!("{} RH", zone.zone_id))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
        chart
            .draw_series(DashedLineSeries::new(
                zone.rows.iter().map(|r| (r.tick, r.vpd_kpa)),
                5,
                5,
                color.into(),
            ))?
            .label(format!("{} VPD", zone.zone_id))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn plot_biomass_growth(output_dir: &str, zones: &[ZoneSeries]) -> Result<()> {
    plot_zone_lines(
        &format!("{}/3_biomass_growth.png", output_dir),
        "Dry Biomass Over Time",
        "Biomass (g)",
        zones,
        |r| r.total_biomass_g,
    )
}

fn plot_health(output_dir: &str, zones: &[ZoneSeries]) -> Result<()> {
    plot_zone_lines(
        &format!("{}/4_mean_health.png", output_dir),
        "Mean Plant Health",
        "Health",
        zones,
        |r| r.mean_health,
    )
}

/// Histogram of warning and error events per tick, all zones combined.
fn plot_event_timeline(output_dir: &str, zones: &[ZoneSeries]) -> Result<()> {
    let path = format!("{}/5_event_timeline.png", output_dir);
    let root = BitMapBackend::new(&path, (1024, 256)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut alerts: BTreeMap<u64, u32> = BTreeMap::new();
    for row in zones.iter().flat_map(|z| z.rows.iter()) {
        let events: Vec<SimulationEvent> = serde_json::from_str(&row.events_json)?;
        let count = events
            .iter()
            .filter(|e| matches!(e.level, EventLevel::Warning | EventLevel::Error))
            .count() as u32;
        if count > 0 {
            *alerts.entry(row.tick).or_insert(0) += count;
        }
    }
    let y_max = alerts.values().copied().max().unwrap_or(1).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Warnings and Errors", ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0u64..max_tick(zones), 0u32..y_max + 1)?;

    chart.configure_mesh().x_desc("Tick").draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(RED.filled())
            .data(alerts.iter().map(|(tick, count)| (*tick, *count))),
    )?;

    root.present()?;
    Ok(())
}
