#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::indexing_slicing)]

//! Fills swiss tables of a fixed size to increasing load factors and charts
//! how far lookups have to probe under each probing policy.

use std::collections::hash_map::RandomState;

use log::info;
use plotters::prelude::*;
use rand::Rng;
use swisstable::{
    FlatHashMap, LinearProbe, ProbePolicy, ProbeStats, TableConfig, TriangularProbe,
};

// Large enough for many groups, small enough to run in seconds.
const TABLE_SIZE: usize = 1 << 16;
const NUM_LOAD_FACTORS: usize = 10;
const MIN_LOAD: f64 = 0.1;
const MAX_LOAD: f64 = 0.85;

const METHODS: [&str; 2] = ["Linear Probing", "Triangular Probing"];

/// Inserts `keys` into a table that will not grow and measures its probe lengths.
fn measure<P: ProbePolicy>(keys: &[u64]) -> Result<ProbeStats, swisstable::Error> {
    let config =
        TableConfig::default().with_initial_capacity(TABLE_SIZE).with_max_load_percent(90);
    let mut map: FlatHashMap<u64, u64, RandomState, P> =
        FlatHashMap::with_config(config, RandomState::new())?;
    for &key in keys {
        map.insert(key, key);
    }
    Ok(map.probe_stats())
}

fn draw_chart(
    path: &str,
    caption: &str,
    y_desc: &str,
    load_factors: &[f64],
    series: &[Vec<f64>],
) -> Result<(), Box<dyn std::error::Error>> {
    let font_family = "sans-serif";
    let colors = [RGBColor(220, 50, 50), RGBColor(50, 90, 220)];

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = series.iter().flatten().fold(1.0_f64, |max, &value| max.max(value)) * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, (font_family, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..(MAX_LOAD + 0.05), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Load Factor")
        .y_desc(y_desc)
        .axis_desc_style((font_family, 16))
        .draw()?;

    for (method_idx, (&method, values)) in METHODS.iter().zip(series).enumerate() {
        let color = &colors[method_idx % colors.len()];
        let line_style = ShapeStyle::from(color).stroke_width(2);

        chart
            .draw_series(LineSeries::new(
                load_factors.iter().copied().zip(values.iter().copied()),
                line_style,
            ))?
            .label(method)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            load_factors
                .iter()
                .zip(values)
                .map(|(&x, &y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| MIN_LOAD + (MAX_LOAD - MIN_LOAD) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();
    let num_keys: Vec<usize> =
        load_factors.iter().map(|&load| (TABLE_SIZE as f64 * load) as usize).collect();

    info!("load factors: {load_factors:?}");
    info!("number of keys: {num_keys:?}");

    let mut rng = rand::rng();
    let max_keys_needed = num_keys.iter().copied().max().unwrap_or(0);
    let keys: Vec<u64> = (0..max_keys_needed).map(|_| rng.random()).collect();

    let mut average_probes: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];
    let mut worst_probes: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];

    for &n_keys in &num_keys {
        let sample = keys.get(..n_keys).unwrap_or(keys.as_slice());
        let results = [measure::<LinearProbe>(sample)?, measure::<TriangularProbe>(sample)?];

        for (method_idx, stats) in results.iter().enumerate() {
            info!(
                "{}: {} keys, load {:.2}, avg probes = {:.3}, worst = {}",
                METHODS[method_idx],
                stats.len,
                stats.load_factor,
                stats.average_probe_length,
                stats.max_probe_length
            );
            average_probes[method_idx].push(stats.average_probe_length);
            worst_probes[method_idx].push(stats.max_probe_length as f64);
        }
    }

    draw_chart(
        "average_probe_length.png",
        "Average Groups Probed per Lookup",
        "Average Probe Length (groups)",
        &load_factors,
        &average_probes,
    )?;
    draw_chart(
        "worst_probe_length.png",
        "Worst-Case Groups Probed per Lookup",
        "Worst-Case Probe Length (groups)",
        &load_factors,
        &worst_probes,
    )?;

    info!("wrote average_probe_length.png and worst_probe_length.png");
    Ok(())
}
