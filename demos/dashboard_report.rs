//! Example: Dashboard Report
//!
//! Loads an insurance CSV, builds the metrics pipeline and prints every
//! chart data product the dashboard renders. Pass `--json` to dump the
//! whole snapshot as JSON instead.
//!
//! Run with: `cargo run --example dashboard_report -- insurance_demo.csv`

use dashmetrics::{ColorSeries, CsvDatasetSource, DashboardPipeline, PipelineConfig};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json_mode = args.iter().any(|arg| arg == "--json");
    let path = args
        .iter()
        .find(|arg| *arg != "--json")
        .cloned()
        .unwrap_or_else(|| "insurance_demo.csv".to_string());

    // Keep stdout clean for the JSON dump
    if !json_mode {
        tracing_subscriber::fmt()
            .with_target(false)
            .compact()
            .init();
    }

    // Step 1: Build the pipeline (load, encode, correlate)
    if !json_mode {
        println!("=== Insurance Dashboard Report ===\n");
        println!("Step 1: Building pipeline from {}...", path);
    }
    let start = Instant::now();
    let source = CsvDatasetSource::new(&path);
    let pipeline = DashboardPipeline::from_source(PipelineConfig::default(), &source)?;
    let snapshot = pipeline.refresh()?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    println!("  ✓ Pipeline ready in {:?}\n", start.elapsed());

    // Step 2: Dataset summary
    println!("Step 2: Dataset summary");
    println!("  Rows:      {}", snapshot.summary.rows);
    println!("  Columns:   {}", snapshot.summary.columns.join(", "));
    println!("  Loaded at: {}\n", snapshot.summary.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));

    // Step 3: Categorical encodings
    println!("Step 3: Categorical encodings");
    for name in snapshot.encodings.column_names() {
        if let Some(encoding) = snapshot.encodings.column(name) {
            let pairs: Vec<String> = encoding
                .labels()
                .iter()
                .enumerate()
                .map(|(code, label)| format!("{}={}", label, code))
                .collect();
            println!("  {:<8} {}", name, pairs.join(", "));
        }
    }
    println!();

    // Step 4: Correlation heatmap
    println!("Step 4: Spearman correlation heatmap");
    print!("  {:<10}", "");
    for label in &snapshot.heatmap.x_labels {
        print!("{:>9}", truncate(label, 8));
    }
    println!();
    for (label, row) in snapshot.heatmap.y_labels.iter().zip(snapshot.heatmap.values.iter()) {
        print!("  {:<10}", truncate(label, 10));
        for value in row {
            print!("{:>9.3}", value);
        }
        println!();
    }
    println!();

    // Step 5: Scatter plots
    println!("Step 5: Scatter plots ({} x {})", snapshot.scatter_continuous.x_column, snapshot.scatter_continuous.y_column);
    let x_min = snapshot.scatter_continuous.x.iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = snapshot.scatter_continuous.x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_min = snapshot.scatter_continuous.y.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = snapshot.scatter_continuous.y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    println!("  {} points", snapshot.scatter_continuous.len());
    println!("  x range: {:.2} .. {:.2}", x_min, x_max);
    println!("  y range: {:.2} .. {:.2}", y_min, y_max);
    println!(
        "  colored by {} (continuous) and {} (groups)\n",
        snapshot.scatter_continuous.color_column, snapshot.scatter_grouped.color_column
    );

    // Step 6: Histogram
    println!(
        "Step 6: Histogram of {} (sum of {}, grouped by {})",
        snapshot.histogram.x_column, snapshot.histogram.y_column, snapshot.histogram.group_column
    );
    print!("  {:<22}", "Bin");
    for series in &snapshot.histogram.series {
        print!("{:>14}", series.group);
    }
    println!();
    println!("  {:-<22}{:-<width$}", "", "", width = snapshot.histogram.series.len() * 14);
    for bin in 0..snapshot.histogram.bin_count() {
        let low = snapshot.histogram.bin_edges[bin];
        let high = snapshot.histogram.bin_edges[bin + 1];
        print!("  {:<22}", format!("[{:.1}, {:.1})", low, high));
        for series in &snapshot.histogram.series {
            print!("{:>14.2}", series.sums[bin]);
        }
        println!();
    }
    println!();

    // Step 7: Bar chart
    println!(
        "Step 7: Mean {} by {}",
        snapshot.bar.value_column, snapshot.bar.label_column
    );
    println!("  {:<12} {:>12}", "Group", "Mean");
    println!("  {:-<25}", "");
    for (label, value) in snapshot.bar.labels.iter().zip(snapshot.bar.values.iter()) {
        println!("  {:<12} {:>12.2}", label, value);
    }

    // Summary
    println!("\n=== Summary ===");
    let labels = &snapshot.heatmap.x_labels;
    let mut strongest = (0, 1, 0.0f64);
    for i in 0..labels.len() {
        for j in (i + 1)..labels.len() {
            let value = snapshot.heatmap.values[i][j];
            if value.abs() > strongest.2.abs() {
                strongest = (i, j, value);
            }
        }
    }
    println!(
        "Strongest correlation: {} / {} at {:+.3}",
        labels[strongest.0], labels[strongest.1], strongest.2
    );

    if let Some((label, value)) = snapshot
        .bar
        .labels
        .iter()
        .zip(snapshot.bar.values.iter())
        .max_by(|a, b| a.1.total_cmp(b.1))
    {
        println!("Highest mean {}: {} at {:.2}", snapshot.bar.value_column, label, value);
    }

    if let ColorSeries::Label(groups) = &snapshot.scatter_grouped.color {
        let smokers = groups.iter().filter(|label| label.as_str() == "yes").count();
        if smokers > 0 {
            println!(
                "Rows in group 'yes' of {}: {} of {}",
                snapshot.scatter_grouped.color_column,
                smokers,
                groups.len()
            );
        }
    }

    println!("\n✅ Dashboard report completed successfully!");

    Ok(())
}

fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
