//! Sample report exercising every item kind.
//!
//! Run with: `cargo run --example sample_report`
//!
//! Writes a local report under `./report/Sample Report/<timestamp>/` and an
//! email build of the same report under `./report/email/Sample Report/<timestamp>/`.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use report_render::{
    DataTable, Email, EmailRenderer, FileInput, GraphMode, LocalRenderer, RenderOptions, Report,
    ReportError, ReportItem,
};

fn prices() -> Result<DataTable, ReportError> {
    let mut table = DataTable::new("date", ["aapl", "goog"]);
    let (mut aapl, mut goog) = (180.0_f64, 140.0_f64);
    for day in 1..=28 {
        aapl += ((day * 7 % 11) as f64 - 5.0) * 0.8;
        goog += ((day * 5 % 9) as f64 - 4.0) * 0.6;
        table.push_row(format!("2024-02-{day:02}"), [aapl, goog])?;
    }
    Ok(table)
}

fn returns(prices: &DataTable) -> Result<DataTable, ReportError> {
    let mut table = DataTable::new(prices.index_name(), prices.columns().iter().cloned());
    let rows: Vec<_> = prices.iter_rows().collect();
    for pair in rows.windows(2) {
        let (_, prev) = pair[0];
        let (label, next) = pair[1];
        let changes: Vec<f64> = prev
            .iter()
            .zip(next)
            .map(|(p, n)| match (p.as_f64(), n.as_f64()) {
                (Some(p), Some(n)) if p != 0.0 => n / p - 1.0,
                _ => 0.0,
            })
            .collect();
        table.push_row(label, changes)?;
    }
    Ok(table)
}

fn correlation() -> Result<DataTable, ReportError> {
    let mut table = DataTable::new("window", ["30d", "60d", "90d"]);
    table.push_row("2024-01-01", [0.42, 0.51, 0.48])?;
    table.push_row("2024-01-15", [0.38, 0.47, 0.50])?;
    table.push_row("2024-02-01", [0.55, 0.52, 0.49])?;
    Ok(table)
}

fn badge_png() -> Result<Vec<u8>, ReportError> {
    let img = RgbImage::from_fn(48, 48, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([50, 136, 189])
        } else {
            Rgb([254, 224, 139])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

fn build_report() -> Result<Report, ReportError> {
    let prices = prices()?;
    let returns = returns(&prices)?;

    let mut report = Report::new("Sample Report");
    report.add_label("Reports/My Sample Report");

    report.add_item(ReportItem::line_graph(
        "Sample Stock Item",
        "LOREM IPSUM DOLOR SIT AMET",
        prices.clone(),
    ));
    report.add_item(ReportItem::table("Stock Table", "LOREM IPSUM", prices.clone()));

    let lorem = "Lorem ipsum dolor sit amet,\nconsectetur adipiscing elit.\n";
    report.add_item(ReportItem::file(
        "Sample File",
        "Sample File Description Text",
        FileInput::named_stream(Cursor::new(lorem.as_bytes().to_vec()), "lorem.txt"),
        None,
    )?);
    let reversed: String = lorem
        .lines()
        .rev()
        .map(|line| line.chars().rev().collect::<String>() + "\n")
        .collect();
    report.add_item(ReportItem::file(
        "Reversed In_Memory File",
        "Testing in-memory file ops",
        FileInput::stream(Cursor::new(reversed.into_bytes())),
        Some(".txt"),
    )?);

    report.add_item(ReportItem::text("Some Freetext", "This is some freetext...\n".repeat(10)));
    report.add_item(ReportItem::html("Some Markup", "<p>Rendered <strong>as is</strong>.</p>"));

    report.add_item(ReportItem::image(
        "You Got This",
        "An image rendered from memory",
        FileInput::named_stream(Cursor::new(badge_png()?), "badge.png"),
        None,
    )?);

    for mode in [GraphMode::Line, GraphMode::Stacked] {
        report.add_item(ReportItem::graph(
            format!("Sample {mode} Chart"),
            format!("Sample {mode} chart description"),
            returns.clone(),
            mode,
        ));
    }

    report.add_item(ReportItem::interactive_table(
        "Interactive Table for AAPL-GOOG",
        "Rolling correlation",
        correlation()?,
    ));
    report.add_item(ReportItem::heatmap("AAPL-GOOG", "Rolling correlation", correlation()?));
    report.add_item(ReportItem::interactive_plot("interactive-plot", "should be some lines", prices.clone()));
    report.add_item(ReportItem::table_explorer("table-explorer", "Table Explorer example", prices));

    Ok(report)
}

fn main() -> Result<(), ReportError> {
    let output_root = Path::new("./report");
    let report = build_report()?;

    let rendered = LocalRenderer::default().render(&report, output_root)?;
    println!("Report written to: {}", rendered.html_path.display());

    let print_only = |email: &Email| -> Result<(), ReportError> {
        println!(
            "Would send `{}` with {} inline images and {} attachments",
            email.subject,
            email.payload.images.len(),
            email.payload.attachments.len()
        );
        Ok(())
    };
    EmailRenderer::with_transport(print_only, RenderOptions::default()).render(
        &report,
        &["no-reply@example.com".to_string()],
        "Sample report",
        &output_root.join("email"),
    )?;

    Ok(())
}
