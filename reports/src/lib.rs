//! # report-render
//!
//! Assemble reports from typed items and render them to a local HTML file
//! tree or to an email payload.
//!
//! A [`Report`] is an ordered list of [`ReportItem`]s: tables, line graphs,
//! stacked charts, heatmaps, interactive widgets, free text, files and
//! images. Renderers take the report by shared reference, give every item a
//! lookup key that is unique within the report, dispatch each item on its
//! kind and assemble the results in item order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_render::{LocalRenderer, Report, ReportItem};
//! use report_render::table::DataTable;
//!
//! let mut prices = DataTable::new("date", ["aapl", "goog"]);
//! prices.push_row("2024-01-02", [185.6, 139.6])?;
//! prices.push_row("2024-01-03", [184.3, 140.4])?;
//!
//! let mut report = Report::new("Daily");
//! report.add_item(ReportItem::line_graph("Prices", "Close prices", prices));
//! report.add_item(ReportItem::text("Notes", "Markets were calm."));
//!
//! let rendered = LocalRenderer::default().render(&report, "./report".as_ref())?;
//! println!("{}", rendered.html_path.display());
//! # Ok::<(), report_render::ReportError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`table`] - the tabular payload
//! - [`file`] - path-or-stream payload of file and image items
//! - [`item`] - item metadata and the closed set of item kinds
//! - [`report`] - the report container and unique keying
//! - [`shapes`] - table reshaping for widgets and plots
//! - [`chart`] - stacked and line charts rasterised to PNG
//! - [`render`] - the local and email renderers
//! - [`components`] - Leptos SSR components
//! - [`styles`] - CSS constants
//!
//! ## Leptos 0.8 SSR
//!
//! Pages are produced with Leptos's `RenderHtml` trait; no reactive runtime
//! or hydration is involved:
//!
//! ```rust,ignore
//! use leptos::tachys::view::RenderHtml;
//!
//! let view = view! { <MyComponent /> };
//! let html: String = view.to_html();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod chart;
pub mod components;
pub mod error;
pub mod file;
pub mod item;
pub mod render;
pub mod report;
pub mod shapes;
pub mod styles;
pub mod table;

pub use error::{BoxError, ReportError, Result};
pub use file::FileInput;
pub use item::{GraphMode, ItemKind, ReportItem, TabularKind, TextMarkup};
pub use render::email::{
    BuiltEmail, Email, EmailPayload, EmailRenderer, EmailTransport, InlineImage, NoTransport,
};
pub use render::local::{LocalRenderer, RenderedReport};
pub use render::{RenderOptions, WidgetAssets};
pub use report::{KeyCollision, KeyedItem, KeyedItems, Report};
pub use table::{Cell, DataTable};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{render_document, render_email_body};
    use crate::render::{Element, ItemBlock};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn prices() -> DataTable {
        let mut table = DataTable::new("date", ["aapl", "goog", "msft"]);
        table.push_row("2024-01-02", [1.0, 2.0, 3.0]).unwrap();
        table.push_row("2024-01-03", [2.0, -1.0, 0.5]).unwrap();
        table
    }

    fn block(name: &str, description: &str, element: Element) -> ItemBlock {
        ItemBlock {
            key: format!("R_{name}_0"),
            id: format!("R_{name}_0"),
            name: name.into(),
            description: description.into(),
            labels: vec![],
            element,
        }
    }

    fn render_local(report: &Report) -> String {
        let temp = TempDir::new().expect("temp dir");
        let rendered = LocalRenderer::default()
            .render_at(report, temp.path(), at())
            .expect("render");
        fs::read_to_string(rendered.html_path).expect("read page")
    }

    #[test]
    fn renders_empty_report() {
        let html = render_document("Empty", &[], &[], &WidgetAssets::default());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html"));
        assert!(html.contains("Empty (Local Report Render)"));
        // no plot library without line plots
        assert!(!html.contains("plotly"));
    }

    #[test]
    fn item_blocks_have_header_and_description_footer() {
        let blocks = vec![
            block("Described", "explains things", Element::Text { body: "x".into(), markup: TextMarkup::Plain }),
            block("Bare", "", Element::Text { body: "y".into(), markup: TextMarkup::Plain }),
        ];
        let html = render_document("R", &[], &blocks, &WidgetAssets::default());

        assert!(html.contains("<h2>Described</h2>"));
        assert!(html.contains("<h2>Bare</h2>"));
        assert_eq!(html.matches("Description:").count(), 1);
        assert!(html.contains("explains things"));
        // blocks keep item order
        assert!(html.find("Described").unwrap() < html.find("Bare").unwrap());
    }

    #[test]
    fn plain_text_is_escaped_and_html_is_verbatim() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::text("Plain", "<b>not bold</b>"));
        report.add_item(ReportItem::html("Markup", "<em id=\"verbatim\">yes</em>"));
        let html = render_local(&report);

        assert!(html.contains("&lt;b&gt;not bold&lt;/b&gt;"));
        assert!(html.contains("<em id=\"verbatim\">yes</em>"));
    }

    #[test]
    fn table_has_index_and_data_columns() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::table("Prices", "", prices()));
        let html = render_local(&report);

        assert!(html.contains("<table"));
        for header in ["date", "aapl", "goog", "msft"] {
            assert!(html.contains(&format!(">{header}</th>")), "missing header {header}");
        }
        assert!(html.contains(">2024-01-03</td>"));
        assert!(html.contains(">-1</td>"));
    }

    #[test]
    fn line_graph_embeds_figure_and_plot_library() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::line_graph("Prices", "", prices()));
        let html = render_local(&report);

        assert!(html.contains(r#"id="plot-R_Prices_0""#));
        assert!(html.contains(r#""name":"msft""#));
        assert!(html.contains(&WidgetAssets::default().plot_library));
    }

    #[test]
    fn stacked_graph_references_png_with_legend() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::graph("Returns", "", prices(), GraphMode::Stacked));
        let html = render_local(&report);

        assert!(html.contains(r#"src="Files/R_Returns_0.png""#));
        assert!(html.contains("Total"));
        assert!(html.contains("background:#1f77b4"));
    }

    #[test]
    fn builtin_widgets_mount_with_json_props() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::heatmap("Heat", "", prices()));
        report.add_item(ReportItem::interactive_table("Grid", "", prices()));
        report.add_item(ReportItem::table_explorer("Explore", "", prices()));
        report.add_item(ReportItem::interactive_plot("Traces", "", prices()));
        let html = render_local(&report);

        for component in ["Heatmap", "InteractiveTable", "TableExplorer", "InteractivePlot"] {
            assert!(html.contains(&format!(r#"data-widget="{component}""#)), "{component}");
        }
        assert!(html.contains(r#"[["date","aapl","goog","msft"],["2024-01-02",1.0,2.0,3.0]"#));
        assert!(html.contains(r#""headers":["aapl","goog","msft"]"#));
        assert!(html.contains(r#""traces":[{"name":"aapl""#));
    }

    #[test]
    fn widget_bundle_is_loaded_only_when_configured() {
        let blocks = vec![block(
            "Heat",
            "",
            Element::Widget {
                mount_id: "widget-R_Heat_0".into(),
                component: "Heatmap".into(),
                props_json: "{}".into(),
            },
        )];
        let without = render_document("R", &[], &blocks, &WidgetAssets::default());
        assert!(!without.contains("ReportWidgets"));

        let assets = WidgetAssets {
            widget_bundle_js: Some("widgets/bundle.js".into()),
            widget_bundle_css: Some("widgets/bundle.css".into()),
            ..Default::default()
        };
        let with = render_document("R", &[], &blocks, &assets);
        assert!(with.contains(r#"src="widgets/bundle.js""#));
        assert!(with.contains(r#"href="widgets/bundle.css""#));
        assert!(with.contains("ReportWidgets"));
    }

    #[test]
    fn json_in_script_elements_cannot_break_out() {
        let mut report = Report::new("R");
        let mut data = DataTable::new("</script>", ["a"]);
        data.push_row("x", [1.0]).unwrap();
        report.add_item(ReportItem::line_graph("Evil", "", data));
        let html = render_local(&report);

        assert_eq!(html.matches("</script>").count(), html.matches("<script").count());
        assert!(html.contains(r"<\/script>"));
    }

    #[test]
    fn file_and_image_items_use_relative_paths() {
        let mut report = Report::new("R");
        report.add_item(
            ReportItem::file("Notes", "", FileInput::named_stream(Cursor::new(b"n".to_vec()), "n.txt"), None)
                .unwrap(),
        );
        report.add_item(
            ReportItem::image("Logo", "", FileInput::named_stream(Cursor::new(b"i".to_vec()), "logo.png"), None)
                .unwrap(),
        );
        let html = render_local(&report);

        assert!(html.contains(r#"<a href="Files/R_Notes_0.txt">Notes</a>"#));
        assert!(html.contains(r#"src="Files/R_Logo_0.png""#));
        assert!(html.contains(r#"alt="Logo""#));
    }

    #[test]
    fn labels_render_as_chips() {
        let mut report = Report::new("R");
        report.add_label("Reports/Sample");
        let mut item = ReportItem::text("Note", "n");
        item.add_label("draft");
        report.add_item(item);
        let html = render_local(&report);

        assert!(html.contains(r#"<li class="chip">Reports/Sample</li>"#));
        assert!(html.contains(r#"<li class="chip">draft</li>"#));
    }

    #[test]
    fn email_body_hides_labels_and_keeps_footers() {
        let mut labelled = block("Note", "about", Element::Attachment { name: "Note".into() });
        labelled.labels = vec!["draft".into()];
        let html = render_email_body(&[labelled]);

        assert!(!html.contains("chip"));
        assert!(html.contains("See attached file named Note"));
        assert!(html.contains("Description:"));
        assert!(!html.contains("<html"));
    }

    #[test]
    fn render_to_text_matches_item_snippets() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::text("a", "alpha\n"));
        report.add_item(ReportItem::table("t", "table of prices", prices()));
        assert_eq!(report.render_to_text(), "alpha\ntable of prices");
    }

    #[test]
    fn one_report_renders_locally_then_by_email() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("R");
        let notes = FileInput::named_stream(Cursor::new(b"streamed notes".to_vec()), "notes.txt");
        report.add_item(ReportItem::file("Notes", "", notes, None).unwrap());

        let local = LocalRenderer::default()
            .render_at(&report, &temp.path().join("local"), at())
            .expect("local render");
        let built = EmailRenderer::new(RenderOptions::default())
            .build_at(&report, &temp.path().join("email"), at())
            .expect("email build");

        // the stream is rewound, so the second copy is complete
        let local_copy = fs::read(local.run_dir.join("Files").join("R_Notes_0.txt")).unwrap();
        assert_eq!(local_copy, b"streamed notes");
        assert_eq!(fs::read(&built.payload.attachments[0]).unwrap(), b"streamed notes");
    }
}
