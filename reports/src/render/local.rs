//! Local HTML file tree renderer.
//!
//! ```text
//! <output_root>/<report name>/<YYYYMMDD_HHMMSS>/
//!     report.html
//!     Files/<lookup key>.<ext>
//!     Files/<lookup key>.png
//! ```

use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};

use super::{Element, IdIssuer, ItemBlock, ItemIds, RenderOptions, RunDirectory};
use crate::chart::StackedChart;
use crate::components::render_document;
use crate::error::{ReportError, Result};
use crate::file::create_new;
use crate::item::{GraphMode, ItemKind, ReportItem};
use crate::report::{KeyCollision, Report};
use crate::shapes::{self, script_json};
use crate::table::DataTable;

/// Name of the page written into the run directory.
pub const REPORT_FILE: &str = "report.html";

/// Widget bundle component for heatmap items.
pub const HEATMAP_WIDGET: &str = "Heatmap";
/// Widget bundle component for interactive table items.
pub const INTERACTIVE_TABLE_WIDGET: &str = "InteractiveTable";
/// Widget bundle component for table explorer items.
pub const TABLE_EXPLORER_WIDGET: &str = "TableExplorer";
/// Widget bundle component for interactive plot items.
pub const INTERACTIVE_PLOT_WIDGET: &str = "InteractivePlot";

const BUILTIN_WIDGETS: [&str; 4] = [
    HEATMAP_WIDGET,
    INTERACTIVE_TABLE_WIDGET,
    TABLE_EXPLORER_WIDGET,
    INTERACTIVE_PLOT_WIDGET,
];

const WIDGET_WIDTH: u32 = 1200;

/// Outcome of a successful local render.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    /// Timestamped run directory
    pub run_dir: PathBuf,
    /// The written `report.html`
    pub html_path: PathBuf,
    /// Key collisions resolved while keying the report
    pub collisions: Vec<KeyCollision>,
}

/// Renders a [`Report`] into a browsable HTML file tree.
#[derive(Clone, Debug)]
pub struct LocalRenderer {
    options: RenderOptions,
    widgets: BTreeSet<String>,
}

impl Default for LocalRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl LocalRenderer {
    /// Renderer with the built-in widget components registered.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            widgets: BUILTIN_WIDGETS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Declare that the widget bundle exports `component`.
    pub fn register_widget(&mut self, component: impl Into<String>) -> &mut Self {
        self.widgets.insert(component.into());
        self
    }

    /// Whether widget items naming `component` can be rendered.
    pub fn has_widget(&self, component: &str) -> bool {
        self.widgets.contains(component)
    }

    /// Render options in use.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render into a run directory stamped with the current local time.
    pub fn render(&self, report: &Report, output_root: &Path) -> Result<RenderedReport> {
        self.render_at(report, output_root, super::now())
    }

    /// Render into a run directory stamped with `at`.
    ///
    /// `report.html` is written last; a failing item leaves no page behind.
    pub fn render_at(
        &self,
        report: &Report,
        output_root: &Path,
        at: NaiveDateTime,
    ) -> Result<RenderedReport> {
        let run = RunDirectory::create(output_root, report.name(), at)?;
        let keyed = report.uniquely_keyed_items();

        let mut issuer = IdIssuer::new();
        let mut blocks = Vec::with_capacity(keyed.len());
        for entry in &keyed.items {
            tracing::debug!(
                "rendering {} item `{}` as {}",
                entry.item.kind().variant_name(),
                entry.item.name(),
                entry.lookup_key
            );
            let ids = issuer.issue(&entry.lookup_key);
            let element = self.dispatch(&run, &ids, entry.item)?;
            blocks.push(ItemBlock::new(&entry.lookup_key, &ids, entry.item, element));
        }

        let html = render_document(report.name(), report.labels(), &blocks, &self.options.assets);

        let html_path = run.path().join(REPORT_FILE);
        let mut out = BufWriter::new(create_new(&html_path)?);
        out.write_all(html.as_bytes())?;
        out.flush()?;

        tracing::info!(
            "rendered {} items of `{}` to {}",
            blocks.len(),
            report.name(),
            html_path.display()
        );
        Ok(RenderedReport {
            run_dir: run.path().to_path_buf(),
            html_path,
            collisions: keyed.collisions,
        })
    }

    fn dispatch(&self, run: &RunDirectory, ids: &ItemIds, item: &ReportItem) -> Result<Element> {
        let element = match item.kind() {
            ItemKind::Table(data) => Element::Table(shapes::display_table(data)),
            ItemKind::LineGraph(data)
            | ItemKind::Graph {
                data,
                mode: GraphMode::Line,
            } => line_plot(ids, item.name(), data)?,
            ItemKind::Graph {
                data,
                mode: GraphMode::Stacked,
            } => {
                let chart = StackedChart::from_table(data);
                let png = run.files().join(format!("{}.png", ids.stem));
                chart.write_png(&png, item.name(), self.options.chart_size)?;
                Element::Chart {
                    src: run.relative(&png),
                    legend: chart.legend(),
                }
            }
            ItemKind::Heatmap(data) => builtin_widget(
                ids,
                item,
                HEATMAP_WIDGET,
                json!({ "data": shapes::heatmap_rows(data) }),
            )?,
            ItemKind::InteractiveTable(data) => builtin_widget(
                ids,
                item,
                INTERACTIVE_TABLE_WIDGET,
                serde_json::to_value(shapes::interactive_table(data))?,
            )?,
            ItemKind::TableExplorer(data) => builtin_widget(
                ids,
                item,
                TABLE_EXPLORER_WIDGET,
                json!({ "data": shapes::table_explorer_rows(data) }),
            )?,
            ItemKind::InteractivePlot(data) => builtin_widget(
                ids,
                item,
                INTERACTIVE_PLOT_WIDGET,
                json!({ "traces": shapes::plot_traces(data) }),
            )?,
            ItemKind::Text { body, markup } => Element::Text {
                body: body.clone(),
                markup: *markup,
            },
            ItemKind::File(source) => {
                let copy = source.copy_to(run.files(), &ids.stem)?;
                Element::Link {
                    href: run.relative(&copy),
                    label: item.name().to_string(),
                }
            }
            ItemKind::Image(source) => {
                let copy = source.copy_to(run.files(), &ids.stem)?;
                Element::Image {
                    src: run.relative(&copy),
                    alt: item.name().to_string(),
                }
            }
            ItemKind::Widget { component, props } => {
                if !self.has_widget(component) {
                    return Err(ReportError::UnhandledVariant {
                        variant: component.clone(),
                        item: item.name().to_string(),
                        renderer: "local",
                    });
                }
                Element::Widget {
                    mount_id: mount_id(ids),
                    component: component.clone(),
                    props_json: script_json(props)?,
                }
            }
        };
        Ok(element)
    }
}

fn line_plot(ids: &ItemIds, title: &str, data: &DataTable) -> Result<Element> {
    Ok(Element::LinePlot {
        div_id: format!("plot-{}", ids.id),
        figure_json: script_json(&shapes::line_figure(data, title))?,
    })
}

fn mount_id(ids: &ItemIds) -> String {
    format!("widget-{}", ids.id)
}

// Built-in widgets also receive the item name as title and a fixed width.
fn builtin_widget(
    ids: &ItemIds,
    item: &ReportItem,
    component: &str,
    payload: Value,
) -> Result<Element> {
    let mut props = Map::new();
    props.insert("title".into(), Value::from(item.name()));
    props.insert("width".into(), Value::from(WIDGET_WIDTH));
    if let Value::Object(fields) = payload {
        props.extend(fields);
    }
    Ok(Element::Widget {
        mount_id: mount_id(ids),
        component: component.to_string(),
        props_json: script_json(&props)?,
    })
}
