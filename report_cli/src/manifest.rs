//! TOML report manifests.
//!
//! A manifest names the report, optionally tunes rendering, and lists the
//! items in order:
//!
//! ```toml
//! name = "Weekly"
//! labels = ["Reports/Weekly"]
//! widgets = ["Gauge"]
//!
//! [render.chart_size]
//! width = 800
//! height = 480
//!
//! [[items]]
//! kind = "graph"
//! mode = "stacked"
//! name = "Returns"
//! csv = "returns.csv"
//!
//! [[items]]
//! kind = "file"
//! name = "Notes"
//! path = "notes.txt"
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use report_render::item::TabularKind;
use report_render::{FileInput, GraphMode, RenderOptions, Report, ReportItem};
use serde::Deserialize;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub name: String,
    /// Report key; defaults to the name
    pub unique_key: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Custom widget components the widget bundle provides
    #[serde(default)]
    pub widgets: Vec<String>,
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One `[[items]]` entry.
#[derive(Debug, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unique_key: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub kind: KindSpec,
}

/// Item payload, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindSpec {
    Table(TableSource),
    LineGraph(TableSource),
    Graph(GraphSource),
    Heatmap(TableSource),
    InteractiveTable(TableSource),
    InteractivePlot(TableSource),
    TableExplorer(TableSource),
    Text {
        body: String,
        /// Insert `body` verbatim instead of escaping it
        #[serde(default)]
        html: bool,
    },
    File(FileSpec),
    Image(FileSpec),
    Widget {
        component: String,
        #[serde(default = "empty_props")]
        props: serde_json::Value,
    },
}

/// Delimited text with the index in the first column.
#[derive(Debug, Deserialize)]
pub struct TableSource {
    pub csv: PathBuf,
    /// Field separator, `,` when absent
    pub sep: Option<char>,
}

#[derive(Debug, Deserialize)]
pub struct GraphSource {
    #[serde(flatten)]
    pub table: TableSource,
    #[serde(default)]
    pub mode: GraphMode,
}

#[derive(Debug, Deserialize)]
pub struct FileSpec {
    pub path: PathBuf,
    /// Overrides the extension implied by `path`; must agree with it
    pub extension: Option<String>,
}

fn empty_props() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Manifest {
    /// Load and parse a manifest. Missing files and parse errors are fatal.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let mut manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(
            "loaded manifest {} with {} items",
            path.display(),
            manifest.items.len()
        );
        Ok(manifest)
    }

    /// Build the report. Every file and table is read here, so a manifest
    /// that builds will not fail later for a missing input.
    pub fn build_report(&self) -> Result<Report> {
        let mut report = Report::new(&self.name);
        if let Some(key) = &self.unique_key {
            report = report.with_unique_key(key);
        }
        for label in &self.labels {
            report.add_label(label);
        }
        for spec in &self.items {
            let item = self
                .build_item(spec)
                .with_context(|| format!("Failed to build item `{}`", spec.name))?;
            report.add_item(item);
        }
        Ok(report)
    }

    fn build_item(&self, spec: &ItemSpec) -> Result<ReportItem> {
        let name = spec.name.as_str();
        let description = spec.description.as_str();
        let mut item = match &spec.kind {
            KindSpec::Table(src) => self.tabular(TabularKind::Table, src, name, description)?,
            KindSpec::LineGraph(src) => self.tabular(TabularKind::LineGraph, src, name, description)?,
            KindSpec::Graph(src) => {
                self.tabular(TabularKind::Graph(src.mode), &src.table, name, description)?
            }
            KindSpec::Heatmap(src) => self.tabular(TabularKind::Heatmap, src, name, description)?,
            KindSpec::InteractiveTable(src) => {
                self.tabular(TabularKind::InteractiveTable, src, name, description)?
            }
            KindSpec::InteractivePlot(src) => {
                self.tabular(TabularKind::InteractivePlot, src, name, description)?
            }
            KindSpec::TableExplorer(src) => {
                self.tabular(TabularKind::TableExplorer, src, name, description)?
            }
            KindSpec::Text { body, html: false } => ReportItem::text(name, body).with_description(description),
            KindSpec::Text { body, html: true } => ReportItem::html(name, body).with_description(description),
            KindSpec::File(file) => ReportItem::file(
                name,
                description,
                FileInput::path(self.resolve(&file.path)),
                file.extension.as_deref(),
            )?,
            KindSpec::Image(file) => ReportItem::image(
                name,
                description,
                FileInput::path(self.resolve(&file.path)),
                file.extension.as_deref(),
            )?,
            KindSpec::Widget { component, props } => {
                ReportItem::widget(name, description, component, props.clone())
            }
        };
        if let Some(key) = &spec.unique_key {
            item = item.with_unique_key(key);
        }
        for label in &spec.labels {
            item.add_label(label);
        }
        Ok(item)
    }

    fn tabular(
        &self,
        kind: TabularKind,
        src: &TableSource,
        name: &str,
        description: &str,
    ) -> Result<ReportItem> {
        let sep = match src.sep {
            None => b',',
            Some(c) if c.is_ascii() => c as u8,
            Some(c) => bail!("separator {c:?} is not a single-byte character"),
        };
        let path = self.resolve(&src.csv);
        ReportItem::from_csv(kind, &path, name, description, sep)
            .with_context(|| format!("Failed to load table {}", path.display()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
