//! Report items: shared metadata plus one closed set of payload kinds.
//!
//! Every item exposes its name, description, unique key and labels the same
//! way regardless of kind; renderers only look at [`ItemKind`] to choose a
//! rendering routine.
//!
//! # Example
//!
//! ```rust
//! use report_render::item::{GraphMode, ReportItem};
//! use report_render::table::DataTable;
//!
//! let mut returns = DataTable::new("date", ["aapl", "goog"]);
//! returns.push_row("2024-01-02", [0.012, -0.004]).unwrap();
//!
//! let item = ReportItem::graph("Daily returns", "Stacked daily returns", returns, GraphMode::Stacked)
//!     .with_unique_key("returns");
//!
//! assert_eq!(item.name(), "Daily returns");
//! assert_eq!(item.unique_key(), "returns");
//! assert_eq!(item.kind().variant_name(), "graph");
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::file::{FileInput, FileSource};
use crate::table::DataTable;

/// Output mode of a [`ItemKind::Graph`] item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum GraphMode {
    /// One line per column
    #[default]
    Line,
    /// Positive/negative stacked bars with a running-total line
    Stacked,
}

impl FromStr for GraphMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(GraphMode::Line),
            "stacked" => Ok(GraphMode::Stacked),
            _ => Err(ReportError::UnknownGraphMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for GraphMode {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GraphMode::Line => "line",
            GraphMode::Stacked => "stacked",
        })
    }
}

/// How a text item's body is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextMarkup {
    /// Escaped, whitespace preserved
    #[default]
    Plain,
    /// Inserted into the page as-is
    Html,
}

/// Payload of a report item. One case per item kind.
#[derive(Debug)]
pub enum ItemKind {
    /// Plain display table
    Table(DataTable),
    /// Time-series line plot
    LineGraph(DataTable),
    /// Line or stacked chart, chosen by `mode`
    Graph {
        /// Values to chart
        data: DataTable,
        /// Output mode
        mode: GraphMode,
    },
    /// Heatmap widget
    Heatmap(DataTable),
    /// Sortable table widget
    InteractiveTable(DataTable),
    /// Trace plot widget
    InteractivePlot(DataTable),
    /// Table explorer widget
    TableExplorer(DataTable),
    /// Free text
    Text {
        /// Text content
        body: String,
        /// Interpretation of `body`
        markup: TextMarkup,
    },
    /// File copied next to the report and linked
    File(FileSource),
    /// Image copied next to the report and displayed
    Image(FileSource),
    /// Caller-registered widget component from the widget bundle
    Widget {
        /// Component name exported by the widget bundle
        component: String,
        /// Props handed to the component
        props: serde_json::Value,
    },
}

impl ItemKind {
    /// Stable lowercase name of the variant.
    pub fn variant_name(&self) -> &'static str {
        match self {
            ItemKind::Table(_) => "table",
            ItemKind::LineGraph(_) => "line_graph",
            ItemKind::Graph { .. } => "graph",
            ItemKind::Heatmap(_) => "heatmap",
            ItemKind::InteractiveTable(_) => "interactive_table",
            ItemKind::InteractivePlot(_) => "interactive_plot",
            ItemKind::TableExplorer(_) => "table_explorer",
            ItemKind::Text { .. } => "text",
            ItemKind::File(_) => "file",
            ItemKind::Image(_) => "image",
            ItemKind::Widget { .. } => "widget",
        }
    }

    /// Tabular payload, for every kind that carries one.
    pub fn data(&self) -> Option<&DataTable> {
        match self {
            ItemKind::Table(data)
            | ItemKind::LineGraph(data)
            | ItemKind::Graph { data, .. }
            | ItemKind::Heatmap(data)
            | ItemKind::InteractiveTable(data)
            | ItemKind::InteractivePlot(data)
            | ItemKind::TableExplorer(data) => Some(data),
            ItemKind::Text { .. } | ItemKind::File(_) | ItemKind::Image(_) | ItemKind::Widget { .. } => {
                None
            }
        }
    }
}

/// Tabular item kinds, used to build items from delimited text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabularKind {
    /// [`ItemKind::Table`]
    Table,
    /// [`ItemKind::LineGraph`]
    LineGraph,
    /// [`ItemKind::Graph`]
    Graph(GraphMode),
    /// [`ItemKind::Heatmap`]
    Heatmap,
    /// [`ItemKind::InteractiveTable`]
    InteractiveTable,
    /// [`ItemKind::InteractivePlot`]
    InteractivePlot,
    /// [`ItemKind::TableExplorer`]
    TableExplorer,
}

impl TabularKind {
    /// Wrap a table in the matching item kind.
    pub fn with_data(self, data: DataTable) -> ItemKind {
        match self {
            TabularKind::Table => ItemKind::Table(data),
            TabularKind::LineGraph => ItemKind::LineGraph(data),
            TabularKind::Graph(mode) => ItemKind::Graph { data, mode },
            TabularKind::Heatmap => ItemKind::Heatmap(data),
            TabularKind::InteractiveTable => ItemKind::InteractiveTable(data),
            TabularKind::InteractivePlot => ItemKind::InteractivePlot(data),
            TabularKind::TableExplorer => ItemKind::TableExplorer(data),
        }
    }
}

/// One titled, described unit of report content.
#[derive(Debug)]
pub struct ReportItem {
    name: String,
    description: String,
    unique_key: String,
    labels: Vec<String>,
    kind: ItemKind,
}

impl ReportItem {
    /// Item of any kind. The unique key defaults to the name.
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ItemKind) -> Self {
        let name = name.into();
        Self {
            unique_key: name.clone(),
            name,
            description: description.into(),
            labels: Vec::new(),
            kind,
        }
    }

    /// Display table.
    pub fn table(name: impl Into<String>, description: impl Into<String>, data: DataTable) -> Self {
        Self::new(name, description, ItemKind::Table(data))
    }

    /// Line plot, one line per column.
    pub fn line_graph(name: impl Into<String>, description: impl Into<String>, data: DataTable) -> Self {
        Self::new(name, description, ItemKind::LineGraph(data))
    }

    /// Line or stacked chart.
    pub fn graph(
        name: impl Into<String>,
        description: impl Into<String>,
        data: DataTable,
        mode: GraphMode,
    ) -> Self {
        Self::new(name, description, ItemKind::Graph { data, mode })
    }

    /// Heatmap widget.
    pub fn heatmap(name: impl Into<String>, description: impl Into<String>, data: DataTable) -> Self {
        Self::new(name, description, ItemKind::Heatmap(data))
    }

    /// Interactive table widget.
    pub fn interactive_table(
        name: impl Into<String>,
        description: impl Into<String>,
        data: DataTable,
    ) -> Self {
        Self::new(name, description, ItemKind::InteractiveTable(data))
    }

    /// Interactive trace plot widget.
    pub fn interactive_plot(
        name: impl Into<String>,
        description: impl Into<String>,
        data: DataTable,
    ) -> Self {
        Self::new(name, description, ItemKind::InteractivePlot(data))
    }

    /// Table explorer widget.
    pub fn table_explorer(
        name: impl Into<String>,
        description: impl Into<String>,
        data: DataTable,
    ) -> Self {
        Self::new(name, description, ItemKind::TableExplorer(data))
    }

    /// Tabular item loaded from delimited text (first column = index).
    pub fn from_csv(
        kind: TabularKind,
        path: impl AsRef<Path>,
        name: impl Into<String>,
        description: impl Into<String>,
        sep: u8,
    ) -> Result<Self> {
        let data = DataTable::from_csv(path, sep)?;
        Ok(Self::new(name, description, kind.with_data(data)))
    }

    /// Plain free text.
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(
            name,
            "",
            ItemKind::Text {
                body: body.into(),
                markup: TextMarkup::Plain,
            },
        )
    }

    /// Pre-formatted HTML snippet, inserted verbatim.
    pub fn html(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(
            name,
            "",
            ItemKind::Text {
                body: body.into(),
                markup: TextMarkup::Html,
            },
        )
    }

    /// File item. Fails fast on a missing path or conflicting extension.
    pub fn file(
        name: impl Into<String>,
        description: impl Into<String>,
        input: impl Into<FileInput>,
        extension: Option<&str>,
    ) -> Result<Self> {
        let source = FileSource::new(input.into(), extension)?;
        Ok(Self::new(name, description, ItemKind::File(source)))
    }

    /// Image item. Same construction rules as [`ReportItem::file`].
    pub fn image(
        name: impl Into<String>,
        description: impl Into<String>,
        input: impl Into<FileInput>,
        extension: Option<&str>,
    ) -> Result<Self> {
        let source = FileSource::new(input.into(), extension)?;
        Ok(Self::new(name, description, ItemKind::Image(source)))
    }

    /// Custom widget from the widget bundle.
    pub fn widget(
        name: impl Into<String>,
        description: impl Into<String>,
        component: impl Into<String>,
        props: serde_json::Value,
    ) -> Self {
        Self::new(
            name,
            description,
            ItemKind::Widget {
                component: component.into(),
                props,
            },
        )
    }

    /// Replace the default (name-derived) unique key.
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = key.into();
        self
    }

    /// Replace the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a free-form label.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// Human readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, empty when absent.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared unique key.
    pub fn unique_key(&self) -> &str {
        &self.unique_key
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Payload.
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Plain-text rendition: the body for text items, the description otherwise.
    pub fn text_snippet(&self) -> &str {
        match &self.kind {
            ItemKind::Text { body, .. } => body,
            _ => &self.description,
        }
    }
}
