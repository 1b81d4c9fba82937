//! Renderers and the pieces they share.
//!
//! Both renderers follow the same contract: create a fresh run directory,
//! key the report items, dispatch each item on its [`ItemKind`] to a rendered
//! [`Element`], then assemble the elements in item order into the final
//! artifact.
//!
//! [`ItemKind`]: crate::item::ItemKind

pub mod email;
pub mod local;

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;

use crate::chart::{ChartSize, LegendEntry};
use crate::error::{ReportError, Result};
use crate::item::{ReportItem, TextMarkup};
use crate::shapes::TableView;

/// Run-directory timestamp format.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sub-directory holding copies and rasterised charts.
pub const FILES_DIR: &str = "Files";

/// Script and stylesheet locations for browser-side rendering.
///
/// The plotting library draws line plots; the widget bundle mounts heatmaps,
/// interactive tables, table explorers, trace plots and custom widgets. Paths
/// may be URLs or paths relative to the rendered `report.html`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WidgetAssets {
    /// Plotting library script
    pub plot_library: String,
    /// Widget bundle script, if widgets should come alive
    pub widget_bundle_js: Option<String>,
    /// Widget bundle stylesheet
    pub widget_bundle_css: Option<String>,
}

impl Default for WidgetAssets {
    fn default() -> Self {
        Self {
            plot_library: "https://cdn.plot.ly/plotly-2.35.2.min.js".into(),
            widget_bundle_js: None,
            widget_bundle_css: None,
        }
    }
}

/// Knobs shared by both renderers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Browser-side assets (local renderer only)
    pub assets: WidgetAssets,
    /// Pixel size of rasterised charts
    pub chart_size: ChartSize,
}

/// `<root>/<report name>/<stamp>/` plus its `Files/` child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunDirectory {
    path: PathBuf,
    files: PathBuf,
}

impl RunDirectory {
    /// Create a fresh run directory for `report_name` at time `at`.
    ///
    /// Parents are created as needed; the timestamped directory itself must
    /// not exist yet ([`ReportError::DestinationExists`]).
    pub fn create(root: &Path, report_name: &str, at: NaiveDateTime) -> Result<Self> {
        let parent = root.join(report_dir_name(report_name));
        fs::create_dir_all(&parent)?;

        let path = parent.join(run_stamp(at));
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(ReportError::DestinationExists(path));
            }
            Err(err) => return Err(err.into()),
        }

        let files = path.join(FILES_DIR);
        fs::create_dir(&files)?;
        tracing::info!("created run directory {}", path.display());
        Ok(Self { path, files })
    }

    /// The timestamped directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `Files/` sub-directory.
    pub fn files(&self) -> &Path {
        &self.files
    }

    /// Path relative to the run directory for a file stored under `Files/`.
    pub fn relative(&self, file: &Path) -> String {
        match file.file_name() {
            Some(name) => format!("{FILES_DIR}/{}", name.to_string_lossy()),
            None => FILES_DIR.to_string(),
        }
    }
}

/// Timestamp component of a run directory.
pub fn run_stamp(at: NaiveDateTime) -> String {
    at.format(RUN_STAMP_FORMAT).to_string()
}

/// Current local time, the default render timestamp.
pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Report name as a single directory component.
pub fn report_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".repeat(cleaned.len().max(1)),
        _ => cleaned,
    }
}

/// File name stem for a lookup key under `Files/`.
pub fn file_stem(key: &str) -> String {
    report_dir_name(key)
}

/// Content id for an inline email image: ASCII alphanumerics and `_` only.
pub fn content_id(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// File stem and element id issued to one item for one render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemIds {
    /// File name stem under `Files/`
    pub stem: String,
    /// Element id and email content id
    pub id: String,
}

/// Issues [`ItemIds`] that stay distinct after sanitising.
///
/// Distinct lookup keys can sanitise to the same stem (`a/b` and `a_b`) or
/// the same id (`Sales Q1` and `Sales-Q1`). A later claimant gets `_1`,
/// `_2`, ... appended until it is unique within the render. Comparison
/// ignores ASCII case so stems stay distinct on case-insensitive
/// filesystems.
#[derive(Debug, Default)]
pub struct IdIssuer {
    stems: HashSet<String>,
    ids: HashSet<String>,
}

impl IdIssuer {
    /// Empty issuer, one per render.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stem and id for the item keyed `key`.
    pub fn issue(&mut self, key: &str) -> ItemIds {
        let stem = claim(&mut self.stems, file_stem(key));
        let id = claim(&mut self.ids, content_id(key));
        if stem != file_stem(key) || id != content_id(key) {
            tracing::debug!("key `{}` sanitised onto a taken name, issued {} / {}", key, stem, id);
        }
        ItemIds { stem, id }
    }
}

fn claim(issued: &mut HashSet<String>, base: String) -> String {
    let mut candidate = base.clone();
    let mut n = 0usize;
    while !issued.insert(candidate.to_ascii_lowercase()) {
        n += 1;
        candidate = format!("{base}_{n}");
    }
    candidate
}

/// What one item renders to, before assembly into a page or email body.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// Static table
    Table(TableView),
    /// Browser-drawn line plot
    LinePlot {
        /// Element id of the plot container
        div_id: String,
        /// Figure spec, ready for a `<script>` element
        figure_json: String,
    },
    /// Rasterised chart with an HTML legend
    Chart {
        /// `Files/...` path or `cid:...` reference
        src: String,
        /// Series colours
        legend: Vec<LegendEntry>,
    },
    /// Inline image
    Image {
        /// `Files/...` path or `cid:...` reference
        src: String,
        /// Alternative text
        alt: String,
    },
    /// Link to a copied file
    Link {
        /// Relative path of the copy
        href: String,
        /// Link text
        label: String,
    },
    /// Email notice for a file sent as an attachment
    Attachment {
        /// Item name shown to the reader
        name: String,
    },
    /// Free text
    Text {
        /// Text content
        body: String,
        /// Interpretation of `body`
        markup: TextMarkup,
    },
    /// Widget mount point
    Widget {
        /// Element id the widget mounts into
        mount_id: String,
        /// Component exported by the widget bundle
        component: String,
        /// Props, ready for a `<script>` element
        props_json: String,
    },
}

impl Element {
    /// Needs the plotting library on the page.
    pub fn needs_plot_library(&self) -> bool {
        matches!(self, Element::LinePlot { .. })
    }

    /// Needs the widget bundle on the page.
    pub fn needs_widget_bundle(&self) -> bool {
        matches!(self, Element::Widget { .. })
    }
}

/// One rendered item: header metadata, content, description footer.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemBlock {
    /// Lookup key assigned for this render
    pub key: String,
    /// Element id issued for this render
    pub id: String,
    /// Item name, used as the block header
    pub name: String,
    /// Footer text; no footer when empty
    pub description: String,
    /// Item labels
    pub labels: Vec<String>,
    /// Rendered content
    pub element: Element,
}

impl ItemBlock {
    pub(crate) fn new(key: &str, ids: &ItemIds, item: &ReportItem, element: Element) -> Self {
        Self {
            key: key.to_string(),
            id: ids.id.clone(),
            name: item.name().to_string(),
            description: item.description().to_string(),
            labels: item.labels().to_vec(),
            element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn run_stamp_uses_minutes_not_months() {
        assert_eq!(run_stamp(at(9, 45, 1)), "20240307_094501");
    }

    #[test]
    fn run_directory_layout() {
        let temp = TempDir::new().expect("temp dir");
        let run = RunDirectory::create(temp.path(), "Weekly", at(10, 0, 0)).expect("run dir");

        assert_eq!(run.path(), temp.path().join("Weekly").join("20240307_100000"));
        assert!(run.files().is_dir());
        assert_eq!(run.relative(&run.files().join("k.png")), "Files/k.png");
    }

    #[test]
    fn existing_run_directory_is_rejected() {
        let temp = TempDir::new().expect("temp dir");
        RunDirectory::create(temp.path(), "Weekly", at(10, 0, 0)).expect("first");
        let err = RunDirectory::create(temp.path(), "Weekly", at(10, 0, 0)).unwrap_err();
        assert!(matches!(err, ReportError::DestinationExists(_)));
    }

    #[test]
    fn report_names_become_one_directory_component() {
        assert_eq!(report_dir_name("Reports/Sample"), "Reports_Sample");
        assert_eq!(report_dir_name(r"a\b"), "a_b");
        assert_eq!(report_dir_name(".."), "__");
        assert_eq!(report_dir_name(""), "_");
    }

    #[test]
    fn content_ids_are_sanitised() {
        let cid = content_id("Report 1_Sales/Q1-2024_0");
        assert_eq!(cid, "Report_1_Sales_Q1_2024_0");
        assert!(cid.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn sanitised_collisions_get_suffixes() {
        let mut issuer = IdIssuer::new();
        let slash = issuer.issue("R_a/b_0");
        let underscore = issuer.issue("R_a_b_0");
        assert_eq!(slash.stem, "R_a_b_0");
        assert_eq!(underscore.stem, "R_a_b_0_1");

        let spaced = issuer.issue("R_Sales Q1_0");
        let dashed = issuer.issue("R_Sales-Q1_0");
        assert_eq!(spaced.id, "R_Sales_Q1_0");
        assert_eq!(dashed.id, "R_Sales_Q1_0_1");
        // stems keep the space and the dash, so they never clashed
        assert_eq!((spaced.stem.as_str(), dashed.stem.as_str()), ("R_Sales Q1_0", "R_Sales-Q1_0"));
    }

    #[test]
    fn suffixes_skip_names_already_taken() {
        let mut issuer = IdIssuer::new();
        assert_eq!(issuer.issue("k_0_1").id, "k_0_1");
        assert_eq!(issuer.issue("k_0").id, "k_0");
        assert_eq!(issuer.issue("k-0").id, "k_0_2");
        // case-insensitive filesystems would fold these together
        assert_eq!(issuer.issue("K_0").stem, "K_0_2");
    }

    #[test]
    fn render_options_parse_with_defaults() {
        let options: RenderOptions = serde_json::from_str(r#"{"chart_size": {"width": 640}}"#).unwrap();
        assert_eq!(options.chart_size.width, 640);
        assert_eq!(options.chart_size.height, ChartSize::default().height);
        assert_eq!(options.assets, WidgetAssets::default());
    }
}
