//! Email payload renderer with an injectable delivery transport.
//!
//! Email clients run no scripts, so every chart is rasterised and referenced
//! by content id, every table-like item becomes a static table, and custom
//! widgets cannot be rendered at all.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Element, IdIssuer, ItemBlock, ItemIds, RenderOptions, RunDirectory};
use crate::chart::{LineChart, StackedChart};
use crate::components::render_email_body;
use crate::error::{ReportError, Result};
use crate::file::FileSource;
use crate::item::{GraphMode, ItemKind, ReportItem};
use crate::report::{KeyCollision, Report};
use crate::shapes;

// Longest magic-byte signature `image::guess_format` looks at is well below this.
const SNIFF_LEN: usize = 64;

/// Inline image reference: the file to embed and the id the HTML uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    /// File to embed
    pub filename: PathBuf,
    /// Content id referenced as `cid:{cid}`
    pub cid: String,
}

/// Everything a transport needs besides addressing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    /// HTML body
    pub html: String,
    /// Inline images, in item order
    pub images: Vec<InlineImage>,
    /// Attached files, in item order
    pub attachments: Vec<PathBuf>,
}

/// A fully built email handed to an [`EmailTransport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Email {
    /// Destination addresses
    pub recipients: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Body, images and attachments
    #[serde(flatten)]
    pub payload: EmailPayload,
    /// Run directory holding the referenced files
    pub run_dir: PathBuf,
}

/// Delivery mechanism supplied by the caller.
///
/// Implementations wrap their own failures with [`ReportError::transport`].
pub trait EmailTransport {
    /// Deliver one email.
    fn send(&self, email: &Email) -> Result<()>;
}

impl<F> EmailTransport for F
where
    F: Fn(&Email) -> Result<()>,
{
    fn send(&self, email: &Email) -> Result<()> {
        self(email)
    }
}

/// Default transport: refuses to deliver.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTransport;

impl EmailTransport for NoTransport {
    fn send(&self, _email: &Email) -> Result<()> {
        Err(ReportError::NoTransport)
    }
}

/// Output of [`EmailRenderer::build`].
#[derive(Clone, Debug)]
pub struct BuiltEmail {
    /// Timestamped run directory holding copies and charts
    pub run_dir: PathBuf,
    /// Body, inline images and attachments
    pub payload: EmailPayload,
    /// Key collisions resolved while keying the report
    pub collisions: Vec<KeyCollision>,
}

/// Renders a [`Report`] into an [`EmailPayload`] and delivers it.
#[derive(Clone, Debug, Default)]
pub struct EmailRenderer<T = NoTransport> {
    transport: T,
    options: RenderOptions,
}

impl EmailRenderer<NoTransport> {
    /// Renderer without a transport; [`EmailRenderer::render`] always fails.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            transport: NoTransport,
            options,
        }
    }
}

impl<T: EmailTransport> EmailRenderer<T> {
    /// Renderer delivering through `transport`.
    pub fn with_transport(transport: T, options: RenderOptions) -> Self {
        Self { transport, options }
    }

    /// The configured transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the payload under a run directory stamped with the current time.
    pub fn build(&self, report: &Report, output_root: &Path) -> Result<BuiltEmail> {
        self.build_at(report, output_root, super::now())
    }

    /// Build the payload under a run directory stamped with `at`. Nothing is sent.
    pub fn build_at(
        &self,
        report: &Report,
        output_root: &Path,
        at: NaiveDateTime,
    ) -> Result<BuiltEmail> {
        let run = RunDirectory::create(output_root, report.name(), at)?;
        let keyed = report.uniquely_keyed_items();

        let mut issuer = IdIssuer::new();
        let mut parts = Parts::default();
        let mut blocks = Vec::with_capacity(keyed.len());
        for entry in &keyed.items {
            tracing::debug!(
                "rendering {} item `{}` for email as {}",
                entry.item.kind().variant_name(),
                entry.item.name(),
                entry.lookup_key
            );
            let ids = issuer.issue(&entry.lookup_key);
            let element = self.dispatch(&run, &ids, entry.item, &mut parts)?;
            blocks.push(ItemBlock::new(&entry.lookup_key, &ids, entry.item, element));
        }

        let payload = EmailPayload {
            html: render_email_body(&blocks),
            images: parts.images,
            attachments: parts.attachments,
        };
        tracing::info!(
            "built email for `{}`: {} inline images, {} attachments",
            report.name(),
            payload.images.len(),
            payload.attachments.len()
        );
        Ok(BuiltEmail {
            run_dir: run.path().to_path_buf(),
            payload,
            collisions: keyed.collisions,
        })
    }

    /// Build with the current time and hand the result to the transport.
    pub fn render(
        &self,
        report: &Report,
        recipients: &[String],
        subject: &str,
        output_root: &Path,
    ) -> Result<Email> {
        self.render_at(report, recipients, subject, output_root, super::now())
    }

    /// Build with timestamp `at` and hand the result to the transport.
    pub fn render_at(
        &self,
        report: &Report,
        recipients: &[String],
        subject: &str,
        output_root: &Path,
        at: NaiveDateTime,
    ) -> Result<Email> {
        let built = self.build_at(report, output_root, at)?;
        let email = Email {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            payload: built.payload,
            run_dir: built.run_dir,
        };
        self.transport.send(&email)?;
        tracing::info!("sent `{}` to {} recipients", email.subject, email.recipients.len());
        Ok(email)
    }

    fn dispatch(
        &self,
        run: &RunDirectory,
        ids: &ItemIds,
        item: &ReportItem,
        parts: &mut Parts,
    ) -> Result<Element> {
        let element = match item.kind() {
            ItemKind::Table(data)
            | ItemKind::Heatmap(data)
            | ItemKind::InteractiveTable(data)
            | ItemKind::InteractivePlot(data)
            | ItemKind::TableExplorer(data) => Element::Table(shapes::display_table(data)),
            ItemKind::LineGraph(data)
            | ItemKind::Graph {
                data,
                mode: GraphMode::Line,
            } => {
                let chart = LineChart::from_table(data);
                let png = run.files().join(format!("{}.png", ids.stem));
                chart.write_png(&png, item.name(), self.options.chart_size)?;
                Element::Chart {
                    src: parts.inline(png, ids),
                    legend: chart.legend(),
                }
            }
            ItemKind::Graph {
                data,
                mode: GraphMode::Stacked,
            } => {
                let chart = StackedChart::from_table(data);
                let png = run.files().join(format!("{}.png", ids.stem));
                chart.write_png(&png, item.name(), self.options.chart_size)?;
                Element::Chart {
                    src: parts.inline(png, ids),
                    legend: chart.legend(),
                }
            }
            ItemKind::Text { body, markup } => Element::Text {
                body: body.clone(),
                markup: *markup,
            },
            ItemKind::File(source) | ItemKind::Image(source) => {
                attach_or_inline(run, ids, item, source, parts)?
            }
            ItemKind::Widget { .. } => {
                return Err(ReportError::UnhandledVariant {
                    variant: item.kind().variant_name().to_string(),
                    item: item.name().to_string(),
                    renderer: "email",
                });
            }
        };
        Ok(element)
    }
}

#[derive(Default)]
struct Parts {
    images: Vec<InlineImage>,
    attachments: Vec<PathBuf>,
}

impl Parts {
    fn inline(&mut self, filename: PathBuf, ids: &ItemIds) -> String {
        let cid = ids.id.clone();
        let src = format!("cid:{cid}");
        self.images.push(InlineImage { filename, cid });
        src
    }
}

// Decided by the copy's content, not its extension.
fn attach_or_inline(
    run: &RunDirectory,
    ids: &ItemIds,
    item: &ReportItem,
    source: &FileSource,
    parts: &mut Parts,
) -> Result<Element> {
    let copy = source.copy_to(run.files(), &ids.stem)?;
    if is_image(&copy)? {
        Ok(Element::Image {
            src: parts.inline(copy, ids),
            alt: item.name().to_string(),
        })
    } else {
        parts.attachments.push(copy);
        Ok(Element::Attachment {
            name: item.name().to_string(),
        })
    }
}

fn is_image(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(image::guess_format(&head).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileInput;
    use crate::table::DataTable;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::io::Cursor;
    use tempfile::TempDir;

    // Smallest valid PNG signature plus IHDR start; enough for sniffing.
    const PNG_HEAD: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13, b'I', b'H', b'D', b'R',
    ];

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap()
    }

    fn data() -> DataTable {
        let mut table = DataTable::new("date", ["a", "b"]);
        table.push_row("2024-01-02", [1.0, -1.0]).unwrap();
        table.push_row("2024-01-03", [2.0, 0.5]).unwrap();
        table
    }

    fn renderer() -> EmailRenderer {
        EmailRenderer::new(RenderOptions::default())
    }

    fn stream(bytes: &[u8], name: &str) -> FileInput {
        FileInput::named_stream(Cursor::new(bytes.to_vec()), name)
    }

    #[test]
    fn images_are_inlined_and_other_files_attached() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail").with_unique_key("M");
        // extension says text, bytes say PNG
        report.add_item(ReportItem::file("Logo", "", stream(PNG_HEAD, "logo.txt"), None).unwrap());
        report.add_item(ReportItem::file("Notes", "", stream(b"plain notes", "notes.txt"), None).unwrap());

        let built = renderer().build_at(&report, temp.path(), at()).expect("build");

        assert_eq!(built.payload.images.len(), 1);
        assert_eq!(built.payload.images[0].cid, "M_Logo_0");
        assert!(built.payload.html.contains(r#"src="cid:M_Logo_0""#));

        assert_eq!(built.payload.attachments, vec![built.run_dir.join("Files").join("M_Notes_0.txt")]);
        assert!(built.payload.html.contains("See attached file named Notes"));
    }

    #[test]
    fn non_image_image_items_join_the_attachment_list() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::image("Chart", "", stream(b"not really", "chart.dat"), None).unwrap());

        let built = renderer().build_at(&report, temp.path(), at()).expect("build");
        assert!(built.payload.images.is_empty());
        assert_eq!(built.payload.attachments.len(), 1);
    }

    #[test]
    fn charts_are_rasterised_and_referenced_by_cid() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::graph("Stack", "", data(), GraphMode::Stacked));
        report.add_item(ReportItem::line_graph("Line/1", "", data()));

        let built = renderer().build_at(&report, temp.path(), at()).expect("build");
        let cids: Vec<&str> = built.payload.images.iter().map(|i| i.cid.as_str()).collect();
        assert_eq!(cids, vec!["Mail_Stack_0", "Mail_Line_1_0"]);
        for image in &built.payload.images {
            assert!(image.filename.is_file());
            assert!(image.cid.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn keys_that_sanitise_alike_get_distinct_cids() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail").with_unique_key("M");
        report.add_item(ReportItem::graph("Sales Q1", "", data(), GraphMode::Stacked));
        report.add_item(ReportItem::graph("Sales-Q1", "", data(), GraphMode::Stacked));
        report.add_item(ReportItem::file("a/b", "", stream(PNG_HEAD, "a.png"), None).unwrap());
        report.add_item(ReportItem::file("a_b", "", stream(PNG_HEAD, "b.png"), None).unwrap());

        let built = renderer().build_at(&report, temp.path(), at()).expect("build");
        let cids: Vec<&str> = built.payload.images.iter().map(|i| i.cid.as_str()).collect();
        assert_eq!(cids, vec!["M_Sales_Q1_0", "M_Sales_Q1_0_1", "M_a_b_0", "M_a_b_0_1"]);
        assert!(built.payload.html.contains(r#"src="cid:M_Sales_Q1_0_1""#));

        let files = built.run_dir.join("Files");
        assert!(files.join("M_a_b_0.png").is_file());
        assert!(files.join("M_a_b_0_1.png").is_file());
    }

    #[test]
    fn widgets_and_tables_fall_back_to_static_tables() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::heatmap("Heat", "", data()));
        report.add_item(ReportItem::table_explorer("Explore", "", data()));

        let built = renderer().build_at(&report, temp.path(), at()).expect("build");
        assert_eq!(built.payload.html.matches("<table").count(), 2);
        assert!(built.payload.images.is_empty());
    }

    #[test]
    fn custom_widgets_are_unhandled() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::widget("Gauge", "", "GaugeWidget", serde_json::json!({})));

        let err = renderer().build_at(&report, temp.path(), at()).unwrap_err();
        assert!(matches!(err, ReportError::UnhandledVariant { renderer: "email", .. }));
    }

    #[test]
    fn default_transport_fails_after_building() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::text("Hello", "hi"));

        let err = renderer()
            .render_at(&report, &["a@example.com".to_string()], "Subject", temp.path(), at())
            .unwrap_err();
        assert!(matches!(err, ReportError::NoTransport));
        assert!(temp.path().join("Mail").join("20240501_083000").is_dir());
    }

    #[test]
    fn injected_transport_receives_the_email() {
        let temp = TempDir::new().expect("temp dir");
        let mut report = Report::new("Mail");
        report.add_item(ReportItem::text("Hello", "hi there").with_description("greeting"));

        let seen = RefCell::new(Vec::new());
        let transport = |email: &Email| -> Result<()> {
            seen.borrow_mut().push(email.clone());
            Ok(())
        };
        let renderer = EmailRenderer::with_transport(transport, RenderOptions::default());
        let email = renderer
            .render_at(&report, &["a@example.com".to_string()], "Weekly", temp.path(), at())
            .expect("render");

        let seen = seen.into_inner();
        assert_eq!(seen, vec![email]);
        assert_eq!(seen[0].subject, "Weekly");
        assert!(seen[0].payload.html.contains("hi there"));
        assert!(seen[0].payload.html.contains("greeting"));
    }

    #[test]
    fn transport_errors_propagate() {
        let temp = TempDir::new().expect("temp dir");
        let report = Report::new("Mail");
        let failing = |_: &Email| -> Result<()> { Err(ReportError::transport("smtp down")) };

        let err = EmailRenderer::with_transport(failing, RenderOptions::default())
            .render_at(&report, &[], "s", temp.path(), at())
            .unwrap_err();
        assert!(matches!(err, ReportError::Transport(_)));
        assert!(err.to_string().contains("smtp down"));
    }
}
