//! Leptos SSR components that turn rendered items into HTML.
//!
//! # Component Hierarchy
//!
//! ```text
//! ReportDocument                 (local page)
//! ├── LabelChips                 (report labels)
//! └── ItemBlockView (per item)
//!     ├── LabelChips             (item labels)
//!     ├── ElementView
//!     │   ├── DataTableView
//!     │   ├── LinePlot
//!     │   ├── ChartImage
//!     │   └── WidgetMount
//!     └── DescriptionFooter
//!
//! EmailBody                      (email fragment)
//! └── ItemBlockView (per item, labels hidden)
//! ```
//!
//! The renderers only call [`render_document`] and [`render_email_body`].

mod block;
mod document;
mod email;
mod plot;
mod table;
mod widget;

pub use block::{DescriptionFooter, ElementView, ItemBlockView, LabelChips};
pub use document::ReportDocument;
pub use email::EmailBody;
pub use plot::{ChartImage, LinePlot, PLOT_BOOTSTRAP};
pub use table::DataTableView;
pub use widget::{WIDGET_BOOTSTRAP, WidgetMount};

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;

use crate::render::{ItemBlock, WidgetAssets};

/// Complete local page, including `<!DOCTYPE html>`.
pub fn render_document(
    report_name: &str,
    labels: &[String],
    blocks: &[ItemBlock],
    assets: &WidgetAssets,
) -> String {
    let doc = view! {
        <ReportDocument
            report_name=report_name.to_string()
            labels=labels.to_vec()
            blocks=blocks.to_vec()
            assets=assets.clone()
        />
    };

    // Leptos doesn't include DOCTYPE
    format!("<!DOCTYPE html>\n{}", doc.to_html())
}

/// HTML fragment used as an email body.
pub fn render_email_body(blocks: &[ItemBlock]) -> String {
    view! { <EmailBody blocks=blocks.to_vec() /> }.to_html()
}
