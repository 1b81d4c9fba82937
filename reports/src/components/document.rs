//! Root document component - the complete local HTML page.
//!
//! Browser assets are only referenced when some item needs them: the
//! plotting library for line plots, the widget bundle for widget mounts.

use leptos::prelude::*;

use super::{ItemBlockView, LabelChips, PLOT_BOOTSTRAP, WIDGET_BOOTSTRAP};
use crate::render::{ItemBlock, WidgetAssets};
use crate::styles::REPORT_CSS;

/// The complete HTML document for a local report.
#[component]
pub fn ReportDocument(
    report_name: String,
    labels: Vec<String>,
    blocks: Vec<ItemBlock>,
    assets: WidgetAssets,
) -> impl IntoView {
    let title = format!("{report_name} (Local Report Render)");
    let needs_plots = blocks.iter().any(|b| b.element.needs_plot_library());
    let needs_widgets = blocks.iter().any(|b| b.element.needs_widget_bundle());
    let bundle_css = assets.widget_bundle_css.clone().filter(|_| needs_widgets);
    let bundle_js = assets.widget_bundle_js.clone().filter(|_| needs_widgets);

    view! {
        <html lang="en">
            <head>
                <meta charset="UTF-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{title}</title>
                <style>{REPORT_CSS}</style>
                {bundle_css.map(|href| view! { <link rel="stylesheet" href=href /> })}
            </head>
            <body>
                <main class="report">
                    <header class="report-header">
                        <h1>{report_name}</h1>
                        {(!labels.is_empty()).then(|| view! { <LabelChips labels=labels /> })}
                    </header>
                    {blocks
                        .into_iter()
                        .map(|block| view! { <ItemBlockView block=block /> })
                        .collect::<Vec<_>>()}
                </main>

                {needs_plots.then(|| view! {
                    <script src=assets.plot_library.clone()></script>
                    <script inner_html=PLOT_BOOTSTRAP></script>
                })}
                {bundle_js.map(|src| view! {
                    <script src=src></script>
                    <script inner_html=WIDGET_BOOTSTRAP></script>
                })}
            </body>
        </html>
    }
}
