//! CSS for rendered reports.
//!
//! [`REPORT_CSS`] styles the local page; [`EMAIL_CSS`] is the much smaller
//! sheet embedded in email bodies, where most clients ignore anything fancy.
//!
//! To extend or override styles:
//!
//! ```rust
//! use report_render::styles::REPORT_CSS;
//!
//! let my_css = ".report-item h2 { color: red; }";
//! let combined = format!("{}\n{}", REPORT_CSS, my_css);
//! assert!(combined.contains("--bg-page"));
//! ```

/// Stylesheet for the local `report.html`.
pub const REPORT_CSS: &str = r#"
:root {
    --bg-page: #fafafa;
    --bg-card: #ffffff;
    --bg-head: #f0f0f0;
    --text-main: #1f1f1f;
    --text-dim: #5c5c5c;
    --text-muted: #8a8a8a;
    --border-subtle: rgba(0, 0, 0, 0.08);
    --border-visible: rgba(0, 0, 0, 0.16);
    --font-body: 'Inter', 'Segoe UI', Helvetica, Arial, sans-serif;
    --font-mono: 'JetBrains Mono', 'Fira Code', monospace;
    --container-max: 1280px;
    --accent: #3288bd;
}

*, *::before, *::after {
    box-sizing: border-box;
}

body {
    font-family: var(--font-body);
    background: var(--bg-page);
    color: var(--text-main);
    line-height: 1.5;
    margin: 0;
}

.report {
    max-width: var(--container-max);
    margin: 0 auto;
    padding: 24px;
}

.report-header {
    border-bottom: 1px solid var(--border-visible);
    margin-bottom: 24px;
    padding-bottom: 12px;
}

h1, h2 {
    margin: 0 0 0.3em;
    font-weight: 500;
}

h1 {
    font-size: 22px;
}

h2 {
    font-size: 18px;
}

/* Items */
.report-item {
    background: var(--bg-card);
    border: 1px solid var(--border-subtle);
    border-radius: 6px;
    padding: 16px 20px;
    margin-bottom: 20px;
    overflow-x: auto;
}

.item-content {
    margin: 8px 0;
}

.item-description {
    color: var(--text-dim);
    font-size: 13px;
    margin-top: 12px;
}

.item-description hr {
    width: 100%;
    border: 0;
    border-top: 1px solid var(--border-visible);
}

.label-chips {
    list-style: none;
    display: flex;
    flex-wrap: wrap;
    gap: 6px;
    margin: 4px 0 8px;
    padding: 0;
}

.chip {
    background: var(--bg-head);
    color: var(--text-dim);
    border-radius: 999px;
    font-size: 11px;
    padding: 2px 10px;
}

/* Tables */
table {
    border-collapse: collapse;
    margin: 12px 0;
    font-size: 12px;
}

th, td {
    border: 1px solid var(--border-visible);
    padding: 6px 10px;
    text-align: right;
}

th {
    background: var(--bg-head);
    color: var(--text-dim);
    font-weight: 600;
}

td.index, th.index {
    text-align: left;
    font-family: var(--font-mono);
}

/* Text */
.report-text {
    white-space: pre-wrap;
}

/* Plots, charts, images */
.report-plot {
    width: 100%;
    min-height: 420px;
}

.report-chart img,
.report-image {
    max-width: 100%;
    height: auto;
}

.chart-legend {
    list-style: none;
    display: flex;
    flex-wrap: wrap;
    gap: 14px;
    padding: 0;
    font-size: 12px;
}

.swatch {
    display: inline-block;
    width: 12px;
    height: 12px;
    margin-right: 6px;
    vertical-align: middle;
    border-radius: 2px;
}

/* Widgets */
.report-widget {
    min-height: 120px;
}

.report-widget:empty::before {
    content: attr(data-widget) " widget (bundle not loaded)";
    color: var(--text-muted);
    font-size: 12px;
}
"#;

/// Stylesheet embedded at the top of email bodies.
pub const EMAIL_CSS: &str = r#"
table { border-collapse: collapse; font-size: 12px; }
th, td { border: 1px solid #cccccc; padding: 4px 8px; text-align: right; }
th { background: #f0f0f0; }
td.index, th.index { text-align: left; }
.report-text { white-space: pre-wrap; }
.item-description { color: #5c5c5c; font-size: 13px; }
.swatch { display: inline-block; width: 10px; height: 10px; margin-right: 4px; }
"#;
