//! Line plot mount and rasterised chart components.

use leptos::prelude::*;

use crate::chart::LegendEntry;

/// Draws every `.report-plot` from its sibling JSON figure spec.
pub const PLOT_BOOTSTRAP: &str = r#"
(() => {
  document.querySelectorAll('.report-plot[data-figure]').forEach(el => {
    const spec = document.getElementById(el.dataset.figure);
    if (!spec || typeof Plotly === 'undefined') return;
    const figure = JSON.parse(spec.textContent);
    Plotly.newPlot(el, figure.data, figure.layout, { responsive: true });
  });
})();
"#;

/// Browser-drawn line plot: container plus JSON figure spec.
#[component]
pub fn LinePlot(div_id: String, figure_json: String) -> impl IntoView {
    let figure_id = format!("{div_id}-figure");
    view! {
        <div class="report-plot" id=div_id data-figure=figure_id.clone()></div>
        <script type="application/json" id=figure_id inner_html=figure_json></script>
    }
}

/// Rasterised chart with an HTML legend.
#[component]
pub fn ChartImage(src: String, legend: Vec<LegendEntry>) -> impl IntoView {
    view! {
        <figure class="report-chart">
            <img src=src alt="chart" />
            <ul class="chart-legend">
                {legend
                    .into_iter()
                    .map(|entry| {
                        let style = format!("background:{}", entry.colour);
                        view! {
                            <li>
                                <span class="swatch" style=style></span>
                                {entry.label}
                            </li>
                        }
                    })
                    .collect::<Vec<_>>()}
            </ul>
        </figure>
    }
}
