//! Widget mount points for the external widget bundle.
//!
//! The bundle is expected to expose `window.ReportWidgets[component](el, props)`.

use leptos::prelude::*;

/// Mounts every `[data-widget]` element once the bundle has loaded.
pub const WIDGET_BOOTSTRAP: &str = r#"
(() => {
  const registry = window.ReportWidgets || {};
  document.querySelectorAll('.report-widget[data-widget]').forEach(el => {
    const mount = registry[el.dataset.widget];
    const spec = document.getElementById(el.dataset.props);
    if (typeof mount !== 'function' || !spec) {
      console.warn('report widget not available:', el.dataset.widget);
      return;
    }
    mount(el, JSON.parse(spec.textContent));
  });
})();
"#;

/// Empty container plus its JSON props.
#[component]
pub fn WidgetMount(mount_id: String, component: String, props_json: String) -> impl IntoView {
    let props_id = format!("{mount_id}-props");
    view! {
        <div class="report-widget" id=mount_id data-widget=component data-props=props_id.clone()></div>
        <script type="application/json" id=props_id inner_html=props_json></script>
    }
}
