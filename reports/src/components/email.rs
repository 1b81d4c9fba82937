//! Email body fragment

use leptos::prelude::*;

use super::ItemBlockView;
use crate::render::ItemBlock;
use crate::styles::EMAIL_CSS;

/// All item blocks, labels hidden, wrapped in one container.
#[component]
pub fn EmailBody(blocks: Vec<ItemBlock>) -> impl IntoView {
    view! {
        <div class="report-email">
            <style>{EMAIL_CSS}</style>
            {blocks
                .into_iter()
                .map(|block| view! { <ItemBlockView block=block show_labels=false /> })
                .collect::<Vec<_>>()}
        </div>
    }
}
