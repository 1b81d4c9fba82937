//! Per-item block: header, labels, content, description footer.

use leptos::prelude::*;

use super::{ChartImage, DataTableView, LinePlot, WidgetMount};
use crate::item::TextMarkup;
use crate::render::{Element, ItemBlock};

/// One report item.
#[component]
pub fn ItemBlockView(
    block: ItemBlock,
    /// Email bodies hide item labels
    #[prop(default = true)]
    show_labels: bool,
) -> impl IntoView {
    let ItemBlock {
        key,
        id,
        name,
        description,
        labels,
        element,
    } = block;
    let show_labels = show_labels && !labels.is_empty();

    view! {
        <section class="report-item" id=format!("item-{id}") data-key=key>
            <h2>{name}</h2>
            {show_labels.then(|| view! { <LabelChips labels=labels /> })}
            <div class="item-content">
                <ElementView element=element />
            </div>
            {(!description.is_empty()).then(|| view! { <DescriptionFooter description=description /> })}
        </section>
    }
}

/// Free-form labels shown as chips.
#[component]
pub fn LabelChips(labels: Vec<String>) -> impl IntoView {
    view! {
        <ul class="label-chips">
            {labels
                .into_iter()
                .map(|label| view! { <li class="chip">{label}</li> })
                .collect::<Vec<_>>()}
        </ul>
    }
}

/// `Description:` footer followed by a rule.
#[component]
pub fn DescriptionFooter(description: String) -> impl IntoView {
    view! {
        <div class="item-description">
            "Description:"
            <br />
            <span>{description}</span>
            <hr />
        </div>
    }
}

/// Primary content of an item.
#[component]
pub fn ElementView(element: Element) -> impl IntoView {
    match element {
        Element::Table(table) => view! { <DataTableView table=table /> }.into_any(),
        Element::LinePlot { div_id, figure_json } => {
            view! { <LinePlot div_id=div_id figure_json=figure_json /> }.into_any()
        }
        Element::Chart { src, legend } => view! { <ChartImage src=src legend=legend /> }.into_any(),
        Element::Image { src, alt } => view! { <img class="report-image" src=src alt=alt /> }.into_any(),
        Element::Link { href, label } => view! { <a href=href>{label}</a> }.into_any(),
        Element::Attachment { name } => {
            view! { <div>{format!("See attached file named {name}")}</div> }.into_any()
        }
        Element::Text {
            body,
            markup: TextMarkup::Plain,
        } => view! { <div class="report-text">{body}</div> }.into_any(),
        Element::Text {
            body,
            markup: TextMarkup::Html,
        } => view! { <div class="report-html" inner_html=body></div> }.into_any(),
        Element::Widget {
            mount_id,
            component,
            props_json,
        } => view! { <WidgetMount mount_id=mount_id component=component props_json=props_json /> }
            .into_any(),
    }
}
