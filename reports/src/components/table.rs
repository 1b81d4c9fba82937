//! Static data table component

use leptos::prelude::*;

use crate::shapes::TableView;

/// Index column followed by one column per data column.
#[component]
pub fn DataTableView(table: TableView) -> impl IntoView {
    let TableView { headers, rows } = table;
    view! {
        <table class="data-table">
            <thead>
                <tr>
                    {headers
                        .into_iter()
                        .enumerate()
                        .map(|(idx, header)| {
                            let class = (idx == 0).then_some("index");
                            view! { <th class=class>{header}</th> }
                        })
                        .collect::<Vec<_>>()}
                </tr>
            </thead>
            <tbody>
                {rows
                    .into_iter()
                    .map(|row| {
                        view! {
                            <tr>
                                {row
                                    .into_iter()
                                    .enumerate()
                                    .map(|(idx, cell)| {
                                        let class = (idx == 0).then_some("index");
                                        view! { <td class=class>{cell}</td> }
                                    })
                                    .collect::<Vec<_>>()}
                            </tr>
                        }
                    })
                    .collect::<Vec<_>>()}
            </tbody>
        </table>
    }
}
