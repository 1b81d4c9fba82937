//! Stateless reshaping of [`DataTable`]s into the payloads each front end expects.
//!
//! - [`display_table`] - index column plus one column per data column
//! - [`line_figure`] - plotting-library figure spec, one trace per column
//! - [`heatmap_rows`] / [`table_explorer_rows`] - row-major arrays with a header row
//! - [`interactive_table`] - headers plus one mapping per row
//! - [`plot_traces`] - named `{name, x, y}` traces

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::table::{Cell, DataTable};

/// Line colours for browser plots, cycled by column.
pub const LINE_PALETTE: [&str; 6] = ["#3288bd", "#99d594", "#e6f598", "#fee08b", "#fc8d59", "#d53e4f"];

/// Header used for the heatmap index column when the index is unnamed.
pub const DEFAULT_INDEX_HEADER: &str = "date";

/// Static table ready for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TableView {
    /// Index column header followed by data column headers
    pub headers: Vec<String>,
    /// Formatted cells, index label first
    pub rows: Vec<Vec<String>>,
}

/// Display table: index column first, then every data column.
pub fn display_table(data: &DataTable) -> TableView {
    let headers = std::iter::once(data.index_name().to_string())
        .chain(data.columns().iter().cloned())
        .collect();
    let rows = data
        .iter_rows()
        .map(|(label, cells)| {
            std::iter::once(label.to_string())
                .chain(cells.iter().map(Cell::to_string))
                .collect()
        })
        .collect();
    TableView { headers, rows }
}

/// Plotting-library figure: `data` traces plus `layout`.
#[derive(Clone, Debug, Serialize)]
pub struct LineFigure {
    /// One trace per data column
    pub data: Vec<LineTrace>,
    /// Axis, title and legend settings
    pub layout: Value,
}

/// One line of a [`LineFigure`].
#[derive(Clone, Debug, Serialize)]
pub struct LineTrace {
    /// Always `scatter`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Always `lines`
    pub mode: &'static str,
    /// Column name, shown in the legend
    pub name: String,
    /// Index labels
    pub x: Vec<String>,
    /// Column values
    pub y: Vec<Cell>,
    /// `{ "color": ... }`
    pub line: Value,
}

/// Time-series line figure: one trace per column, colours cycling
/// [`LINE_PALETTE`], legend pinned top-left.
pub fn line_figure(data: &DataTable, title: &str) -> LineFigure {
    let traces = data
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| LineTrace {
            kind: "scatter",
            mode: "lines",
            name: column.clone(),
            x: data.index().to_vec(),
            y: data.column(idx).cloned().collect(),
            line: serde_json::json!({ "color": LINE_PALETTE[idx % LINE_PALETTE.len()] }),
        })
        .collect();

    let layout = serde_json::json!({
        "title": { "text": title },
        "xaxis": {
            "type": axis_type(data.index()),
            "title": { "text": data.index_name() },
            "gridcolor": "rgba(128,128,128,0.3)",
        },
        "yaxis": {
            "title": { "text": "VALUE" },
            "gridcolor": "rgba(128,128,128,0.3)",
        },
        "showlegend": true,
        "legend": { "x": 0, "y": 1, "xanchor": "left", "yanchor": "top" },
    });

    LineFigure { data: traces, layout }
}

/// `date` when every index label is a date or timestamp, `linear` when all
/// are numbers, `category` otherwise.
pub fn axis_type(labels: &[String]) -> &'static str {
    if labels.is_empty() {
        return "linear";
    }
    if labels.iter().all(|label| is_date_like(label)) {
        "date"
    } else if labels.iter().all(|label| label.trim().parse::<f64>().is_ok()) {
        "linear"
    } else {
        "category"
    }
}

fn is_date_like(label: &str) -> bool {
    let label = label.trim();
    NaiveDate::parse_from_str(label, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(label, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(label, "%Y-%m-%dT%H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(label).is_ok()
}

/// Heatmap payload: `[[index_header, cols...], [label, values...], ...]`.
pub fn heatmap_rows(data: &DataTable) -> Vec<Vec<Value>> {
    let index_header = if data.index_name().is_empty() {
        DEFAULT_INDEX_HEADER
    } else {
        data.index_name()
    };
    let header = std::iter::once(Value::from(index_header))
        .chain(data.columns().iter().map(|c| Value::from(c.as_str())))
        .collect();

    std::iter::once(header)
        .chain(data.iter_rows().map(|(label, cells)| {
            std::iter::once(Value::from(label))
                .chain(cells.iter().map(cell_value))
                .collect()
        }))
        .collect()
}

/// Table explorer payload: `[[cols...], [values...], ...]`, no index.
pub fn table_explorer_rows(data: &DataTable) -> Vec<Vec<Value>> {
    let header = data.columns().iter().map(|c| Value::from(c.as_str())).collect();
    std::iter::once(header)
        .chain(data.rows().iter().map(|row| row.iter().map(cell_value).collect()))
        .collect()
}

/// Interactive table payload.
#[derive(Clone, Debug, Serialize)]
pub struct InteractiveTableProps {
    /// Data column names
    pub headers: Vec<String>,
    /// One `column -> value` mapping per row, column order kept
    pub data: Vec<Map<String, Value>>,
}

/// Headers plus one mapping per row. The index is not included.
pub fn interactive_table(data: &DataTable) -> InteractiveTableProps {
    let records = data
        .rows()
        .iter()
        .map(|row| {
            data.columns()
                .iter()
                .cloned()
                .zip(row.iter().map(cell_value))
                .collect::<Map<String, Value>>()
        })
        .collect();
    InteractiveTableProps {
        headers: data.columns().to_vec(),
        data: records,
    }
}

/// One named series for the interactive plot widget.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotTrace {
    /// Column name
    pub name: String,
    /// Index labels
    pub x: Vec<String>,
    /// Column values
    pub y: Vec<Cell>,
}

/// One trace per column, x = index, y = column values.
pub fn plot_traces(data: &DataTable) -> Vec<PlotTrace> {
    data.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| PlotTrace {
            name: column.clone(),
            x: data.index().to_vec(),
            y: data.column(idx).cloned().collect(),
        })
        .collect()
}

fn cell_value(cell: &Cell) -> Value {
    Value::from(cell)
}

/// Serialize for embedding inside a `<script>` element.
///
/// `</` is escaped so the payload cannot terminate the element early.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn prices() -> DataTable {
        let mut table = DataTable::new("date", ["aapl", "goog", "msft"]);
        table.push_row("2024-01-02", [1.0, 2.0, 3.0]).unwrap();
        table.push_row("2024-01-03", [4.0, 5.0, 6.0]).unwrap();
        table
    }

    #[test]
    fn display_table_has_index_column_first() {
        let view = display_table(&prices());
        assert_eq!(view.headers, vec!["date", "aapl", "goog", "msft"]);
        assert_eq!(view.rows[0], vec!["2024-01-02", "1", "2", "3"]);
        assert_eq!(view.rows.len(), 2);
    }

    #[test]
    fn line_figure_has_one_trace_per_column_with_cycling_colours() {
        let mut wide = DataTable::new("t", (0..8).map(|i| format!("c{i}")));
        wide.push_row("1", [0.0; 8]).unwrap();

        let figure = line_figure(&wide, "Wide");
        assert_eq!(figure.data.len(), 8);
        assert_eq!(figure.data[0].line["color"], LINE_PALETTE[0]);
        assert_eq!(figure.data[6].line["color"], LINE_PALETTE[0]);
        assert_eq!(figure.data[7].line["color"], LINE_PALETTE[1]);
        assert_eq!(figure.layout["legend"]["x"], 0);
        assert_eq!(figure.layout["legend"]["y"], 1);
        assert_eq!(figure.layout["title"]["text"], "Wide");
    }

    #[test]
    fn line_figure_for_three_columns() {
        let figure = line_figure(&prices(), "Prices");
        let names: Vec<&str> = figure.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["aapl", "goog", "msft"]);
        assert_eq!(figure.data[1].y, vec![Cell::Number(2.0), Cell::Number(5.0)]);
        assert_eq!(figure.layout["xaxis"]["type"], "date");
        assert_eq!(figure.layout["xaxis"]["title"]["text"], "date");
    }

    #[test]
    fn axis_type_detection() {
        assert_eq!(axis_type(&["2024-01-01".into(), "2024-01-02 10:00:00".into()]), "date");
        assert_eq!(axis_type(&["1".into(), "2.5".into()]), "linear");
        assert_eq!(axis_type(&["a".into(), "2024-01-01".into()]), "category");
    }

    #[test]
    fn heatmap_rows_have_header_and_index() {
        let rows = heatmap_rows(&prices());
        assert_eq!(rows[0], vec![json!("date"), json!("aapl"), json!("goog"), json!("msft")]);
        assert_eq!(rows[1], vec![json!("2024-01-02"), json!(1.0), json!(2.0), json!(3.0)]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn heatmap_falls_back_to_date_header_for_unnamed_index() {
        let mut table = DataTable::new("", ["x"]);
        table.push_row("r", [1.0]).unwrap();
        assert_eq!(heatmap_rows(&table)[0][0], json!("date"));
    }

    #[test]
    fn table_explorer_rows_drop_the_index() {
        let rows = table_explorer_rows(&prices());
        assert_eq!(rows[0], vec![json!("aapl"), json!("goog"), json!("msft")]);
        assert_eq!(rows[2], vec![json!(4.0), json!(5.0), json!(6.0)]);
    }

    #[test]
    fn interactive_table_records_keep_column_order() {
        let props = interactive_table(&prices());
        assert_eq!(props.headers, vec!["aapl", "goog", "msft"]);
        let json = serde_json::to_string(&props.data[0]).unwrap();
        assert_eq!(json, r#"{"aapl":1.0,"goog":2.0,"msft":3.0}"#);
    }

    #[test]
    fn plot_traces_follow_columns() {
        let traces = plot_traces(&prices());
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[2].name, "msft");
        assert_eq!(traces[2].x, vec!["2024-01-02", "2024-01-03"]);
        assert_eq!(traces[2].y, vec![Cell::Number(3.0), Cell::Number(6.0)]);
    }

    #[test]
    fn script_json_cannot_close_the_script_element() {
        let json = script_json(&json!({ "html": "</script><script>alert(1)" })).unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("<\\/script>"));
    }

    #[test]
    fn script_json_reports_unserialisable_values() {
        // JSON object keys must be strings
        let mut keyed = std::collections::BTreeMap::new();
        keyed.insert(vec![1u8], "v");
        let err = script_json(&keyed).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }

    #[test]
    fn cell_values_match_cell_serialisation() {
        let cells = [
            Cell::Number(1.5),
            Cell::Number(f64::NAN),
            Cell::Text("n/a".into()),
            Cell::Empty,
        ];
        let values: Vec<Value> = cells.iter().map(cell_value).collect();
        assert_eq!(values, vec![json!(1.5), Value::Null, json!("n/a"), Value::Null]);
        assert_eq!(serde_json::to_value(&cells).unwrap(), Value::Array(values));
    }
}
