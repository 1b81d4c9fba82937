//! The report container and its unique-keying algorithm.
//!
//! # Example
//!
//! ```rust
//! use report_render::{Report, ReportItem};
//!
//! let mut report = Report::new("Weekly").with_unique_key("R");
//! report.add_item(ReportItem::text("Sales", "first"));
//! report.add_item(ReportItem::text("Sales", "second"));
//!
//! let keyed = report.uniquely_keyed_items();
//! let keys: Vec<&str> = keyed.items.iter().map(|k| k.lookup_key.as_str()).collect();
//! assert_eq!(keys, ["R_Sales_0", "R_Sales_1"]);
//! assert_eq!(keyed.collisions.len(), 1);
//! ```

use std::collections::HashSet;

use crate::item::ReportItem;

/// Ordered report items plus report-level metadata.
#[derive(Debug)]
pub struct Report {
    name: String,
    unique_key: String,
    items: Vec<ReportItem>,
    labels: Vec<String>,
}

/// An item paired with the lookup key assigned for one render.
#[derive(Debug, Clone)]
pub struct KeyedItem<'a> {
    /// Key unique within this report
    pub lookup_key: String,
    /// The item
    pub item: &'a ReportItem,
}

/// A key collision that was resolved by bumping the numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    /// Name of the item that collided
    pub item_name: String,
    /// Unique key the item declared
    pub declared_key: String,
    /// Key finally assigned
    pub assigned_key: String,
    /// Suffix that was needed (always > 0)
    pub suffix: usize,
}

/// Result of [`Report::uniquely_keyed_items`].
#[derive(Debug)]
pub struct KeyedItems<'a> {
    /// Items in report order with their assigned keys
    pub items: Vec<KeyedItem<'a>>,
    /// One entry per item that needed a suffix above zero
    pub collisions: Vec<KeyCollision>,
}

impl<'a> KeyedItems<'a> {
    /// Number of keyed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the report has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Assigned keys in report order.
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|keyed| keyed.lookup_key.as_str()).collect()
    }
}

impl Report {
    /// Empty report. The unique key defaults to the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            unique_key: name.clone(),
            name,
            items: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Replace the default report key.
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = key.into();
        self
    }

    /// Append one item.
    pub fn add_item(&mut self, item: ReportItem) {
        self.items.push(item);
    }

    /// Append several items, keeping their order.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = ReportItem>) {
        self.items.extend(items);
    }

    /// Append a report label.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// Items in insertion (= rendering) order.
    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    /// Report labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Report name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Report-level key used as the prefix of every lookup key.
    pub fn unique_key(&self) -> &str {
        &self.unique_key
    }

    /// Pair every item with a lookup key `{report_key}_{item_key}_{n}`.
    ///
    /// `n` is the smallest suffix not already issued in this call, so the
    /// n-th duplicate of a base key gets `_n`. Keys are distinct and the
    /// output has one entry per item, in order. Collisions are returned and
    /// logged; they never fail the call.
    pub fn uniquely_keyed_items(&self) -> KeyedItems<'_> {
        let mut issued: HashSet<String> = HashSet::with_capacity(self.items.len());
        let mut items = Vec::with_capacity(self.items.len());
        let mut collisions = Vec::new();

        for item in &self.items {
            let base = format!("{}_{}", self.unique_key, item.unique_key());
            let mut suffix = 0usize;
            let key = loop {
                let candidate = format!("{base}_{suffix}");
                if !issued.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            issued.insert(key.clone());

            if suffix > 0 {
                tracing::warn!(
                    "Duplicate lookup key found for item: {} key: {}. Explicitly include proper \
                     unique keys to avoid ordering fragility for chart versioning.",
                    item.name(),
                    item.unique_key()
                );
                collisions.push(KeyCollision {
                    item_name: item.name().to_string(),
                    declared_key: item.unique_key().to_string(),
                    assigned_key: key.clone(),
                    suffix,
                });
            }
            items.push(KeyedItem {
                lookup_key: key,
                item,
            });
        }

        KeyedItems { items, collisions }
    }

    /// Concatenate the plain-text snippet of every item.
    pub fn render_to_text(&self) -> String {
        self.items.iter().map(ReportItem::text_snippet).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DataTable;

    fn text(name: &str) -> ReportItem {
        ReportItem::text(name, format!("{name} body"))
    }

    fn keys(report: &Report) -> Vec<String> {
        report
            .uniquely_keyed_items()
            .keys()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn empty_report_has_no_keys() {
        let report = Report::new("Empty");
        let keyed = report.uniquely_keyed_items();
        assert!(keyed.is_empty());
        assert!(keyed.collisions.is_empty());
    }

    #[test]
    fn report_key_defaults_to_name() {
        let mut report = Report::new("Daily");
        report.add_item(text("Sales"));
        assert_eq!(keys(&report), ["Daily_Sales_0"]);
    }

    #[test]
    fn duplicate_names_get_increasing_suffixes() {
        let mut report = Report::new("Weekly").with_unique_key("R");
        report.add_item(text("Sales"));
        report.add_item(text("Sales"));

        let keyed = report.uniquely_keyed_items();
        assert_eq!(keyed.keys(), ["R_Sales_0", "R_Sales_1"]);
        assert_eq!(
            keyed.collisions,
            vec![KeyCollision {
                item_name: "Sales".into(),
                declared_key: "Sales".into(),
                assigned_key: "R_Sales_1".into(),
                suffix: 1,
            }]
        );
    }

    #[test]
    fn keys_are_distinct_and_ordered_for_many_duplicates() {
        let mut report = Report::new("R");
        let names = ["a", "b", "a", "a", "c", "b", "a"];
        report.add_items(names.iter().map(|n| text(n)));

        let keyed = report.uniquely_keyed_items();
        assert_eq!(keyed.len(), names.len());

        let unique: HashSet<&str> = keyed.keys().into_iter().collect();
        assert_eq!(unique.len(), names.len());

        for (keyed_item, name) in keyed.items.iter().zip(names) {
            assert_eq!(keyed_item.item.name(), name);
        }
        assert_eq!(keyed.keys()[6], "R_a_3");
        assert_eq!(keyed.collisions.len(), 4);
    }

    #[test]
    fn reordering_a_distinct_item_keeps_the_colliding_pair_suffixes() {
        let mut original = Report::new("R");
        original.add_item(text("Sales").with_description("first"));
        original.add_item(text("Sales").with_description("second"));
        original.add_item(text("Costs"));

        let mut reordered = Report::new("R");
        reordered.add_item(text("Costs"));
        reordered.add_item(text("Sales").with_description("first"));
        reordered.add_item(text("Sales").with_description("second"));

        let before = original.uniquely_keyed_items();
        let after = reordered.uniquely_keyed_items();

        // colliding pair: first Sales keeps _0, second keeps _1
        let sales = |keyed: &KeyedItems<'_>| -> Vec<(String, String)> {
            keyed
                .items
                .iter()
                .filter(|k| k.item.name() == "Sales")
                .map(|k| (k.item.description().to_string(), k.lookup_key.to_string()))
                .collect()
        };
        assert_eq!(sales(&before), sales(&after));
        assert_eq!(sales(&before)[1].1, "R_Sales_1");

        // the distinct item moves to a different slot of the keyed sequence
        assert_eq!(before.keys()[2], "R_Costs_0");
        assert_eq!(after.keys()[0], "R_Costs_0");
        assert_ne!(before.keys(), after.keys());
    }

    #[test]
    fn reordering_duplicates_swaps_which_item_gets_which_suffix() {
        let mut one = Report::new("R");
        one.add_item(text("Sales").with_description("jan"));
        one.add_item(text("Sales").with_description("feb"));

        let mut two = Report::new("R");
        two.add_item(text("Sales").with_description("feb"));
        two.add_item(text("Sales").with_description("jan"));

        let key_of = |report: &Report, desc: &str| {
            report
                .uniquely_keyed_items()
                .items
                .iter()
                .find(|k| k.item.description() == desc)
                .map(|k| k.lookup_key.to_string())
        };
        assert_eq!(key_of(&one, "jan").as_deref(), Some("R_Sales_0"));
        assert_eq!(key_of(&two, "jan").as_deref(), Some("R_Sales_1"));
    }

    #[test]
    fn explicit_keys_avoid_collisions() {
        let mut report = Report::new("R");
        report.add_item(text("Sales").with_unique_key("sales_q1"));
        report.add_item(text("Sales").with_unique_key("sales_q2"));

        let keyed = report.uniquely_keyed_items();
        assert_eq!(keyed.keys(), ["R_sales_q1_0", "R_sales_q2_0"]);
        assert!(keyed.collisions.is_empty());
    }

    #[test]
    fn render_to_text_concatenates_snippets() {
        let mut report = Report::new("R");
        report.add_item(ReportItem::text("a", "alpha "));
        report.add_item(ReportItem::table("t", "beta", DataTable::new("i", ["x"])));
        assert_eq!(report.render_to_text(), "alpha beta");
    }

    #[test]
    fn labels_are_kept() {
        let mut report = Report::new("R");
        report.add_label("Reports/Sample");
        assert_eq!(report.labels(), ["Reports/Sample"]);
    }
}
