//! Flattens the group-keyed extraction payload into ordered page records

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use super::types::{ElementBox, ElementKind, ElementTag, PageContent, SelectableElement, TableElement};
use crate::service::{RawElement, RawGroup, RawPageContentResponse};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed page content response: {message}")]
    Malformed { message: String },
}

impl NormalizeError {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Normalize a raw payload into page records sorted by page number.
///
/// Only a payload whose success flag is false is malformed. A successful
/// payload with no page descriptors yields an empty list; unreadable groups
/// and elements without a usable page number are dropped with a warning. Two descriptors with the
/// same page number resolve to the one encountered last.
pub fn normalize(raw: &RawPageContentResponse) -> Result<Vec<PageContent>, NormalizeError> {
    if !raw.success {
        return Err(NormalizeError::malformed(
            raw.message
                .clone()
                .unwrap_or_else(|| "success flag is false".to_string()),
        ));
    }

    let mut pages: BTreeMap<u32, PageContent> = BTreeMap::new();

    for (group_id, value) in &raw.data {
        let group: RawGroup = match serde_json::from_value(value.clone()) {
            Ok(group) => group,
            Err(e) => {
                warn!("Group '{group_id}' is unreadable, skipping it: {e}");
                continue;
            }
        };

        if !group.kv.is_empty() {
            debug!(
                "Group '{group_id}': ignoring {} key-value entries",
                group.kv.len()
            );
        }

        report_orphans(group_id, &group);

        for descriptor in &group.pages {
            let page_num = descriptor.page_num;
            if page_num == 0 {
                warn!("Group '{group_id}': skipping page descriptor with page number 0");
                continue;
            }

            let elements = collect_elements(group_id, &group, page_num);
            let record = PageContent {
                page_num,
                raw_binary: descriptor.raw_binary.clone(),
                metadata: descriptor.metadata.clone(),
                elements,
            };

            if pages.insert(page_num, record).is_some() {
                warn!(
                    "Duplicate page number {page_num} (group '{group_id}'), keeping the later record"
                );
            }
        }
    }

    debug!("Normalized {} pages", pages.len());
    Ok(pages.into_values().collect())
}

fn collect_elements(group_id: &str, group: &RawGroup, page_num: u32) -> Vec<SelectableElement> {
    let collections = [
        (ElementTag::Text, &group.text),
        (ElementTag::Table, &group.table),
        (ElementTag::Cell, &group.cell),
    ];

    collections
        .into_iter()
        .flat_map(|(tag, raw)| {
            raw.iter()
                .enumerate()
                .filter(move |(_, e)| e.page_num() == Some(page_num))
                .map(move |(idx, e)| convert_element(group_id, tag, idx, page_num, e))
        })
        .collect()
}

fn report_orphans(group_id: &str, group: &RawGroup) {
    let elements = || [&group.text, &group.table, &group.cell].into_iter().flatten();

    let unpaged = elements().filter(|e| e.page_num().is_none()).count();
    let orphaned = elements()
        .filter_map(RawElement::page_num)
        .filter(|&n| !group.pages.iter().any(|p| p.page_num == n))
        .count();

    if unpaged > 0 {
        warn!("Group '{group_id}': dropping {unpaged} elements without a usable page number");
    }
    if orphaned > 0 {
        warn!("Group '{group_id}': dropping {orphaned} elements with no matching page descriptor");
    }
}

fn convert_element(
    group_id: &str,
    tag: ElementTag,
    idx: usize,
    page_num: u32,
    raw: &RawElement,
) -> SelectableElement {
    let id = match &raw.id {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{group_id}-{}-{idx}", tag.as_str()),
    };

    let edge = |v: Option<f64>| v.unwrap_or(0.0);
    let mut bbox = ElementBox::new(edge(raw.top), edge(raw.left), edge(raw.bottom), edge(raw.right));
    if !bbox.is_ordered() {
        warn!("Element '{id}' has inverted edges, reordering");
        bbox = bbox.ordered();
    }

    let kind = match tag {
        ElementTag::Text => ElementKind::Text {
            text: raw.text.clone().unwrap_or_default(),
            word_positions: opaque_string(raw.word_positions.as_ref()),
        },
        ElementTag::Table => ElementKind::Table(TableElement {
            num_cols: raw.num_cols.unwrap_or(0),
            num_rows: raw.num_rows.unwrap_or(0),
            last_header_row: raw.last_header_row.unwrap_or(-1),
            last_header_col: raw.last_header_col.unwrap_or(-1),
            caption: raw.caption.clone(),
            label: raw.label.clone().unwrap_or_default(),
            cell_matrix: raw.cell_matrix.clone().unwrap_or(Value::Null),
        }),
        ElementTag::Cell => ElementKind::Cell {
            text: raw.text.clone().unwrap_or_default(),
        },
    };

    SelectableElement {
        id,
        page: page_num,
        bbox,
        kind,
    }
}

fn opaque_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(data: Value) -> RawPageContentResponse {
        serde_json::from_value(json!({ "success": true, "data": data })).unwrap()
    }

    #[test]
    fn orphaned_elements_are_dropped() {
        let raw = response(json!({
            "g1": {
                "pages": [{ "page_num": 3, "raw_binary": "AA==" }],
                "text": [
                    { "id": "a", "page": 3, "top": 1, "left": 1, "bottom": 2, "right": 2, "text": "kept" },
                    { "id": "b", "page": 4, "top": 1, "left": 1, "bottom": 2, "right": 2, "text": "orphan" }
                ]
            }
        }));

        let pages = normalize(&raw).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_num, 3);
        assert_eq!(pages[0].elements.len(), 1);
        assert_eq!(pages[0].elements[0].id, "a");
    }

    #[test]
    fn unsuccessful_payload_is_malformed() {
        let raw: RawPageContentResponse =
            serde_json::from_value(json!({ "success": false, "message": "boom" })).unwrap();
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::Malformed {
                message: "boom".to_string()
            })
        );
    }

    #[test]
    fn empty_success_is_not_an_error() {
        assert!(normalize(&response(json!({}))).unwrap().is_empty());
        assert!(
            normalize(&response(json!({ "g": { "text": [] } })))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn output_is_sorted_across_groups() {
        let raw = response(json!({
            "b": { "pages": [{ "page_num": 5 }, { "page_num": 2 }] },
            "a": { "pages": [{ "page_num": 9 }, { "page_num": 1 }] }
        }));

        let nums: Vec<u32> = normalize(&raw).unwrap().iter().map(|p| p.page_num).collect();
        assert_eq!(nums, vec![1, 2, 5, 9]);
    }

    #[test]
    fn later_duplicate_wins() {
        let raw = response(json!({
            "first": { "pages": [{ "page_num": 1, "metadata": { "src": "first" } }] },
            "second": { "pages": [{ "page_num": 1, "metadata": { "src": "second" } }] }
        }));

        let pages = normalize(&raw).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].metadata["src"], "second");
    }

    #[test]
    fn variants_are_tagged_by_collection() {
        let raw = response(json!({
            "g": {
                "pages": [{ "page_num": 1 }],
                "text": [{ "id": "t", "page": 1, "text": "hello", "word_positions": [[0, 5]] }],
                "table": [{
                    "id": "tb", "page": 1, "num_cols": 2, "num_rows": 1,
                    "last_header_row": 0, "last_header_col": -1,
                    "label": "Table 1", "cell_matrix": "[[\"a\",\"b\"]]"
                }],
                "cell": [{ "id": 17, "page": 1, "text": "a" }],
                "kv": [{ "key": "total", "value": "1" }]
            }
        }));

        let pages = normalize(&raw).unwrap();
        let tags: Vec<ElementTag> = pages[0].elements.iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec![ElementTag::Text, ElementTag::Table, ElementTag::Cell]);

        match &pages[0].elements[0].kind {
            ElementKind::Text { word_positions, .. } => assert_eq!(word_positions, "[[0,5]]"),
            other => panic!("unexpected {other:?}"),
        }
        match &pages[0].elements[1].kind {
            ElementKind::Table(table) => {
                assert_eq!(table.label, "Table 1");
                assert_eq!(table.caption, None);
                assert_eq!(table.grid().unwrap().rows, vec![vec!["a", "b"]]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(pages[0].elements[2].id, "17");
    }

    #[test]
    fn missing_ids_are_synthesized_and_unique() {
        let raw = response(json!({
            "g": {
                "pages": [{ "page_num": 1 }],
                "text": [{ "page": 1 }, { "page": 1 }]
            }
        }));

        let pages = normalize(&raw).unwrap();
        assert_eq!(pages[0].elements[0].id, "g-text-0");
        assert_eq!(pages[0].elements[1].id, "g-text-1");
    }

    #[test]
    fn every_element_belongs_to_its_page() {
        let raw = response(json!({
            "g": {
                "pages": [{ "page_num": 1 }, { "page_num": 2 }],
                "text": [{ "page": 2 }, { "page": 1 }, { "page": 2 }],
                "cell": [{ "page": 1 }]
            }
        }));

        for page in normalize(&raw).unwrap() {
            assert!(page.elements.iter().all(|e| e.page == page.page_num));
        }
    }

    #[test]
    fn inverted_boxes_are_reordered_and_degenerate_ones_kept() {
        let raw = response(json!({
            "g": {
                "pages": [{ "page_num": 1 }],
                "text": [
                    { "id": "inv", "page": 1, "top": 20, "left": 30, "bottom": 10, "right": 5 },
                    { "id": "dot", "page": 1, "top": 4, "left": 4, "bottom": 4, "right": 4 }
                ]
            }
        }));

        let pages = normalize(&raw).unwrap();
        let inv = pages[0].element("inv").unwrap();
        assert_eq!(inv.bbox, ElementBox::new(10.0, 5.0, 20.0, 30.0));
        assert!(pages[0].element("dot").unwrap().bbox.is_degenerate());
    }

    #[test]
    fn unreadable_group_is_skipped() {
        let raw = response(json!({
            "bad": { "pages": "nope" },
            "good": { "pages": [{ "page_num": 4 }] }
        }));

        let pages = normalize(&raw).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_num, 4);
    }

    #[test]
    fn elements_without_usable_page_are_dropped() {
        let raw = response(json!({
            "g": {
                "pages": [{ "page_num": 1 }, { "page_num": 3 }],
                "text": [
                    { "id": "ok", "page": 1 },
                    { "id": "null", "page": null },
                    { "id": "missing" },
                    { "id": "word", "page": "one" },
                    { "id": "neg", "page": -1 },
                    { "id": "half", "page": 1.5 }
                ],
                "cell": [{ "id": "whole", "page": 3.0, "top": null, "left": 2.5, "bottom": 1, "right": 9 }]
            }
        }));

        let pages = normalize(&raw).unwrap();
        assert_eq!(pages.len(), 2);
        let ids: Vec<&str> = pages[0].elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);

        let whole = pages[1].element("whole").unwrap();
        assert_eq!(whole.page, 3);
        assert_eq!(whole.bbox.top, 0.0);
        assert_eq!(whole.bbox.left, 2.5);
    }
}
