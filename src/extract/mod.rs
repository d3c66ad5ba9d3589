//! Pure markup extraction.
//!
//! Every field extractor is independent: a missing label, an empty table, or
//! unexpected structure yields an absent field, never an error. Inputs are
//! parsed snapshots; nothing here touches the live page.

pub mod case;
pub mod contractor;

use scraper::{ElementRef, Html, Selector};

pub use case::{extract_case_cards, filter_retained};
pub use contractor::extract_contractor_detail;

/// Collected, trimmed text of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First whitespace-delimited token of a raw field, used where a code is
/// followed by descriptive text in the same cell.
pub(crate) fn first_token(raw: &str) -> String {
    raw.split_whitespace().next().unwrap_or("").to_string()
}

/// Label-based lookup: find a `<label>` whose text contains `label`
/// (case-insensitive), then read the first element sibling that follows the
/// label's parent. Mirrors the sites' label/value markup where the value
/// node is the parent's adjacent structural sibling.
pub(crate) fn text_by_label(doc: &Html, label: &str) -> Option<String> {
    let selector = Selector::parse("label").ok()?;
    let needle = label.to_lowercase();
    for lbl in doc.select(&selector) {
        if !text_of(lbl).to_lowercase().contains(&needle) {
            continue;
        }
        let Some(parent) = lbl.parent() else {
            continue;
        };
        let mut sibling = parent.next_sibling();
        while let Some(node) = sibling {
            if let Some(el) = ElementRef::wrap(node) {
                let value = text_of(el);
                return if value.is_empty() { None } else { Some(value) };
            }
            sibling = node.next_sibling();
        }
    }
    None
}

/// Locate a section heading by known text (case-insensitive substring on
/// `heading_tag` elements), then the first `<table>` among its following
/// siblings.
pub(crate) fn table_after_heading<'a>(
    doc: &'a Html,
    heading_tag: &str,
    heading_text: &str,
) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(heading_tag).ok()?;
    let needle = heading_text.to_lowercase();
    for heading in doc.select(&selector) {
        if !text_of(heading).to_lowercase().contains(&needle) {
            continue;
        }
        let mut sibling = heading.next_sibling();
        while let Some(node) = sibling {
            if let Some(el) = ElementRef::wrap(node) {
                if el.value().name() == "table" {
                    return Some(el);
                }
            }
            sibling = node.next_sibling();
        }
    }
    None
}

/// Data rows of a table with the header row skipped, mapped to their cell
/// texts. Rows with fewer than `min_cols` cells are dropped, not errored.
pub(crate) fn table_rows(table: ElementRef<'_>, min_cols: usize) -> Vec<Vec<String>> {
    let (Ok(tr), Ok(td)) = (Selector::parse("tr"), Selector::parse("td")) else {
        return Vec::new();
    };
    table
        .select(&tr)
        .skip(1) // header row
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&td).map(text_of).collect();
            (cells.len() >= min_cols).then_some(cells)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_by_label_reads_adjacent_sibling() {
        let doc = Html::parse_document(
            r#"<div><span><label>Registration #</label></span>
               <span>OMAKMS123AB</span></div>"#,
        );
        assert_eq!(
            text_by_label(&doc, "registration #").as_deref(),
            Some("OMAKMS123AB")
        );
    }

    #[test]
    fn test_text_by_label_missing_is_none() {
        let doc = Html::parse_document("<div><label>Other Field</label></div>");
        assert!(text_by_label(&doc, "Registration #").is_none());
    }

    #[test]
    fn test_table_after_heading_skips_non_table_siblings() {
        let doc = Html::parse_document(
            r#"<div><h4>Bond Information</h4><p>note</p>
               <table><tr><th>h</th></tr><tr><td>a</td></tr></table></div>"#,
        );
        let table = table_after_heading(&doc, "h4", "bond information").unwrap();
        assert_eq!(table.value().name(), "table");
    }

    #[test]
    fn test_table_rows_skips_header_and_short_rows() {
        let doc = Html::parse_document(
            r#"<table>
                 <tr><th>Company</th><th>Number</th><th>Amount</th></tr>
                 <tr><td>A</td><td>1</td><td>$100</td></tr>
                 <tr><td>short</td></tr>
                 <tr><td>B</td><td>2</td><td>$200</td></tr>
               </table>"#,
        );
        let table_sel = Selector::parse("table").unwrap();
        let table = doc.select(&table_sel).next().unwrap();
        let rows = table_rows(table, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["A", "1", "$100"]);
        assert_eq!(rows[1], vec!["B", "2", "$200"]);
    }

    #[test]
    fn test_first_token() {
        assert_eq!(first_token("1A123456 DUI ARRAIGNMENT"), "1A123456");
        assert_eq!(first_token("  "), "");
    }
}
