//! Court-calendar card extraction.
//!
//! The calendar page renders every assigned case as a result card. The card
//! markup is inconsistent between cases (some have no date cells, some carry
//! extra text after the case number), so every field is pulled
//! independently and the draft keeps whatever was actually present.

use super::{first_token, text_of};
use crate::core::types::{CaseDraft, CaseRecord};
use scraper::{ElementRef, Html, Selector};

/// Result-card container on the calendar page. Also used by the workflow as
/// the marker that the result set has rendered.
pub const CALENDAR_CARD_SELECTOR: &str =
    "div.dw-search-result.std-vertical-med-margin.dw-cal-search-result";

/// Parse every result card found in a rendered calendar page.
pub fn extract_case_cards(html: &str) -> Vec<CaseDraft> {
    let doc = Html::parse_document(html);
    let Ok(cards) = Selector::parse(CALENDAR_CARD_SELECTOR) else {
        return Vec::new();
    };
    doc.select(&cards).map(parse_card).collect()
}

fn parse_card(card: ElementRef<'_>) -> CaseDraft {
    let mut draft = CaseDraft::default();

    // Client name: the last cell of the icon row.
    if let Ok(sel) = Selector::parse("div.dw-icon-row div") {
        if let Some(cell) = card.select(&sel).last() {
            let name = text_of(cell);
            if !name.is_empty() {
                draft.client_name = Some(name);
            }
        }
    }

    draft.appointment_date = parse_appointment_date(card);

    // Labeled item pairs: label cell + data cell per item row.
    let (Ok(items), Ok(label_sel), Ok(data_sel)) = (
        Selector::parse("div.dw-cal-result-item"),
        Selector::parse("div.dw-cal-result-label"),
        Selector::parse("div.dw-cal-result-data"),
    ) else {
        return draft;
    };
    for item in card.select(&items) {
        let Some(label) = item.select(&label_sel).next().map(text_of) else {
            continue;
        };
        let Some(data) = item.select(&data_sel).next().map(text_of) else {
            continue;
        };
        let label = label.trim_matches(|c| c == ':' || c == ' ');
        if label.eq_ignore_ascii_case("Case Number") {
            // The cell mixes the number with trailing hearing text.
            let token = first_token(&data);
            if !token.is_empty() {
                draft.case_number = Some(token);
            }
        } else if label.eq_ignore_ascii_case("Court") && !data.is_empty() {
            draft.court = Some(data);
        }
    }

    draft
}

/// Assemble "MONTH DAY, YEAR" from the three calendar cells; any cell
/// missing leaves the date absent.
fn parse_appointment_date(card: ElementRef<'_>) -> Option<String> {
    let cell = |class: &str| -> Option<String> {
        let sel = Selector::parse(class).ok()?;
        let text = card.select(&sel).next().map(text_of)?;
        (!text.is_empty()).then_some(text)
    };
    let month = cell("div.dw-cal-result-month")?;
    let day = cell("div.dw-cal-result-day")?;
    let year = cell("div.dw-cal-result-year")?;
    Some(format!("{month} {day}, {year}"))
}

/// Keep only complete records assigned to `retained_court` (exact match on
/// the trimmed court text). The calendar lists every court the attorney
/// appears in; only one court's cases belong in the ledger.
pub fn filter_retained(drafts: Vec<CaseDraft>, retained_court: &str) -> Vec<CaseRecord> {
    drafts
        .into_iter()
        .filter_map(CaseDraft::into_record)
        .filter(|rec| rec.court == retained_court)
        .collect()
}
