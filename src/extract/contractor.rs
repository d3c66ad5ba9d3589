//! Contractor detail-page extraction.
//!
//! The verification site renders scalar fields as label/value pairs and the
//! bond and lawsuit histories as tables under known headings. Sections come
//! and go per contractor; a registration with no lawsuits simply has no
//! lawsuit section, so absence is normal, not an error.

use super::{table_after_heading, table_rows, text_by_label};
use crate::core::types::{Bond, ContractorRecord, Lawsuit};
use scraper::Html;

/// Extract a structured record from one detail page's HTML. Safe to call
/// repeatedly on the same content; every field is independent.
pub fn extract_contractor_detail(html: &str) -> ContractorRecord {
    let doc = Html::parse_document(html);

    let bonds = table_after_heading(&doc, "h4", "Bond Information")
        .map(|table| {
            table_rows(table, 3)
                .into_iter()
                .map(|cells| Bond {
                    company: cells[0].clone(),
                    number: cells[1].clone(),
                    amount: cells[2].clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let lawsuits = table_after_heading(&doc, "h4", "Lawsuits")
        .map(|table| {
            table_rows(table, 4)
                .into_iter()
                .map(|cells| Lawsuit {
                    case_number: cells[0].clone(),
                    county: cells[1].clone(),
                    parties: cells[2].clone(),
                    status: cells[3].clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    ContractorRecord {
        registration_number: text_by_label(&doc, "Registration #"),
        suspension_status: text_by_label(&doc, "License Suspended"),
        insurance_company: text_by_label(&doc, "Insurance Company"),
        insurance_amount: text_by_label(&doc, "Insurance Amount"),
        bonds,
        lawsuits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(label: &str, value: &str) -> String {
        format!("<div><span><label>{label}</label></span><span>{value}</span></div>")
    }

    fn detail_page(with_insurance: bool) -> String {
        let mut html = String::from("<div id=\"layoutContainer\">");
        html.push_str(&labeled("Registration #", "OMAKMS123AB"));
        html.push_str(&labeled("License Suspended", "No"));
        if with_insurance {
            html.push_str(&labeled("Insurance Company", "ACME MUTUAL"));
            html.push_str(&labeled("Insurance Amount", "$1,000,000"));
        }
        html.push_str(
            r#"<h4>Bond Information</h4>
               <table>
                 <tr><th>Bonding Company</th><th>Bond Number</th><th>Amount</th></tr>
                 <tr><td>SURETY ONE</td><td>B-100</td><td>$12,000</td></tr>
                 <tr><td>SURETY TWO</td><td>B-200</td><td>$6,000</td></tr>
               </table>
               <h4>Lawsuits Against Bond</h4>
               <table>
                 <tr><th>Case</th><th>County</th><th>Parties</th><th>Status</th></tr>
                 <tr><td>26-2-00123-1</td><td>OKANOGAN</td><td>DOE v. OMAK</td><td>OPEN</td></tr>
                 <tr><td>incomplete row</td></tr>
               </table>"#,
        );
        html.push_str("</div>");
        html
    }

    #[test]
    fn test_bonds_table_two_data_rows() {
        let record = extract_contractor_detail(&detail_page(true));
        assert_eq!(record.bonds.len(), 2);
        assert_eq!(
            record.bonds[0],
            Bond {
                company: "SURETY ONE".into(),
                number: "B-100".into(),
                amount: "$12,000".into(),
            }
        );
        assert_eq!(record.bonds[1].number, "B-200");
    }

    #[test]
    fn test_lawsuits_short_row_skipped() {
        let record = extract_contractor_detail(&detail_page(true));
        assert_eq!(record.lawsuits.len(), 1);
        assert_eq!(record.lawsuits[0].county, "OKANOGAN");
        assert_eq!(record.lawsuits[0].status, "OPEN");
    }

    #[test]
    fn test_missing_insurance_section_leaves_fields_absent() {
        let record = extract_contractor_detail(&detail_page(false));
        assert!(record.insurance_company.is_none());
        assert!(record.insurance_amount.is_none());
        // Everything else still populated.
        assert_eq!(record.registration_number.as_deref(), Some("OMAKMS123AB"));
        assert_eq!(record.suspension_status.as_deref(), Some("No"));
        assert_eq!(record.bonds.len(), 2);
    }

    #[test]
    fn test_empty_page_yields_empty_record() {
        let record = extract_contractor_detail("<html><body></body></html>");
        assert!(record.registration_number.is_none());
        assert!(record.bonds.is_empty());
        assert!(record.lawsuits.is_empty());
    }

    #[test]
    fn test_repeat_extraction_is_stable() {
        let html = detail_page(true);
        let a = extract_contractor_detail(&html);
        let b = extract_contractor_detail(&html);
        assert_eq!(a.bonds, b.bonds);
        assert_eq!(a.registration_number, b.registration_number);
    }
}
