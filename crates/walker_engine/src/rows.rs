use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use walker_core::{normalize_numeric, PageTotal, Record};
use walker_logging::{walker_debug, walker_warn};

use crate::settings::WalkSettings;
use crate::types::{Affordance, ExtractError, PageRead};

/// Maps one table body row to a record.
///
/// The first `leading_cells` cells are control columns and are skipped.
/// Returns `None` when no data cells remain.
pub fn map_row(row: ElementRef<'_>, cell_selector: &Selector, leading_cells: usize) -> Option<Record> {
    let cells: Vec<ElementRef<'_>> = row.select(cell_selector).skip(leading_cells).collect();
    if cells.is_empty() {
        return None;
    }
    Some(Record::from_cells(|i| cells.get(i).map(|cell| cell_text(*cell))))
}

/// Reads every row of the current page. A page whose rows cannot be read
/// yields no records rather than an error.
pub fn extract_rows(document: &Html, settings: &WalkSettings) -> Vec<Record> {
    let (row_sel, cell_sel) = match (
        Selector::parse(&settings.row_selector),
        Selector::parse(&settings.cell_selector),
    ) {
        (Ok(row), Ok(cell)) => (row, cell),
        _ => {
            walker_warn!(
                "Row selectors {:?}/{:?} are invalid; page yields no rows",
                settings.row_selector,
                settings.cell_selector
            );
            return Vec::new();
        }
    };

    let records: Vec<Record> = document
        .select(&row_sel)
        .filter_map(|row| map_row(row, &cell_sel, settings.leading_cells))
        .collect();
    walker_debug!("Read {} rows from this page", records.len());
    records
}

/// Parses a page snapshot into rows, pagination state and a signature.
pub fn read_page(html: &str, settings: &WalkSettings) -> Result<PageRead, ExtractError> {
    let document = Html::parse_document(html);
    let records = extract_rows(&document, settings);
    let next = find_affordance(&document, settings)?;
    let total = settings
        .total_selector
        .as_deref()
        .map_or(PageTotal::Unknown, |sel| read_total(&document, sel));

    Ok(PageRead {
        records,
        next,
        total,
        signature: page_signature(html),
    })
}

fn find_affordance(document: &Html, settings: &WalkSettings) -> Result<Option<Affordance>, ExtractError> {
    let selector =
        Selector::parse(&settings.next_selector).map_err(|_| ExtractError::InvalidSelector {
            selector: settings.next_selector.clone(),
        })?;

    Ok(document.select(&selector).next().map(|el| {
        let element = el.value();
        let disabled = element.classes().any(|c| c == settings.disabled_class)
            || element.attr("disabled").is_some();
        Affordance { disabled }
    }))
}

/// Reads `"<page> of <total>"` style text; anything else is unknown.
fn read_total(document: &Html, selector: &str) -> PageTotal {
    let Ok(sel) = Selector::parse(selector) else {
        return PageTotal::Unknown;
    };
    let Some(text) = document.select(&sel).next().map(cell_text) else {
        return PageTotal::Unknown;
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens
        .windows(2)
        .rev()
        .find(|pair| pair[0].eq_ignore_ascii_case("of"))
        .and_then(|pair| normalize_numeric(pair[1]))
        .and_then(|total| u32::try_from(total).ok())
        .map_or(PageTotal::Unknown, PageTotal::Known)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Hex SHA-256 of the page markup.
pub fn page_signature(html: &str) -> String {
    let digest = Sha256::digest(html.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
