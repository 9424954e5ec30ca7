#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use walker_engine::{Clock, SnapshotHost};

pub const TAB_URL: &str = "https://coretaxdjp.pajak.go.id/e-invoice-portal/output-tax";

/// Checkbox and action cells every host row starts with.
pub const CONTROLS: &str = r#"<td><input type="checkbox"></td><td><button class="p-button">⋮</button></td>"#;

/// A row with all 17 data cells; `id` ends up in the invoice number.
pub fn data_row(id: &str) -> String {
    let cells = [
        "0123456789012345".to_string(),
        format!("PT Pembeli {id}"),
        "04".to_string(),
        format!("04002400{id}"),
        "15/05/2024".to_string(),
        "Mei".to_string(),
        "2024".to_string(),
        "APPROVED".to_string(),
        "Signed".to_string(),
        "Rp 1.250.000".to_string(),
        "Rp 1.145.833".to_string(),
        "137.500".to_string(),
        "0".to_string(),
        "Budi".to_string(),
        format!("REF-{id}"),
        "Ya".to_string(),
        "Tidak".to_string(),
    ];
    let data: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
    format!("<tr>{CONTROLS}{data}</tr>")
}

/// A row holding only control cells; it maps to nothing.
pub fn control_only_row() -> String {
    format!("<tr>{CONTROLS}</tr>")
}

pub fn table_page(rows: &[String], page: u32, total: u32) -> String {
    let body: String = rows.concat();
    let disabled = if page >= total { " p-disabled" } else { "" };
    format!(
        r#"<html><body><div class="p-datatable"><table><thead><tr><th></th><th></th></tr></thead>
<tbody>{body}</tbody></table>
<div class="p-paginator"><span class="p-paginator-current">{page} of {total}</span>
<button class="p-paginator-next{disabled}">›</button></div></div></body></html>"#
    )
}

/// Page 1 with three rows and one control-only row, page 2 with two rows and
/// a disabled next control.
pub fn two_page_host() -> SnapshotHost {
    let first = table_page(
        &[data_row("001"), data_row("002"), control_only_row(), data_row("003")],
        1,
        2,
    );
    let second = table_page(&[data_row("004"), data_row("005")], 2, 2);
    SnapshotHost::new(TAB_URL, vec![first, second])
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
}

pub fn fixed_clock() -> Clock {
    Arc::new(fixed_time)
}
