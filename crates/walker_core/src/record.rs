use serde::{Deserialize, Serialize};

/// Number of data cells a host table row exposes after the control cells.
pub const FIELD_COUNT: usize = 17;

/// One extracted table row.
///
/// Field order is fixed and matches the host table's column order. Keys in the
/// serialized form are the host's own column labels so stored state and the
/// exported header row agree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "NPWP PEMBELI / Identitas Lainnya")]
    pub buyer_tax_id: Option<String>,
    #[serde(rename = "Nama Pembeli")]
    pub buyer_name: Option<String>,
    #[serde(rename = "Kode Transaksi")]
    pub transaction_code: Option<String>,
    #[serde(rename = "Nomor Faktur Pajak")]
    pub invoice_number: Option<String>,
    #[serde(rename = "Tanggal Faktur Pajak")]
    pub invoice_date: Option<String>,
    #[serde(rename = "Masa Pajak")]
    pub tax_period: Option<String>,
    #[serde(rename = "Tahun")]
    pub year: Option<u64>,
    #[serde(rename = "Status Faktur")]
    pub invoice_status: Option<String>,
    #[serde(rename = "ESignStatus")]
    pub esign_status: Option<String>,
    #[serde(rename = "Harga Jual/Penggantian/DPP")]
    pub sale_price: Option<u64>,
    #[serde(rename = "DPP Nilai Lain/DPP")]
    pub other_tax_base: Option<u64>,
    #[serde(rename = "PPN")]
    pub vat: Option<u64>,
    #[serde(rename = "PPnBM")]
    pub luxury_tax: Option<u64>,
    #[serde(rename = "Penandatangan")]
    pub signer: Option<String>,
    #[serde(rename = "Referensi")]
    pub reference: Option<String>,
    #[serde(rename = "Dilaporkan oleh Penjual")]
    pub reported_by_seller: Option<String>,
    #[serde(rename = "Dilaporkan oleh Pemungut PPN")]
    pub reported_by_collector: Option<String>,
}

/// Typed view of one record field, used by the spreadsheet writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(u64),
    /// Absent cell, or a numeric cell with no digits.
    Empty,
}

/// How a column is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

impl Record {
    /// Column labels in fixed order.
    pub const FIELD_NAMES: [&'static str; FIELD_COUNT] = [
        "NPWP PEMBELI / Identitas Lainnya",
        "Nama Pembeli",
        "Kode Transaksi",
        "Nomor Faktur Pajak",
        "Tanggal Faktur Pajak",
        "Masa Pajak",
        "Tahun",
        "Status Faktur",
        "ESignStatus",
        "Harga Jual/Penggantian/DPP",
        "DPP Nilai Lain/DPP",
        "PPN",
        "PPnBM",
        "Penandatangan",
        "Referensi",
        "Dilaporkan oleh Penjual",
        "Dilaporkan oleh Pemungut PPN",
    ];

    /// Column types, index-aligned with [`Record::FIELD_NAMES`].
    pub const FIELD_KINDS: [FieldKind; FIELD_COUNT] = {
        use FieldKind::{Numeric as N, Text as T};
        [T, T, T, T, T, T, N, T, T, N, N, N, N, T, T, T, T]
    };

    /// Builds a record from positional cell texts.
    ///
    /// `cell(i)` returns the raw text of data cell `i`, or `None` when the row
    /// has fewer cells. Text is trimmed; numeric columns go through
    /// [`normalize_numeric`].
    pub fn from_cells<F>(mut cell: F) -> Self
    where
        F: FnMut(usize) -> Option<String>,
    {
        let mut text = |i: usize| cell(i).map(|raw| raw.trim().to_string());
        let buyer_tax_id = text(0);
        let buyer_name = text(1);
        let transaction_code = text(2);
        let invoice_number = text(3);
        let invoice_date = text(4);
        let tax_period = text(5);
        let year = text(6).and_then(|t| normalize_numeric(&t));
        let invoice_status = text(7);
        let esign_status = text(8);
        let sale_price = text(9).and_then(|t| normalize_numeric(&t));
        let other_tax_base = text(10).and_then(|t| normalize_numeric(&t));
        let vat = text(11).and_then(|t| normalize_numeric(&t));
        let luxury_tax = text(12).and_then(|t| normalize_numeric(&t));
        let signer = text(13);
        let reference = text(14);
        let reported_by_seller = text(15);
        let reported_by_collector = text(16);

        Self {
            buyer_tax_id,
            buyer_name,
            transaction_code,
            invoice_number,
            invoice_date,
            tax_period,
            year,
            invoice_status,
            esign_status,
            sale_price,
            other_tax_base,
            vat,
            luxury_tax,
            signer,
            reference,
            reported_by_seller,
            reported_by_collector,
        }
    }

    /// Labelled values in column order.
    pub fn cells(&self) -> [(&'static str, CellValue<'_>); FIELD_COUNT] {
        fn text(value: &Option<String>) -> CellValue<'_> {
            value.as_deref().map_or(CellValue::Empty, CellValue::Text)
        }
        fn number(value: Option<u64>) -> CellValue<'static> {
            value.map_or(CellValue::Empty, CellValue::Number)
        }

        let values = [
            text(&self.buyer_tax_id),
            text(&self.buyer_name),
            text(&self.transaction_code),
            text(&self.invoice_number),
            text(&self.invoice_date),
            text(&self.tax_period),
            number(self.year),
            text(&self.invoice_status),
            text(&self.esign_status),
            number(self.sale_price),
            number(self.other_tax_base),
            number(self.vat),
            number(self.luxury_tax),
            text(&self.signer),
            text(&self.reference),
            text(&self.reported_by_seller),
            text(&self.reported_by_collector),
        ];

        let mut index = 0;
        values.map(|value| {
            let name = Self::FIELD_NAMES[index];
            index += 1;
            (name, value)
        })
    }
}

/// Strips every non-digit character and parses the rest.
///
/// Thousands separators, currency symbols and decimal points are all dropped,
/// so `"Rp 1.250.000"` becomes `1250000` and `"12,5"` becomes `125`.
/// Returns `None` when no digits remain or the value overflows.
pub fn normalize_numeric(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_row() -> Vec<&'static str> {
        vec![
            " 0123456789012345 ",
            "PT Contoh",
            "04",
            "04002400000001",
            "02-01-2024",
            "Januari",
            "2024",
            "APPROVED",
            "Signed",
            "Rp 1.250.000",
            "1.145.833",
            "137.500",
            "0",
            "Budi",
            "INV/001",
            "Ya",
            "Tidak",
        ]
    }

    #[test]
    fn numeric_normalization_drops_separators_and_symbols() {
        assert_eq!(normalize_numeric("Rp 1.250.000"), Some(1_250_000));
        assert_eq!(normalize_numeric("1,250.75"), Some(125_075));
        assert_eq!(normalize_numeric(""), None);
        assert_eq!(normalize_numeric("  - "), None);
        assert_eq!(normalize_numeric("99999999999999999999999"), None);
    }

    #[test]
    fn from_cells_maps_positions_and_types() {
        let row = full_row();
        let record = Record::from_cells(|i| row.get(i).map(|s| s.to_string()));

        assert_eq!(record.buyer_tax_id.as_deref(), Some("0123456789012345"));
        assert_eq!(record.year, Some(2024));
        assert_eq!(record.sale_price, Some(1_250_000));
        assert_eq!(record.luxury_tax, Some(0));
        assert_eq!(record.reported_by_collector.as_deref(), Some("Tidak"));
    }

    #[test]
    fn missing_cells_become_absent_values() {
        let row = ["only", "two"];
        let record = Record::from_cells(|i| row.get(i).map(|s| s.to_string()));

        assert_eq!(record.buyer_tax_id.as_deref(), Some("only"));
        assert_eq!(record.buyer_name.as_deref(), Some("two"));
        assert_eq!(record.transaction_code, None);
        assert_eq!(record.vat, None);
    }

    #[test]
    fn cells_follow_field_order_and_kinds() {
        let row = full_row();
        let record = Record::from_cells(|i| row.get(i).map(|s| s.to_string()));
        let cells = record.cells();

        for (i, (name, value)) in cells.iter().enumerate() {
            assert_eq!(*name, Record::FIELD_NAMES[i]);
            match (Record::FIELD_KINDS[i], value) {
                (FieldKind::Numeric, CellValue::Number(_))
                | (FieldKind::Text, CellValue::Text(_)) => {}
                other => panic!("column {name} has unexpected value {other:?}"),
            }
        }
        assert_eq!(cells[9].1, CellValue::Number(1_250_000));
    }

    #[test]
    fn serialized_keys_are_column_labels() {
        let record = Record {
            buyer_name: Some("PT Contoh".into()),
            vat: Some(11),
            ..Record::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), FIELD_COUNT);
        for name in Record::FIELD_NAMES {
            assert!(object.contains_key(name), "missing key {name}");
        }
        assert_eq!(json["Nama Pembeli"], "PT Contoh");
        assert_eq!(json["PPN"], 11);

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
