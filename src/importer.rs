use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{BihinError, Result};
use crate::models::RawRow;

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Required ledger columns and the header names accepted for each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    Id,
    PurchaseDate,
    Department,
    ItemName,
    UnitPrice,
    Quantity,
    Amount,
}

const ALL_COLUMNS: &[Column] = &[
    Column::Id,
    Column::PurchaseDate,
    Column::Department,
    Column::ItemName,
    Column::UnitPrice,
    Column::Quantity,
    Column::Amount,
];

impl Column {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::PurchaseDate => "purchase_date",
            Self::Department => "department",
            Self::ItemName => "item_name",
            Self::UnitPrice => "unit_price",
            Self::Quantity => "quantity",
            Self::Amount => "amount",
        }
    }

    fn aliases(&self) -> &[&'static str] {
        match self {
            Self::Id => &["no.", "no", "id", "row_id"],
            Self::PurchaseDate => &["購入日", "date", "purchase_date"],
            Self::Department => &["部署", "department", "dept"],
            Self::ItemName => &["品名", "item", "item_name"],
            Self::UnitPrice => &["単価", "unit_price", "price"],
            Self::Quantity => &["数量", "quantity", "qty"],
            Self::Amount => &["金額", "amount"],
        }
    }

    fn matches(&self, header: &str) -> bool {
        let normalized = header.trim_start_matches('\u{feff}').trim().to_lowercase();
        self.aliases().iter().any(|a| *a == normalized)
    }
}

/// Positions of the seven required columns within a header record.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    idx: [usize; 7],
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut idx = [0usize; 7];
        for (slot, col) in ALL_COLUMNS.iter().enumerate() {
            idx[slot] = headers
                .iter()
                .position(|h| col.matches(h))
                .ok_or_else(|| BihinError::MissingColumn(col.key().to_string()))?;
        }
        Ok(Self { idx })
    }

    fn cell(&self, record: &StringRecord, col: Column) -> Option<String> {
        let slot = ALL_COLUMNS.iter().position(|c| *c == col)?;
        let value = record.get(self.idx[slot])?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

pub fn read_csv(file_path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(file_path)?;
    read_from(std::io::BufReader::new(file))
}

/// Read a ledger from any reader. Rows are returned untouched apart from
/// trimming; validation happens in `ledger::RowStore::build`.
pub fn read_from<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns = ColumnMap::from_headers(rdr.headers()?)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(RawRow {
            line,
            id: columns.cell(&record, Column::Id),
            purchase_date: columns.cell(&record, Column::PurchaseDate),
            department: columns.cell(&record, Column::Department),
            item_name: columns.cell(&record, Column::ItemName),
            unit_price: columns.cell(&record, Column::UnitPrice),
            quantity: columns.cell(&record, Column::Quantity),
            amount: columns.cell(&record, Column::Amount),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_japanese_headers_and_ignores_extra_columns() {
        let csv = "No.,購入日,部署,品名,単価,数量,金額,備考\n\
                   1,2022/09/01,総務部,ボールペン,100,2,200,memo\n";
        let rows = read_from(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].department.as_deref(), Some("総務部"));
        assert_eq!(rows[0].item_name.as_deref(), Some("ボールペン"));
        assert_eq!(rows[0].amount.as_deref(), Some("200"));
    }

    #[test]
    fn test_reads_english_headers_in_any_order() {
        let csv = "Amount,Qty,Price,Item,Dept,Date,ID\n300,3,100,Pen,A,2022-09-01,7\n";
        let rows = read_from(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].id.as_deref(), Some("7"));
        assert_eq!(rows[0].purchase_date.as_deref(), Some("2022-09-01"));
        assert_eq!(rows[0].quantity.as_deref(), Some("3"));
    }

    #[test]
    fn test_header_with_bom() {
        let csv = "\u{feff}No.,購入日,部署,品名,単価,数量,金額\n1,2022-09-01,A,Pen,1,1,1\n";
        let rows = read_from(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].id.as_deref(), Some("1"));
    }

    #[test]
    fn test_blank_and_short_rows_become_none() {
        let csv = "id,date,department,item,unit_price,quantity,amount\n\
                   1,2022-09-01,A,Pen,100,,100\n\
                   2,2022-09-02,B\n\
                   3,2022-09-03,C,Pad,  ,1,500\n";
        let rows = read_from(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].quantity.is_none());
        assert!(rows[1].item_name.is_none());
        assert!(rows[2].unit_price.is_none());
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "id,date,department,item,unit_price,quantity\n1,2022-09-01,A,Pen,1,1\n";
        let err = read_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, BihinError::MissingColumn(ref c) if c == "amount"));
    }

    #[test]
    fn test_read_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "id,date,dept,item,price,qty,amount\n1,2022-01-05,A,Tape,50,4,200\n")
            .unwrap();
        let rows = read_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_name.as_deref(), Some("Tape"));
    }
}
