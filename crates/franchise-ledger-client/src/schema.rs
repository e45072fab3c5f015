//! Named-column layout of each sheet, resolved from its header row.

use std::collections::HashMap;

use tracing::warn;

use crate::config::SheetNames;
use crate::store::{ColumnRange, SheetStore};
use crate::{ClientError, ClientResult};

pub(crate) mod col {
    pub(crate) const SALES_INVOICE_NO: &str = "Sales Invoice No";
    pub(crate) const ORDER_ID: &str = "Order ID";
    pub(crate) const BRAND: &str = "Brand";
    pub(crate) const ORDER_DATE: &str = "Order Date";
    pub(crate) const STAGE: &str = "Stage";
    pub(crate) const ORDER_TOTAL: &str = "Order Total";
    pub(crate) const PARTNER_PAID: &str = "Partner Paid";
    pub(crate) const PARTNER_PAID_DATE: &str = "Partner Paid Date";
    pub(crate) const PARTNER_PAYMENT_METHOD: &str = "Partner Payment Method";
    pub(crate) const PARTNER_PAYMENT_REF: &str = "Partner Payment Ref";

    pub(crate) const INVOICE_NO: &str = "Invoice No";
    pub(crate) const SUPPLIER: &str = "Supplier";
    pub(crate) const AMOUNT: &str = "Amount";
    pub(crate) const PAID: &str = "Paid";
    pub(crate) const PAID_DATE: &str = "Paid Date";
    pub(crate) const PAYMENT_REFERENCE: &str = "Payment Reference";
    pub(crate) const FILE_URL: &str = "File URL";

    pub(crate) const SUPPLIER_INVOICE_NO: &str = "Supplier Invoice No";
    pub(crate) const ALLOCATED_AMOUNT: &str = "Allocated Amount";

    pub(crate) const DATE: &str = "Date";
    pub(crate) const LOCATION: &str = "Location";
    pub(crate) const REVENUE: &str = "Revenue";
    pub(crate) const GROSS_SALES: &str = "Gross Sales";
    pub(crate) const COUNT: &str = "Count";
    pub(crate) const FRANCHISE_CODE: &str = "Franchise Code";
    pub(crate) const FRANCHISE_NAME: &str = "Franchise Name";
    pub(crate) const ACTIVE: &str = "Active";
    pub(crate) const NOTES: &str = "Notes";
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableDef {
    pub(crate) required: &'static [&'static str],
    pub(crate) optional: &'static [&'static str],
}

impl TableDef {
    pub(crate) fn default_header(&self) -> Vec<String> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .map(|name| name.to_string())
            .collect()
    }
}

pub(crate) const ORDERS: TableDef = TableDef {
    required: &[
        col::SALES_INVOICE_NO,
        col::STAGE,
        col::PARTNER_PAID,
        col::PARTNER_PAID_DATE,
        col::PARTNER_PAYMENT_METHOD,
        col::PARTNER_PAYMENT_REF,
    ],
    optional: &[col::ORDER_ID, col::BRAND, col::ORDER_DATE, col::ORDER_TOTAL],
};

pub(crate) const SUPPLIER_INVOICES: TableDef = TableDef {
    required: &[
        col::INVOICE_NO,
        col::SUPPLIER,
        col::AMOUNT,
        col::SALES_INVOICE_NO,
        col::PAID,
        col::PAID_DATE,
        col::PAYMENT_REFERENCE,
    ],
    optional: &[col::FILE_URL],
};

pub(crate) const ALLOCATIONS: TableDef = TableDef {
    required: &[
        col::SALES_INVOICE_NO,
        col::SUPPLIER_INVOICE_NO,
        col::ALLOCATED_AMOUNT,
    ],
    optional: &[],
};

pub(crate) const KITCHEN_SALES: TableDef = TableDef {
    required: &[col::DATE, col::LOCATION, col::REVENUE, col::COUNT],
    optional: &[col::GROSS_SALES, col::FRANCHISE_CODE],
};

pub(crate) const KITCHEN_MAPPING: TableDef = TableDef {
    required: &[col::LOCATION, col::FRANCHISE_CODE],
    optional: &[col::FRANCHISE_NAME, col::ACTIVE, col::NOTES],
};

/// Every sheet the ledger needs, paired with its configured name.
pub(crate) fn workbook_tables(names: &SheetNames) -> [(&str, TableDef); 5] {
    [
        (names.orders.as_str(), ORDERS),
        (names.supplier_invoices.as_str(), SUPPLIER_INVOICES),
        (names.allocations.as_str(), ALLOCATIONS),
        (names.kitchen_sales.as_str(), KITCHEN_SALES),
        (names.kitchen_mapping.as_str(), KITCHEN_MAPPING),
    ]
}

#[derive(Debug, Clone)]
pub(crate) struct SheetSchema {
    sheet: String,
    headers: Vec<String>,
    index_by_key: HashMap<String, usize>,
}

impl SheetSchema {
    pub(crate) fn resolve(sheet: &str, table: &TableDef, header: &[String]) -> ClientResult<Self> {
        let mut index_by_key = HashMap::new();
        for (index, name) in header.iter().enumerate() {
            let key = header_key(name);
            if !key.is_empty() {
                index_by_key.entry(key).or_insert(index);
            }
        }

        let missing = table
            .required
            .iter()
            .filter(|name| !index_by_key.contains_key(&header_key(name)))
            .map(|name| name.to_string())
            .collect::<Vec<String>>();
        if !missing.is_empty() {
            warn!(sheet, missing = ?missing, "sheet is missing required columns");
            return Err(ClientError::sheet_schema_mismatch(
                sheet,
                missing,
                header.to_vec(),
            ));
        }

        Ok(Self {
            sheet: sheet.to_string(),
            headers: header.to_vec(),
            index_by_key,
        })
    }

    pub(crate) fn sheet(&self) -> &str {
        &self.sheet
    }

    pub(crate) fn index(&self, column: &str) -> Option<usize> {
        self.index_by_key.get(&header_key(column)).copied()
    }

    /// Index of a column that is about to be written; optional columns that
    /// are absent from the sheet cannot take writes.
    pub(crate) fn writable(&self, column: &str) -> ClientResult<usize> {
        self.index(column).ok_or_else(|| {
            ClientError::sheet_schema_mismatch(
                &self.sheet,
                vec![column.to_string()],
                self.headers.clone(),
            )
        })
    }

    pub(crate) fn cell<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.index(column)
            .and_then(|index| row.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    }

    /// Blank row as wide as the header, with `values` placed by column name.
    /// Columns the sheet does not have are dropped.
    pub(crate) fn build_row(&self, values: &[(&str, String)]) -> Vec<String> {
        let mut row = vec![String::new(); self.headers.len()];
        for (column, value) in values {
            if let Some(index) = self.index(column) {
                row[index] = value.clone();
            }
        }
        row
    }
}

/// A sheet read in full: its schema plus data rows tagged with their row index.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSheet {
    pub(crate) schema: SheetSchema,
    pub(crate) rows: Vec<(usize, Vec<String>)>,
}

pub(crate) fn load_sheet(
    store: &dyn SheetStore,
    sheet: &str,
    table: &TableDef,
) -> ClientResult<LoadedSheet> {
    let mut all_rows = store.get_rows(sheet, ColumnRange::ALL)?.into_iter();
    let header = all_rows.next().unwrap_or_default();
    let schema = SheetSchema::resolve(sheet, table, &header)?;
    let rows = all_rows
        .enumerate()
        .map(|(offset, row)| (offset + 1, row))
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    Ok(LoadedSheet { schema, rows })
}

/// Fails fast when any configured sheet lacks a required column.
pub fn verify_workbook(store: &dyn SheetStore, names: &SheetNames) -> ClientResult<()> {
    for (sheet, table) in workbook_tables(names) {
        let header = store
            .get_rows(sheet, ColumnRange::ALL)?
            .into_iter()
            .next()
            .unwrap_or_default();
        SheetSchema::resolve(sheet, &table, &header)?;
    }
    Ok(())
}

fn header_key(name: &str) -> String {
    name.replace('#', "no")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|character| character.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ALLOCATIONS, ORDERS, SheetSchema, col, header_key, load_sheet, verify_workbook};
    use crate::config::SheetNames;
    use crate::store::MemorySheetStore;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn header_keys_ignore_case_spacing_and_hash() {
        assert_eq!(header_key("Sales Invoice #"), header_key("sales invoice no"));
        assert_eq!(header_key(" Allocated_Amount "), header_key("Allocated Amount"));
    }

    #[test]
    fn resolve_reports_every_missing_required_column() {
        let header = cells(&["Sales Invoice No", "Notes"]);
        let resolved = SheetSchema::resolve("Allocations", &ALLOCATIONS, &header);
        assert!(resolved.is_err());
        if let Err(error) = resolved {
            assert_eq!(error.code, "sheet_schema_mismatch");
            let missing = error
                .data
                .as_ref()
                .and_then(|data| data.get("missing_columns"))
                .and_then(|value| value.as_array())
                .map(Vec::len);
            assert_eq!(missing, Some(2));
        }
    }

    #[test]
    fn columns_resolve_by_name_in_any_order() {
        let header = cells(&["Allocated Amount", "Note", "Supplier Invoice #", "Sales Invoice No"]);
        let resolved = SheetSchema::resolve("Allocations", &ALLOCATIONS, &header);
        assert!(resolved.is_ok());
        if let Ok(schema) = resolved {
            assert_eq!(schema.index(col::ALLOCATED_AMOUNT), Some(0));
            assert_eq!(schema.index(col::SUPPLIER_INVOICE_NO), Some(2));
            let row = cells(&["300", "", " SI-1 ", "#1005"]);
            assert_eq!(schema.cell(&row, col::SUPPLIER_INVOICE_NO), "SI-1");
            assert_eq!(
                schema.build_row(&[(col::SALES_INVOICE_NO, "1006".to_string())]),
                cells(&["", "", "", "1006"])
            );
        }
    }

    #[test]
    fn optional_columns_are_not_writable_when_absent() {
        let header = ORDERS.required.iter().map(|name| name.to_string()).collect::<Vec<_>>();
        let resolved = SheetSchema::resolve("Orders", &ORDERS, &header);
        assert!(resolved.is_ok());
        if let Ok(schema) = resolved {
            assert!(schema.writable(col::STAGE).is_ok());
            assert!(schema.writable(col::ORDER_TOTAL).is_err());
        }
    }

    #[test]
    fn load_sheet_skips_blank_rows_but_keeps_row_indexes() {
        let store = MemorySheetStore::new();
        store.seed(
            "Allocations",
            vec![
                ALLOCATIONS.default_header(),
                cells(&["1005", "SI-1", "300"]),
                cells(&["", " ", ""]),
                cells(&["1005", "SI-2", "150"]),
            ],
        );
        let loaded = load_sheet(&store, "Allocations", &ALLOCATIONS);
        assert!(loaded.is_ok());
        if let Ok(sheet) = loaded {
            let indexes = sheet.rows.iter().map(|(index, _)| *index).collect::<Vec<_>>();
            assert_eq!(indexes, vec![1, 3]);
        }
    }

    #[test]
    fn verify_workbook_fails_on_empty_sheets() {
        let store = MemorySheetStore::new();
        assert!(verify_workbook(&store, &SheetNames::default()).is_err());
    }
}
