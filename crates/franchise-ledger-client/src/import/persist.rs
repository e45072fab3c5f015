use tracing::{debug, warn};

use crate::import::validate::ValidSale;
use crate::ledger::Ledger;
use crate::records::format_amount;
use crate::schema::{SheetSchema, col};

pub(crate) struct PendingSale {
    pub(crate) sale: ValidSale,
    pub(crate) franchise_code: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct PersistResult {
    pub(crate) appended: usize,
    pub(crate) errors: Vec<String>,
}

/// Appends each row as its own batch. A failed append is recorded against
/// its row and the rest of the batch still goes in.
pub(crate) fn append_sales(
    ledger: &Ledger<'_>,
    schema: &SheetSchema,
    pending: &[PendingSale],
) -> PersistResult {
    let sheet = &ledger.sheets().kitchen_sales;
    let mut result = PersistResult::default();

    for item in pending {
        let mut values = vec![
            (col::DATE, item.sale.date.clone()),
            (col::LOCATION, item.sale.location.clone()),
            (col::REVENUE, format_amount(item.sale.revenue)),
            (col::GROSS_SALES, format_amount(item.sale.gross_sales)),
            (col::COUNT, format_amount(item.sale.count)),
        ];
        if let Some(code) = &item.franchise_code {
            values.push((col::FRANCHISE_CODE, code.clone()));
        }

        match ledger.store().append_row(sheet, &schema.build_row(&values)) {
            Ok(row_index) => {
                debug!(row = item.sale.row, row_index, "sale appended");
                result.appended += 1;
            }
            Err(error) => {
                warn!(row = item.sale.row, code = %error.code, "sale append failed");
                result
                    .errors
                    .push(format!("row {}: {}", item.sale.row, error.message));
            }
        }
    }
    result
}
