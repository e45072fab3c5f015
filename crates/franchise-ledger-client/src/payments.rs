//! Write path for order stages and payment metadata.
//!
//! Every operation validates all of its inputs first, then locates the target
//! row, then issues exactly one `write_cells` batch naming only the columns it
//! changes. Omitted optional fields are never written.

use serde::Serialize;
use tracing::info;

use crate::dates::parse_iso_date;
use crate::ledger::Ledger;
use crate::recon::normalize::normalize_invoice_number;
use crate::records::{SupplierInvoice, format_amount, format_flag, read_orders, read_supplier_invoices};
use crate::schema::{ORDERS, SheetSchema, col, load_sheet};
use crate::store::CellWrite;
use crate::{ClientError, ClientResult};

pub const ORDER_STAGES: [&str; 6] = [
    "New",
    "Ordered with Supplier",
    "In Transit",
    "Delivered",
    "Completed",
    "Cancelled",
];

pub const PAYMENT_METHODS: [&str; 4] = ["SHOPIFY", "BANK_TRANSFER", "CASH", "OTHER"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageUpdate {
    pub sales_invoice_no: String,
    pub previous_stage: String,
    pub stage: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerPayment {
    pub paid_date: Option<String>,
    pub payment_method: Option<String>,
    pub payment_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerPaidUpdate {
    pub sales_invoice_no: String,
    pub partner_paid: bool,
    pub fields_written: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierInvoicePatch {
    pub paid: Option<bool>,
    pub paid_date: Option<String>,
    pub payment_reference: Option<String>,
    pub sales_invoice_no: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierInvoiceUpdate {
    pub invoice_no: String,
    pub supplier: String,
    pub fields_written: Vec<String>,
    pub invoice: SupplierInvoice,
}

pub fn canonical_stage(value: &str) -> Option<&'static str> {
    let wanted = value.trim();
    ORDER_STAGES
        .iter()
        .find(|stage| stage.eq_ignore_ascii_case(wanted))
        .copied()
}

pub fn canonical_payment_method(value: &str) -> Option<&'static str> {
    let wanted = value.trim();
    PAYMENT_METHODS
        .iter()
        .find(|method| method.eq_ignore_ascii_case(wanted))
        .copied()
}

pub fn set_order_stage(
    ledger: &Ledger<'_>,
    sales_invoice_no: &str,
    stage: &str,
) -> ClientResult<StageUpdate> {
    let Some(canonical) = canonical_stage(stage) else {
        return Err(ClientError::invalid_stage(stage, &ORDER_STAGES));
    };

    let target = locate_order(ledger, sales_invoice_no)?;
    let column = target.schema.writable(col::STAGE)?;
    ledger.store().write_cells(
        target.schema.sheet(),
        target.row_index,
        &[CellWrite::new(column, canonical)],
    )?;

    info!(sales_invoice_no, stage = canonical, previous = %target.stage, "order stage updated");
    Ok(StageUpdate {
        sales_invoice_no: target.sales_invoice_no,
        previous_stage: target.stage,
        stage: canonical.to_string(),
    })
}

pub fn mark_partner_paid(
    ledger: &Ledger<'_>,
    sales_invoice_no: &str,
    payment: &PartnerPayment,
) -> ClientResult<PartnerPaidUpdate> {
    let payment_method = match supplied(payment.payment_method.as_deref()) {
        Some(raw) => match canonical_payment_method(raw) {
            Some(method) => Some(method.to_string()),
            None => return Err(ClientError::invalid_payment_method(raw, &PAYMENT_METHODS)),
        },
        None => None,
    };
    let paid_date = validated_date("paid_date", payment.paid_date.as_deref())?;
    let payment_ref = supplied(payment.payment_ref.as_deref()).map(str::to_string);

    let target = locate_order(ledger, sales_invoice_no)?;
    let schema = &target.schema;

    let mut writes = vec![CellWrite::new(
        schema.writable(col::PARTNER_PAID)?,
        format_flag(true),
    )];
    let mut fields_written = vec!["partner_paid".to_string()];
    if let Some(value) = &paid_date {
        writes.push(CellWrite::new(schema.writable(col::PARTNER_PAID_DATE)?, value.clone()));
        fields_written.push("partner_paid_date".to_string());
    }
    if let Some(value) = &payment_method {
        writes.push(CellWrite::new(
            schema.writable(col::PARTNER_PAYMENT_METHOD)?,
            value.clone(),
        ));
        fields_written.push("partner_payment_method".to_string());
    }
    if let Some(value) = &payment_ref {
        writes.push(CellWrite::new(schema.writable(col::PARTNER_PAYMENT_REF)?, value.clone()));
        fields_written.push("partner_payment_ref".to_string());
    }

    ledger
        .store()
        .write_cells(schema.sheet(), target.row_index, &writes)?;

    info!(sales_invoice_no, fields = ?fields_written, "partner payment recorded");
    Ok(PartnerPaidUpdate {
        sales_invoice_no: target.sales_invoice_no,
        partner_paid: true,
        fields_written,
        paid_date,
        payment_method,
        payment_ref,
    })
}

pub fn update_supplier_invoice(
    ledger: &Ledger<'_>,
    invoice_no: &str,
    supplier: Option<&str>,
    patch: &SupplierInvoicePatch,
) -> ClientResult<SupplierInvoiceUpdate> {
    let paid_date = validated_date("paid_date", patch.paid_date.as_deref())?;
    let payment_reference = supplied(patch.payment_reference.as_deref()).map(str::to_string);
    let sales_invoice_no = supplied(patch.sales_invoice_no.as_deref()).map(str::to_string);
    if let Some(amount) = patch.amount
        && (!amount.is_finite() || amount < 0.0)
    {
        return Err(ClientError::invalid_amount("amount", &amount.to_string()));
    }
    if patch.paid.is_none()
        && paid_date.is_none()
        && payment_reference.is_none()
        && sales_invoice_no.is_none()
        && patch.amount.is_none()
    {
        return Err(ClientError::invalid_argument_for_command(
            "No invoice fields were supplied; nothing to update.",
            Some("invoice update"),
        ));
    }

    let (schema, mut invoice) = locate_supplier_invoice(ledger, invoice_no, supplier)?;

    let mut writes = Vec::new();
    let mut fields_written = Vec::new();
    if let Some(paid) = patch.paid {
        writes.push(CellWrite::new(schema.writable(col::PAID)?, format_flag(paid)));
        fields_written.push("paid".to_string());
        invoice.paid = paid;
    }
    if let Some(value) = paid_date {
        writes.push(CellWrite::new(schema.writable(col::PAID_DATE)?, value.clone()));
        fields_written.push("paid_date".to_string());
        invoice.paid_date = Some(value);
    }
    if let Some(value) = payment_reference {
        writes.push(CellWrite::new(schema.writable(col::PAYMENT_REFERENCE)?, value.clone()));
        fields_written.push("payment_reference".to_string());
        invoice.payment_reference = Some(value);
    }
    if let Some(value) = sales_invoice_no {
        writes.push(CellWrite::new(schema.writable(col::SALES_INVOICE_NO)?, value.clone()));
        fields_written.push("sales_invoice_no".to_string());
        invoice.sales_invoice_no = Some(value);
    }
    if let Some(amount) = patch.amount {
        writes.push(CellWrite::new(schema.writable(col::AMOUNT)?, format_amount(amount)));
        fields_written.push("amount".to_string());
        invoice.amount = amount;
    }

    ledger
        .store()
        .write_cells(schema.sheet(), invoice.row_index, &writes)?;

    info!(invoice_no, supplier = %invoice.supplier, fields = ?fields_written, "supplier invoice updated");
    Ok(SupplierInvoiceUpdate {
        invoice_no: invoice.invoice_no.clone(),
        supplier: invoice.supplier.clone(),
        fields_written,
        invoice,
    })
}

pub fn mark_supplier_invoice_paid(
    ledger: &Ledger<'_>,
    invoice_no: &str,
    supplier: Option<&str>,
    paid_date: Option<&str>,
    payment_reference: Option<&str>,
) -> ClientResult<SupplierInvoiceUpdate> {
    update_supplier_invoice(
        ledger,
        invoice_no,
        supplier,
        &SupplierInvoicePatch {
            paid: Some(true),
            paid_date: paid_date.map(str::to_string),
            payment_reference: payment_reference.map(str::to_string),
            ..SupplierInvoicePatch::default()
        },
    )
}

pub fn set_supplier_invoice_file_url(
    ledger: &Ledger<'_>,
    invoice_no: &str,
    supplier: Option<&str>,
    file_url: &str,
) -> ClientResult<SupplierInvoiceUpdate> {
    let Some(url) = supplied(Some(file_url)) else {
        return Err(ClientError::invalid_argument_for_command(
            "File URL must not be empty.",
            Some("invoice file"),
        ));
    };

    let (schema, mut invoice) = locate_supplier_invoice(ledger, invoice_no, supplier)?;
    let column = schema.writable(col::FILE_URL)?;
    ledger
        .store()
        .write_cells(schema.sheet(), invoice.row_index, &[CellWrite::new(column, url)])?;

    info!(invoice_no, supplier = %invoice.supplier, "supplier invoice file linked");
    invoice.file_url = Some(url.to_string());
    Ok(SupplierInvoiceUpdate {
        invoice_no: invoice.invoice_no.clone(),
        supplier: invoice.supplier.clone(),
        fields_written: vec!["file_url".to_string()],
        invoice,
    })
}

pub(crate) struct OrderTarget {
    pub(crate) schema: SheetSchema,
    pub(crate) row_index: usize,
    pub(crate) sales_invoice_no: String,
    pub(crate) stage: String,
}

/// Finds the order row by normalized sales invoice number.
pub(crate) fn locate_order(ledger: &Ledger<'_>, sales_invoice_no: &str) -> ClientResult<OrderTarget> {
    let key = normalize_invoice_number(sales_invoice_no);
    if key.is_empty() {
        return Err(ClientError::order_not_found(sales_invoice_no));
    }

    let sheet = &ledger.sheets().orders;
    let schema = load_sheet(ledger.store(), sheet, &ORDERS)?.schema;
    let column = schema.writable(col::SALES_INVOICE_NO)?;
    let Some(row_index) = ledger.store().find_row_index(sheet, column, &key)? else {
        return Err(ClientError::order_not_found(sales_invoice_no));
    };

    let orders = read_orders(ledger.store(), sheet)?;
    let Some(order) = orders
        .records
        .into_iter()
        .find(|order| order.row_index == row_index)
    else {
        return Err(ClientError::order_not_found(sales_invoice_no));
    };

    Ok(OrderTarget {
        schema,
        row_index,
        sales_invoice_no: order.sales_invoice_no,
        stage: order.stage,
    })
}

/// Invoice numbers repeat across suppliers, so a lookup that hits several
/// rows needs `supplier` to pick one.
pub(crate) fn locate_supplier_invoice(
    ledger: &Ledger<'_>,
    invoice_no: &str,
    supplier: Option<&str>,
) -> ClientResult<(SheetSchema, SupplierInvoice)> {
    let key = normalize_invoice_number(invoice_no);
    let table = read_supplier_invoices(ledger.store(), &ledger.sheets().supplier_invoices)?;
    let wanted_supplier = supplied(supplier);

    let mut candidates = table
        .records
        .into_iter()
        .filter(|invoice| !key.is_empty() && normalize_invoice_number(&invoice.invoice_no) == key)
        .filter(|invoice| match wanted_supplier {
            Some(name) => invoice.supplier.trim().eq_ignore_ascii_case(name),
            None => true,
        })
        .collect::<Vec<SupplierInvoice>>();

    match candidates.len() {
        0 => Err(ClientError::supplier_invoice_not_found(invoice_no, wanted_supplier)),
        1 => match candidates.pop() {
            Some(invoice) => Ok((table.schema, invoice)),
            None => Err(ClientError::supplier_invoice_not_found(invoice_no, wanted_supplier)),
        },
        _ => {
            let mut suppliers = candidates
                .iter()
                .map(|invoice| invoice.supplier.clone())
                .collect::<Vec<String>>();
            suppliers.sort();
            suppliers.dedup();
            Err(ClientError::ambiguous_invoice(invoice_no, suppliers))
        }
    }
}

/// Blank strings count as "not supplied".
pub(crate) fn supplied(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn validated_date(field: &str, value: Option<&str>) -> ClientResult<Option<String>> {
    match supplied(value) {
        Some(raw) => match parse_iso_date(raw) {
            Some(_) => Ok(Some(raw.to_string())),
            None => Err(ClientError::invalid_date(field, raw)),
        },
        None => Ok(None),
    }
}
