use std::path::Path;

use crate::ClientResult;
use crate::commands::common::with_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::entry::{NewOrder, create_order};
use crate::payments::{PartnerPayment, mark_partner_paid, set_order_stage};

#[derive(Debug, Default)]
pub struct OrderCreateOptions<'a> {
    pub order: NewOrder,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct OrderStageOptions<'a> {
    pub sales_invoice_no: String,
    pub stage: String,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct OrderPaidOptions<'a> {
    pub sales_invoice_no: String,
    pub payment: PartnerPayment,
    pub home_override: Option<&'a Path>,
}

pub fn create(options: OrderCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let order = with_ledger(options.home_override, |ledger| {
        create_order(ledger, &options.order)
    })?;
    success("order create", order)
}

pub fn stage(options: OrderStageOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let update = with_ledger(options.home_override, |ledger| {
        set_order_stage(ledger, &options.sales_invoice_no, &options.stage)
    })?;
    success("order stage", update)
}

pub fn paid(options: OrderPaidOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let update = with_ledger(options.home_override, |ledger| {
        mark_partner_paid(ledger, &options.sales_invoice_no, &options.payment)
    })?;
    success("order paid", update)
}
