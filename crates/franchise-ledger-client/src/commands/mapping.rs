use std::path::Path;

use crate::ClientResult;
use crate::commands::common::with_ledger;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::MappingAddedData;
use crate::import::add_kitchen_mapping;
use crate::records::KitchenMapping;

#[derive(Debug)]
pub struct MappingAddOptions<'a> {
    pub mapping: KitchenMapping,
    pub home_override: Option<&'a Path>,
}

pub fn add(options: MappingAddOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let row_index = with_ledger(options.home_override, |ledger| {
        add_kitchen_mapping(ledger, &options.mapping)
    })?;
    success(
        "mapping add",
        MappingAddedData {
            mapping: options.mapping,
            row_index,
        },
    )
}
