use crate::config::{LedgerConfig, SheetNames};
use crate::store::SheetStore;

/// Handle every core operation runs against: an injected store plus the
/// configuration that names its sheets. Holds no cached sheet contents.
#[derive(Clone, Copy)]
pub struct Ledger<'a> {
    store: &'a dyn SheetStore,
    config: &'a LedgerConfig,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a dyn SheetStore, config: &'a LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &'a dyn SheetStore {
        self.store
    }

    pub fn sheets(&self) -> &'a SheetNames {
        &self.config.sheets
    }

    pub fn discrepancy_epsilon(&self) -> f64 {
        self.config.reconciliation.discrepancy_epsilon
    }
}
