use std::path::Path;

use crate::ClientResult;
use crate::ledger::Ledger;
use crate::setup::ensure_initialized;

/// Initializes the workbook under `home_override` (or the default home) and
/// runs `operation` against a ledger over it. The store lives only for the
/// duration of the call.
pub(crate) fn with_ledger<T>(
    home_override: Option<&Path>,
    operation: impl FnOnce(&Ledger<'_>) -> ClientResult<T>,
) -> ClientResult<T> {
    let setup = ensure_initialized(home_override)?;
    let store = setup.open_store()?;
    let ledger = Ledger::new(&store, &setup.config);
    operation(&ledger)
}
