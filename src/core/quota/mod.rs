pub mod enrichment;
pub mod ledger;
pub mod rotation;

pub use enrichment::{EnrichmentCounter, EnrichmentCounterStore};
pub use ledger::{ChargeOutcome, JsonLedgerStore, LedgerStore, PreflightOutcome, QuotaLedger, QuotaTracker};
pub use rotation::{OperationGuard, RotationDecision, RotationPolicy};
