mod churn_coordinator;
mod pair_ledger;

pub use churn_coordinator::*;
pub use pair_ledger::*;
