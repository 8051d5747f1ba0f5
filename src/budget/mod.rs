//! Budget gating and cost attribution.
//!
//! The registry consults a [`BudgetGate`] before every invocation and
//! reports billable costs to it afterwards. The gate is authoritative: the
//! registry never second-guesses a block.
//!
//! Two gates ship with the crate:
//!
//! - [`UnmeteredGate`] never blocks and discards costs. A registry built
//!   without a gate uses it, so a missing budget tracker fails open.
//! - [`CostLedger`] keeps an in-memory ledger and enforces daily USD limits
//!   globally and per tool, agent, product or user.

mod error;
mod gate;
mod ledger;

pub use error::{BudgetError, BudgetErrorKind};
pub use gate::{BudgetDecision, BudgetGate, BudgetQuery, CostEntry, UnmeteredGate};
pub use ledger::{BudgetLimits, CostLedger, CostRecord, CostSummary};
