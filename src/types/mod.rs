//! Identifier types for toolgate.
//!
//! All identifiers use the TypeID format: a short prefix followed by a
//! time-sortable UUIDv7, e.g. `dispatch_01h455vb4pex5vsknk084sn02q`.

mod id;

use id::prefixed_id;
pub use id::InvalidId;

prefixed_id! {
    /// Identifies a single dispatch through the registry.
    ///
    /// Recorded on the dispatch's tracing span so the budget check, the tool
    /// invocation and the cost log of one call can be correlated.
    DispatchId, "dispatch"
}

prefixed_id! {
    /// Identifies a marketing campaign document.
    CampaignId, "camp"
}
