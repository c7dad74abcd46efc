pub mod fingerprint;
pub mod normalize;
pub mod reconcile;

pub use fingerprint::fingerprint_bytes;
pub use normalize::{normalize, to_records};
pub use reconcile::{Reconciler, ReconcileSummary};
