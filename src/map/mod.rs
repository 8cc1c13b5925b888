pub mod bounds;
pub mod marker;
pub mod registry;
pub mod viewport;

pub use bounds::Bounds;
pub use marker::{MapSurface, MarkerSummary};
pub use registry::{MarkerRegistry, ReconcileOutcome};
pub use viewport::{RefreshOutcome, ViewportWatcher, WatcherSettings};
