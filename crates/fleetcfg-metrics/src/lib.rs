//! fleetcfg-metrics — observability for the config controller.
//!
//! # Architecture
//!
//! ```text
//! MetricsCollector
//!   ├── record_request()  ← called per HTTP request by the API middleware
//!   ├── record_delivery() ← called per device dispatch
//!   └── snapshot()        → MetricsSnapshot for GET /metrics
//!
//! HostProbe
//!   └── cpu_usage() / memory_usage() → host gauges in the snapshot
//! ```

pub mod collector;
pub mod host;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use host::{FixedHost, HostProbe, SimulatedHost};
