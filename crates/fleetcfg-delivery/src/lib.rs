//! fleetcfg-delivery — the validate-then-dispatch path.
//!
//! # Components
//!
//! - **`validator`** — structural check plus an injectable acceptance policy
//! - **`dispatcher`** — single-attempt delivery of a config to one device
//! - **`policy`** — acceptance and delivery policies (random, fixed, closures)
//! - **`latency`** — simulated processing time as a non-blocking wait
//!
//! Neither component touches rollout state. Recording a dispatch against
//! a rollout is the caller's job.

pub mod dispatcher;
pub mod latency;
pub mod policy;
pub mod validator;

pub use dispatcher::DeviceDispatcher;
pub use latency::{Latency, NoLatency, TokioLatency};
pub use policy::{
    AcceptancePolicy, DeliveryPolicy, FixedAcceptance, FixedDelivery, RandomAcceptance,
    RandomDelivery,
};
pub use validator::ConfigValidator;
