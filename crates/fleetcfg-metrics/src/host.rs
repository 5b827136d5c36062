//! Host resource gauges.

use rand::Rng;

/// Source of host-level CPU and memory usage, both in percent.
pub trait HostProbe: Send + Sync {
    fn cpu_usage(&self) -> f64;
    fn memory_usage(&self) -> f64;
}

/// Draws plausible values: CPU 10-80%, memory 20-90%.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedHost;

impl HostProbe for SimulatedHost {
    fn cpu_usage(&self) -> f64 {
        rand::thread_rng().gen_range(10.0..=80.0)
    }

    fn memory_usage(&self) -> f64 {
        rand::thread_rng().gen_range(20.0..=90.0)
    }
}

/// Reports constant values (for testing).
#[derive(Debug, Clone, Copy)]
pub struct FixedHost {
    pub cpu: f64,
    pub memory: f64,
}

impl HostProbe for FixedHost {
    fn cpu_usage(&self) -> f64 {
        self.cpu
    }

    fn memory_usage(&self) -> f64 {
        self.memory
    }
}
