mod controller;
mod loop_worker;
mod metrics;

pub use controller::CollectorController;
pub use metrics::{CollectorMetrics, CollectorSnapshot};
