//! Stats module - Utilization metrics and severity bands

mod utilization;

pub use utilization::{
    format_utilization, utilization, Aggregate, Severity, YearUtilization, CAPACITY_PERCENT,
};
