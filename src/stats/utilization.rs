//! Utilization Metrics Module
//! Derived enrollment/capacity percentages and the shared severity bands.

/// Utilization at or above this value is at capacity (medium band).
pub const MEDIUM_THRESHOLD: u32 = 85;
/// Utilization above this value is over capacity (high band).
pub const CAPACITY_PERCENT: u32 = 100;

/// Enrollment as a rounded integer percentage of capacity.
///
/// Returns `None` when capacity is absent or zero. Rounds half away from
/// zero, so `utilization(850, Some(900)) == Some(94)`.
pub fn utilization(enrollment: u64, capacity: Option<u64>) -> Option<u32> {
    let capacity = capacity.filter(|&c| c > 0)?;
    // floor(e * 100 / c + 1/2) in integer arithmetic
    let rounded = (enrollment * 200 + capacity) / (capacity * 2);
    u32::try_from(rounded).ok()
}

/// Summed enrollment and capacity for a set of reporting schools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aggregate {
    pub total_enrollment: u64,
    pub total_capacity: u64,
    pub utilization: Option<u32>,
}

impl Aggregate {
    /// Build from sums, deriving utilization from the totals.
    pub fn from_totals(total_enrollment: u64, total_capacity: u64) -> Self {
        Self {
            total_enrollment,
            total_capacity,
            utilization: utilization(total_enrollment, Some(total_capacity)),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.utilization)
    }
}

/// One point of a utilization time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearUtilization {
    pub year: String,
    pub utilization: Option<u32>,
}

/// Severity band of a utilization value, shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// No utilization could be computed
    Unknown,
    /// Under 85%
    Low,
    /// 85% to 100% inclusive
    Medium,
    /// Over capacity
    High,
}

impl Severity {
    pub fn classify(utilization: Option<u32>) -> Self {
        match utilization {
            None => Severity::Unknown,
            Some(u) if u < MEDIUM_THRESHOLD => Severity::Low,
            Some(u) if u <= CAPACITY_PERCENT => Severity::Medium,
            Some(_) => Severity::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Unknown => "No data",
            Severity::Low => "Under 85%",
            Severity::Medium => "85-100%",
            Severity::High => "Over capacity",
        }
    }
}

/// Format a utilization value for display, `N/A` when undefined.
pub fn format_utilization(utilization: Option<u32>) -> String {
    utilization
        .map(|u| format!("{}%", u))
        .unwrap_or_else(|| "N/A".to_string())
}
