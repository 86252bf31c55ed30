//! Shared colors for severity bands and chart series.

use crate::stats::Severity;
use egui::Color32;

pub const DISTRICT_COLOR: Color32 = Color32::from_rgb(51, 51, 51);
pub const CAPACITY_LINE_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Series colors, assigned by catalog position.
pub const PALETTE: [Color32; 12] = [
    Color32::from_rgb(76, 175, 80),   // Green
    Color32::from_rgb(255, 152, 0),   // Orange
    Color32::from_rgb(33, 150, 243),  // Blue
    Color32::from_rgb(156, 39, 176),  // Purple
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(139, 195, 74),  // Light Green
    Color32::from_rgb(255, 87, 34),   // Deep Orange
    Color32::from_rgb(103, 58, 183),  // Deep Purple
    Color32::from_rgb(0, 150, 136),   // Teal
    Color32::from_rgb(121, 85, 72),   // Brown
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

pub fn palette_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Unknown => Color32::GRAY,
        Severity::Low => Color32::from_rgb(40, 167, 69),
        Severity::Medium => Color32::from_rgb(255, 193, 7),
        Severity::High => Color32::from_rgb(220, 53, 69),
    }
}
