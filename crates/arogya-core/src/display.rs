//! Fixed colour lookups for the status, severity, and availability fields
//! shown on the list screens.
//!
//! All lookups are case-insensitive and fall back to [`BadgeColor::Gray`]
//! (or red, for availability) on unrecognised values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Badge colour rendered next to a list row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl BadgeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::Green => "green",
            BadgeColor::Yellow => "yellow",
            BadgeColor::Red => "red",
            BadgeColor::Gray => "gray",
        }
    }
}

impl fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hospital availability: only `available` is green.
pub fn availability_color(availability: &str) -> BadgeColor {
    if availability.eq_ignore_ascii_case("available") {
        BadgeColor::Green
    } else {
        BadgeColor::Red
    }
}

/// Outbreak alert severity.
pub fn severity_color(severity: &str) -> BadgeColor {
    match severity.to_lowercase().as_str() {
        "high" => BadgeColor::Red,
        "medium" => BadgeColor::Yellow,
        "low" => BadgeColor::Green,
        _ => BadgeColor::Gray,
    }
}

/// Vaccination record status.
pub fn vaccination_status_color(status: &str) -> BadgeColor {
    match status.to_lowercase().as_str() {
        "completed" => BadgeColor::Green,
        "pending" => BadgeColor::Yellow,
        "overdue" => BadgeColor::Red,
        _ => BadgeColor::Gray,
    }
}

/// Notification delivery status.
pub fn notification_status_color(status: &str) -> BadgeColor {
    match status.to_lowercase().as_str() {
        "sent" => BadgeColor::Green,
        "pending" => BadgeColor::Yellow,
        "failed" => BadgeColor::Red,
        _ => BadgeColor::Gray,
    }
}

/// Lowercased label used as the display key for a status-like field.
pub fn status_label(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Map search link for a hospital location, or `None` when no location is known.
pub fn directions_url(geo_location: &str) -> Option<String> {
    let geo = geo_location.trim();
    if geo.is_empty() {
        return None;
    }
    Some(format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(geo)
    ))
}
