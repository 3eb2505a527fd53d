//! Production planning: turns the day's orders and published menu into the
//! quantities the kitchen should cook.
//!
//! Everything here is a pure transformation over in-memory lists. Loading
//! from and saving to the database lives in `commands::production`.

mod aggregate;
mod buffer;
mod export;
mod merge;
mod replace;

pub use aggregate::aggregate_orders;
pub use buffer::{add_planned_quantity, apply_global_buffer, apply_item_buffers, set_item_buffer};
pub use export::{escape_html, format_quantity, plan_to_csv, plan_to_html};
pub use merge::{merge_plan, unplanned_orders};
pub use replace::{apply_replacements_to_menu, apply_replacements_to_orders};

pub const DEFAULT_UNIT: &str = "Nos";

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Item names are matched trimmed and case-insensitively.
pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
