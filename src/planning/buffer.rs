use super::{name_key, round2};
use crate::error::{AppError, Result};
use crate::models::{BaseSource, PlanItem};
use std::collections::HashMap;

impl PlanItem {
    pub fn recompute_final(&mut self) {
        self.final_quantity = round2(self.base_quantity + self.buffer_quantity);
    }
}

/// Manual buffer for a single item.
pub fn set_item_buffer(item: &mut PlanItem, buffer: f64) -> Result<()> {
    if !buffer.is_finite() || buffer < 0.0 {
        return Err(AppError::validation(format!(
            "Buffer for {} must be a non-negative number",
            item.item_name
        )));
    }

    item.buffer_quantity = round2(buffer);
    item.recompute_final();
    Ok(())
}

/// Sets every item's buffer to `percent` of its base quantity. Manual
/// buffers are overwritten, not added to.
pub fn apply_global_buffer(items: &mut [PlanItem], percent: f64) -> Result<()> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(AppError::validation(
            "Buffer percentage must be a non-negative number",
        ));
    }

    for item in items.iter_mut() {
        item.buffer_quantity = round2(item.base_quantity * percent / 100.0);
        item.recompute_final();
    }

    tracing::debug!(percent, items = items.len(), "Applied global buffer");
    Ok(())
}

/// Buffers items from their own percentage, keyed by item name. Items
/// without an entry keep their buffer.
pub fn apply_item_buffers(items: &mut [PlanItem], percents: &HashMap<String, f64>) {
    for item in items.iter_mut() {
        if let Some(percent) = percents.get(&name_key(&item.item_name)) {
            item.buffer_quantity = round2(item.base_quantity * percent / 100.0);
            item.recompute_final();
        }
    }
}

/// Last-minute increase of the planned quantity.
pub fn add_planned_quantity(item: &mut PlanItem, additional: f64) -> Result<()> {
    if !additional.is_finite() || additional <= 0.0 {
        return Err(AppError::validation(
            "Additional quantities must be greater than zero.",
        ));
    }

    item.planned_quantity = round2(item.planned_quantity + additional);
    if item.base_source == BaseSource::Planned {
        item.base_quantity = item.planned_quantity;
    }
    item.recompute_final();
    Ok(())
}
