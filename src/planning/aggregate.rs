use super::{name_key, round2};
use crate::models::{AggregatedOrderItem, MealCategory, OrderLine};
use std::collections::HashMap;

/// Sums order quantities per meal and item, expanding combos into their
/// components. Output keeps first-seen order.
pub fn aggregate_orders(lines: &[OrderLine], fallback_unit: &str) -> Vec<AggregatedOrderItem> {
    let mut totals: Vec<AggregatedOrderItem> = Vec::new();
    let mut index: HashMap<(MealCategory, String), usize> = HashMap::new();

    let mut add = |category: MealCategory, name: &str, unit: &str, quantity: f64| {
        let key = (category, name_key(name));
        match index.get(&key) {
            Some(&pos) => totals[pos].quantity += quantity,
            None => {
                index.insert(key, totals.len());
                totals.push(AggregatedOrderItem {
                    category,
                    item_name: name.trim().to_string(),
                    unit: unit.to_string(),
                    quantity,
                });
            }
        }
    };

    for line in lines {
        if !line.is_combo {
            add(line.category, &line.item_name, &line.unit, line.quantity);
            continue;
        }

        if line.combo_items.is_empty() {
            tracing::debug!(combo = %line.item_name, "Combo line has no components, skipping");
        }

        for component in &line.combo_items {
            let unit = component
                .unit
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(fallback_unit);
            add(
                line.category,
                &component.item_name,
                unit,
                component.quantity * line.quantity,
            );
        }
    }

    for total in &mut totals {
        total.quantity = round2(total.quantity);
    }

    totals
}
