use super::{name_key, round2};
use crate::models::{
    AggregatedOrderItem, BaseSource, MealCategory, PlanItem, PublishedMenuItem,
};
use std::collections::{HashMap, HashSet};

/// Joins the published menu against aggregated orders. One plan item per
/// menu line, in menu order.
pub fn merge_plan(menu: &[PublishedMenuItem], aggregated: &[AggregatedOrderItem]) -> Vec<PlanItem> {
    let ordered: HashMap<(MealCategory, String), f64> = aggregated
        .iter()
        .map(|item| ((item.category, name_key(&item.item_name)), item.quantity))
        .collect();

    menu.iter()
        .map(|menu_item| {
            let key = (menu_item.category, name_key(&menu_item.item_name));
            let planned = round2(menu_item.planned_quantity);
            let (customer_orders, base_quantity, base_source) = match ordered.get(&key) {
                Some(&quantity) => (quantity, quantity, BaseSource::Orders),
                None => (0.0, planned, BaseSource::Planned),
            };
            let buffer_quantity = round2(menu_item.buffer_quantity.unwrap_or(0.0));

            PlanItem {
                item_name: menu_item.item_name.clone(),
                unit: menu_item.unit.clone(),
                category: menu_item.category,
                planned_quantity: planned,
                customer_orders,
                base_quantity,
                base_source,
                buffer_quantity,
                final_quantity: round2(base_quantity + buffer_quantity),
            }
        })
        .collect()
}

/// Aggregated items that do not appear on the menu of their meal.
pub fn unplanned_orders(
    menu: &[PublishedMenuItem],
    aggregated: &[AggregatedOrderItem],
) -> Vec<AggregatedOrderItem> {
    let on_menu: HashSet<(MealCategory, String)> = menu
        .iter()
        .map(|item| (item.category, name_key(&item.item_name)))
        .collect();

    aggregated
        .iter()
        .filter(|item| !on_menu.contains(&(item.category, name_key(&item.item_name))))
        .cloned()
        .collect()
}
