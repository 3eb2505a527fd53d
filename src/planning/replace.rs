use super::name_key;
use crate::models::{OrderLine, PublishedMenuItem, SubscriptionReplacement};
use std::collections::HashMap;

fn replacement_map(replacements: &[SubscriptionReplacement]) -> HashMap<String, &str> {
    replacements
        .iter()
        .map(|r| (name_key(&r.group), r.default_item.as_str()))
        .collect()
}

/// Renames subscription groups on order lines (and combo components) to the
/// item the kitchen actually cooks for them.
pub fn apply_replacements_to_orders(lines: &mut [OrderLine], replacements: &[SubscriptionReplacement]) {
    if replacements.is_empty() {
        return;
    }
    let map = replacement_map(replacements);

    for line in lines.iter_mut() {
        if let Some(default_item) = map.get(&name_key(&line.item_name)) {
            line.item_name = default_item.to_string();
        }
        for component in line.combo_items.iter_mut() {
            if let Some(default_item) = map.get(&name_key(&component.item_name)) {
                component.item_name = default_item.to_string();
            }
        }
    }
}

pub fn apply_replacements_to_menu(
    items: &mut [PublishedMenuItem],
    replacements: &[SubscriptionReplacement],
) {
    if replacements.is_empty() {
        return;
    }
    let map = replacement_map(replacements);

    for item in items.iter_mut() {
        if let Some(default_item) = map.get(&name_key(&item.item_name)) {
            item.item_name = default_item.to_string();
        }
    }
}
