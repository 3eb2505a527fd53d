//! Loads production plans from the database and writes the kitchen's
//! decisions back onto the menu.

use super::{
    admin_logs::log_admin_action, menus::find_menu, menus::published_menu_items,
    orders::order_lines_for, parse_date, subscriptions::get_replacements, validate_date,
};
use crate::error::{AppError, Result};
use crate::models::{
    MealCategory, MenuWithItems, NewAdminLog, PlanItem, PlannedQtyResult, PlannedQtyUpdate,
    ProductionPlan, ProductionStatus, SavePlanResult, SubscriptionReplacement,
};
use crate::planning::{
    aggregate_orders, apply_item_buffers, apply_replacements_to_menu,
    apply_replacements_to_orders, merge_plan, name_key, plan_to_csv, plan_to_html, round2,
    set_item_buffer, unplanned_orders,
};
use rusqlite::Connection;
use std::collections::HashMap;

/// Builds the plan for one meal. A date without a menu yields an empty,
/// unpublished plan rather than an error.
pub fn load_plan(
    conn: &Connection,
    date: &str,
    meal: MealCategory,
    fallback_unit: &str,
) -> Result<ProductionPlan> {
    let date = validate_date(date)?;

    let menu = match find_menu(conn, &date, meal)? {
        Some(menu) => menu,
        None => {
            tracing::debug!(date = %date, meal = %meal, "No menu, empty plan");
            return Ok(ProductionPlan {
                date,
                category: meal,
                published: false,
                generated: false,
                items: Vec::new(),
                unplanned: Vec::new(),
            });
        }
    };

    let replacements = get_replacements(conn)?;

    let mut published = published_menu_items(&menu);
    apply_replacements_to_menu(&mut published, &replacements);

    let mut lines = order_lines_for(conn, &date, meal)?;
    apply_replacements_to_orders(&mut lines, &replacements);

    let aggregated = aggregate_orders(&lines, fallback_unit);
    let mut items = merge_plan(&published, &aggregated);
    if !menu.menu.is_production_generated {
        apply_item_buffers(&mut items, &item_buffer_percents(&menu, &replacements));
    }
    let unplanned = unplanned_orders(&published, &aggregated);

    for item in &unplanned {
        tracing::warn!(
            date = %date,
            meal = %meal,
            item = %item.item_name,
            quantity = item.quantity,
            "Ordered item is not on the published menu"
        );
    }

    tracing::debug!(date = %date, meal = %meal, items = items.len(), orders = lines.len(), "Loaded production plan");

    Ok(ProductionPlan {
        date,
        category: meal,
        published: menu.menu.is_released,
        generated: menu.menu.is_production_generated,
        items,
        unplanned,
    })
}

/// Plans for every meal of the day, breakfast first.
pub fn load_day_plan(conn: &Connection, date: &str, fallback_unit: &str) -> Result<Vec<ProductionPlan>> {
    MealCategory::ALL
        .iter()
        .map(|meal| load_plan(conn, date, *meal, fallback_unit))
        .collect()
}

fn renamed_keys(replacements: &[SubscriptionReplacement]) -> HashMap<String, String> {
    replacements
        .iter()
        .map(|r| (name_key(&r.group), name_key(&r.default_item)))
        .collect()
}

/// The key a menu line appears under in the plan, after subscription
/// replacements.
fn plan_key(name: &str, renamed: &HashMap<String, String>) -> String {
    let key = name_key(name);
    renamed.get(&key).cloned().unwrap_or(key)
}

fn lines_by_plan_name(
    menu: &MenuWithItems,
    replacements: &[SubscriptionReplacement],
) -> HashMap<String, Vec<i64>> {
    let renamed = renamed_keys(replacements);

    let mut lines: HashMap<String, Vec<i64>> = HashMap::new();
    for item in &menu.items {
        lines
            .entry(plan_key(&item.item_name, &renamed))
            .or_default()
            .push(item.id);
    }
    lines
}

fn item_buffer_percents(
    menu: &MenuWithItems,
    replacements: &[SubscriptionReplacement],
) -> HashMap<String, f64> {
    let renamed = renamed_keys(replacements);

    menu.items
        .iter()
        .filter(|item| !item.is_combo)
        .filter_map(|item| {
            item.buffer_percentage
                .map(|percent| (plan_key(&item.item_name, &renamed), percent))
        })
        .collect()
}

fn existing_menu(conn: &Connection, date: &str, meal: MealCategory) -> Result<MenuWithItems> {
    find_menu(conn, date, meal)?
        .ok_or_else(|| AppError::not_found(format!("{} menu for {}", meal, date)))
}

/// Stores buffer and final quantities on the matching menu lines and marks
/// the menu's production plan as generated.
pub fn save_plan(
    conn: &Connection,
    date: &str,
    meal: MealCategory,
    items: &[PlanItem],
) -> Result<SavePlanResult> {
    let date = validate_date(date)?;
    let menu = existing_menu(conn, &date, meal)?;

    let mut checked = Vec::with_capacity(items.len());
    for item in items {
        let mut item = item.clone();
        let buffer = item.buffer_quantity;
        set_item_buffer(&mut item, buffer)?;
        checked.push(item);
    }

    let lines = lines_by_plan_name(&menu, &get_replacements(conn)?);

    let tx = conn.unchecked_transaction()?;
    let mut updated_items = 0;

    for item in &checked {
        let Some(ids) = lines.get(&name_key(&item.item_name)) else {
            tracing::debug!(item = %item.item_name, "Plan item has no menu line, skipped");
            continue;
        };
        for id in ids {
            updated_items += tx.execute(
                "UPDATE menu_items SET buffer_qty = ?1, final_qty = ?2 WHERE id = ?3",
                rusqlite::params![item.buffer_quantity, item.final_quantity, id],
            )?;
        }
    }

    tx.execute(
        "UPDATE menus SET is_production_generated = 1 WHERE id = ?1",
        [menu.menu.id],
    )?;
    tx.commit()?;

    tracing::info!(date = %date, meal = %meal, updated_items, "Saved production plan");

    log_admin_action(
        conn,
        &NewAdminLog {
            admin_name: None,
            action_type: "generate_production".to_string(),
            entity_type: "menu".to_string(),
            entity_id: menu.menu.id,
            description: Some(format!(
                "Production plan saved for {} {} ({} items)",
                date, meal, updated_items
            )),
        },
    );

    Ok(SavePlanResult { meal, updated_items })
}

/// Adds last-minute quantities to the planned amounts of menu lines.
pub fn update_planned(
    conn: &Connection,
    date: &str,
    meal: MealCategory,
    updates: &[PlannedQtyUpdate],
) -> Result<Vec<PlannedQtyResult>> {
    if updates.is_empty() {
        return Err(AppError::validation("No updates provided"));
    }
    if updates
        .iter()
        .any(|u| !u.additional_qty.is_finite() || u.additional_qty <= 0.0)
    {
        return Err(AppError::validation(
            "Additional quantities must be greater than zero.",
        ));
    }

    let date = validate_date(date)?;
    let menu = existing_menu(conn, &date, meal)?;
    let lines = lines_by_plan_name(&menu, &get_replacements(conn)?);

    let tx = conn.unchecked_transaction()?;
    let mut results = Vec::new();

    for update in updates {
        let Some(ids) = lines.get(&name_key(&update.item_name)) else {
            tracing::debug!(item = %update.item_name, "No menu line to add planned quantity to");
            continue;
        };

        let mut new_planned_qty = 0.0;
        for id in ids {
            tx.execute(
                "UPDATE menu_items SET planned_qty = planned_qty + ?1 WHERE id = ?2",
                rusqlite::params![update.additional_qty, id],
            )?;
            new_planned_qty = tx.query_row(
                "SELECT planned_qty FROM menu_items WHERE id = ?1",
                [id],
                |row| row.get(0),
            )?;
        }

        results.push(PlannedQtyResult {
            item_name: update.item_name.clone(),
            new_planned_qty: round2(new_planned_qty),
        });
    }

    if results.is_empty() {
        return Err(AppError::not_found("Matching menu items"));
    }

    tx.commit()?;
    tracing::info!(date = %date, meal = %meal, updated = results.len(), "Updated planned quantities");

    Ok(results)
}

pub fn production_status(conn: &Connection, date: &str) -> Result<Vec<ProductionStatus>> {
    let date = validate_date(date)?;

    let mut statuses = Vec::with_capacity(MealCategory::ALL.len());
    for meal in MealCategory::ALL {
        let status = match find_menu(conn, &date, meal)? {
            Some(menu) => ProductionStatus {
                meal,
                has_menu: true,
                is_released: menu.menu.is_released,
                is_generated: menu.menu.is_production_generated,
            },
            None => ProductionStatus {
                meal,
                has_menu: false,
                is_released: false,
                is_generated: false,
            },
        };
        statuses.push(status);
    }

    Ok(statuses)
}

/// CSV of every published plan item of the day, meal by meal.
pub fn export_day_csv(conn: &Connection, date: &str, fallback_unit: &str) -> Result<String> {
    let items: Vec<PlanItem> = load_day_plan(conn, date, fallback_unit)?
        .into_iter()
        .filter(|plan| plan.published)
        .flat_map(|plan| plan.items)
        .collect();

    Ok(plan_to_csv(&items))
}

pub fn export_day_html(conn: &Connection, date: &str, fallback_unit: &str) -> Result<String> {
    let label = parse_date(date)?.format("%A, %d %B %Y").to_string();
    let plans = load_day_plan(conn, date, fallback_unit)?;

    Ok(plan_to_html(&plans, &label))
}
