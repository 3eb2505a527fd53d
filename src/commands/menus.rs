use super::validate_date;
use crate::error::{AppError, Result};
use crate::models::{
    MealCategory, Menu, MenuItem, MenuWithItems, PublishedMenuItem, UpsertMenu,
};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashSet;

const MENU_SELECT: &str =
    "SELECT id, date, meal, period_type, is_festival, is_released, is_production_generated FROM menus";

fn menu_from_row(row: &Row<'_>) -> rusqlite::Result<Menu> {
    Ok(Menu {
        id: row.get(0)?,
        date: row.get(1)?,
        meal: row.get(2)?,
        period_type: row.get(3)?,
        is_festival: row.get(4)?,
        is_released: row.get(5)?,
        is_production_generated: row.get(6)?,
    })
}

fn menu_items(conn: &Connection, menu_id: i64) -> Result<Vec<MenuItem>> {
    let mut stmt = conn.prepare(
        "SELECT mi.id, mi.menu_id, mi.item_id, i.name, i.uom, i.is_combo, mi.planned_qty,
                mi.available_qty, mi.buffer_qty, mi.final_qty, mi.rate, mi.sort_order,
                i.buffer_percentage
         FROM menu_items mi
         JOIN items i ON mi.item_id = i.id
         WHERE mi.menu_id = ?1
         ORDER BY mi.sort_order ASC, mi.id ASC",
    )?;

    let items = stmt
        .query_map([menu_id], |row| {
            Ok(MenuItem {
                id: row.get(0)?,
                menu_id: row.get(1)?,
                item_id: row.get(2)?,
                item_name: row.get(3)?,
                uom: row.get(4)?,
                is_combo: row.get(5)?,
                planned_qty: row.get(6)?,
                available_qty: row.get(7)?,
                buffer_qty: row.get(8)?,
                final_qty: row.get(9)?,
                rate: row.get(10)?,
                sort_order: row.get(11)?,
                buffer_percentage: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn find_menu(conn: &Connection, date: &str, meal: MealCategory) -> Result<Option<MenuWithItems>> {
    let date = validate_date(date)?;

    let menu = conn
        .query_row(
            &format!("{} WHERE date = ?1 AND meal = ?2", MENU_SELECT),
            rusqlite::params![date, meal],
            menu_from_row,
        )
        .optional()?;

    match menu {
        Some(menu) => {
            let items = menu_items(conn, menu.id)?;
            Ok(Some(MenuWithItems { menu, items }))
        }
        None => Ok(None),
    }
}

pub fn get_menu(conn: &Connection, date: &str, meal: MealCategory) -> Result<MenuWithItems> {
    find_menu(conn, date, meal)?
        .ok_or_else(|| AppError::not_found(format!("{} menu for {}", meal, date)))
}

/// Creates the menu for a date and meal, or replaces the lines of the
/// existing one. Replacing resets the production plan flag.
pub fn upsert_menu(conn: &Connection, payload: UpsertMenu) -> Result<MenuWithItems> {
    let date = validate_date(&payload.date)?;

    let mut seen = HashSet::new();
    for line in &payload.items {
        if !seen.insert(line.item_id) {
            return Err(AppError::validation(format!(
                "Item {} appears more than once on the menu",
                line.item_id
            )));
        }
        if !line.planned_qty.is_finite() || line.planned_qty < 0.0 {
            return Err(AppError::validation("Planned quantity must be a non-negative number"));
        }
        if let Some(available) = line.available_qty {
            if !available.is_finite() || available < 0.0 {
                return Err(AppError::validation(
                    "Available quantity must be a non-negative number",
                ));
            }
        }
        if !line.rate.is_finite() || line.rate < 0.0 {
            return Err(AppError::validation("Rate must be a non-negative number"));
        }
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
            [line.item_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AppError::not_found(format!("Item {}", line.item_id)));
        }
    }

    let tx = conn.unchecked_transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM menus WHERE date = ?1 AND meal = ?2",
            rusqlite::params![date, payload.meal],
            |row| row.get(0),
        )
        .optional()?;

    let menu_id = match existing {
        Some(menu_id) => {
            let ordered: i64 = tx.query_row(
                "SELECT COUNT(*) FROM order_items oi
                 JOIN menu_items mi ON oi.menu_item_id = mi.id
                 WHERE mi.menu_id = ?1",
                [menu_id],
                |row| row.get(0),
            )?;
            if ordered > 0 {
                return Err(AppError::conflict(format!(
                    "The {} menu for {} already has orders and cannot be replaced",
                    payload.meal, date
                )));
            }

            tx.execute(
                "UPDATE menus SET is_festival = ?1, period_type = ?2, is_production_generated = 0
                 WHERE id = ?3",
                rusqlite::params![payload.is_festival, payload.period_type, menu_id],
            )?;
            tx.execute("DELETE FROM menu_items WHERE menu_id = ?1", [menu_id])?;
            menu_id
        }
        None => {
            tx.execute(
                "INSERT INTO menus (date, meal, period_type, is_festival, is_released)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                rusqlite::params![date, payload.meal, payload.period_type, payload.is_festival],
            )?;
            tx.last_insert_rowid()
        }
    };

    for (idx, line) in payload.items.iter().enumerate() {
        let sort_order = line.sort_order.unwrap_or(idx as i32 + 1);
        let available = line.available_qty.unwrap_or(line.planned_qty);
        tx.execute(
            "INSERT INTO menu_items (menu_id, item_id, planned_qty, available_qty, final_qty, rate, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?3, ?5, ?6)",
            rusqlite::params![menu_id, line.item_id, line.planned_qty, available, line.rate, sort_order],
        )?;
    }

    tx.commit()?;
    tracing::info!(menu_id, date = %date, meal = %payload.meal, items = payload.items.len(), "Saved menu");

    get_menu(conn, &date, payload.meal)
}

pub fn set_menu_released(conn: &Connection, menu_id: i64, released: bool) -> Result<Menu> {
    conn.execute(
        "UPDATE menus SET is_released = ?1 WHERE id = ?2",
        rusqlite::params![released, menu_id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Menu {}", menu_id)));
    }

    tracing::info!(menu_id, released, "Changed menu release state");

    let menu = conn.query_row(
        &format!("{} WHERE id = ?1", MENU_SELECT),
        [menu_id],
        menu_from_row,
    )?;

    Ok(menu)
}

/// The menu as the production planner consumes it. Combo lines are left
/// out: the kitchen cooks their components, which are planned on their own.
pub fn published_menu_items(menu: &MenuWithItems) -> Vec<PublishedMenuItem> {
    menu.items
        .iter()
        .filter(|item| !item.is_combo)
        .map(|item| PublishedMenuItem {
            date: menu.menu.date.clone(),
            item_name: item.item_name.clone(),
            unit: item.uom.clone(),
            category: menu.menu.meal,
            planned_quantity: item.planned_qty,
            available_quantity: item.available_qty.max(0.0),
            buffer_quantity: Some(item.buffer_qty),
            final_quantity: Some(item.final_qty),
        })
        .collect()
}
