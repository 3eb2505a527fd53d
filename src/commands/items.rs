use super::{optional, required, unique_violation};
use crate::error::{AppError, Result};
use crate::models::{ComboComponentDetail, ComboComponentInput, CreateItem, Item, UpdateItem};
use crate::planning::DEFAULT_UNIT;
use rusqlite::{Connection, OptionalExtension, Row};

const ITEM_SELECT: &str =
    "SELECT i.id, i.name, i.description, i.category_id, c.name, i.uom, i.meal, i.price,
            i.buffer_percentage, i.is_combo, i.created_at
     FROM items i
     LEFT JOIN categories c ON i.category_id = c.id";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        uom: row.get(5)?,
        meal: row.get(6)?,
        price: row.get(7)?,
        buffer_percentage: row.get(8)?,
        is_combo: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn validate_pricing(price: f64, buffer_percentage: Option<f64>) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price must be a non-negative number"));
    }
    if let Some(pct) = buffer_percentage {
        if !pct.is_finite() || pct < 0.0 {
            return Err(AppError::validation(
                "Buffer percentage must be a non-negative number",
            ));
        }
    }
    Ok(())
}

pub fn get_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY i.name", ITEM_SELECT))?;

    let items = stmt
        .query_map([], item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn get_item(conn: &Connection, id: i64) -> Result<Item> {
    conn.query_row(&format!("{} WHERE i.id = ?1", ITEM_SELECT), [id], item_from_row)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Item {}", id)))
}

pub fn create_item(conn: &Connection, item: CreateItem) -> Result<Item> {
    let name = required("Item name", &item.name)?;
    validate_pricing(item.price, item.buffer_percentage)?;
    let uom = optional(item.uom).unwrap_or_else(|| DEFAULT_UNIT.to_string());

    conn.execute(
        "INSERT INTO items (name, description, category_id, uom, meal, price, buffer_percentage, is_combo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            name,
            optional(item.description),
            item.category_id,
            uom,
            item.meal,
            item.price,
            item.buffer_percentage,
            item.is_combo
        ],
    )
    .map_err(|e| unique_violation(e, format!("Item '{}' already exists", name)))?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %name, combo = item.is_combo, "Created item");

    get_item(conn, id)
}

pub fn update_item(conn: &Connection, item: UpdateItem) -> Result<Item> {
    let name = required("Item name", &item.name)?;
    let uom = required("Unit", &item.uom)?;
    validate_pricing(item.price, item.buffer_percentage)?;

    let current = get_item(conn, item.id)?;
    if !current.is_combo && item.is_combo {
        let used_in: i64 = conn.query_row(
            "SELECT COUNT(*) FROM item_combos WHERE included_item_id = ?1",
            [item.id],
            |row| row.get(0),
        )?;
        if used_in > 0 {
            return Err(AppError::conflict(format!(
                "{} is part of {} combo(s) and cannot become a combo itself",
                current.name, used_in
            )));
        }
    }
    if current.is_combo && !item.is_combo {
        let components: i64 = conn.query_row(
            "SELECT COUNT(*) FROM item_combos WHERE combo_item_id = ?1",
            [item.id],
            |row| row.get(0),
        )?;
        if components > 0 {
            return Err(AppError::conflict(format!(
                "{} still has combo components; clear them first",
                current.name
            )));
        }
    }

    conn.execute(
        "UPDATE items SET name = ?1, description = ?2, category_id = ?3, uom = ?4, meal = ?5,
                price = ?6, buffer_percentage = ?7, is_combo = ?8
         WHERE id = ?9",
        rusqlite::params![
            name,
            optional(item.description),
            item.category_id,
            uom,
            item.meal,
            item.price,
            item.buffer_percentage,
            item.is_combo,
            item.id
        ],
    )
    .map_err(|e| unique_violation(e, format!("Item '{}' already exists", name)))?;

    get_item(conn, item.id)
}

pub fn delete_item(conn: &Connection, id: i64) -> Result<()> {
    let item = get_item(conn, id)?;

    let on_menus: i64 = conn.query_row(
        "SELECT COUNT(*) FROM menu_items WHERE item_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if on_menus > 0 {
        return Err(AppError::conflict(format!(
            "Cannot delete {}: it is used on {} menu line(s)",
            item.name, on_menus
        )));
    }

    let in_combos: i64 = conn.query_row(
        "SELECT COUNT(*) FROM item_combos WHERE included_item_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if in_combos > 0 {
        return Err(AppError::conflict(format!(
            "Cannot delete {}: it is part of a combo",
            item.name
        )));
    }

    conn.execute("DELETE FROM items WHERE id = ?1", [id])?;
    tracing::info!(id, name = %item.name, "Deleted item");

    Ok(())
}

/// Replaces the components of a combo item.
pub fn set_combo_components(
    conn: &Connection,
    combo_item_id: i64,
    components: &[ComboComponentInput],
) -> Result<Vec<ComboComponentDetail>> {
    let combo = get_item(conn, combo_item_id)?;
    if !combo.is_combo {
        return Err(AppError::validation(format!("{} is not a combo item", combo.name)));
    }

    for component in components {
        if !component.quantity.is_finite() || component.quantity <= 0.0 {
            return Err(AppError::validation(
                "Combo component quantities must be greater than zero",
            ));
        }
        let included = get_item(conn, component.item_id)?;
        if included.is_combo {
            return Err(AppError::validation(format!(
                "{} is a combo and cannot be nested inside {}",
                included.name, combo.name
            )));
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM item_combos WHERE combo_item_id = ?1",
        [combo_item_id],
    )?;
    for component in components {
        tx.execute(
            "INSERT INTO item_combos (combo_item_id, included_item_id, quantity) VALUES (?1, ?2, ?3)",
            rusqlite::params![combo_item_id, component.item_id, component.quantity],
        )?;
    }
    tx.commit()?;

    tracing::debug!(combo = %combo.name, components = components.len(), "Updated combo components");

    get_combo_components(conn, combo_item_id)
}

pub fn get_combo_components(conn: &Connection, combo_item_id: i64) -> Result<Vec<ComboComponentDetail>> {
    let mut stmt = conn.prepare(
        "SELECT ic.included_item_id, i.name, i.uom, ic.quantity
         FROM item_combos ic
         JOIN items i ON ic.included_item_id = i.id
         WHERE ic.combo_item_id = ?1
         ORDER BY ic.id",
    )?;

    let components = stmt
        .query_map([combo_item_id], |row| {
            Ok(ComboComponentDetail {
                item_id: row.get(0)?,
                item_name: row.get(1)?,
                uom: row.get(2)?,
                quantity: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(components)
}
