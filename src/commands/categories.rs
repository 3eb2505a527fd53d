use super::{required, unique_violation};
use crate::error::{AppError, Result};
use crate::models::Category;
use rusqlite::Connection;

pub fn get_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;

    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

pub fn create_category(conn: &Connection, name: &str) -> Result<Category> {
    let name = required("Category name", name)?;

    conn.execute("INSERT INTO categories (name) VALUES (?1)", [&name])
        .map_err(|e| unique_violation(e, format!("Category '{}' already exists", name)))?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %name, "Created category");

    Ok(Category { id, name })
}

pub fn delete_category(conn: &Connection, id: i64) -> Result<()> {
    // Items keep existing, just without a category
    conn.execute(
        "UPDATE items SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;

    conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Category {}", id)));
    }

    Ok(())
}
