use super::required;
use crate::error::{AppError, Result};
use crate::models::SubscriptionReplacement;
use rusqlite::Connection;

pub fn get_replacements(conn: &Connection) -> Result<Vec<SubscriptionReplacement>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_name, default_item FROM subscription_replacements ORDER BY group_name",
    )?;

    let replacements = stmt
        .query_map([], |row| {
            Ok(SubscriptionReplacement {
                id: row.get(0)?,
                group: row.get(1)?,
                default_item: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(replacements)
}

/// Maps a subscription group to the item cooked for it, replacing any
/// existing mapping for the same group.
pub fn set_replacement(conn: &Connection, group: &str, default_item: &str) -> Result<SubscriptionReplacement> {
    let group = required("Subscription group", group)?;
    let default_item = required("Default item", default_item)?;

    conn.execute(
        "INSERT INTO subscription_replacements (group_name, default_item) VALUES (?1, ?2)
         ON CONFLICT(group_name) DO UPDATE SET default_item = excluded.default_item",
        [&group, &default_item],
    )?;

    let replacement = conn.query_row(
        "SELECT id, group_name, default_item FROM subscription_replacements WHERE group_name = ?1",
        [&group],
        |row| {
            Ok(SubscriptionReplacement {
                id: row.get(0)?,
                group: row.get(1)?,
                default_item: row.get(2)?,
            })
        },
    )?;

    tracing::info!(group = %replacement.group, default_item = %replacement.default_item, "Saved subscription replacement");

    Ok(replacement)
}

pub fn delete_replacement(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM subscription_replacements WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Subscription replacement {}", id)));
    }

    Ok(())
}
