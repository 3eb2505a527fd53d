use crate::error::Result;
use crate::models::{AdminLog, AdminLogFilter, NewAdminLog};
use rusqlite::Connection;

/// Records an admin action. Never fails the caller: a write error is only
/// logged.
pub fn log_admin_action(conn: &Connection, entry: &NewAdminLog) {
    let result = conn.execute(
        "INSERT INTO admin_logs (admin_name, action_type, entity_type, entity_id, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            entry.admin_name,
            entry.action_type,
            entry.entity_type,
            entry.entity_id,
            entry.description
        ],
    );

    if let Err(e) = result {
        tracing::warn!(
            action = %entry.action_type,
            entity = %entry.entity_type,
            entity_id = entry.entity_id,
            error = %e,
            "Failed to write admin log"
        );
    }
}

pub fn get_admin_logs(conn: &Connection, filter: &AdminLogFilter) -> Result<Vec<AdminLog>> {
    let mut sql = String::from(
        "SELECT id, admin_name, action_type, entity_type, entity_id, description, created_at
         FROM admin_logs WHERE 1 = 1",
    );
    let mut params: Vec<String> = Vec::new();

    let filters = [
        ("admin_name", &filter.admin_name),
        ("entity_type", &filter.entity_type),
        ("action_type", &filter.action_type),
    ];
    for (column, value) in filters {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            params.push(value.to_string());
            sql.push_str(&format!(" AND {} = ?{}", column, params.len()));
        }
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;

    let logs = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(AdminLog {
                id: row.get(0)?,
                admin_name: row.get(1)?,
                action_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                description: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(logs)
}
