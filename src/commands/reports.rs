use super::{orders::recent_orders, parse_date, validate_date, DATE_FORMAT};
use crate::error::{AppError, Result};
use crate::models::{
    CategoryReportRow, ChecklistEntry, ChecklistStatus, CustomerReportRow, Dashboard,
    MealCategory, OrderStatus, SalesReportRow, SubscriptionReportRow,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashMap;

const TOP_CUSTOMERS: i64 = 10;
const RECENT_ORDERS: i64 = 5;

fn date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        return Err(AppError::validation("Start date must not be after end date"));
    }
    Ok((start, end))
}

fn fmt(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Daily revenue and order count, with a zero row for days without orders.
pub fn sales_report(conn: &Connection, start: &str, end: &str) -> Result<Vec<SalesReportRow>> {
    let (start, end) = date_range(start, end)?;

    let mut stmt = conn.prepare(
        "SELECT order_date, COALESCE(SUM(total_price), 0), COUNT(*)
         FROM orders
         WHERE order_date BETWEEN ?1 AND ?2 AND status <> ?3
         GROUP BY order_date",
    )?;

    let totals: HashMap<String, (f64, i64)> = stmt
        .query_map(
            rusqlite::params![fmt(start), fmt(end), OrderStatus::Cancelled],
            |row| Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?))),
        )?
        .collect::<Result<HashMap<_, _>, _>>()?;

    let rows = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            let date = fmt(day);
            let (total_sales, total_orders) = totals.get(&date).copied().unwrap_or((0.0, 0));
            SalesReportRow {
                date,
                total_sales,
                total_orders,
            }
        })
        .collect();

    Ok(rows)
}

/// Items sold and revenue per item category, best sellers first.
pub fn category_report(conn: &Connection, start: &str, end: &str) -> Result<Vec<CategoryReportRow>> {
    let (start, end) = date_range(start, end)?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(c.name, 'Uncategorized') AS category_name,
                COALESCE(SUM(oi.quantity), 0),
                COALESCE(SUM(oi.quantity * oi.price), 0)
         FROM order_items oi
         JOIN orders o ON oi.order_id = o.id
         JOIN items i ON oi.item_id = i.id
         LEFT JOIN categories c ON i.category_id = c.id
         WHERE o.order_date BETWEEN ?1 AND ?2 AND o.status <> ?3
         GROUP BY category_name
         ORDER BY 3 DESC, category_name ASC",
    )?;

    let rows = stmt
        .query_map(
            rusqlite::params![fmt(start), fmt(end), OrderStatus::Cancelled],
            |row| {
                Ok(CategoryReportRow {
                    category_name: row.get(0)?,
                    total_items_sold: row.get(1)?,
                    total_revenue: row.get(2)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn top_customers_report(conn: &Connection, start: &str, end: &str) -> Result<Vec<CustomerReportRow>> {
    let (start, end) = date_range(start, end)?;

    let mut stmt = conn.prepare(
        "SELECT c.name, COUNT(o.id), COALESCE(SUM(o.total_price), 0), MAX(o.order_date)
         FROM orders o
         JOIN customers c ON o.customer_id = c.id
         WHERE o.order_date BETWEEN ?1 AND ?2 AND o.status <> ?3
         GROUP BY c.id, c.name
         ORDER BY 3 DESC, c.name ASC
         LIMIT ?4",
    )?;

    let rows = stmt
        .query_map(
            rusqlite::params![fmt(start), fmt(end), OrderStatus::Cancelled, TOP_CUSTOMERS],
            |row| {
                Ok(CustomerReportRow {
                    customer_name: row.get(0)?,
                    total_orders: row.get(1)?,
                    total_spent: row.get(2)?,
                    last_order_date: row.get(3)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Subscription orders per meal, in meal order.
pub fn subscription_report(conn: &Connection, start: &str, end: &str) -> Result<Vec<SubscriptionReportRow>> {
    let (start, end) = date_range(start, end)?;

    let mut stmt = conn.prepare(
        "SELECT meal, COUNT(*), COALESCE(SUM(total_price), 0)
         FROM orders
         WHERE order_date BETWEEN ?1 AND ?2 AND status <> ?3 AND order_type = 'subscription'
         GROUP BY meal",
    )?;

    let mut rows = stmt
        .query_map(
            rusqlite::params![fmt(start), fmt(end), OrderStatus::Cancelled],
            |row| {
                Ok(SubscriptionReportRow {
                    meal: row.get(0)?,
                    total_subscriptions: row.get(1)?,
                    total_revenue: row.get(2)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by_key(|row| row.meal);

    Ok(rows)
}

/// One menu step of the daily checklist: done once every meal has reached it.
fn menu_step(key: &str, label: &str, done: i64, noun: &str) -> ChecklistEntry {
    let expected = MealCategory::ALL.len() as i64;
    let completed = done >= expected;
    let status = if completed {
        ChecklistStatus::Done
    } else if done > 0 {
        ChecklistStatus::InProgress
    } else {
        ChecklistStatus::Pending
    };

    ChecklistEntry {
        key: key.to_string(),
        label: label.to_string(),
        completed,
        status,
        detail: Some(format!("{}/{} {}", done, expected, noun)),
    }
}

fn deliveries_step(total: i64, delivered: i64, open: i64) -> ChecklistEntry {
    let completed = total > 0 && open == 0;
    let status = if completed {
        ChecklistStatus::Done
    } else if delivered > 0 {
        ChecklistStatus::InProgress
    } else {
        ChecklistStatus::Pending
    };

    ChecklistEntry {
        key: "deliveries".to_string(),
        label: "Deliveries Completed".to_string(),
        completed,
        status,
        detail: Some(if total > 0 {
            format!("{}/{} delivered", delivered, total)
        } else {
            "No orders yet".to_string()
        }),
    }
}

/// Overall order counts, the checklist for `date`, and the latest orders.
pub fn dashboard(conn: &Connection, date: &str) -> Result<Dashboard> {
    let date = validate_date(date)?;

    let total_customers: i64 =
        conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;

    let (total_orders, pending_orders, completed_orders): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN status IN (?1, ?2) THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = ?3 THEN 1 ELSE 0 END), 0)
         FROM orders
         WHERE status <> ?4",
        rusqlite::params![
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Delivered,
            OrderStatus::Cancelled
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let (ready, released, planned): (i64, i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(EXISTS(SELECT 1 FROM menu_items mi WHERE mi.menu_id = m.id)), 0),
                COALESCE(SUM(m.is_released), 0),
                COALESCE(SUM(m.is_production_generated), 0)
         FROM menus m
         WHERE m.date = ?1",
        [&date],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let (day_orders, delivered, open): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status IN (?3, ?4) THEN 1 ELSE 0 END), 0)
         FROM orders
         WHERE order_date = ?1 AND status <> ?5",
        rusqlite::params![
            date,
            OrderStatus::Delivered,
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let checklist = vec![
        menu_step("daily_menu", "Daily Menu Setup", ready, "menus ready"),
        menu_step("menu_release", "Menu Release", released, "released"),
        menu_step("production_plan", "Kitchen Production Planning", planned, "planned"),
        deliveries_step(day_orders, delivered, open),
    ];

    Ok(Dashboard {
        date,
        total_customers,
        total_orders,
        pending_orders,
        completed_orders,
        checklist,
        recent_orders: recent_orders(conn, RECENT_ORDERS)?,
    })
}
