use super::customers::{find_address, get_customer};
use super::{items::get_combo_components, optional, parse_date, required, validate_date, DATE_FORMAT};
use crate::error::{AppError, Result};
use crate::models::{
    ComboComponent, CreateOrder, Invoice, InvoiceLine, MealCategory, Order, OrderHistoryEntry,
    OrderHistoryFilter, OrderHistoryPage, OrderItem, OrderLine, OrderStatus, OrderWithItems,
    RecentOrder,
};
use crate::planning::round2;
use chrono::Local;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashMap;

const HISTORY_LIMIT: i64 = 25;
const CUSTOMER_ORDERS_LIMIT: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

const ORDER_SELECT: &str =
    "SELECT o.id, o.customer_id, c.name, o.address_id, o.order_date, o.meal, o.total_price,
            o.discount, o.status, o.payment_method, o.order_type, o.created_at
     FROM orders o
     LEFT JOIN customers c ON o.customer_id = c.id";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        address_id: row.get(3)?,
        order_date: row.get(4)?,
        meal: row.get(5)?,
        total_price: row.get(6)?,
        discount: row.get(7)?,
        status: row.get(8)?,
        payment_method: row.get(9)?,
        order_type: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn order_items(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>> {
    let mut item_stmt = conn.prepare(
        "SELECT oi.id, oi.order_id, oi.item_id, i.name, oi.menu_item_id, oi.quantity, oi.price
         FROM order_items oi
         LEFT JOIN items i ON oi.item_id = i.id
         WHERE oi.order_id = ?1
         ORDER BY oi.id",
    )?;

    let items = item_stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                item_id: row.get(2)?,
                item_name: row.get(3)?,
                menu_item_id: row.get(4)?,
                quantity: row.get(5)?,
                price: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Resolves the delivery address: the requested one if it belongs to the
/// customer, otherwise the customer's default.
fn resolve_address(conn: &Connection, customer_id: i64, requested: Option<i64>) -> Result<i64> {
    if let Some(address_id) = requested {
        let owned: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM addresses WHERE id = ?1 AND customer_id = ?2)",
            [address_id, customer_id],
            |row| row.get(0),
        )?;
        if owned {
            return Ok(address_id);
        }
        tracing::debug!(customer_id, address_id, "Requested address not owned by customer, using default");
    }

    conn.query_row(
        "SELECT id FROM addresses WHERE customer_id = ?1 AND is_default = 1 LIMIT 1",
        [customer_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| AppError::validation("No valid address found for customer"))
}

pub fn create_order(conn: &Connection, order: CreateOrder) -> Result<OrderWithItems> {
    if order.items.is_empty() {
        return Err(AppError::validation("Order must include at least one item"));
    }
    if order.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::validation("Item quantities must be greater than zero"));
    }
    let discount = order.discount.unwrap_or(0.0);
    if !discount.is_finite() || discount < 0.0 {
        return Err(AppError::validation("Discount must be a non-negative number"));
    }
    let date = validate_date(&order.order_date)?;
    let payment_method = required("Payment method", &order.payment_method)?;
    let order_type = order
        .order_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("one_time")
        .to_lowercase();

    let customer_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1)",
        [order.customer_id],
        |row| row.get(0),
    )?;
    if !customer_exists {
        return Err(AppError::not_found(format!("Customer {}", order.customer_id)));
    }
    let address_id = resolve_address(conn, order.customer_id, order.address_id)?;

    let (menu_id, released): (i64, bool) = conn
        .query_row(
            "SELECT id, is_released FROM menus WHERE date = ?1 AND meal = ?2",
            rusqlite::params![date, order.meal],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("{} menu for {}", order.meal, date)))?;

    if !released {
        return Err(AppError::validation(format!(
            "The {} menu for {} is not released yet",
            order.meal, date
        )));
    }

    // Calculate total and validate availability
    let mut subtotal = 0.0;
    let mut line_details: Vec<(i64, i64, i32, f64)> = Vec::new();
    let mut requested: HashMap<i64, f64> = HashMap::new();

    for item in &order.items {
        let (item_id, name, rate, available): (i64, String, f64, f64) = conn
            .query_row(
                "SELECT mi.item_id, i.name, mi.rate, mi.available_qty
                 FROM menu_items mi
                 JOIN items i ON mi.item_id = i.id
                 WHERE mi.id = ?1 AND mi.menu_id = ?2",
                [item.menu_item_id, menu_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Menu item {} is not on the {} menu for {}",
                    item.menu_item_id, order.meal, date
                ))
            })?;

        let wanted = requested.entry(item.menu_item_id).or_insert(0.0);
        *wanted += item.quantity as f64;
        if available < *wanted {
            return Err(AppError::validation(format!(
                "Insufficient quantity for {}: requested {}, available {}",
                name, wanted, available
            )));
        }

        subtotal += rate * item.quantity as f64;
        line_details.push((item_id, item.menu_item_id, item.quantity, rate));
    }

    let total = round2((subtotal - discount).max(0.0));

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO orders (customer_id, address_id, order_date, meal, total_price, discount, status, payment_method, order_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            order.customer_id,
            address_id,
            date,
            order.meal,
            total,
            discount,
            OrderStatus::Pending,
            payment_method,
            order_type
        ],
    )?;

    let order_id = tx.last_insert_rowid();

    for (item_id, menu_item_id, qty, rate) in &line_details {
        tx.execute(
            "INSERT INTO order_items (order_id, item_id, menu_item_id, quantity, price) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![order_id, item_id, menu_item_id, qty, rate],
        )?;

        // Reserve from the menu
        tx.execute(
            "UPDATE menu_items SET available_qty = MAX(available_qty - ?1, 0) WHERE id = ?2",
            rusqlite::params![qty, menu_item_id],
        )?;
    }

    tx.commit()?;
    tracing::info!(order_id, customer_id = order.customer_id, date = %date, meal = %order.meal, total, "Placed order");

    get_order(conn, order_id)
}

pub fn get_order(conn: &Connection, id: i64) -> Result<OrderWithItems> {
    let order = conn
        .query_row(&format!("{} WHERE o.id = ?1", ORDER_SELECT), [id], order_from_row)
        .optional()?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;

    let items = order_items(conn, id)?;

    Ok(OrderWithItems { order, items })
}

pub fn get_orders_for_date(conn: &Connection, date: &str, meal: Option<MealCategory>) -> Result<Vec<OrderWithItems>> {
    let date = validate_date(date)?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE o.order_date = ?1 AND (?2 IS NULL OR o.meal = ?2) ORDER BY o.created_at DESC, o.id DESC",
        ORDER_SELECT
    ))?;

    let orders: Vec<Order> = stmt
        .query_map(rusqlite::params![date, meal], order_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Vec::new();

    for order in orders {
        let items = order_items(conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}

pub fn update_order_status(conn: &Connection, order_id: i64, status: OrderStatus) -> Result<OrderWithItems> {
    let current = get_order(conn, order_id)?;

    if !current.order.status.can_transition_to(status) {
        return Err(AppError::validation(format!(
            "Cannot change order {} from {} to {}",
            order_id, current.order.status, status
        )));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        rusqlite::params![status, order_id],
    )?;

    if status == OrderStatus::Cancelled {
        // Give the quantities back to the menu
        for item in &current.items {
            if let Some(menu_item_id) = item.menu_item_id {
                tx.execute(
                    "UPDATE menu_items SET available_qty = available_qty + ?1 WHERE id = ?2",
                    rusqlite::params![item.quantity, menu_item_id],
                )?;
            }
        }
    }
    tx.commit()?;

    tracing::info!(order_id, from = %current.order.status, to = %status, "Order status changed");

    get_order(conn, order_id)
}

/// Every non-cancelled order line for a date and meal, with combo
/// components expanded from the catalog.
pub fn order_lines_for(conn: &Connection, date: &str, meal: MealCategory) -> Result<Vec<OrderLine>> {
    let date = validate_date(date)?;

    let mut stmt = conn.prepare(
        "SELECT oi.item_id, i.name, i.uom, i.is_combo, oi.quantity
         FROM order_items oi
         JOIN orders o ON oi.order_id = o.id
         JOIN items i ON oi.item_id = i.id
         WHERE o.order_date = ?1 AND o.meal = ?2 AND o.status <> ?3
         ORDER BY oi.id",
    )?;

    let rows: Vec<(i64, String, String, bool, i32)> = stmt
        .query_map(rusqlite::params![date, meal, OrderStatus::Cancelled], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut combos: HashMap<i64, Vec<ComboComponent>> = HashMap::new();
    let mut lines = Vec::with_capacity(rows.len());

    for (item_id, name, uom, is_combo, quantity) in rows {
        let combo_items = if is_combo {
            if !combos.contains_key(&item_id) {
                let components = get_combo_components(conn, item_id)?
                    .into_iter()
                    .map(|c| ComboComponent {
                        item_name: c.item_name,
                        unit: Some(c.uom),
                        quantity: c.quantity,
                    })
                    .collect();
                combos.insert(item_id, components);
            }
            combos.get(&item_id).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };

        lines.push(OrderLine {
            category: meal,
            item_name: name,
            unit: uom,
            quantity: quantity as f64,
            is_combo,
            combo_items,
        });
    }

    Ok(lines)
}

fn page_limit(limit: Option<i64>, default: i64) -> Result<i64> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::validation(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(limit)
}

fn optional_date(value: &Option<String>) -> Result<Option<chrono::NaiveDate>> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_date)
        .transpose()
}

fn format_address(written: Option<String>, city: Option<String>, pin_code: Option<String>) -> Option<String> {
    let written = written?;
    let place = [city, pin_code]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if place.is_empty() {
        Some(written)
    } else {
        Some(format!("{}, {}", written, place))
    }
}

/// Admin order history, newest first. Filters combine with AND; an inverted
/// date range is swapped rather than rejected.
pub fn order_history(conn: &Connection, filter: &OrderHistoryFilter) -> Result<OrderHistoryPage> {
    let limit = page_limit(filter.limit, HISTORY_LIMIT)?;
    let offset = filter.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::validation("Offset must not be negative"));
    }

    let mut start = optional_date(&filter.start_date)?;
    let mut end = optional_date(&filter.end_date)?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            start = Some(e);
            end = Some(s);
        }
    }

    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(start) = start {
        params.push(Value::Text(start.format(DATE_FORMAT).to_string()));
        clauses.push(format!("o.order_date >= ?{}", params.len()));
    }
    if let Some(end) = end {
        params.push(Value::Text(end.format(DATE_FORMAT).to_string()));
        clauses.push(format!("o.order_date <= ?{}", params.len()));
    }
    if let Some(status) = filter.status {
        params.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("o.status = ?{}", params.len()));
    }
    if let Some(customer) = optional(filter.customer.clone()) {
        params.push(Value::Text(format!("%{}%", customer)));
        let n = params.len();
        clauses.push(format!("(c.name LIKE ?{n} OR c.primary_mobile LIKE ?{n})"));
    }
    if let Some(product) = optional(filter.product.clone()) {
        params.push(Value::Text(format!("%{}%", product)));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM order_items hi JOIN items hp ON hi.item_id = hp.id
                     WHERE hi.order_id = o.id AND hp.name LIKE ?{})",
            params.len()
        ));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM orders o LEFT JOIN customers c ON o.customer_id = c.id {}",
            where_sql
        ),
        rusqlite::params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    params.push(Value::Integer(limit));
    let limit_param = params.len();
    params.push(Value::Integer(offset));
    let offset_param = params.len();

    let mut stmt = conn.prepare(&format!(
        "SELECT o.id, o.customer_id, c.name, o.address_id, o.order_date, o.meal, o.total_price,
                o.discount, o.status, o.payment_method, o.order_type, o.created_at,
                c.primary_mobile, a.written_address, a.city, a.pin_code,
                (SELECT COALESCE(SUM(quantity), 0) FROM order_items WHERE order_id = o.id)
         FROM orders o
         LEFT JOIN customers c ON o.customer_id = c.id
         LEFT JOIN addresses a ON o.address_id = a.id
         {}
         ORDER BY o.created_at DESC, o.id DESC
         LIMIT ?{} OFFSET ?{}",
        where_sql, limit_param, offset_param
    ))?;

    let rows: Vec<(Order, Option<String>, Option<String>, i64)> = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((
                order_from_row(row)?,
                row.get(12)?,
                format_address(row.get(13)?, row.get(14)?, row.get(15)?),
                row.get(16)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut orders = Vec::with_capacity(rows.len());
    for (order, customer_mobile, delivery_address, item_count) in rows {
        let items = order_items(conn, order.id)?;
        orders.push(OrderHistoryEntry {
            order,
            customer_mobile,
            delivery_address,
            item_count,
            items,
        });
    }

    tracing::debug!(total, returned = orders.len(), limit, offset, "Loaded order history");

    Ok(OrderHistoryPage { orders, total })
}

pub fn get_invoice(conn: &Connection, order_id: i64) -> Result<Invoice> {
    let OrderWithItems { order, items } = get_order(conn, order_id)?;
    let customer = get_customer(conn, order.customer_id)?;
    let address = match order.address_id {
        Some(address_id) => find_address(conn, order.customer_id, address_id)?,
        None => None,
    };

    let mut lines: Vec<InvoiceLine> = items
        .into_iter()
        .map(|item| InvoiceLine {
            name: item.item_name.unwrap_or_else(|| "Item".to_string()),
            quantity: item.quantity,
            price: item.price,
            line_total: round2(item.price * item.quantity as f64),
        })
        .collect();
    lines.sort_by(|a, b| a.name.cmp(&b.name));

    let subtotal = round2(lines.iter().map(|line| line.line_total).sum());

    Ok(Invoice {
        invoice_number: format!("INV-{:05}", order.id),
        issued_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        discount: order.discount,
        total: order.total_price,
        order,
        customer,
        address,
        lines,
        subtotal,
    })
}

/// A customer's most recent orders, newest first.
pub fn get_customer_orders(conn: &Connection, customer_id: i64, limit: Option<i64>) -> Result<Vec<Order>> {
    get_customer(conn, customer_id)?;
    let limit = page_limit(limit, CUSTOMER_ORDERS_LIMIT)?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE o.customer_id = ?1 ORDER BY o.created_at DESC, o.id DESC LIMIT ?2",
        ORDER_SELECT
    ))?;

    let orders = stmt
        .query_map([customer_id, limit], order_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(orders)
}

pub(crate) fn recent_orders(conn: &Connection, limit: i64) -> Result<Vec<RecentOrder>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.customer_id, c.name, o.address_id, o.order_date, o.meal, o.total_price,
                o.discount, o.status, o.payment_method, o.order_type, o.created_at,
                (SELECT COALESCE(SUM(quantity), 0) FROM order_items WHERE order_id = o.id)
         FROM orders o
         LEFT JOIN customers c ON o.customer_id = c.id
         ORDER BY o.created_at DESC, o.id DESC
         LIMIT ?1",
    )?;

    let recent = stmt
        .query_map([limit], |row| {
            let order = order_from_row(row)?;
            Ok(RecentOrder {
                reference: format!("ORD-{:05}", order.id),
                order,
                item_count: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(recent)
}
