use super::{optional, required, unique_violation};
use crate::error::{AppError, Result};
use crate::models::{Address, CreateAddress, CreateCustomer, Customer, UpdateCustomer};
use rusqlite::{Connection, OptionalExtension, Row};

const CUSTOMER_SELECT: &str =
    "SELECT id, name, recipient_name, primary_mobile, alternative_mobile, email, referred_by,
            payment_frequency, created_at
     FROM customers";

const ADDRESS_SELECT: &str =
    "SELECT id, customer_id, house_apartment_no, written_address, city, pin_code, address_type, is_default
     FROM addresses";

const DEFAULT_PAYMENT_FREQUENCY: &str = "Daily";
const DEFAULT_ADDRESS_TYPE: &str = "Address";

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        recipient_name: row.get(2)?,
        primary_mobile: row.get(3)?,
        alternative_mobile: row.get(4)?,
        email: row.get(5)?,
        referred_by: row.get(6)?,
        payment_frequency: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn address_from_row(row: &Row<'_>) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        house_apartment_no: row.get(2)?,
        written_address: row.get(3)?,
        city: row.get(4)?,
        pin_code: row.get(5)?,
        address_type: row.get(6)?,
        is_default: row.get(7)?,
    })
}

pub fn get_customers(conn: &Connection) -> Result<Vec<Customer>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name", CUSTOMER_SELECT))?;

    let customers = stmt
        .query_map([], customer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(customers)
}

pub fn get_customer(conn: &Connection, id: i64) -> Result<Customer> {
    conn.query_row(
        &format!("{} WHERE id = ?1", CUSTOMER_SELECT),
        [id],
        customer_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))
}

pub fn create_customer(conn: &Connection, customer: CreateCustomer) -> Result<Customer> {
    let name = required("Name", &customer.name)?;
    let mobile = required("Primary mobile", &customer.primary_mobile)?;
    let recipient = optional(customer.recipient_name).unwrap_or_else(|| name.clone());
    let frequency = optional(customer.payment_frequency)
        .unwrap_or_else(|| DEFAULT_PAYMENT_FREQUENCY.to_string());

    conn.execute(
        "INSERT INTO customers (name, recipient_name, primary_mobile, alternative_mobile, email, referred_by, payment_frequency)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            name,
            recipient,
            mobile,
            optional(customer.alternative_mobile),
            optional(customer.email),
            optional(customer.referred_by),
            frequency
        ],
    )
    .map_err(|e| unique_violation(e, "A customer with this mobile number or email already exists"))?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, "Created customer");

    get_customer(conn, id)
}

pub fn update_customer(conn: &Connection, customer: UpdateCustomer) -> Result<Customer> {
    let name = required("Name", &customer.name)?;
    let recipient = required("Recipient name", &customer.recipient_name)?;
    let mobile = required("Primary mobile", &customer.primary_mobile)?;
    let frequency = required("Payment frequency", &customer.payment_frequency)?;

    conn.execute(
        "UPDATE customers SET name = ?1, recipient_name = ?2, primary_mobile = ?3, alternative_mobile = ?4,
                email = ?5, referred_by = ?6, payment_frequency = ?7
         WHERE id = ?8",
        rusqlite::params![
            name,
            recipient,
            mobile,
            optional(customer.alternative_mobile),
            optional(customer.email),
            optional(customer.referred_by),
            frequency,
            customer.id
        ],
    )
    .map_err(|e| unique_violation(e, "A customer with this mobile number or email already exists"))?;

    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Customer {}", customer.id)));
    }

    get_customer(conn, customer.id)
}

pub fn delete_customer(conn: &Connection, id: i64) -> Result<()> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE customer_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Err(AppError::conflict("Cannot delete customer with existing orders"));
    }

    conn.execute("DELETE FROM customers WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Customer {}", id)));
    }

    Ok(())
}

pub fn get_addresses(conn: &Connection, customer_id: i64) -> Result<Vec<Address>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE customer_id = ?1 ORDER BY is_default DESC, id ASC",
        ADDRESS_SELECT
    ))?;

    let addresses = stmt
        .query_map([customer_id], address_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(addresses)
}

/// Adds an address. The customer's first address, or one flagged as default,
/// becomes the only default.
pub fn add_address(conn: &Connection, customer_id: i64, address: CreateAddress) -> Result<Address> {
    get_customer(conn, customer_id)?;

    let written = required("Address", &address.written_address)?;
    let city = required("City", &address.city)?;
    let pin_code = required("Pin code", &address.pin_code)?;
    let address_type =
        optional(address.address_type).unwrap_or_else(|| DEFAULT_ADDRESS_TYPE.to_string());

    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM addresses WHERE customer_id = ?1",
        [customer_id],
        |row| row.get(0),
    )?;
    let is_default = address.is_default || existing == 0;

    let tx = conn.unchecked_transaction()?;
    if is_default {
        tx.execute(
            "UPDATE addresses SET is_default = 0 WHERE customer_id = ?1",
            [customer_id],
        )?;
    }
    tx.execute(
        "INSERT INTO addresses (customer_id, house_apartment_no, written_address, city, pin_code, address_type, is_default)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            customer_id,
            optional(address.house_apartment_no),
            written,
            city,
            pin_code,
            address_type,
            is_default
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    get_address(conn, customer_id, id)
}

pub(crate) fn find_address(conn: &Connection, customer_id: i64, address_id: i64) -> Result<Option<Address>> {
    let address = conn
        .query_row(
            &format!("{} WHERE id = ?1 AND customer_id = ?2", ADDRESS_SELECT),
            [address_id, customer_id],
            address_from_row,
        )
        .optional()?;
    Ok(address)
}

pub fn get_address(conn: &Connection, customer_id: i64, address_id: i64) -> Result<Address> {
    find_address(conn, customer_id, address_id)?
        .ok_or_else(|| AppError::not_found(format!("Address {}", address_id)))
}

/// Rewrites an address. Flagging it default clears the others; the current
/// default stays default until another address takes over.
pub fn update_address(
    conn: &Connection,
    customer_id: i64,
    address_id: i64,
    address: CreateAddress,
) -> Result<Address> {
    let current = get_address(conn, customer_id, address_id)?;

    let written = required("Address", &address.written_address)?;
    let city = required("City", &address.city)?;
    let pin_code = required("Pin code", &address.pin_code)?;
    let address_type =
        optional(address.address_type).unwrap_or_else(|| DEFAULT_ADDRESS_TYPE.to_string());
    let is_default = address.is_default || current.is_default;

    let tx = conn.unchecked_transaction()?;
    if is_default {
        tx.execute(
            "UPDATE addresses SET is_default = 0 WHERE customer_id = ?1 AND id <> ?2",
            [customer_id, address_id],
        )?;
    }
    tx.execute(
        "UPDATE addresses SET house_apartment_no = ?1, written_address = ?2, city = ?3, pin_code = ?4,
                address_type = ?5, is_default = ?6
         WHERE id = ?7 AND customer_id = ?8",
        rusqlite::params![
            optional(address.house_apartment_no),
            written,
            city,
            pin_code,
            address_type,
            is_default,
            address_id,
            customer_id
        ],
    )?;
    tx.commit()?;

    tracing::info!(customer_id, address_id, is_default, "Updated address");

    get_address(conn, customer_id, address_id)
}

pub fn set_default_address(conn: &Connection, customer_id: i64, address_id: i64) -> Result<Vec<Address>> {
    let owned: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM addresses WHERE id = ?1 AND customer_id = ?2)",
        [address_id, customer_id],
        |row| row.get(0),
    )?;
    if !owned {
        return Err(AppError::not_found(format!("Address {}", address_id)));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE addresses SET is_default = 0 WHERE customer_id = ?1",
        [customer_id],
    )?;
    tx.execute(
        "UPDATE addresses SET is_default = 1 WHERE id = ?1",
        [address_id],
    )?;
    tx.commit()?;

    get_addresses(conn, customer_id)
}
