use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Opened kitchen database");

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Database {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock()?;
        initialize_schema(&conn)
    }
}

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        -- Item categories (South Indian, Beverages, ...)
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        );

        -- Sellable items, including combos
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            description TEXT,
            category_id INTEGER,
            uom TEXT NOT NULL DEFAULT 'Nos',
            meal TEXT,
            price REAL NOT NULL DEFAULT 0,
            buffer_percentage REAL,
            is_combo INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );

        -- Components of combo items
        CREATE TABLE IF NOT EXISTS item_combos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            combo_item_id INTEGER NOT NULL,
            included_item_id INTEGER NOT NULL,
            quantity REAL NOT NULL DEFAULT 1,
            FOREIGN KEY (combo_item_id) REFERENCES items(id) ON DELETE CASCADE,
            FOREIGN KEY (included_item_id) REFERENCES items(id)
        );

        -- One published menu per date and meal
        CREATE TABLE IF NOT EXISTS menus (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date DATE NOT NULL,
            meal TEXT NOT NULL,
            period_type TEXT,
            is_festival INTEGER NOT NULL DEFAULT 0,
            is_released INTEGER NOT NULL DEFAULT 0,
            is_production_generated INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (date, meal)
        );

        CREATE TABLE IF NOT EXISTS menu_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            menu_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            planned_qty REAL NOT NULL DEFAULT 0,
            available_qty REAL NOT NULL DEFAULT 0,
            buffer_qty REAL NOT NULL DEFAULT 0,
            final_qty REAL NOT NULL DEFAULT 0,
            rate REAL NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            UNIQUE (menu_id, item_id),
            FOREIGN KEY (menu_id) REFERENCES menus(id) ON DELETE CASCADE,
            FOREIGN KEY (item_id) REFERENCES items(id)
        );

        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            recipient_name TEXT NOT NULL,
            primary_mobile TEXT NOT NULL UNIQUE,
            alternative_mobile TEXT,
            email TEXT UNIQUE,
            referred_by TEXT,
            payment_frequency TEXT NOT NULL DEFAULT 'Daily',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            house_apartment_no TEXT,
            written_address TEXT NOT NULL,
            city TEXT NOT NULL,
            pin_code TEXT NOT NULL,
            address_type TEXT NOT NULL DEFAULT 'Address',
            is_default INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
        );

        -- Orders are placed for a service date and meal
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            address_id INTEGER,
            order_date DATE NOT NULL,
            meal TEXT NOT NULL,
            total_price REAL NOT NULL,
            discount REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'Pending',
            payment_method TEXT NOT NULL,
            order_type TEXT NOT NULL DEFAULT 'one_time',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (customer_id) REFERENCES customers(id),
            FOREIGN KEY (address_id) REFERENCES addresses(id)
        );

        CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            menu_item_id INTEGER,
            quantity INTEGER NOT NULL,
            price REAL NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders(id),
            FOREIGN KEY (item_id) REFERENCES items(id),
            FOREIGN KEY (menu_item_id) REFERENCES menu_items(id)
        );

        -- Subscription group name -> item the kitchen cooks for it
        CREATE TABLE IF NOT EXISTS subscription_replacements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            default_item TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS admin_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admin_name TEXT,
            action_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            description TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_orders_date_meal ON orders(order_date, meal);
        CREATE INDEX IF NOT EXISTS idx_menu_items_menu ON menu_items(menu_id);
        ",
    )?;

    // Databases created before buffers, discounts and unique menu lines existed
    migrate_conn(conn)?;

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let columns = conn
        .prepare(&format!("PRAGMA table_info({})", table))?
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(columns)
}

fn migrate_conn(conn: &Connection) -> Result<()> {
    let item_columns = table_columns(conn, "items")?;
    if !item_columns.iter().any(|c| c == "buffer_percentage") {
        tracing::info!("Migrating items: adding buffer_percentage");
        conn.execute("ALTER TABLE items ADD COLUMN buffer_percentage REAL", [])?;
    }

    let order_columns = table_columns(conn, "orders")?;
    if !order_columns.iter().any(|c| c == "discount") {
        tracing::info!("Migrating orders: adding discount");
        conn.execute(
            "ALTER TABLE orders ADD COLUMN discount REAL NOT NULL DEFAULT 0",
            [],
        )?;
    }
    if !order_columns.iter().any(|c| c == "order_type") {
        tracing::info!("Migrating orders: adding order_type");
        conn.execute(
            "ALTER TABLE orders ADD COLUMN order_type TEXT NOT NULL DEFAULT 'one_time'",
            [],
        )?;
    }

    migrate_menu_items_unique(conn)?;

    Ok(())
}

/// Older menus could list the same item twice. The unique index is only
/// added once no such duplicates remain.
fn migrate_menu_items_unique(conn: &Connection) -> Result<()> {
    let has_unique: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_index_list('menu_items') WHERE \"unique\" = 1)",
        [],
        |row| row.get(0),
    )?;
    if has_unique {
        return Ok(());
    }

    let duplicates: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (
             SELECT 1 FROM menu_items GROUP BY menu_id, item_id HAVING COUNT(*) > 1
         )",
        [],
        |row| row.get(0),
    )?;
    if duplicates > 0 {
        tracing::warn!(duplicates, "Menus list the same item more than once, unique menu lines not enforced");
        return Ok(());
    }

    tracing::info!("Migrating menu_items: one line per item and menu");
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_menu_items_menu_item ON menu_items(menu_id, item_id)",
        [],
    )?;
    Ok(())
}

#[cfg(feature = "desktop")]
mod desktop {
    use super::Database;
    use tauri::{AppHandle, Manager};

    pub trait DatabaseExt {
        fn db(&self) -> &Database;
    }

    impl DatabaseExt for AppHandle {
        fn db(&self) -> &Database {
            self.state::<Database>().inner()
        }
    }
}

#[cfg(feature = "desktop")]
pub use desktop::DatabaseExt;
