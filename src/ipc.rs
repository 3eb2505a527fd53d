//! Tauri commands exposed to the desktop frontend.

use crate::commands::{
    admin_logs, categories, customers, items, menus, orders, production, reports, subscriptions,
};
use crate::config::AppConfig;
use crate::db::DatabaseExt;
use crate::error::Result;
use crate::models::*;
use crate::planning;
use tauri::{AppHandle, Manager};

fn config(app: &AppHandle) -> AppConfig {
    app.state::<AppConfig>().inner().clone()
}

#[tauri::command]
pub fn get_config(app: AppHandle) -> AppConfig {
    config(&app)
}

// ===== Catalog =====

#[tauri::command]
pub fn get_categories(app: AppHandle) -> Result<Vec<Category>> {
    let conn = app.db().conn.lock()?;
    categories::get_categories(&conn)
}

#[tauri::command]
pub fn create_category(app: AppHandle, name: String) -> Result<Category> {
    let conn = app.db().conn.lock()?;
    categories::create_category(&conn, &name)
}

#[tauri::command]
pub fn delete_category(app: AppHandle, id: i64) -> Result<()> {
    let conn = app.db().conn.lock()?;
    categories::delete_category(&conn, id)
}

#[tauri::command]
pub fn get_items(app: AppHandle) -> Result<Vec<Item>> {
    let conn = app.db().conn.lock()?;
    items::get_items(&conn)
}

#[tauri::command]
pub fn get_item(app: AppHandle, id: i64) -> Result<Item> {
    let conn = app.db().conn.lock()?;
    items::get_item(&conn, id)
}

#[tauri::command]
pub fn create_item(app: AppHandle, item: CreateItem) -> Result<Item> {
    let conn = app.db().conn.lock()?;
    items::create_item(&conn, item)
}

#[tauri::command]
pub fn update_item(app: AppHandle, item: UpdateItem) -> Result<Item> {
    let conn = app.db().conn.lock()?;
    items::update_item(&conn, item)
}

#[tauri::command]
pub fn delete_item(app: AppHandle, id: i64) -> Result<()> {
    let conn = app.db().conn.lock()?;
    items::delete_item(&conn, id)
}

#[tauri::command]
pub fn set_combo_components(
    app: AppHandle,
    combo_item_id: i64,
    components: Vec<ComboComponentInput>,
) -> Result<Vec<ComboComponentDetail>> {
    let conn = app.db().conn.lock()?;
    items::set_combo_components(&conn, combo_item_id, &components)
}

#[tauri::command]
pub fn get_combo_components(app: AppHandle, combo_item_id: i64) -> Result<Vec<ComboComponentDetail>> {
    let conn = app.db().conn.lock()?;
    items::get_combo_components(&conn, combo_item_id)
}

// ===== Menus =====

#[tauri::command]
pub fn get_menu(app: AppHandle, date: String, meal: MealCategory) -> Result<MenuWithItems> {
    let conn = app.db().conn.lock()?;
    menus::get_menu(&conn, &date, meal)
}

#[tauri::command]
pub fn upsert_menu(app: AppHandle, menu: UpsertMenu) -> Result<MenuWithItems> {
    let conn = app.db().conn.lock()?;
    menus::upsert_menu(&conn, menu)
}

#[tauri::command]
pub fn set_menu_released(app: AppHandle, menu_id: i64, released: bool) -> Result<Menu> {
    let conn = app.db().conn.lock()?;
    menus::set_menu_released(&conn, menu_id, released)
}

// ===== Customers =====

#[tauri::command]
pub fn get_customers(app: AppHandle) -> Result<Vec<Customer>> {
    let conn = app.db().conn.lock()?;
    customers::get_customers(&conn)
}

#[tauri::command]
pub fn get_customer(app: AppHandle, id: i64) -> Result<Customer> {
    let conn = app.db().conn.lock()?;
    customers::get_customer(&conn, id)
}

#[tauri::command]
pub fn create_customer(app: AppHandle, customer: CreateCustomer) -> Result<Customer> {
    let conn = app.db().conn.lock()?;
    customers::create_customer(&conn, customer)
}

#[tauri::command]
pub fn update_customer(app: AppHandle, customer: UpdateCustomer) -> Result<Customer> {
    let conn = app.db().conn.lock()?;
    customers::update_customer(&conn, customer)
}

#[tauri::command]
pub fn delete_customer(app: AppHandle, id: i64) -> Result<()> {
    let conn = app.db().conn.lock()?;
    customers::delete_customer(&conn, id)
}

#[tauri::command]
pub fn get_addresses(app: AppHandle, customer_id: i64) -> Result<Vec<Address>> {
    let conn = app.db().conn.lock()?;
    customers::get_addresses(&conn, customer_id)
}

#[tauri::command]
pub fn add_address(app: AppHandle, customer_id: i64, address: CreateAddress) -> Result<Address> {
    let conn = app.db().conn.lock()?;
    customers::add_address(&conn, customer_id, address)
}

#[tauri::command]
pub fn update_address(
    app: AppHandle,
    customer_id: i64,
    address_id: i64,
    address: CreateAddress,
) -> Result<Address> {
    let conn = app.db().conn.lock()?;
    customers::update_address(&conn, customer_id, address_id, address)
}

#[tauri::command]
pub fn set_default_address(app: AppHandle, customer_id: i64, address_id: i64) -> Result<Vec<Address>> {
    let conn = app.db().conn.lock()?;
    customers::set_default_address(&conn, customer_id, address_id)
}

// ===== Orders =====

#[tauri::command]
pub fn create_order(app: AppHandle, order: CreateOrder) -> Result<OrderWithItems> {
    let conn = app.db().conn.lock()?;
    orders::create_order(&conn, order)
}

#[tauri::command]
pub fn get_order(app: AppHandle, id: i64) -> Result<OrderWithItems> {
    let conn = app.db().conn.lock()?;
    orders::get_order(&conn, id)
}

#[tauri::command]
pub fn get_orders_for_date(
    app: AppHandle,
    date: String,
    meal: Option<MealCategory>,
) -> Result<Vec<OrderWithItems>> {
    let conn = app.db().conn.lock()?;
    orders::get_orders_for_date(&conn, &date, meal)
}

#[tauri::command]
pub fn update_order_status(app: AppHandle, order_id: i64, status: OrderStatus) -> Result<OrderWithItems> {
    let conn = app.db().conn.lock()?;
    orders::update_order_status(&conn, order_id, status)
}

#[tauri::command]
pub fn order_history(app: AppHandle, filter: Option<OrderHistoryFilter>) -> Result<OrderHistoryPage> {
    let conn = app.db().conn.lock()?;
    orders::order_history(&conn, &filter.unwrap_or_default())
}

#[tauri::command]
pub fn get_invoice(app: AppHandle, order_id: i64) -> Result<Invoice> {
    let conn = app.db().conn.lock()?;
    orders::get_invoice(&conn, order_id)
}

#[tauri::command]
pub fn get_customer_orders(app: AppHandle, customer_id: i64, limit: Option<i64>) -> Result<Vec<Order>> {
    let conn = app.db().conn.lock()?;
    orders::get_customer_orders(&conn, customer_id, limit)
}

// ===== Production =====

#[tauri::command]
pub fn load_plan(app: AppHandle, date: String, meal: MealCategory) -> Result<ProductionPlan> {
    let fallback_unit = config(&app).fallback_unit;
    let conn = app.db().conn.lock()?;
    production::load_plan(&conn, &date, meal, &fallback_unit)
}

#[tauri::command]
pub fn load_day_plan(app: AppHandle, date: String) -> Result<Vec<ProductionPlan>> {
    let fallback_unit = config(&app).fallback_unit;
    let conn = app.db().conn.lock()?;
    production::load_day_plan(&conn, &date, &fallback_unit)
}

#[tauri::command]
pub fn set_item_buffer(item: PlanItem, buffer: f64) -> Result<PlanItem> {
    let mut item = item;
    planning::set_item_buffer(&mut item, buffer)?;
    Ok(item)
}

/// Applies `percent`, or the configured default when absent.
#[tauri::command]
pub fn apply_global_buffer(
    app: AppHandle,
    items: Vec<PlanItem>,
    percent: Option<f64>,
) -> Result<Vec<PlanItem>> {
    let mut items = items;
    let percent = percent.unwrap_or_else(|| config(&app).default_buffer_percent);
    planning::apply_global_buffer(&mut items, percent)?;
    Ok(items)
}

#[tauri::command]
pub fn save_plan(
    app: AppHandle,
    date: String,
    meal: MealCategory,
    items: Vec<PlanItem>,
) -> Result<SavePlanResult> {
    let conn = app.db().conn.lock()?;
    production::save_plan(&conn, &date, meal, &items)
}

#[tauri::command]
pub fn update_planned(
    app: AppHandle,
    date: String,
    meal: MealCategory,
    updates: Vec<PlannedQtyUpdate>,
) -> Result<Vec<PlannedQtyResult>> {
    let conn = app.db().conn.lock()?;
    production::update_planned(&conn, &date, meal, &updates)
}

#[tauri::command]
pub fn production_status(app: AppHandle, date: String) -> Result<Vec<ProductionStatus>> {
    let conn = app.db().conn.lock()?;
    production::production_status(&conn, &date)
}

#[tauri::command]
pub fn export_day_csv(app: AppHandle, date: String) -> Result<String> {
    let fallback_unit = config(&app).fallback_unit;
    let conn = app.db().conn.lock()?;
    production::export_day_csv(&conn, &date, &fallback_unit)
}

#[tauri::command]
pub fn export_day_html(app: AppHandle, date: String) -> Result<String> {
    let fallback_unit = config(&app).fallback_unit;
    let conn = app.db().conn.lock()?;
    production::export_day_html(&conn, &date, &fallback_unit)
}

// ===== Subscriptions =====

#[tauri::command]
pub fn get_replacements(app: AppHandle) -> Result<Vec<SubscriptionReplacement>> {
    let conn = app.db().conn.lock()?;
    subscriptions::get_replacements(&conn)
}

#[tauri::command]
pub fn set_replacement(app: AppHandle, group: String, default_item: String) -> Result<SubscriptionReplacement> {
    let conn = app.db().conn.lock()?;
    subscriptions::set_replacement(&conn, &group, &default_item)
}

#[tauri::command]
pub fn delete_replacement(app: AppHandle, id: i64) -> Result<()> {
    let conn = app.db().conn.lock()?;
    subscriptions::delete_replacement(&conn, id)
}

// ===== Reports =====

#[tauri::command]
pub fn sales_report(app: AppHandle, start: String, end: String) -> Result<Vec<SalesReportRow>> {
    let conn = app.db().conn.lock()?;
    reports::sales_report(&conn, &start, &end)
}

#[tauri::command]
pub fn category_report(app: AppHandle, start: String, end: String) -> Result<Vec<CategoryReportRow>> {
    let conn = app.db().conn.lock()?;
    reports::category_report(&conn, &start, &end)
}

#[tauri::command]
pub fn top_customers_report(app: AppHandle, start: String, end: String) -> Result<Vec<CustomerReportRow>> {
    let conn = app.db().conn.lock()?;
    reports::top_customers_report(&conn, &start, &end)
}

#[tauri::command]
pub fn subscription_report(
    app: AppHandle,
    start: String,
    end: String,
) -> Result<Vec<SubscriptionReportRow>> {
    let conn = app.db().conn.lock()?;
    reports::subscription_report(&conn, &start, &end)
}

/// Dashboard for `date`, or for today when absent.
#[tauri::command]
pub fn dashboard(app: AppHandle, date: Option<String>) -> Result<Dashboard> {
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
    let conn = app.db().conn.lock()?;
    reports::dashboard(&conn, &date)
}

// ===== Admin logs =====

#[tauri::command]
pub fn get_admin_logs(app: AppHandle, filter: Option<AdminLogFilter>) -> Result<Vec<AdminLog>> {
    let conn = app.db().conn.lock()?;
    admin_logs::get_admin_logs(&conn, &filter.unwrap_or_default())
}
