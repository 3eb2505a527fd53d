use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Condiments,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Condiments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => "Breakfast",
            MealCategory::Lunch => "Lunch",
            MealCategory::Dinner => "Dinner",
            MealCategory::Condiments => "Condiments",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealCategory::ALL
            .into_iter()
            .find(|meal| meal.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown meal category: {}", s))
    }
}

impl TryFrom<String> for MealCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToSql for MealCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OrderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

// ===== Catalog =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub uom: String,
    pub meal: Option<MealCategory>,
    pub price: f64,
    pub buffer_percentage: Option<f64>,
    pub is_combo: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItem {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub uom: Option<String>,
    pub meal: Option<MealCategory>,
    pub price: f64,
    pub buffer_percentage: Option<f64>,
    #[serde(default)]
    pub is_combo: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub uom: String,
    pub meal: Option<MealCategory>,
    pub price: f64,
    pub buffer_percentage: Option<f64>,
    pub is_combo: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ComboComponentInput {
    pub item_id: i64,
    pub quantity: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ComboComponentDetail {
    pub item_id: i64,
    pub item_name: String,
    pub uom: String,
    pub quantity: f64,
}

// ===== Menus =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Menu {
    pub id: i64,
    pub date: String,
    pub meal: MealCategory,
    pub period_type: Option<String>,
    pub is_festival: bool,
    pub is_released: bool,
    pub is_production_generated: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MenuItem {
    pub id: i64,
    pub menu_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub uom: String,
    pub is_combo: bool,
    pub planned_qty: f64,
    pub available_qty: f64,
    pub buffer_qty: f64,
    pub final_qty: f64,
    pub rate: f64,
    pub sort_order: i32,
    /// The item's own buffer percentage, used until a plan is saved.
    pub buffer_percentage: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MenuWithItems {
    pub menu: Menu,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertMenuItem {
    pub item_id: i64,
    pub planned_qty: f64,
    pub available_qty: Option<f64>,
    pub rate: f64,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertMenu {
    pub date: String,
    pub meal: MealCategory,
    pub period_type: Option<String>,
    #[serde(default)]
    pub is_festival: bool,
    pub items: Vec<UpsertMenuItem>,
}

// ===== Customers =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub recipient_name: String,
    pub primary_mobile: String,
    pub alternative_mobile: Option<String>,
    pub email: Option<String>,
    pub referred_by: Option<String>,
    pub payment_frequency: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub recipient_name: Option<String>,
    pub primary_mobile: String,
    pub alternative_mobile: Option<String>,
    pub email: Option<String>,
    pub referred_by: Option<String>,
    pub payment_frequency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub id: i64,
    pub name: String,
    pub recipient_name: String,
    pub primary_mobile: String,
    pub alternative_mobile: Option<String>,
    pub email: Option<String>,
    pub referred_by: Option<String>,
    pub payment_frequency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Address {
    pub id: i64,
    pub customer_id: i64,
    pub house_apartment_no: Option<String>,
    pub written_address: String,
    pub city: String,
    pub pin_code: String,
    pub address_type: String,
    pub is_default: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAddress {
    pub house_apartment_no: Option<String>,
    pub written_address: String,
    pub city: String,
    pub pin_code: String,
    pub address_type: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

// ===== Orders =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub address_id: Option<i64>,
    pub order_date: String,
    pub meal: MealCategory,
    pub total_price: f64,
    pub discount: f64,
    pub status: OrderStatus,
    pub payment_method: String,
    pub order_type: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub item_name: Option<String>,
    pub menu_item_id: Option<i64>,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub menu_item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: i64,
    pub address_id: Option<i64>,
    pub order_date: String,
    pub meal: MealCategory,
    pub payment_method: String,
    pub order_type: Option<String>,
    pub discount: Option<f64>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OrderHistoryFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<OrderStatus>,
    /// Matches the customer's name or mobile number.
    pub customer: Option<String>,
    /// Matches the name of any item on the order.
    pub product: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderHistoryEntry {
    pub order: Order,
    pub customer_mobile: Option<String>,
    pub delivery_address: Option<String>,
    pub item_count: i64,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderHistoryPage {
    pub orders: Vec<OrderHistoryEntry>,
    /// Matching orders before paging.
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: i32,
    pub price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Invoice {
    pub invoice_number: String,
    pub issued_at: String,
    pub order: Order,
    pub customer: Customer,
    pub address: Option<Address>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

// ===== Production planning =====

/// A placed order line as the planner sees it. Combo lines carry their
/// components and contribute nothing under their own name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLine {
    pub category: MealCategory,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
    #[serde(default)]
    pub is_combo: bool,
    #[serde(default)]
    pub combo_items: Vec<ComboComponent>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComboComponent {
    pub item_name: String,
    pub unit: Option<String>,
    pub quantity: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PublishedMenuItem {
    pub date: String,
    pub item_name: String,
    pub unit: String,
    pub category: MealCategory,
    pub planned_quantity: f64,
    pub available_quantity: f64,
    pub buffer_quantity: Option<f64>,
    pub final_quantity: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregatedOrderItem {
    pub category: MealCategory,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
}

/// Where a plan item's base quantity came from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaseSource {
    Orders,
    Planned,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlanItem {
    pub item_name: String,
    pub unit: String,
    pub category: MealCategory,
    pub planned_quantity: f64,
    pub customer_orders: f64,
    pub base_quantity: f64,
    pub base_source: BaseSource,
    pub buffer_quantity: f64,
    pub final_quantity: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubscriptionReplacement {
    pub id: i64,
    pub group: String,
    pub default_item: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductionPlan {
    pub date: String,
    pub category: MealCategory,
    pub published: bool,
    pub generated: bool,
    pub items: Vec<PlanItem>,
    /// Ordered items that have no line on the published menu.
    pub unplanned: Vec<AggregatedOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SavePlanResult {
    pub meal: MealCategory,
    pub updated_items: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlannedQtyUpdate {
    pub item_name: String,
    pub additional_qty: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlannedQtyResult {
    pub item_name: String,
    pub new_planned_qty: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductionStatus {
    pub meal: MealCategory,
    pub has_menu: bool,
    pub is_released: bool,
    pub is_generated: bool,
}

// ===== Reports =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SalesReportRow {
    pub date: String,
    pub total_sales: f64,
    pub total_orders: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryReportRow {
    pub category_name: String,
    pub total_items_sold: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerReportRow {
    pub customer_name: String,
    pub total_orders: i64,
    pub total_spent: f64,
    pub last_order_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubscriptionReportRow {
    pub meal: MealCategory,
    pub total_subscriptions: i64,
    pub total_revenue: f64,
}

// ===== Dashboard =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChecklistEntry {
    pub key: String,
    pub label: String,
    pub completed: bool,
    pub status: ChecklistStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecentOrder {
    pub reference: String,
    pub order: Order,
    pub item_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Dashboard {
    pub date: String,
    pub total_customers: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
    pub checklist: Vec<ChecklistEntry>,
    pub recent_orders: Vec<RecentOrder>,
}

// ===== Admin logs =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminLog {
    pub id: i64,
    pub admin_name: Option<String>,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewAdminLog {
    pub admin_name: Option<String>,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AdminLogFilter {
    pub admin_name: Option<String>,
    pub entity_type: Option<String>,
    pub action_type: Option<String>,
}
