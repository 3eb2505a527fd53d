pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod planning;

#[cfg(feature = "desktop")]
mod ipc;


pub use config::AppConfig;
pub use db::Database;
pub use error::{AppError, Result};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::{
        menu::{Menu, MenuItem},
        tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
        Manager,
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            let config = AppConfig::load(&data_dir)?;
            logging::init(&config.log_filter);

            // Initialize database
            let db = Database::open(&config.database_path(&data_dir))?;
            db.initialize()?;
            app.manage(db);
            app.manage(config);

            // Create tray menu
            let show = MenuItem::with_id(app, "show", "Show Planner", true, None::<&str>)?;
            let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
            let menu = Menu::with_items(app, &[&show, &quit])?;

            if let Some(icon) = app.default_window_icon().cloned() {
                TrayIconBuilder::new()
                    .icon(icon)
                    .menu(&menu)
                    .show_menu_on_left_click(false)
                    .on_tray_icon_event(|tray, event| {
                        if let TrayIconEvent::Click {
                            button: MouseButton::Left,
                            button_state: MouseButtonState::Up,
                            ..
                        } = event
                        {
                            let app = tray.app_handle();
                            if let Some(window) = app.get_webview_window("main") {
                                if window.is_visible().unwrap_or(false) {
                                    let _ = window.hide();
                                } else {
                                    let _ = window.show();
                                    let _ = window.set_focus();
                                }
                            }
                        }
                    })
                    .on_menu_event(|app, event| match event.id.as_ref() {
                        "show" => {
                            if let Some(window) = app.get_webview_window("main") {
                                let _ = window.show();
                                let _ = window.set_focus();
                            }
                        }
                        "quit" => app.exit(0),
                        _ => {}
                    })
                    .build(app)?;
            } else {
                tracing::warn!("No window icon bundled, skipping tray icon");
            }

            tracing::info!(data_dir = %data_dir.display(), "Kitchen planner started");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            ipc::get_config,
            // Catalog
            ipc::get_categories,
            ipc::create_category,
            ipc::delete_category,
            ipc::get_items,
            ipc::get_item,
            ipc::create_item,
            ipc::update_item,
            ipc::delete_item,
            ipc::set_combo_components,
            ipc::get_combo_components,
            // Menus
            ipc::get_menu,
            ipc::upsert_menu,
            ipc::set_menu_released,
            // Customers
            ipc::get_customers,
            ipc::get_customer,
            ipc::create_customer,
            ipc::update_customer,
            ipc::delete_customer,
            ipc::get_addresses,
            ipc::add_address,
            ipc::update_address,
            ipc::set_default_address,
            // Orders
            ipc::create_order,
            ipc::get_order,
            ipc::get_orders_for_date,
            ipc::update_order_status,
            ipc::order_history,
            ipc::get_invoice,
            ipc::get_customer_orders,
            // Production
            ipc::load_plan,
            ipc::load_day_plan,
            ipc::set_item_buffer,
            ipc::apply_global_buffer,
            ipc::save_plan,
            ipc::update_planned,
            ipc::production_status,
            ipc::export_day_csv,
            ipc::export_day_html,
            // Subscriptions
            ipc::get_replacements,
            ipc::set_replacement,
            ipc::delete_replacement,
            // Reports
            ipc::sales_report,
            ipc::category_report,
            ipc::top_customers_report,
            ipc::subscription_report,
            ipc::dashboard,
            // Admin logs
            ipc::get_admin_logs,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
