use crate::models::{MealCategory, PlanItem, ProductionPlan};

const CSV_HEADER: [&str; 8] = [
    "Item Name",
    "Unit",
    "Category",
    "Planned Quantity",
    "Customer Orders",
    "Base Quantity",
    "Buffer Quantity",
    "Final Quantity",
];

/// Whole numbers print bare, everything else with two decimals.
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn plan_to_csv(items: &[PlanItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for item in items {
        let row = [
            csv_field(&item.item_name),
            csv_field(&item.unit),
            item.category.to_string(),
            format_quantity(item.planned_quantity),
            format_quantity(item.customer_orders),
            format_quantity(item.base_quantity),
            format_quantity(item.buffer_quantity),
            format_quantity(item.final_quantity),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

fn render_card(item: &PlanItem) -> String {
    format!(
        r#"<article class="card">
  <div class="card-top">
    <div>
      <h3 class="card-title">{name}</h3>
      <p class="card-unit">Unit: {unit}</p>
    </div>
    <div class="card-final">
      <span class="card-final-label">Final Qty</span>
      <span class="card-final-value">{final_qty}</span>
    </div>
  </div>
  <div class="card-details">
    <div><span class="label">Planned Qty</span><span class="value">{planned}</span></div>
    <div><span class="label">Customer orders</span><span class="value">{orders}</span></div>
    <div><span class="label">Buffer</span><span class="value">{buffer}</span></div>
  </div>
</article>"#,
        name = escape_html(&item.item_name),
        unit = escape_html(&item.unit),
        final_qty = format_quantity(item.final_quantity),
        planned = format_quantity(item.planned_quantity),
        orders = format_quantity(item.customer_orders),
        buffer = format_quantity(item.buffer_quantity),
    )
}

fn render_section(plan: &ProductionPlan) -> String {
    let cards: String = plan.items.iter().map(render_card).collect();
    format!(
        r#"<section class="section">
  <header class="section-header">
    <h2>{category}</h2>
    <p>{count} items scheduled</p>
  </header>
  <div class="cards">{cards}</div>
</section>"#,
        category = escape_html(plan.category.as_str()),
        count = plan.items.len(),
        cards = cards,
    )
}

/// Printable card layout. Only published meals with at least one item get
/// a section, in breakfast-to-condiments order.
pub fn plan_to_html(plans: &[ProductionPlan], date_label: &str) -> String {
    let sections: String = MealCategory::ALL
        .iter()
        .filter_map(|meal| plans.iter().find(|plan| plan.category == *meal))
        .filter(|plan| plan.published && !plan.items.is_empty())
        .map(render_section)
        .collect();

    let body = if sections.is_empty() {
        r#"<p class="empty">No published items are available for this date.</p>"#.to_string()
    } else {
        sections
    };

    let date_label = escape_html(date_label);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Kitchen Production Planning · {date_label}</title>
    <style>
      body {{
        font-family: "Inter", -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background: #f8fafc;
        color: #1f2937;
        margin: 0;
        padding: 32px;
      }}
      h1 {{ font-size: 24px; font-weight: 600; margin: 0 0 8px; }}
      .subtitle {{ margin: 0 0 24px; color: #64748b; font-size: 14px; }}
      .section {{ margin-top: 32px; page-break-inside: avoid; }}
      .section-header {{
        display: flex;
        justify-content: space-between;
        align-items: center;
        margin-bottom: 16px;
      }}
      .section-header h2 {{ margin: 0; font-size: 18px; font-weight: 600; }}
      .cards {{
        display: grid;
        gap: 16px;
        grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      }}
      .card {{
        background: #ffffff;
        border: 1px solid #e2e8f0;
        border-radius: 16px;
        padding: 20px;
        display: flex;
        flex-direction: column;
        gap: 16px;
      }}
      .card-top {{ display: flex; justify-content: space-between; gap: 12px; }}
      .card-title {{ font-size: 16px; font-weight: 600; margin: 0 0 4px; }}
      .card-unit {{ margin: 0; font-size: 12px; color: #6b7280; }}
      .card-final {{ text-align: right; }}
      .card-final-label {{
        display: block;
        font-size: 11px;
        color: #9ca3af;
        text-transform: uppercase;
        letter-spacing: 0.08em;
      }}
      .card-final-value {{ font-size: 22px; font-weight: 700; }}
      .card-details {{ display: grid; gap: 10px; font-size: 14px; }}
      .card-details div {{ display: flex; justify-content: space-between; }}
      .label {{ color: #6b7280; }}
      .value {{ font-weight: 600; }}
      .empty {{ margin-top: 48px; font-size: 16px; text-align: center; color: #475569; }}
      @media print {{
        body {{ background: #ffffff; }}
      }}
    </style>
  </head>
  <body>
    <h1>Kitchen Production Planning</h1>
    <p class="subtitle">Finalised plan for {date_label}</p>
    {body}
  </body>
</html>"#,
        date_label = date_label,
        body = body,
    )
}
