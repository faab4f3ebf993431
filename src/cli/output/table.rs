//! Table output for tenant listings using comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::Tenant;

/// Tenant fields safe to print; credentials are left out.
#[derive(Debug, Clone, Serialize)]
pub struct TenantView {
    pub client_id: String,
    pub catalog_url: String,
    pub gate_url: String,
    pub active: bool,
    pub lang: String,
    pub currency: String,
    pub commands: Vec<String>,
    pub updated_at: String,
}

impl From<&Tenant> for TenantView {
    fn from(tenant: &Tenant) -> Self {
        Self {
            client_id: tenant.client_id.clone(),
            catalog_url: tenant.catalog_url.clone(),
            gate_url: tenant.gate_url.clone(),
            active: tenant.active,
            lang: tenant.lang.clone(),
            currency: tenant.currency.clone(),
            commands: tenant.commands.clone(),
            updated_at: tenant.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }
}

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Format tenants as a table
    pub fn format_tenants(&self, tenants: &[TenantView]) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Client ID").add_attribute(Attribute::Bold),
            Cell::new("Catalog").add_attribute(Attribute::Bold),
            Cell::new("Active").add_attribute(Attribute::Bold),
            Cell::new("Lang").add_attribute(Attribute::Bold),
            Cell::new("Currency").add_attribute(Attribute::Bold),
            Cell::new("Updated").add_attribute(Attribute::Bold),
        ]);

        for tenant in tenants {
            let active_cell = match (self.use_colors, tenant.active) {
                (true, true) => Cell::new("yes").fg(Color::Green),
                (true, false) => Cell::new("no").fg(Color::DarkGrey),
                (false, true) => Cell::new("yes"),
                (false, false) => Cell::new("no"),
            };

            table.add_row(vec![
                Cell::new(truncate_text(&tenant.client_id, 12)),
                Cell::new(truncate_text(&tenant.catalog_url, 40)),
                active_cell,
                Cell::new(or_dash(&tenant.lang)),
                Cell::new(or_dash(&tenant.currency)),
                Cell::new(&tenant.updated_at),
            ]);
        }

        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_credentials() {
        let tenant = Tenant::new("c1", "https://shop.example.com", "secret-key")
            .with_gateway("https://mg.example.com", "secret-token");
        let json = serde_json::to_string(&TenantView::from(&tenant)).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("shop.example.com"));
    }

    #[test]
    fn test_table_lists_every_tenant() {
        let tenants: Vec<TenantView> = ["alpha", "beta"]
            .iter()
            .map(|id| TenantView::from(&Tenant::new(*id, "https://shop.example.com", "k").with_active(true)))
            .collect();

        let output = TableFormatter::with_colors(false).format_tenants(&tenants);
        assert!(output.contains("alpha"));
        assert!(output.contains("beta"));
        assert!(output.contains("yes"));
        assert!(output.contains("-"));
    }

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("ábcdefghij", 6), "ábc...");
    }
}
