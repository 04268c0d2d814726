//! Popup markup and the text projections shown in the control panel.

use crate::domain::model::{Domain, FlatLocation, Location, SelectionStats};
use serde::Serialize;

pub const NO_ADDRESS: &str = "No address available";
pub const CATEGORIES_PLACEHOLDER: &str = "Select domain to view categories...";
pub const NO_CATEGORIES: &str = "No categories available";
pub const LOCATIONS_PLACEHOLDER: &str = "Select categories to view locations...";
pub const NO_VISIBLE_LOCATIONS: &str = "No locations available for selected categories";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn location_popup(location: &Location) -> String {
    let mut html = format!(
        "<div class=\"location-popup\"><h4>{}</h4><p><strong>Address:</strong><br>{}</p>",
        escape_html(&location.name),
        escape_html(&location.address)
    );
    if let Some(phone) = &location.phone {
        html.push_str(&format!("<p><strong>Phone:</strong> {}</p>", escape_html(phone)));
    }
    if let Some(email) = &location.email {
        html.push_str(&format!("<p><strong>Email:</strong> {}</p>", escape_html(email)));
    }
    if let Some(website) = &location.website {
        html.push_str(&format!(
            "<p><strong>Website:</strong> <a href=\"{}\" target=\"_blank\">Visit</a></p>",
            escape_html(website)
        ));
    }
    html.push_str("<div class=\"categories\">");
    for category in &location.categories {
        html.push_str(&format!(
            "<span class=\"category-tag\" style=\"background: {}\">{}</span>",
            escape_html(&category.color),
            escape_html(&category.name)
        ));
    }
    html.push_str("</div></div>");
    html
}

pub fn flat_location_popup(location: &FlatLocation) -> String {
    let mut html = format!(
        "<div class=\"popup-content\"><div class=\"popup-title\">{}</div><div class=\"popup-address\">{}</div>",
        escape_html(&location.name),
        escape_html(&location.address)
    );
    if let Some(description) = &location.description {
        html.push_str(&format!(
            "<div class=\"popup-description\">{}</div>",
            escape_html(description)
        ));
    }

    let mut contacts = Vec::new();
    if let Some(phone) = &location.phone {
        contacts.push(format!("📞 {}", escape_html(phone)));
    }
    if let Some(email) = &location.email {
        let email = escape_html(email);
        contacts.push(format!("📧 <a href=\"mailto:{}\">{}</a>", email, email));
    }
    if let Some(website) = &location.website {
        contacts.push(format!(
            "🌐 <a href=\"{}\" target=\"_blank\">Website</a>",
            escape_html(website)
        ));
    }
    if !contacts.is_empty() {
        html.push_str(&format!(
            "<div class=\"popup-contact\">{}</div>",
            contacts.join("<br>")
        ));
    }

    html.push_str("</div>");
    html
}

/// One row of the tier-3 location list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationListItem {
    pub id: String,
    pub name: String,
    pub address: String,
    pub categories: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<&Location> for LocationListItem {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id.clone(),
            name: location.name.clone(),
            address: if location.address.is_empty() {
                NO_ADDRESS.to_string()
            } else {
                location.address.clone()
            },
            categories: location.category_names().join(", "),
            phone: location.phone.clone(),
            email: location.email.clone(),
        }
    }
}

/// One checkbox row of the tier-2 category list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListItem {
    pub id: String,
    pub name: String,
    pub color: String,
    pub location_count: u32,
    pub checked: bool,
}

pub fn domain_details(domain: &Domain) -> String {
    format!(
        "Location: {} | Language: {}\nStats: {} categories | {} locations",
        domain.country, domain.language, domain.category_count, domain.location_count
    )
}

pub fn stats_line(stats: &SelectionStats) -> String {
    format!(
        "{} domains | {}/{} categories | {} locations",
        stats.domains, stats.selected_categories, stats.categories, stats.visible_locations
    )
}
