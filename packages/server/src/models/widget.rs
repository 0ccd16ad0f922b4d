use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Typed view of a site's widget settings.
///
/// Stored settings are a free-form JSON object with camelCase keys; unknown
/// keys survive in storage but are ignored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetSettings {
    pub theme: String,
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub border_radius: String,
    pub show_avatar: bool,
    pub show_date: bool,
    pub show_rating: bool,
    pub show_submit_form: bool,
    pub layout: String,
    pub max_reviews: usize,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            theme: "light".into(),
            primary_color: "#007bff".into(),
            background_color: "#ffffff".into(),
            text_color: "#333333".into(),
            border_radius: "8px".into(),
            show_avatar: true,
            show_date: true,
            show_rating: true,
            show_submit_form: true,
            layout: "cards".into(),
            max_reviews: 10,
        }
    }
}

impl WidgetSettings {
    /// Read settings from stored JSON, falling back to defaults field by field.
    pub fn from_stored(stored: &Value) -> Self {
        let merged = merge_settings(&default_settings(), stored);
        let mut settings: Self = serde_json::from_value(merged).unwrap_or_else(|e| {
            tracing::warn!("Unreadable widget settings, using defaults: {}", e);
            Self::default()
        });
        let defaults = Self::default();
        settings.primary_color = css_value_or(&settings.primary_color, &defaults.primary_color);
        settings.background_color =
            css_value_or(&settings.background_color, &defaults.background_color);
        settings.text_color = css_value_or(&settings.text_color, &defaults.text_color);
        settings.border_radius = css_value_or(&settings.border_radius, &defaults.border_radius);
        settings
    }

    pub fn is_dark(&self) -> bool {
        self.theme == "dark"
    }

    pub fn is_cards(&self) -> bool {
        self.layout == "cards"
    }
}

/// Keep a CSS value only if it cannot break out of its declaration.
fn css_value_or(value: &str, fallback: &str) -> String {
    let safe = !value.is_empty()
        && value.len() <= 32
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "#.%(), -".contains(c));
    let chosen = if safe { value } else { fallback };
    chosen.to_string()
}

/// Default settings as a JSON object.
pub fn default_settings() -> Value {
    serde_json::to_value(WidgetSettings::default()).unwrap_or_else(|_| json!({}))
}

/// Shallow merge: top-level keys of `overlay` replace those of `base`.
/// A non-object `overlay` leaves `base` unchanged.
pub fn merge_settings(base: &Value, overlay: &Value) -> Value {
    let mut merged: Map<String, Value> = base.as_object().cloned().unwrap_or_default();
    if let Some(overlay) = overlay.as_object() {
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WidgetSiteInfo {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WidgetSettingsResponse {
    pub site: WidgetSiteInfo,
    /// Stored settings merged over the defaults.
    #[schema(value_type = Object)]
    pub settings: Value,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmbedQuery {
    /// Iframe width in pixels (default: 400).
    pub width: Option<u32>,
    /// Iframe height in pixels (default: 500).
    pub height: Option<u32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EmbedInstructions {
    pub html: &'static str,
    pub javascript: &'static str,
    pub customization: &'static str,
    pub responsive: &'static str,
}

impl Default for EmbedInstructions {
    fn default() -> Self {
        Self {
            html: "Paste the iframe where the reviews widget should appear.",
            javascript: "Use the script version to control when the widget loads.",
            customization: "Adjust width and height to fit your layout.",
            responsive: "For a fluid layout set width=\"100%\" and size the container with CSS.",
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EmbedResponse {
    pub iframe: String,
    pub javascript: String,
    pub instructions: EmbedInstructions,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WidgetStatsResponse {
    /// Approved reviews shown publicly.
    pub total_reviews: usize,
    pub average_rating: f64,
    pub last_updated: DateTime<Utc>,
}
