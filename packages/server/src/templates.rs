use askama::Template;
use review_core::PublicReview;
use uuid::Uuid;

use crate::models::widget::WidgetSettings;

/// One approved review prepared for display.
pub struct WidgetReview {
    pub id: Uuid,
    pub author_name: String,
    pub initial: String,
    pub rating: i32,
    pub stars: String,
    pub date: String,
    pub comment: String,
}

impl From<PublicReview> for WidgetReview {
    fn from(r: PublicReview) -> Self {
        let filled = r.rating.clamp(0, 5) as usize;
        Self {
            id: r.id,
            initial: r
                .author_name
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default(),
            author_name: r.author_name,
            rating: r.rating,
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled)),
            date: r.created_at.format("%Y-%m-%d").to_string(),
            comment: r.comment,
        }
    }
}

/// The embeddable reviews page.
#[derive(Template)]
#[template(path = "widget.html")]
pub struct WidgetPage<'a> {
    pub site_id: Uuid,
    pub site_name: &'a str,
    pub settings: &'a WidgetSettings,
    pub reviews: Vec<WidgetReview>,
    /// Mean of the shown ratings, formatted with one decimal.
    pub average_rating: String,
}

#[derive(Template, Default)]
#[template(path = "widget_not_found.html")]
pub struct WidgetNotFound;

#[derive(Template)]
#[template(
    source = r#"<iframe src="{{ base_url|safe }}/widget/{{ site_id }}" width="{{ width }}" height="{{ height }}" frameborder="0" scrolling="auto" title="{{ site_name }} Reviews"></iframe>"#,
    ext = "html"
)]
pub struct EmbedIframe<'a> {
    pub base_url: &'a str,
    pub site_id: Uuid,
    pub site_name: &'a str,
    pub width: u32,
    pub height: u32,
}

#[derive(Template)]
#[template(path = "embed_script.html")]
pub struct EmbedScript<'a> {
    pub base_url: &'a str,
    pub site_id: Uuid,
    pub site_name: &'a str,
    pub width: u32,
    pub height: u32,
}
