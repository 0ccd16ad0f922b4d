use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use server::entity::widget_view;
use uuid::Uuid;

use crate::common::{PUBLIC_BASE_URL, TestApp, routes};

async fn view_count(app: &TestApp, site_id: Uuid) -> u64 {
    widget_view::Entity::find()
        .filter(widget_view::Column::SiteId.eq(site_id))
        .count(&app.db)
        .await
        .expect("DB query failed")
}

mod page {
    use super::*;

    #[tokio::test]
    async fn renders_approved_reviews_as_an_embeddable_page() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await;

        let res = app.get_from_ip(&routes::widget(site_id), "10.0.0.7").await;

        assert_eq!(res.status, 200);
        let content_type = res.headers["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/html"), "{content_type}");
        assert_eq!(res.headers["x-frame-options"], "ALLOWALL");
        assert_eq!(res.headers["access-control-allow-origin"], "*");
        assert!(res.text.contains("Mama Mia Pizzeria"));
        assert!(res.text.contains("Really pleasant experience overall."));
        assert!(res.text.contains("★★★★★"));
    }

    #[tokio::test]
    async fn every_render_is_recorded_as_a_view() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        app.get_from_ip(&routes::widget(site_id), "10.0.0.7").await;
        app.get_from_ip(&routes::widget(site_id), "172.16.0.1").await;

        assert_eq!(view_count(&app, site_id).await, 2);

        let view = widget_view::Entity::find()
            .filter(widget_view::Column::SiteId.eq(site_id))
            .filter(widget_view::Column::IpAddress.eq("10.0.0.7"))
            .one(&app.db)
            .await
            .unwrap()
            .expect("view should be stored");
        assert_eq!(view.country.as_deref(), Some("Poland"));
        assert_eq!(
            view.referer.as_deref(),
            Some("https://shop.example.com/about")
        );
    }

    #[tokio::test]
    async fn reviewer_names_are_escaped() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        let res = app
            .post_from_ip(
                &routes::widget_reviews(site_id),
                &json!({
                    "author_name": "<b>Maria</b>",
                    "rating": 4,
                    "comment": "Tasty pizza, friendly staff.",
                }),
                "1.2.3.4",
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let page = app.get_from_ip(&routes::widget(site_id), "1.2.3.4").await;

        assert_eq!(page.status, 200);
        assert!(!page.text.contains("<b>Maria"));
        assert!(page.text.contains("&lt;b&gt;Maria"));
    }

    #[tokio::test]
    async fn max_reviews_setting_limits_the_page() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        app.put_with_token(
            &routes::site_settings(site_id),
            &json!({"settings": {"maxReviews": 1}}),
            &owner.token,
        )
        .await;
        app.submit_review(site_id, "1.2.3.4", "a@x.com", 5).await;
        app.submit_review(site_id, "1.2.3.4", "b@x.com", 3).await;

        let page = app.get_from_ip(&routes::widget(site_id), "1.2.3.4").await;

        assert_eq!(page.status, 200);
        assert_eq!(page.text.matches("Really pleasant experience overall.").count(), 1);
    }

    #[tokio::test]
    async fn unknown_site_renders_a_not_found_page() {
        let app = TestApp::spawn().await;
        let site_id = Uuid::now_v7();

        let res = app.get_from_ip(&routes::widget(site_id), "1.2.3.4").await;

        assert_eq!(res.status, 404);
        assert!(res.text.contains("Widget Not Found"));
        assert_eq!(view_count(&app, site_id).await, 0);
    }

    #[tokio::test]
    async fn malformed_site_id_renders_the_not_found_page() {
        let app = TestApp::spawn().await;

        let res = app.get_from_ip("/widget/not-a-uuid", "1.2.3.4").await;

        assert_eq!(res.status, 404);
        assert!(res.text.contains("Widget Not Found"));
    }
}

mod api {
    use super::*;

    #[tokio::test]
    async fn visitors_can_submit_and_list_reviews_through_the_widget() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let submitted = app
            .post_from_ip(
                &routes::widget_reviews(site_id),
                &json!({
                    "author_name": "Maria",
                    "author_email": "m@x.com",
                    "rating": 5,
                    "comment": "Great service overall!",
                }),
                "1.2.3.4",
            )
            .await;
        assert_eq!(submitted.status, 201, "{}", submitted.text);
        assert_eq!(submitted.body["status"], "APPROVED");

        let duplicate = app
            .post_from_ip(
                &routes::widget_reviews(site_id),
                &json!({
                    "author_name": "Maria",
                    "author_email": "m@x.com",
                    "rating": 1,
                    "comment": "Changed my mind about it.",
                }),
                "1.2.3.4",
            )
            .await;
        assert_eq!(duplicate.status, 409);

        let list = app.get_without_token(&routes::widget_reviews(site_id)).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["total"], 1);
        assert_eq!(list.body["reviews"][0]["author_name"], "Maria");
    }

    #[tokio::test]
    async fn settings_are_filled_in_with_defaults() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        app.put_with_token(
            &routes::site_settings(site_id),
            &json!({"settings": {"theme": "dark"}}),
            &owner.token,
        )
        .await;

        let res = app.get_without_token(&routes::widget_settings(site_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["site"]["name"], "Mama Mia Pizzeria");
        assert_eq!(res.body["settings"]["theme"], "dark");
        assert_eq!(res.body["settings"]["showSubmitForm"], true);
        assert_eq!(res.body["settings"]["borderRadius"], "8px");
    }

    #[tokio::test]
    async fn embed_snippets_point_at_the_public_base_url() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let res = app
            .get_without_token(&routes::widget_embed(site_id, "?width=320"))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let iframe = res.body["iframe"].as_str().unwrap();
        assert!(iframe.contains(&format!("{PUBLIC_BASE_URL}/widget/{site_id}")));
        assert!(iframe.contains("width=\"320\""));
        assert!(iframe.contains("height=\"500\""));
        let script = res.body["javascript"].as_str().unwrap();
        assert!(script.contains(&site_id.to_string()));
        assert!(res.body["instructions"]["html"].is_string());
    }

    #[tokio::test]
    async fn stats_summarize_approved_reviews_only() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        app.submit_review(site_id, "1.2.3.4", "a@x.com", 5).await;
        app.submit_review(site_id, "1.2.3.4", "b@x.com", 4).await;

        let res = app.get_without_token(&routes::widget_stats(site_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_reviews"], 2);
        assert_eq!(res.body["average_rating"], 4.5);
        assert!(res.body["last_updated"].is_string());
    }

    #[tokio::test]
    async fn unknown_site_is_a_json_404() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::widget_settings(Uuid::now_v7()))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
