use common::Tier;
use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

/// Review id from a submission response.
fn review_id(res: &crate::common::TestResponse) -> Uuid {
    assert_eq!(res.status, 201, "Submission failed: {}", res.text);
    res.uuid()
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn visitor_review_on_a_free_site_is_published_immediately() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let res = app
            .post_from_ip(
                &routes::site_reviews(site_id),
                &json!({
                    "author_name": "Maria",
                    "author_email": "m@x.com",
                    "rating": 5,
                    "comment": "Great service overall!",
                }),
                "1.2.3.4",
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "APPROVED");
        assert_eq!(res.body["author_name"], "Maria");
        assert!(res.body.get("ip_address").is_none());
        assert!(res.body.get("author_email").is_none());

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.status, 200, "{}", public.text);
        assert_eq!(public.body["site"]["name"], "Mama Mia Pizzeria");
        assert_eq!(public.body["total"], 1);
        let review = &public.body["reviews"][0];
        assert_eq!(review["author_name"], "Maria");
        assert_eq!(review["rating"], 5);
        assert!(review.get("author_email").is_none());
        assert!(review.get("ip_address").is_none());
        assert!(review.get("status").is_none());
    }

    #[tokio::test]
    async fn same_visitor_cannot_review_twice_within_a_day() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let first = app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app.submit_review(site_id, "1.2.3.4", "m@x.com", 1).await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "DUPLICATE_REVIEW");

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 1);
    }

    #[tokio::test]
    async fn forged_forwarded_for_values_do_not_bypass_the_duplicate_guard() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let first = app.submit_review(site_id, "rotating-0", "m@x.com", 5).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app.submit_review(site_id, "rotating-1", "m@x.com", 5).await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "DUPLICATE_REVIEW");

        let mine = app.get_with_token(routes::MY_REVIEWS, &owner.token).await;
        assert_eq!(mine.body["data"][0]["ip_address"], "127.0.0.1");
    }

    #[tokio::test]
    async fn same_address_with_another_email_is_accepted() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await;
        let res = app.submit_review(site_id, "1.2.3.4", "other@x.com", 4).await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn reviews_without_email_are_not_treated_as_duplicates() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        let body = json!({
            "author_name": "Anonymous",
            "rating": 3,
            "comment": "It was fine, nothing special.",
        });

        let first = app
            .post_from_ip(&routes::site_reviews(site_id), &body, "1.2.3.4")
            .await;
        let second = app
            .post_from_ip(&routes::site_reviews(site_id), &body, "1.2.3.4")
            .await;

        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(second.status, 201, "{}", second.text);
    }

    #[tokio::test]
    async fn free_site_stops_accepting_reviews_at_the_monthly_quota() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Busy Diner").await;

        for i in 0..50 {
            let res = app
                .submit_review(site_id, "1.2.3.4", &format!("guest{i}@x.com"), 4)
                .await;
            assert_eq!(res.status, 201, "Review {i} failed: {}", res.text);
        }

        let res = app
            .submit_review(site_id, "1.2.3.4", "guest50@x.com", 4)
            .await;
        assert_eq!(res.status, 429);
        assert_eq!(res.body["code"], "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn review_on_a_premium_site_waits_for_moderation() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;

        let res = app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "PENDING");

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 0);
    }

    #[tokio::test]
    async fn invalid_rating_is_rejected() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let res = app.submit_review(site_id, "1.2.3.4", "m@x.com", 6).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn short_comment_is_rejected() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;

        let res = app
            .post_from_ip(
                &routes::site_reviews(site_id),
                &json!({"author_name": "Maria", "rating": 5, "comment": "Nice"}),
                "1.2.3.4",
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_site_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .submit_review(Uuid::now_v7(), "1.2.3.4", "m@x.com", 5)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod moderation {
    use super::*;

    #[tokio::test]
    async fn premium_review_is_held_deduplicated_then_published_on_approval() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let body = json!({
            "author_name": "Maria",
            "author_email": "m@x.com",
            "rating": 5,
            "comment": "Great service overall!",
        });

        let submitted = app
            .post_from_ip(&routes::site_reviews(site_id), &body, "1.2.3.4")
            .await;
        assert_eq!(submitted.status, 201, "{}", submitted.text);
        assert_eq!(submitted.body["status"], "PENDING");
        let id = submitted.uuid();

        let again = app
            .post_from_ip(&routes::site_reviews(site_id), &body, "1.2.3.4")
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "DUPLICATE_REVIEW");

        let approved = app
            .put_with_token(
                &routes::review_status(id),
                &json!({"status": "APPROVED"}),
                &owner.token,
            )
            .await;
        assert_eq!(approved.status, 200, "{}", approved.text);
        assert_eq!(approved.body["status"], "APPROVED");

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 1);
        assert_eq!(public.body["reviews"][0]["id"], id.to_string());
        assert_eq!(public.body["reviews"][0]["comment"], "Great service overall!");
    }

    #[tokio::test]
    async fn premium_owner_can_approve_a_pending_review() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await);

        let res = app
            .put_with_token(
                &routes::review_status(id),
                &json!({"status": "APPROVED"}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "APPROVED");
        assert_eq!(res.body["ip_address"], "1.2.3.4");

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 1);
    }

    #[tokio::test]
    async fn premium_owner_can_hide_an_approved_review() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 2).await);

        for status in ["APPROVED", "HIDDEN"] {
            let res = app
                .put_with_token(
                    &routes::review_status(id),
                    &json!({"status": status}),
                    &owner.token,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 0);
    }

    #[tokio::test]
    async fn free_owner_cannot_moderate() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 1).await);

        let res = app
            .put_with_token(
                &routes::review_status(id),
                &json!({"status": "HIDDEN"}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PLAN_RESTRICTED");

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 1);
    }

    #[tokio::test]
    async fn another_owner_cannot_moderate() {
        let app = TestApp::spawn().await;
        let alice = app.register_owner("alice@example.com").await;
        let bob = app.register_owner("bob@example.com").await;
        let site_id = app.create_site(&alice.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await);

        let res = app
            .put_with_token(
                &routes::review_status(id),
                &json!({"status": "APPROVED"}),
                &bob.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn unknown_review_is_not_found() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;

        let res = app
            .put_with_token(
                &routes::review_status(Uuid::now_v7()),
                &json!({"status": "APPROVED"}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_status_value_is_rejected() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 5).await);

        let res = app
            .put_with_token(
                &routes::review_status(id),
                &json!({"status": "PUBLISHED"}),
                &owner.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn free_owner_can_delete_a_review() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 1).await);

        let res = app.delete_with_token(&routes::review(id), &owner.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let again = app.delete_with_token(&routes::review(id), &owner.token).await;
        assert_eq!(again.status, 404);

        let public = app.get_without_token(&routes::site_reviews(site_id)).await;
        assert_eq!(public.body["total"], 0);
    }

    #[tokio::test]
    async fn another_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.register_owner("alice@example.com").await;
        let bob = app.register_owner("bob@example.com").await;
        let site_id = app.create_site(&alice.token, "Mama Mia Pizzeria").await;
        let id = review_id(&app.submit_review(site_id, "1.2.3.4", "m@x.com", 1).await);

        let res = app.delete_with_token(&routes::review(id), &bob.token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod owner_views {
    use super::*;

    #[tokio::test]
    async fn my_reviews_lists_private_fields_with_pagination() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Mama Mia Pizzeria").await;
        for i in 0..3 {
            review_id(
                &app.submit_review(site_id, "192.168.1.20", &format!("g{i}@x.com"), 5)
                    .await,
            );
        }

        let res = app
            .get_with_token(&format!("{}?page=1&limit=2", routes::MY_REVIEWS), &owner.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        assert_eq!(res.body["data"][0]["ip_address"], "192.168.1.20");
        assert_eq!(res.body["data"][0]["country"], "Ukraine");
        assert_eq!(res.body["sites"][0]["id"], site_id.to_string());

        let page2 = app
            .get_with_token(&format!("{}?page=2&limit=2", routes::MY_REVIEWS), &owner.token)
            .await;
        assert_eq!(page2.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn my_reviews_filters_by_status() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let approved = review_id(&app.submit_review(site_id, "1.2.3.4", "a@x.com", 5).await);
        review_id(&app.submit_review(site_id, "1.2.3.4", "b@x.com", 4).await);
        app.put_with_token(
            &routes::review_status(approved),
            &json!({"status": "APPROVED"}),
            &owner.token,
        )
        .await;

        let res = app
            .get_with_token(&format!("{}?status=PENDING", routes::MY_REVIEWS), &owner.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["author_email"], "b@x.com");
    }

    #[tokio::test]
    async fn my_reviews_rejects_an_unknown_status() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        app.create_site(&owner.token, "Fashion Store").await;

        let res = app
            .get_with_token(&format!("{}?status=BOGUS", routes::MY_REVIEWS), &owner.token)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.text.contains("PENDING, APPROVED, HIDDEN, DELETED"));
    }

    #[tokio::test]
    async fn my_reviews_rejects_a_site_owned_by_someone_else() {
        let app = TestApp::spawn().await;
        let alice = app.register_owner("alice@example.com").await;
        let bob = app.register_owner("bob@example.com").await;
        let site_id = app.create_site(&alice.token, "Alice Shop").await;

        let res = app
            .get_with_token(&format!("{}?site_id={site_id}", routes::MY_REVIEWS), &bob.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn owner_without_sites_gets_an_empty_page() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;

        let res = app.get_with_token(routes::MY_REVIEWS, &owner.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn site_stats_count_by_status_and_rating() {
        let app = TestApp::spawn().await;
        let owner = app.register_owner("owner@example.com").await;
        let site_id = app.create_site(&owner.token, "Fashion Store").await;
        app.set_site_plan(site_id, Tier::Premium).await;
        let five = review_id(&app.submit_review(site_id, "1.2.3.4", "a@x.com", 5).await);
        let four = review_id(&app.submit_review(site_id, "1.2.3.4", "b@x.com", 4).await);
        review_id(&app.submit_review(site_id, "1.2.3.4", "c@x.com", 1).await);
        for id in [five, four] {
            app.put_with_token(
                &routes::review_status(id),
                &json!({"status": "APPROVED"}),
                &owner.token,
            )
            .await;
        }

        let res = app
            .get_with_token(&routes::site_review_stats(site_id), &owner.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let stats = &res.body["stats"];
        assert_eq!(stats["total"], 3);
        assert_eq!(stats["approved"], 2);
        assert_eq!(stats["pending"], 1);
        assert_eq!(stats["hidden"], 0);
        assert_eq!(stats["average_rating"], 4.5);
        assert_eq!(stats["rating_distribution"]["5"], 1);
        assert_eq!(stats["rating_distribution"]["4"], 1);
        assert_eq!(stats["rating_distribution"]["1"], 0);
    }

    #[tokio::test]
    async fn site_stats_of_another_owner_are_forbidden() {
        let app = TestApp::spawn().await;
        let alice = app.register_owner("alice@example.com").await;
        let bob = app.register_owner("bob@example.com").await;
        let site_id = app.create_site(&alice.token, "Alice Shop").await;

        let res = app
            .get_with_token(&routes::site_review_stats(site_id), &bob.token)
            .await;

        assert_eq!(res.status, 403);
    }
}
