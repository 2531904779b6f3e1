//! HTTP round-trip tests against the in-memory storage backend

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use domain_groups::{GroupService, InMemoryGroupPort};
use interface_api::{config::ApiConfig, create_router};

fn server() -> TestServer {
    let service = GroupService::new(Arc::new(InMemoryGroupPort::new()));
    TestServer::new(create_router(service, ApiConfig::default())).unwrap()
}

async fn create_trip(server: &TestServer) -> String {
    let response = server
        .post("/api/v1/groups")
        .json(&json!({ "name": "Trip", "members": ["A", "B", "C"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn add_dinner(server: &TestServer, id: &str) -> Value {
    let response = server
        .post(&format!("/api/v1/groups/{}/expenses", id))
        .json(&json!({
            "description": "Dinner",
            "amount": 300,
            "paidBy": "A",
            "splitBetween": ["A", "B", "C"]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let response = server().get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_storage() {
        let response = server().get("/health/ready").await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["storage"], "in-memory-group-port");
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let response = server().get("/health").await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}

// ============================================================================
// Groups
// ============================================================================

mod group_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_group() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server.get(&format!("/api/v1/groups/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<Value>();
        assert_eq!(body["name"], "Trip");
        assert_eq!(body["members"], json!(["A", "B", "C"]));
        assert_eq!(body["balances"]["A"], "0.00");
        assert_eq!(body["version"], 0);
    }

    #[tokio::test]
    async fn test_prefixed_id_is_accepted() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server.get(&format!("/api/v1/groups/GRP-{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_groups_newest_first() {
        let server = server();
        let first = create_trip(&server).await;
        let second = create_trip(&server).await;

        let body = server.get("/api/v1/groups").await.json::<Value>();
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.as_str()));
        assert!(ids.contains(&second.as_str()));
    }

    #[tokio::test]
    async fn test_delete_group() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server.delete(&format!("/api/v1/groups/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server.get(&format!("/api/v1/groups/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_member_starts_at_zero() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/members", id))
            .json(&json!({ "member": "D" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["balances"]["D"], "0.00");
        assert_eq!(body["balances"]["A"], "-200.00");
    }
}

// ============================================================================
// Ledger operations
// ============================================================================

mod ledger_tests {
    use super::*;

    #[tokio::test]
    async fn test_equal_split_expense() {
        let server = server();
        let id = create_trip(&server).await;

        let body = add_dinner(&server, &id).await;
        assert!(body["entryId"].is_string());
        assert_eq!(body["group"]["balances"], json!({ "A": "-200.00", "B": "100.00", "C": "100.00" }));
        assert_eq!(body["group"]["expenses"][0]["paidBy"], "A");
        assert_eq!(body["group"]["expenses"][0]["isSettlement"], false);
        assert_eq!(body["group"]["version"], 1);
    }

    #[tokio::test]
    async fn test_exact_split_expense() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/expenses", id))
            .json(&json!({
                "description": "Taxi",
                "amount": "30.00",
                "paidBy": "B",
                "shares": { "A": "20.00", "B": "10.00" }
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["group"]["balances"]["A"], "20.00");
        assert_eq!(body["group"]["balances"]["B"], "-20.00");
        assert_eq!(body["group"]["balances"]["C"], "0.00");
    }

    #[tokio::test]
    async fn test_settlement_clears_debt() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/settle", id))
            .json(&json!({ "payer": "B", "receiver": "A", "amount": 100 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let body = response.json::<Value>();
        assert_eq!(body["group"]["balances"], json!({ "A": "-100.00", "B": "0.00", "C": "100.00" }));
        assert_eq!(body["group"]["expenses"][1]["isSettlement"], true);
        assert_eq!(body["group"]["expenses"][1]["receiver"], "A");
    }

    #[tokio::test]
    async fn test_recalculate_reports_no_drift() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/recalculate", id))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<Value>();
        assert_eq!(body["drift"], false);
        assert_eq!(body["group"]["version"], 1);
    }
}

// ============================================================================
// Summaries
// ============================================================================

mod summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_overview() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let body = server
            .get(&format!("/api/v1/groups/{}/overview", id))
            .await
            .json::<Value>();
        assert_eq!(body["membersCount"], 3);
        assert_eq!(body["expensesCount"], 1);
        assert_eq!(body["settlementsCount"], 0);
        assert_eq!(body["totalSpent"], "300.00");
        assert_eq!(body["recentEntries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_balance_summary_status() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let body = server
            .get(&format!("/api/v1/groups/{}/balances/A", id))
            .await
            .json::<Value>();
        assert_eq!(body["balance"], "-200.00");
        assert_eq!(body["status"], "is owed");
    }

    #[tokio::test]
    async fn test_settlement_suggestion() {
        let server = server();
        let id = create_trip(&server).await;
        add_dinner(&server, &id).await;

        let body = server
            .get(&format!("/api/v1/groups/{}/balances/B/suggestion", id))
            .await
            .json::<Value>();
        assert_eq!(body, json!({ "payer": "B", "receiver": "A", "amount": "100.00" }));

        let body = server
            .get(&format!("/api/v1/groups/{}/balances/A/suggestion", id))
            .await
            .json::<Value>();
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_member_totals_across_groups() {
        let server = server();
        let first = create_trip(&server).await;
        let second = create_trip(&server).await;
        add_dinner(&server, &first).await;
        add_dinner(&server, &second).await;

        let body = server.get("/api/v1/members/B/totals").await.json::<Value>();
        assert_eq!(body["member"], "B");
        assert_eq!(body["totalOwes"], "200.00");
        assert_eq!(body["totalOwed"], "0.00");
    }
}

// ============================================================================
// Errors
// ============================================================================

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_payer_is_unprocessable() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/expenses", id))
            .json(&json!({
                "description": "Dinner",
                "amount": 10,
                "paidBy": "Z",
                "splitBetween": ["A"]
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");

        let group = server.get(&format!("/api/v1/groups/{}", id)).await.json::<Value>();
        assert_eq!(group["version"], 0);
        assert!(group["expenses"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_settlement_is_unprocessable() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server
            .post(&format!("/api/v1/groups/{}/settle", id))
            .json(&json!({ "payer": "A", "receiver": "A", "amount": 5 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_blank_group_name_lists_field_details() {
        let response = server()
            .post("/api/v1/groups")
            .json(&json!({ "name": "", "members": ["A"] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.json::<Value>();
        assert!(body["details"][0].as_str().unwrap().starts_with("name"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let response = server().get("/api/v1/groups/not-a-uuid").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let response = server()
            .get("/api/v1/groups/0190a0b4-1f6e-7c1a-8b2d-3e4f5a6b7c8d")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "not_found");
    }

    #[tokio::test]
    async fn test_balance_of_non_member() {
        let server = server();
        let id = create_trip(&server).await;

        let response = server.get(&format!("/api/v1/groups/{}/balances/Z", id)).await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
