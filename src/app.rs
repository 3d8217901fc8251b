//! Router construction and shared application state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, services::token_service::TokenService, store::AccountStore};

/// State shared by every handler.
///
/// Both parts are read-only after startup; the store manages its own
/// concurrency.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, tokens: TokenService) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }
}

/// Build the HTTP router.
///
/// | Method | Path | Auth |
/// |---|---|---|
/// | GET, POST | /account | none |
/// | GET, DELETE | /account/{id} | credential for that account |
/// | POST | /transfer | none; credential for the source when `fromAccountNumber` is set |
/// | GET | /health | none |
///
/// Other methods on these paths are rejected with 400, unknown paths with 404.
pub fn router(state: AppState) -> Router {
    // Routes whose `{id}` must belong to the caller's credential
    let owner_routes = Router::new()
        .route(
            "/account/{id}",
            get(handlers::accounts::get_account)
                .delete(handlers::accounts::delete_account)
                .fallback(handlers::unsupported_method),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_account_owner,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/account",
            get(handlers::accounts::list_accounts)
                .post(handlers::accounts::create_account)
                .fallback(handlers::unsupported_method),
        )
        .route(
            "/transfer",
            post(handlers::transfers::create_transfer).fallback(handlers::unsupported_method),
        )
        .merge(owner_routes)
        .fallback(handlers::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{middleware::auth::TOKEN_HEADER, store::InMemoryAccountStore};
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    };
    use chrono::{Duration, SubsecRound, Utc};
    use serde_json::{Value, json};
    use tokio::task::JoinSet;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"router-test-secret-that-is-long-enough";

    struct TestApp {
        router: Router,
        tokens: TokenService,
    }

    struct Reply {
        status: StatusCode,
        token: Option<String>,
        body: Value,
    }

    impl TestApp {
        fn new() -> Self {
            let tokens = TokenService::new(SECRET, Duration::minutes(15));
            let state = AppState::new(Arc::new(InMemoryAccountStore::new()), tokens.clone());
            Self {
                router: router(state),
                tokens,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            body: Option<Value>,
            token: Option<&str>,
        ) -> Reply {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(TOKEN_HEADER, token);
            }
            let request = match body {
                Some(body) => builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let token = response
                .headers()
                .get(TOKEN_HEADER)
                .map(|value| value.to_str().unwrap().to_string());
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };

            Reply {
                status,
                token,
                body,
            }
        }

        async fn balance(&self, id: i64, token: &str) -> Value {
            self.send(Method::GET, &format!("/account/{id}"), None, Some(token))
                .await
                .body["balance"]
                .clone()
        }

        /// Create an account and return `(id, number, credential)`.
        async fn create(&self, first: &str, last: &str) -> (i64, i64, String) {
            let reply = self
                .send(
                    Method::POST,
                    "/account",
                    Some(json!({ "firstName": first, "lastName": last })),
                    None,
                )
                .await;
            assert_eq!(reply.status, StatusCode::OK);

            (
                reply.body["id"].as_i64().unwrap(),
                reply.body["number"].as_i64().unwrap(),
                reply.token.expect("credential header"),
            )
        }
    }

    #[tokio::test]
    async fn create_returns_fresh_account_and_credential() {
        let app = TestApp::new();
        let start = Utc::now().trunc_subsecs(6);

        let reply = app
            .send(
                Method::POST,
                "/account",
                Some(json!({ "firstName": "Ada", "lastName": "Lovelace" })),
                None,
            )
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["firstName"], "Ada");
        assert_eq!(reply.body["lastName"], "Lovelace");
        assert!(reply.body["number"].as_i64().unwrap() > 0);
        assert_eq!(reply.body["balance"], 0);

        let created_at: chrono::DateTime<Utc> =
            serde_json::from_value(reply.body["createdAt"].clone()).unwrap();
        assert!(created_at >= start);

        let claims = app.tokens.verify(&reply.token.unwrap()).unwrap();
        assert_eq!(claims.account_number, reply.body["number"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn create_rejects_malformed_bodies() {
        let app = TestApp::new();

        let missing_field = app
            .send(Method::POST, "/account", Some(json!({ "firstName": "Ada" })), None)
            .await;
        assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);
        assert!(missing_field.body["error"].is_string());

        let blank = app
            .send(
                Method::POST,
                "/account",
                Some(json!({ "firstName": "", "lastName": "Lovelace" })),
                None,
            )
            .await;
        assert_eq!(blank.status, StatusCode::BAD_REQUEST);

        let no_body = app.send(Method::POST, "/account", None, None).await;
        assert_eq!(no_body.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_returns_created_accounts() {
        let app = TestApp::new();
        let (ada, _, _) = app.create("Ada", "Lovelace").await;
        let (charles, _, _) = app.create("Charles", "Babbage").await;

        let reply = app.send(Method::GET, "/account", None, None).await;

        assert_eq!(reply.status, StatusCode::OK);
        let mut ids: Vec<i64> = reply
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|account| account["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![ada, charles]);
    }

    #[tokio::test]
    async fn fetch_with_matching_credential_round_trips() {
        let app = TestApp::new();
        let created = app
            .send(
                Method::POST,
                "/account",
                Some(json!({ "firstName": "Ada", "lastName": "Lovelace" })),
                None,
            )
            .await;
        let id = created.body["id"].as_i64().unwrap();

        let fetched = app
            .send(
                Method::GET,
                &format!("/account/{id}"),
                None,
                created.token.as_deref(),
            )
            .await;

        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body, created.body);
    }

    #[tokio::test]
    async fn delete_then_fetch_is_not_found() {
        let app = TestApp::new();
        let (id, _, token) = app.create("Ada", "Lovelace").await;

        let deleted = app
            .send(Method::DELETE, &format!("/account/{id}"), None, Some(token.as_str()))
            .await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(deleted.body, json!({ "deleted": id }));

        let fetched = app
            .send(Method::GET, &format!("/account/{id}"), None, Some(token.as_str()))
            .await;
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
        assert_eq!(fetched.body, json!({ "error": "account not found" }));
    }

    #[tokio::test]
    async fn deleted_account_credential_is_forbidden_on_other_accounts() {
        let app = TestApp::new();
        let (ada, _, ada_token) = app.create("Ada", "Lovelace").await;
        let (charles, _, _) = app.create("Charles", "Babbage").await;
        app.send(Method::DELETE, &format!("/account/{ada}"), None, Some(ada_token.as_str()))
            .await;

        let reply = app
            .send(Method::GET, &format!("/account/{charles}"), None, Some(ada_token.as_str()))
            .await;

        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body, json!({ "error": "permission denied" }));
    }

    #[tokio::test]
    async fn credential_for_another_account_is_forbidden() {
        let app = TestApp::new();
        let (_, _, ada_token) = app.create("Ada", "Lovelace").await;
        let (charles, _, _) = app.create("Charles", "Babbage").await;

        for method in [Method::GET, Method::DELETE] {
            let reply = app
                .send(method, &format!("/account/{charles}"), None, Some(ada_token.as_str()))
                .await;
            assert_eq!(reply.status, StatusCode::FORBIDDEN);
            assert_eq!(reply.body, json!({ "error": "permission denied" }));
        }

        // Still there
        let list = app.send(Method::GET, "/account", None, None).await;
        assert_eq!(list.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_id_with_live_credential_is_forbidden() {
        let app = TestApp::new();
        let (_, _, token) = app.create("Ada", "Lovelace").await;

        let reply = app.send(Method::GET, "/account/9999", None, Some(token.as_str())).await;

        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_or_forged_credentials_are_forbidden() {
        let app = TestApp::new();
        let (id, number, _) = app.create("Ada", "Lovelace").await;
        let uri = format!("/account/{id}");

        let missing = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(missing.status, StatusCode::FORBIDDEN);

        let garbage = app.send(Method::GET, &uri, None, Some("not-a-token")).await;
        assert_eq!(garbage.status, StatusCode::FORBIDDEN);

        let other_secret = TokenService::new(b"attacker-chosen-secret-value-here", Duration::minutes(15));
        let account = crate::models::account::Account {
            id: id as i32,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            number,
            balance: 0,
            created_at: Utc::now(),
        };
        let forged = other_secret.issue(&account).unwrap();
        let reply = app.send(Method::GET, &uri, None, Some(forged.as_str())).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);

        let expired = app
            .tokens
            .issue_at(&account, Utc::now() - Duration::days(1))
            .unwrap();
        let reply = app.send(Method::GET, &uri, None, Some(expired.as_str())).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bearer_authorization_header_is_accepted() {
        let app = TestApp::new();
        let (id, _, token) = app.create("Ada", "Lovelace").await;

        let request = Request::builder()
            .uri(format!("/account/{id}"))
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_integer_id_is_bad_request() {
        let app = TestApp::new();
        let (_, _, token) = app.create("Ada", "Lovelace").await;

        let reply = app.send(Method::GET, "/account/abc", None, Some(token.as_str())).await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["error"].is_string());
    }

    #[tokio::test]
    async fn transfer_credits_and_echoes_request() {
        let app = TestApp::new();
        let (id, number, token) = app.create("Ada", "Lovelace").await;

        let body = json!({ "accountNumber": number, "amount": 250 });
        let reply = app.send(Method::POST, "/transfer", Some(body.clone()), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, body);

        let fetched = app
            .send(Method::GET, &format!("/account/{id}"), None, Some(token.as_str()))
            .await;
        assert_eq!(fetched.body["balance"], 250);
    }

    #[tokio::test]
    async fn negative_transfer_is_bad_request() {
        let app = TestApp::new();

        let reply = app
            .send(
                Method::POST,
                "/transfer",
                Some(json!({ "accountNumber": 123456, "amount": -5 })),
                None,
            )
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["error"].is_string());
    }

    #[tokio::test]
    async fn transfer_to_unknown_account_is_not_found() {
        let app = TestApp::new();

        let reply = app
            .send(
                Method::POST,
                "/transfer",
                Some(json!({ "accountNumber": 123456, "amount": 5 })),
                None,
            )
            .await;

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfer_with_source_moves_funds() {
        let app = TestApp::new();
        let (ada_id, ada, ada_token) = app.create("Ada", "Lovelace").await;
        let (charles_id, charles, charles_token) = app.create("Charles", "Babbage").await;
        app.send(
            Method::POST,
            "/transfer",
            Some(json!({ "accountNumber": ada, "amount": 100 })),
            None,
        )
        .await;

        let overdraw = app
            .send(
                Method::POST,
                "/transfer",
                Some(json!({ "accountNumber": charles, "amount": 101, "fromAccountNumber": ada })),
                Some(ada_token.as_str()),
            )
            .await;
        assert_eq!(overdraw.status, StatusCode::BAD_REQUEST);

        let moved = app
            .send(
                Method::POST,
                "/transfer",
                Some(json!({ "accountNumber": charles, "amount": 30, "fromAccountNumber": ada })),
                Some(ada_token.as_str()),
            )
            .await;
        assert_eq!(moved.status, StatusCode::OK);
        assert_eq!(moved.body["fromAccountNumber"], ada);

        let ada_account = app
            .send(Method::GET, &format!("/account/{ada_id}"), None, Some(ada_token.as_str()))
            .await;
        let charles_account = app
            .send(
                Method::GET,
                &format!("/account/{charles_id}"),
                None,
                Some(charles_token.as_str()),
            )
            .await;
        assert_eq!(ada_account.body["balance"], 70);
        assert_eq!(charles_account.body["balance"], 30);
    }

    #[tokio::test]
    async fn debit_requires_source_owner_credential() {
        let app = TestApp::new();
        let (ada_id, ada, ada_token) = app.create("Ada", "Lovelace").await;
        let (charles_id, charles, charles_token) = app.create("Charles", "Babbage").await;
        app.send(
            Method::POST,
            "/transfer",
            Some(json!({ "accountNumber": ada, "amount": 100 })),
            None,
        )
        .await;
        let drain = json!({ "accountNumber": charles, "amount": 100, "fromAccountNumber": ada });

        let anonymous = app
            .send(Method::POST, "/transfer", Some(drain.clone()), None)
            .await;
        assert_eq!(anonymous.status, StatusCode::FORBIDDEN);
        assert_eq!(anonymous.body, json!({ "error": "permission denied" }));

        let thief = app
            .send(
                Method::POST,
                "/transfer",
                Some(drain.clone()),
                Some(charles_token.as_str()),
            )
            .await;
        assert_eq!(thief.status, StatusCode::FORBIDDEN);

        assert_eq!(app.balance(ada_id, &ada_token).await, 100);
        assert_eq!(app.balance(charles_id, &charles_token).await, 0);

        let owner = app
            .send(Method::POST, "/transfer", Some(drain), Some(ada_token.as_str()))
            .await;
        assert_eq!(owner.status, StatusCode::OK);
        assert_eq!(app.balance(ada_id, &ada_token).await, 0);
        assert_eq!(app.balance(charles_id, &charles_token).await, 100);
    }

    #[tokio::test]
    async fn concurrent_transfers_over_http_are_not_lost() {
        let app = TestApp::new();
        let (id, number, token) = app.create("Ada", "Lovelace").await;

        let mut tasks = JoinSet::new();
        for _ in 0..50 {
            let router = app.router.clone();
            let body = json!({ "accountNumber": number, "amount": 3 }).to_string();
            tasks.spawn(async move {
                let request = Request::builder()
                    .method(Method::POST)
                    .uri("/transfer")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap();
                router.oneshot(request).await.unwrap().status()
            });
        }
        while let Some(status) = tasks.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        let fetched = app
            .send(Method::GET, &format!("/account/{id}"), None, Some(token.as_str()))
            .await;
        assert_eq!(fetched.body["balance"], 150);
    }

    #[tokio::test]
    async fn unsupported_method_names_method_and_path() {
        let app = TestApp::new();

        let reply = app.send(Method::GET, "/transfer", None, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let message = reply.body["error"].as_str().unwrap();
        assert!(message.contains("GET"));
        assert!(message.contains("/transfer"));

        let reply = app.send(Method::PUT, "/account", None, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_method_on_owned_account_is_checked_then_rejected() {
        let app = TestApp::new();
        let (id, _, token) = app.create("Ada", "Lovelace").await;
        let uri = format!("/account/{id}");

        let reply = app.send(Method::PUT, &uri, None, Some(token.as_str())).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let message = reply.body["error"].as_str().unwrap();
        assert!(message.contains("PUT"));
        assert!(message.contains(&uri));

        let anonymous = app.send(Method::PUT, &uri, None, None).await;
        assert_eq!(anonymous.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_route_uses_error_envelope() {
        let app = TestApp::new();

        let reply = app.send(Method::GET, "/nope", None, None).await;

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body, json!({ "error": "no route for GET /nope" }));
    }

    #[tokio::test]
    async fn health_reports_connected_store() {
        let app = TestApp::new();

        let reply = app.send(Method::GET, "/health", None, None).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "healthy");
    }
}
