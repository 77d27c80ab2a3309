#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;

    use crate::handlers::accounts::{
        AccountResponse, CreateAccountRequest, ImportResponse, OperationResponse,
        UpdateAccountRequest,
    };
    use crate::handlers::budgets::{BudgetResponse, CreateBudgetRequest};
    use crate::handlers::currencies::CurrencyResponse;
    use crate::handlers::follows::{FollowResponse, FollowUserRequest, UserSummary};
    use crate::handlers::images::ImageResponse;
    use crate::handlers::users::{
        SignInRequest, SignInResponse, SignUpRequest, SignUpResponse, UpdateUserRequest,
        UserResponse,
    };
    use crate::router::create_router;
    use crate::schemas::{ErrorResponse, HealthResponse};
    use crate::services::users::AccountBootstrap;
    use crate::test_utils::test_utils::{setup_test_app, setup_test_app_state_with};
    use async_trait::async_trait;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::{
        multipart::{MultipartForm, Part},
        TestRequest, TestServer,
    };
    use model::entities::{account::AccountType, follow::FollowState};
    use rust_decimal::Decimal;
    use sea_orm::DatabaseTransaction;
    use store::{account::AccountDetails, user::UserProfile, StoreError};
    use tempfile::TempDir;

    async fn test_server() -> (TestServer, TempDir) {
        let (app, attachments) = setup_test_app().await;
        (TestServer::new(app).unwrap(), attachments)
    }

    fn sign_up_request(name: &str, email: &str) -> SignUpRequest {
        SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            currency_iso_code: "EUR".to_string(),
        }
    }

    async fn sign_up(server: &TestServer, name: &str, email: &str) -> SignUpResponse {
        let response = server
            .post("/api/v1/users/sign-up")
            .json(&sign_up_request(name, email))
            .await;
        if response.status_code() != StatusCode::CREATED {
            println!("Error response: {}", response.text());
            panic!("Expected 201 Created, got {}", response.status_code());
        }
        response.json()
    }

    fn bearer(request: TestRequest, token: &str) -> TestRequest {
        request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _dir) = test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    #[tokio::test]
    async fn test_currencies_are_public() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/v1/currencies").await;
        response.assert_status(StatusCode::OK);
        let currencies: Vec<CurrencyResponse> = response.json();
        assert!(currencies.iter().any(|c| c.iso_code == "EUR"));

        let response = server.get("/api/v1/currencies/gbp").await;
        response.assert_status(StatusCode::OK);
        let gbp: CurrencyResponse = response.json();
        assert_eq!(gbp.symbol, "£");

        server
            .get("/api/v1/currencies/XYZ")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_and_wallet() {
        let (server, _dir) = test_server().await;

        let body = sign_up(&server, "Alice", "alice@example.com").await;
        assert!(body.default_account_created);
        assert_eq!(body.user.email, "alice@example.com");
        assert_eq!(body.user.currency.iso_code, "EUR");

        let response = bearer(server.get("/api/v1/accounts"), &body.access_token).await;
        response.assert_status(StatusCode::OK);
        let accounts: Vec<AccountResponse> = response.json();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Wallet");
        assert_eq!(accounts[0].account_type, AccountType::Cash);
        assert_eq!(accounts[0].currency.iso_code, "EUR");
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let (server, _dir) = test_server().await;
        sign_up(&server, "Alice", "alice@example.com").await;

        let response = server
            .post("/api/v1/users/sign-up")
            .json(&sign_up_request("Other Alice", "alice@example.com"))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "DUPLICATE_ENTITY");
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let (server, _dir) = test_server().await;

        let mut request = sign_up_request("Alice", "not-an-email");
        request.password = "short".to_string();
        let response = server.post("/api/v1/users/sign-up").json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let mut request = sign_up_request("Alice", "alice@example.com");
        request.currency_iso_code = "ZZZ".to_string();
        let response = server.post("/api/v1/users/sign-up").json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "INVALID_DATA");
    }

    #[tokio::test]
    async fn test_sign_in_failures_look_the_same() {
        let (server, _dir) = test_server().await;
        sign_up(&server, "Alice", "alice@example.com").await;

        let wrong_password = server
            .post("/api/v1/users/sign-in")
            .json(&SignInRequest {
                email: "alice@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        let unknown_email = server
            .post("/api/v1/users/sign-in")
            .json(&SignInRequest {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_email.text());
        let body: ErrorResponse = wrong_password.json();
        assert_eq!(body.code, "AUTHENTICATION_FAILED");

        let response = server
            .post("/api/v1/users/sign-in")
            .json(&SignInRequest {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let signed_in: SignInResponse = response.json();

        let me = bearer(server.get("/api/v1/users/me"), &signed_in.access_token).await;
        me.assert_status(StatusCode::OK);
        let me: UserResponse = me.json();
        assert_eq!(me.id, signed_in.user.id);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/v1/users/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "UNAUTHORIZED");

        bearer(server.get("/api/v1/accounts"), "garbage")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_and_delete_me() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let token = alice.access_token.as_str();

        let response = bearer(server.put("/api/v1/users/me"), token)
            .json(&UpdateUserRequest {
                name: Some("Alicia".to_string()),
                password: None,
            })
            .await;
        response.assert_status(StatusCode::OK);
        let updated: UserResponse = response.json();
        assert_eq!(updated.name, "Alicia");

        bearer(server.delete("/api/v1/users/me"), token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // The token is still valid but the user is gone
        bearer(server.get("/api/v1/users/me"), token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .post("/api/v1/users/sign-in")
            .json(&SignInRequest {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_missing_image_is_not_found() {
        let (server, attachments) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;

        let response = bearer(server.delete("/api/v1/users/me/images/42"), &alice.access_token).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 0);

        let response = bearer(server.get("/api/v1/users/me/images"), &alice.access_token).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Vec<serde_json::Value>>().len(), 0);
    }

    fn png_part(file_name: &str) -> Part {
        Part::bytes(b"\x89PNG".to_vec())
            .file_name(file_name)
            .mime_type("image/png")
    }

    #[tokio::test]
    async fn test_upload_without_file_part_is_rejected() {
        let (server, attachments) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;

        let form = MultipartForm::new().add_text("caption", "no file here");
        let response = bearer(server.post("/api/v1/users/me/images"), &alice.access_token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "INVALID_DATA");
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_with_two_files_persists_nothing() {
        let (server, attachments) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;

        let form = MultipartForm::new()
            .add_part("first", png_part("a.png"))
            .add_part("second", png_part("b.png"));
        let response = bearer(server.post("/api/v1/users/me/images"), &alice.access_token)
            .multipart(form)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "INVALID_DATA");

        let images: Vec<ImageResponse> =
            bearer(server.get("/api/v1/users/me/images"), &alice.access_token)
                .await
                .json();
        assert!(images.is_empty());
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_rejected() {
        let (server, attachments) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;

        // Test state allows 1 MiB per request
        let form = MultipartForm::new().add_part(
            "image",
            Part::bytes(vec![0u8; 2 * 1024 * 1024])
                .file_name("huge.png")
                .mime_type("image/png"),
        );
        let response = bearer(server.post("/api/v1/users/me/images"), &alice.access_token)
            .multipart(form)
            .await;

        assert!(response.status_code().is_client_error());
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_download_delete_image() {
        let (server, attachments) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let token = alice.access_token.as_str();

        // Plain fields next to the file are ignored
        let form = MultipartForm::new()
            .add_text("caption", "me")
            .add_part("image", png_part("avatar.png"));
        let response = bearer(server.post("/api/v1/users/me/images"), token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let image: ImageResponse = response.json();
        assert!(image.file_name.ends_with(".png"));
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 1);

        let path = format!("/api/v1/users/me/images/{}", image.id);
        let response = bearer(server.get(&path), token).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
        assert_eq!(response.as_bytes().to_vec(), b"\x89PNG".to_vec());

        bearer(server.delete(&path), token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        bearer(server.get(&path), token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        assert_eq!(std::fs::read_dir(attachments.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_import_statement() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let token = alice.access_token.as_str();

        let accounts: Vec<AccountResponse> = bearer(server.get("/api/v1/accounts"), token)
            .await
            .json();
        let import_path = format!("/api/v1/accounts/{}/import", accounts[0].id);

        let statement = "date,description,amount\n\
                         2024-03-01,Groceries,-42.50\n\
                         2024-03-02,Salary,2500.00\n";
        let form = MultipartForm::new().add_part(
            "statement",
            Part::bytes(statement.as_bytes().to_vec())
                .file_name("march.csv")
                .mime_type("text/csv"),
        );
        let response = bearer(server.post(&import_path), token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let import: ImportResponse = response.json();
        assert_eq!(import.file_name, "march.csv");
        assert_eq!(import.operations, 2);

        let operations: Vec<OperationResponse> = bearer(
            server.get(&format!("/api/v1/accounts/{}/operations", accounts[0].id)),
            token,
        )
        .await
        .json();
        assert_eq!(operations.len(), 2);
        assert!(operations.iter().all(|op| op.import_id == Some(import.id)));
        assert_eq!(operations[0].description, "Salary");

        // A malformed file adds nothing
        let form = MultipartForm::new().add_part(
            "statement",
            Part::bytes(b"date,description,amount\nnot-a-date,Rent,-900\n".to_vec())
                .file_name("broken.csv"),
        );
        bearer(server.post(&import_path), token)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let operations: Vec<OperationResponse> = bearer(
            server.get(&format!("/api/v1/accounts/{}/operations", accounts[0].id)),
            token,
        )
        .await
        .json();
        assert_eq!(operations.len(), 2);
    }

    #[tokio::test]
    async fn test_get_other_user_hides_email() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let bob = sign_up(&server, "Bob", "bob@example.com").await;

        let response = bearer(
            server.get(&format!("/api/v1/users/{}", alice.user.id)),
            &bob.access_token,
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert!(body.get("email").is_none());
        let summary: UserSummary = response.json();
        assert_eq!(summary.id, alice.user.id);
        assert_eq!(summary.name, "Alice");

        bearer(server.get("/api/v1/users/9999"), &bob.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_follow_flow() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let bob = sign_up(&server, "Bob", "bob@example.com").await;

        // Bob asks to follow Alice
        let response = bearer(server.post("/api/v1/follows"), &bob.access_token)
            .json(&FollowUserRequest {
                user_id: alice.user.id,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let request: FollowResponse = response.json();
        assert_eq!(request.state, FollowState::Requested);
        assert_eq!(request.user.id, alice.user.id);

        bearer(server.post("/api/v1/follows"), &bob.access_token)
            .json(&FollowUserRequest {
                user_id: alice.user.id,
            })
            .await
            .assert_status(StatusCode::CONFLICT);

        bearer(server.post("/api/v1/follows"), &bob.access_token)
            .json(&FollowUserRequest { user_id: bob.user.id })
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = bearer(server.get("/api/v1/follows/followers"), &alice.access_token).await;
        let followers: Vec<FollowResponse> = response.json();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].user.name, "Bob");

        let approve_path = format!("/api/v1/follows/followers/{}/approve", request.id);
        let response = bearer(server.put(&approve_path), &alice.access_token).await;
        response.assert_status(StatusCode::OK);
        let approved: FollowResponse = response.json();
        assert_eq!(approved.state, FollowState::Approved);

        // Approving twice finds nothing pending
        bearer(server.put(&approve_path), &alice.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = bearer(server.get("/api/v1/follows/following"), &bob.access_token).await;
        let following: Vec<FollowResponse> = response.json();
        assert_eq!(following[0].state, FollowState::Approved);

        let unfollow_path = format!("/api/v1/follows/following/{}", request.id);
        bearer(server.delete(&unfollow_path), &bob.access_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        bearer(server.delete(&unfollow_path), &bob.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_account_crud() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let token = alice.access_token.as_str();

        let response = bearer(server.post("/api/v1/accounts"), token)
            .json(&CreateAccountRequest {
                name: "Savings".to_string(),
                notes: None,
                currency_id: alice.user.currency.id,
                account_type: AccountType::Savings,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let account: AccountResponse = response.json();
        assert_eq!(account.notes, None);

        // Same name twice
        bearer(server.post("/api/v1/accounts"), token)
            .json(&CreateAccountRequest {
                name: "Savings".to_string(),
                notes: None,
                currency_id: alice.user.currency.id,
                account_type: AccountType::Savings,
            })
            .await
            .assert_status(StatusCode::CONFLICT);

        let path = format!("/api/v1/accounts/{}", account.id);
        let response = bearer(server.put(&path), token)
            .json(&UpdateAccountRequest {
                notes: Some("Rainy day".to_string()),
                ..Default::default()
            })
            .await;
        response.assert_status(StatusCode::OK);
        let updated: AccountResponse = response.json();
        assert_eq!(updated.notes.as_deref(), Some("Rainy day"));
        assert_eq!(updated.name, "Savings");

        let operations = bearer(server.get(&format!("{}/operations", path)), token).await;
        operations.assert_status(StatusCode::OK);

        // Other users cannot see it
        let bob = sign_up(&server, "Bob", "bob@example.com").await;
        bearer(server.get(&path), &bob.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        bearer(server.delete(&path), token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        bearer(server.get(&path), token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_budget_crud() {
        let (server, _dir) = test_server().await;
        let alice = sign_up(&server, "Alice", "alice@example.com").await;
        let bob = sign_up(&server, "Bob", "bob@example.com").await;

        let accounts: Vec<AccountResponse> =
            bearer(server.get("/api/v1/accounts"), &alice.access_token)
                .await
                .json();
        let wallet = accounts[0].id;

        let request = CreateBudgetRequest {
            name: "Food".to_string(),
            currency_id: alice.user.currency.id,
            limit: Decimal::new(25000, 2),
            account_ids: vec![wallet],
        };

        // Bob cannot budget over Alice's wallet
        bearer(server.post("/api/v1/budgets"), &bob.access_token)
            .json(&request)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = bearer(server.post("/api/v1/budgets"), &alice.access_token)
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);
        let budget: BudgetResponse = response.json();
        assert_eq!(budget.account_ids, Some(vec![wallet]));
        assert_eq!(budget.limit, Decimal::new(25000, 2));

        let listed: Vec<BudgetResponse> =
            bearer(server.get("/api/v1/budgets"), &alice.access_token)
                .await
                .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].account_ids, None);

        let path = format!("/api/v1/budgets/{}", budget.id);
        bearer(server.delete(&path), &alice.access_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        bearer(server.get(&path), &alice.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    struct BrokenBootstrap;

    #[async_trait]
    impl AccountBootstrap for BrokenBootstrap {
        async fn create_default_account(
            &self,
            _txn: &DatabaseTransaction,
            _owner: &UserProfile,
        ) -> store::Result<AccountDetails> {
            Err(StoreError::InvalidReference("no wallet today".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sign_up_reports_missing_default_account() {
        let (state, _dir) = setup_test_app_state_with(Arc::new(BrokenBootstrap)).await;
        let server = TestServer::new(create_router(state)).unwrap();

        let body = sign_up(&server, "Alice", "alice@example.com").await;
        assert!(!body.default_account_created);

        let accounts: Vec<AccountResponse> =
            bearer(server.get("/api/v1/accounts"), &body.access_token)
                .await
                .json();
        assert!(accounts.is_empty());
    }
}
