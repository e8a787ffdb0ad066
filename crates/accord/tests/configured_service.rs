//! A service configured from a config file and exercised end to end.

use accord::core::fixtures;
use accord::prelude::*;
use accord_test::TestClient;
use http::StatusCode;
use serde_json::json;

fn user_registry() -> Registry {
    Registry::new(fixtures::user_api().unwrap())
        .bind("userById", |_input| async {
            Err::<Output, _>(ApiError::forbidden("not yours"))
        })
        .unwrap()
        .bind("createUser", |_input| async {
            Ok(Output::new(json!({ "id": "u1" })).status(StatusCode::CREATED))
        })
        .unwrap()
}

#[tokio::test]
async fn test_configure_from_toml() {
    let config = ConfigLoader::new()
        .with_string(
            r#"
            [service]
            name = "users"
            version = "3.2.1"

            [logging]
            preset = "silent"

            [errors]
            formatter = "structured"
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let service = user_registry().configure(&config).unwrap().assemble().unwrap();
    assert_eq!(service.formatter().name(), "structured");
    assert_eq!(service.logger().name(), "silent");
    assert_eq!(service.name(), "users");
    assert_eq!(service.version(), "3.2.1");

    let client = TestClient::new(service);
    let response = client
        .get("/api/users/1")
        .header("authorization", "t")
        .send()
        .await
        .unwrap();

    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error_code("FORBIDDEN");
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["error"]["category"], "handler");
    assert_eq!(body["error"]["status"], 403);
}

#[tokio::test]
async fn test_configure_rejects_bad_level() {
    let mut config = AccordConfig::development();
    config.logging.level = Some("users=loudest".to_string());

    assert!(user_registry().configure(&config).is_err());
}

#[tokio::test]
async fn test_default_config_keeps_defaults() {
    let service = user_registry()
        .configure(&AccordConfig::default())
        .unwrap()
        .assemble()
        .unwrap();

    assert_eq!(service.formatter().name(), "default");
    assert_eq!(service.logger().name(), "default");

    let response = TestClient::new(service)
        .post("/users")
        .json(&json!({ "name": "", "email": "e" }))
        .send()
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("INVALID_BODY");
}
