//! Application lifecycle tests
//!
//! End-to-end runs over a sled database in a temporary directory and a
//! wiremock authentication server. Each phase drops the app and builds a
//! new one over the same directory to simulate a restart.

use gomate::{App, AppConfig, CatalogSource};
use serde_json::json;
use storage::KeyValueStore;
use tempfile::TempDir;
use travel_client::{builtin_destinations, Credentials};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(data_dir: &TempDir, auth_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.base_url = auth_url;
    config.catalog.source = CatalogSource::Builtin;
    config.catalog.latency_ms = 0;
    config.storage.data_dir = Some(data_dir.path().to_path_buf());
    config
}

async fn auth_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "emilys",
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "accessToken": "abc"
        })))
        .mount(&server)
        .await;

    server
}

/// Login, favourites and theme survive a restart; logout does not keep them
#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let server = auth_server().await;
    let config = config_for(&temp_dir, server.uri());
    let destinations = builtin_destinations();

    // Phase 1: fresh install, log in and personalise
    {
        let app = App::build(&config).unwrap();
        assert!(app.store.hydrate().await.is_none());

        app.store
            .session
            .login(&Credentials::new("emilys", "emilyspass"))
            .await
            .unwrap();
        assert_eq!(app.store.destinations.fetch().await.unwrap(), 8);

        app.store.favourites.toggle(destinations[0].clone()).await;
        app.store.favourites.toggle(destinations[2].clone()).await;
        app.store.theme.toggle().await;

        app.flush().unwrap();
    }

    // Phase 2: restart, everything is restored without the network
    {
        let app = App::build(&config).unwrap();
        let user = app.store.hydrate().await.unwrap();
        assert_eq!(user.username, "emilys");

        let snapshot = app.store.snapshot();
        assert!(snapshot.session.is_authenticated);
        assert_eq!(snapshot.session.token.as_deref(), Some("abc"));
        assert!(snapshot.theme.is_dark);
        let ids: Vec<&str> = snapshot.favourites.items.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![destinations[0].id.as_str(), destinations[2].id.as_str()]);

        app.store.logout().await;
        app.flush().unwrap();
    }

    // Phase 3: after logout only the theme remains
    {
        let app = App::build(&config).unwrap();
        assert!(app.store.hydrate().await.is_none());

        let snapshot = app.store.snapshot();
        assert!(!snapshot.session.is_authenticated);
        assert!(snapshot.favourites.items.is_empty());
        assert!(snapshot.theme.is_dark);

        assert!(app.kv.get_item("userToken").await.unwrap().is_none());
        assert!(app.kv.get_item("@favourites").await.unwrap().is_none());
    }
}

/// A rejected login leaves nothing behind on disk
#[tokio::test]
async fn test_rejected_login_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let app = App::build(&config_for(&temp_dir, server.uri())).unwrap();
    app.store
        .session
        .login(&Credentials::new("x", "wrong"))
        .await
        .unwrap_err();

    let session = app.store.session.state();
    assert!(!session.is_authenticated);
    assert_eq!(session.error.as_deref(), Some("Invalid credentials"));
    assert!(app.kv.is_empty());
}

/// The REST Countries catalog is selected by configuration
#[tokio::test]
async fn test_remote_catalog_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3.1/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"cca3": "PER", "name": {"common": "Peru"}, "region": "Americas",
             "flags": {"png": "https://flagcdn.com/w320/pe.png"}}
        ])))
        .mount(&server)
        .await;

    let mut config = config_for(&temp_dir, server.uri());
    config.catalog.source = CatalogSource::RestCountries;
    config.catalog.base_url = server.uri();

    let app = App::build(&config).unwrap();
    app.store.destinations.fetch().await.unwrap();

    let hits = app.store.destinations.search("americas");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "PER");
}
