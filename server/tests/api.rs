//! End-to-end tests of the HTTP API against the in-memory catalog and a temporary media root.

use axum::body::Body;
use axum::Router;
use bb_server::catalog::memory::MemoryCatalog;
use bb_server::routes::build_router;
use bb_server::serve::{service_from_config, AppState};
use bb_server::service::Service;
use billboard_rs::api::SessionToken;
use chrono::{TimeDelta, Utc};
use figment::providers::{Format, Toml};
use figment::Figment;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "hunter2";
const BOUNDARY: &str = "billboard-test-boundary";

struct TestApp {
    router: Router,
    service: Arc<Service>,
    media: TempDir,
}

async fn app() -> TestApp {
    app_with_media_settings("").await
}

/// `settings` are extra lines for the `[media]` table.
async fn app_with_media_settings(settings: &str) -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
        [database]
        backend = "memory"

        [server]
        bind_address = "127.0.0.1:0"

        [media]
        root = '{}'
        {settings}

        [admin]
        password = "{PASSWORD}"
        "#,
        media.path().display()
    );
    let config = bb_server::config::extract(Figment::new().merge(Toml::string(&toml))).unwrap();
    let service = service_from_config(&config, Arc::new(MemoryCatalog::new()));
    service
        .bootstrap_admin(config.admin.password.as_deref())
        .await
        .unwrap();
    let router = build_router(AppState::new(config, Arc::clone(&service)));
    TestApp {
        router,
        service,
        media,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
}
impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        Reply {
            status,
            headers,
            bytes,
        }
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> Reply {
        let mut builder = Request::builder().method(Method::DELETE).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn login(&self) -> String {
        let reply = self
            .post_json("/api/v1/auth/login", None, json!({ "password": PASSWORD }))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.json()["token"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: Option<&str>, fields: &[(&str, &str)]) -> Reply {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            if *name == "file" {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\n\
                      Content-Type: application/octet-stream\r\n\r\n",
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/upload")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn upload_file(&self, token: &str, path: &str, contents: &str) -> Value {
        let reply = self
            .upload(Some(token), &[("path", path), ("file", contents)])
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.json());
        reply.json()
    }

    async fn enable(&self, token: &str, route: &str, folders: &[&str]) {
        let reply = self
            .post_json(
                "/api/v1/config",
                Some(token),
                json!({ "route": route, "selected_folders": folders }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    async fn listed_names(&self, uri: &str, token: Option<&str>) -> Vec<String> {
        let reply = self.get(uri, token).await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.json());
        reply.json()["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect()
    }
}

// -- configuration

#[tokio::test]
async fn config_reads_back_what_was_posted() {
    let app = app().await;
    let token = app.login().await;

    let reply = app
        .post_json(
            "/api/v1/config",
            Some(&token),
            json!({
                "route": "internal",
                "duration": 7,
                "selected_folders": [
                    "2025\\internal\\March",
                    "2025/internal/March",
                    "2025/internal/April/",
                ],
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let config = app.get("/api/v1/config?route=internal", None).await.json();
    assert_eq!(config["type"], "ok");
    assert_eq!(config["config"]["duration"], 7);
    assert_eq!(
        config["config"]["selected_folders"],
        json!(["2025/internal/March", "2025/internal/April"])
    );

    // omitting the duration keeps the stored one
    app.enable(&token, "internal", &["2025/internal/May"]).await;
    let config = app.get("/api/v1/config?route=internal", None).await.json();
    assert_eq!(config["config"]["duration"], 7);
    assert_eq!(
        config["config"]["selected_folders"],
        json!(["2025/internal/May"])
    );
}

#[tokio::test]
async fn unconfigured_routes_read_as_defaults() {
    let app = app().await;
    let config = app.get("/api/v1/config?route=external", None).await.json();
    assert_eq!(config["config"]["duration"], 20);
    assert_eq!(config["config"]["selected_folders"], json!([]));

    let config = app.get("/api/v1/config", None).await.json();
    assert_eq!(config["route"], "default");
}

#[tokio::test]
async fn config_rejects_bad_input() {
    let app = app().await;
    let token = app.login().await;
    let zero = app
        .post_json(
            "/api/v1/config",
            Some(&token),
            json!({ "route": "internal", "duration": 0, "selected_folders": [] }),
        )
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.json()["type"], "invalid");

    let escape = app
        .post_json(
            "/api/v1/config",
            Some(&token),
            json!({ "route": "internal", "selected_folders": ["2025/../etc"] }),
        )
        .await;
    assert_eq!(escape.status, StatusCode::BAD_REQUEST);

    let huge = app
        .post_json(
            "/api/v1/config",
            Some(&token),
            json!({ "route": "internal", "duration": 3_000_000_000u32, "selected_folders": [] }),
        )
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);
    assert_eq!(huge.json()["type"], "invalid");
}

// -- authentication

#[tokio::test]
async fn mutations_need_a_session() {
    let app = app().await;
    let config = app
        .post_json(
            "/api/v1/config",
            None,
            json!({ "route": "internal", "selected_folders": [] }),
        )
        .await;
    assert_eq!(config.status, StatusCode::UNAUTHORIZED);
    assert_eq!(config.json()["type"], "unauthorized");

    let upload = app
        .upload(None, &[("path", "2025/internal/a.png"), ("file", "x")])
        .await;
    assert_eq!(upload.status, StatusCode::UNAUTHORIZED);

    let delete = app
        .delete(&format!("/api/v1/images/{}", uuid::Uuid::new_v4()), None)
        .await;
    assert_eq!(delete.status, StatusCode::UNAUTHORIZED);

    let meta = app
        .post_json(
            "/api/v1/images/meta",
            None,
            json!({ "url": "/media/2025/internal/a.png", "scheduled_at": "2025-01-01T00:00" }),
        )
        .await;
    assert_eq!(meta.status, StatusCode::UNAUTHORIZED);

    let folders = app
        .get("/api/v1/folders?year=2025&route=internal", None)
        .await;
    assert_eq!(folders.status, StatusCode::UNAUTHORIZED);

    let all = app
        .get("/api/v1/images?folder=2025/internal&all=true", None)
        .await;
    assert_eq!(all.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app().await;
    let reply = app
        .post_json("/api/v1/auth/login", None, json!({ "password": "guess" }))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let app = app().await;
    let token = SessionToken([9; 32]);
    let now = Utc::now();
    app.service
        .catalog()
        .insert_session(token, now - TimeDelta::hours(1), now - TimeDelta::minutes(1))
        .await
        .unwrap();
    let reply = app
        .get("/api/v1/auth/check", Some(&token.encode_for_http()))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let garbage = app.get("/api/v1/auth/check", Some("not-a-token")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_works_until_logout() {
    let app = app().await;
    let login = app
        .post_json("/api/v1/auth/login", None, json!({ "password": PASSWORD }))
        .await;
    let set_cookie = login.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("bb_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=600"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let with_cookie = |method: Method, uri: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, &cookie)
            .body(Body::empty())
            .unwrap()
    };

    let check = app
        .send(with_cookie(Method::GET, "/api/v1/auth/check"))
        .await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.json()["type"], "ok");

    let logout = app
        .send(with_cookie(Method::POST, "/api/v1/auth/logout"))
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    let check = app
        .send(with_cookie(Method::GET, "/api/v1/auth/check"))
        .await;
    assert_eq!(check.status, StatusCode::UNAUTHORIZED);
}

// -- upload & listing

#[tokio::test]
async fn uploaded_file_is_listed_exactly_once() {
    let app = app().await;
    let token = app.login().await;
    app.enable(&token, "internal", &["2025/internal/March"]).await;

    let first = app
        .upload_file(&token, "2025/internal/March/a.png", "first")
        .await;
    let second = app
        .upload_file(&token, "2025\\internal\\March\\a.png", "second")
        .await;
    assert_eq!(first["url"], "/media/2025/internal/March/a.png");
    assert_eq!(first["image"]["id"], second["image"]["id"]);

    let names = app
        .listed_names("/api/v1/images?folder=2025/internal/March", None)
        .await;
    assert_eq!(names, ["a.png"]);

    let on_disk = app.media.path().join("2025/internal/March/a.png");
    assert_eq!(std::fs::read(on_disk).unwrap(), b"second");

    let served = app.get("/media/2025/internal/March/a.png", None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.bytes, b"second");
}

#[tokio::test]
async fn disabled_folders_list_nothing() {
    let app = app().await;
    let token = app.login().await;
    app.enable(&token, "internal", &["2025/internal/March"]).await;
    app.upload_file(&token, "2025/internal/April/b.png", "b")
        .await;

    let names = app
        .listed_names("/api/v1/images?folder=2025/internal/April", None)
        .await;
    assert!(names.is_empty());

    let names = app
        .listed_names(
            "/api/v1/images?folder=2025/internal/April&all=true",
            Some(&token),
        )
        .await;
    assert_eq!(names, ["b.png"]);
}

#[tokio::test]
async fn listing_descends_into_enabled_subfolders_only() {
    let app = app().await;
    let token = app.login().await;
    app.enable(
        &token,
        "internal",
        &["2025/internal", "2025/internal/March"],
    )
    .await;
    app.upload_file(&token, "2025/internal/top.png", "t").await;
    app.upload_file(&token, "2025/internal/March/m.png", "m")
        .await;
    app.upload_file(&token, "2025/internal/April/a.png", "a")
        .await;

    let names = app
        .listed_names("/api/v1/images?folder=2025/internal", None)
        .await;
    // folder first, then name
    assert_eq!(names, ["top.png", "m.png"]);
}

#[tokio::test]
async fn listing_needs_a_folder_and_a_route() {
    let app = app().await;
    let missing = app.get("/api/v1/images", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let no_route = app.get("/api/v1/images?folder=2025/lobby", None).await;
    assert_eq!(no_route.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_route.json()["type"], "invalid");

    let explicit = app
        .get("/api/v1/images?folder=2025/lobby&route=lobby", None)
        .await;
    assert_eq!(explicit.status, StatusCode::OK);
}

#[tokio::test]
async fn expired_images_drop_out_of_the_default_listing() {
    let app = app().await;
    let token = app.login().await;
    app.enable(&token, "external", &["2025/external/June"]).await;

    let now = Utc::now();
    let scheduled = (now - TimeDelta::hours(2)).to_rfc3339();
    let expired = (now - TimeDelta::hours(1)).to_rfc3339();
    let reply = app
        .upload(
            Some(&token),
            &[
                ("path", "2025/external/June/old.png"),
                ("scheduled_at", scheduled.as_str()),
                ("expires_at", expired.as_str()),
                ("file", "old"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    app.upload_file(&token, "2025/external/June/new.png", "new")
        .await;

    let names = app
        .listed_names("/api/v1/images?folder=2025/external/June", None)
        .await;
    assert_eq!(names, ["new.png"]);

    let names = app
        .listed_names(
            "/api/v1/images?folder=2025/external/June&all=true",
            Some(&token),
        )
        .await;
    assert_eq!(names, ["new.png", "old.png"]);
}

#[tokio::test]
async fn upload_rejects_bad_requests() {
    let app = app().await;
    let token = app.login().await;

    let no_path = app.upload(Some(&token), &[("file", "x")]).await;
    assert_eq!(no_path.status, StatusCode::BAD_REQUEST);

    let bad_ext = app
        .upload(
            Some(&token),
            &[("path", "2025/internal/notes.txt"), ("file", "x")],
        )
        .await;
    assert_eq!(bad_ext.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_ext.json()["type"], "invalid");

    let no_folder = app
        .upload(Some(&token), &[("path", "a.png"), ("file", "x")])
        .await;
    assert_eq!(no_folder.status, StatusCode::BAD_REQUEST);

    let escape = app
        .upload(
            Some(&token),
            &[("path", "../outside.png"), ("file", "x")],
        )
        .await;
    assert_eq!(escape.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn broken_or_oversized_forms_are_rejected() {
    let app = app_with_media_settings("max_upload_bytes = 1024").await;
    let token = app.login().await;

    let big = "x".repeat(4096);
    let too_large = app
        .upload(
            Some(&token),
            &[("path", "2025/internal/big.png"), ("file", big.as_str())],
        )
        .await;
    assert_eq!(too_large.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(too_large.json()["type"], "too_large");

    let garbage = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/upload")
                .header(
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(AUTHORIZATION, format!("Bearer {token}"))
                // cut off in the middle of the first field
                .body(Body::from(format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n2025/inter"
                )))
                .unwrap(),
        )
        .await;
    assert_eq!(garbage.status, StatusCode::BAD_REQUEST);
    assert_eq!(garbage.json()["type"], "invalid");
}

#[tokio::test]
async fn upload_rejects_an_expiry_before_the_start() {
    let app = app().await;
    let token = app.login().await;

    // no start given: it defaults to now, which is after this expiry
    let past_expiry = app
        .upload(
            Some(&token),
            &[
                ("path", "2025/internal/a.png"),
                ("expires_at", "2000-01-01T00:00:00Z"),
                ("file", "x"),
            ],
        )
        .await;
    assert_eq!(past_expiry.status, StatusCode::BAD_REQUEST);
    assert_eq!(past_expiry.json()["type"], "invalid");
    assert!(!app.media.path().join("2025/internal/a.png").exists());

    let inverted = app
        .upload(
            Some(&token),
            &[
                ("path", "2025/internal/a.png"),
                ("scheduled_at", "2030-01-02T00:00:00Z"),
                ("expires_at", "2030-01-01T00:00:00Z"),
                ("file", "x"),
            ],
        )
        .await;
    assert_eq!(inverted.status, StatusCode::BAD_REQUEST);

    let future_expiry = app
        .upload(
            Some(&token),
            &[
                ("path", "2025/internal/a.png"),
                ("expires_at", "2100-01-01T00:00:00Z"),
                ("file", "x"),
            ],
        )
        .await;
    assert_eq!(future_expiry.status, StatusCode::OK);
    assert_eq!(
        future_expiry.json()["image"]["expires_at"],
        "2100-01-01T00:00:00Z"
    );
}

// -- metadata & deletion

#[tokio::test]
async fn meta_schedules_an_image() {
    let app = app().await;
    let token = app.login().await;
    app.enable(&token, "public", &["2025/public/May"]).await;
    let uploaded = app
        .upload_file(&token, "2025/public/May/soon.webp", "w")
        .await;

    let tomorrow = (Utc::now() + TimeDelta::days(1)).to_rfc3339();
    let reply = app
        .post_json(
            "/api/v1/images/meta",
            Some(&token),
            json!({ "url": uploaded["url"], "scheduled_at": tomorrow }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["image"]["id"], uploaded["image"]["id"]);

    let names = app
        .listed_names("/api/v1/images?folder=2025/public/May", None)
        .await;
    assert!(names.is_empty());

    let missing = app
        .post_json(
            "/api/v1/images/meta",
            Some(&token),
            json!({ "url": uploaded["url"] }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let garbage = app
        .post_json(
            "/api/v1/images/meta",
            Some(&token),
            json!({ "url": uploaded["url"], "scheduled_at": "next tuesday" }),
        )
        .await;
    assert_eq!(garbage.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_removes_file_and_listing() {
    let app = app().await;
    let token = app.login().await;
    app.enable(&token, "internal", &["2025/internal/March"]).await;
    let uploaded = app
        .upload_file(&token, "2025/internal/March/gone.png", "g")
        .await;
    let id = uploaded["image"]["id"].as_str().unwrap().to_string();

    let reply = app
        .delete(&format!("/api/v1/images/{id}"), Some(&token))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!app
        .media
        .path()
        .join("2025/internal/March/gone.png")
        .exists());

    let names = app
        .listed_names("/api/v1/images?folder=2025/internal/March", None)
        .await;
    assert!(names.is_empty());

    let again = app
        .delete(&format!("/api/v1/images/{id}"), Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

// -- folders & playlist

#[tokio::test]
async fn folder_tree_filters_and_sorts() {
    let app = app().await;
    let token = app.login().await;
    for dir in [
        "2025/internal/March",
        "2025/internal/February",
        "2025/external/March",
        "2024/internal/March",
    ] {
        std::fs::create_dir_all(app.media.path().join(dir)).unwrap();
    }

    let reply = app
        .get("/api/v1/folders?year=2025&route=internal", Some(&token))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let tree = reply.json();
    assert_eq!(tree["folders"][0]["path"], "2025");
    let internal = &tree["folders"][0]["subfolders"];
    assert_eq!(internal.as_array().unwrap().len(), 1);
    let months: Vec<_> = internal[0]["subfolders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(months, ["February", "March"]);

    let missing = app.get("/api/v1/folders?year=2025", Some(&token)).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn playlist_follows_enabled_folder_order() {
    let app = app().await;
    let token = app.login().await;
    app.upload_file(&token, "2025/internal/March/b.png", "b")
        .await;
    app.upload_file(&token, "2025/internal/March/a.mp4", "a")
        .await;
    app.upload_file(&token, "2025/internal/January/z.jpg", "z")
        .await;
    app.post_json(
        "/api/v1/config",
        Some(&token),
        json!({
            "route": "internal",
            "duration": 5,
            "selected_folders": ["2025/internal/March", "2025/internal/January"],
        }),
    )
    .await;

    let playlist = app
        .get("/api/v1/routes/internal/playlist", None)
        .await
        .json();
    assert_eq!(playlist["duration"], 5);
    let slides: Vec<_> = playlist["slides"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["name"].as_str().unwrap(), s["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(
        slides,
        [("a.mp4", "video"), ("b.png", "image"), ("z.jpg", "image")]
    );
    // not a real video, so no length could be probed
    assert!(playlist["slides"][0].get("length_ms").is_none());

    let empty = app
        .get("/api/v1/routes/external/playlist", None)
        .await
        .json();
    assert_eq!(empty["slides"], json!([]));
}
