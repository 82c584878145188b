use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokenkeeper::api;
use tokenkeeper::application_impl::*;
use tokenkeeper::application_port::*;
use tokenkeeper::infra_memory::*;
use tokenkeeper::server::Server;
use warp::Filter;
use warp::http::StatusCode;

struct App {
    clock: Arc<ManualClock>,
    server: Arc<Server>,
}

async fn app() -> App {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let signer: Arc<dyn TokenSigner> = Arc::new(
        JwtHs256Signer::new(
            JwtConfig {
                issuer: "tokenkeeper".to_string(),
                audience: "tokenkeeper-client".to_string(),
                signing_key: b"http-test-secret-0123456789abcdef".to_vec(),
            },
            clock.clone(),
        )
        .unwrap(),
    );

    let hasher = Arc::new(Argon2PasswordHasher);
    let users = Arc::new(MemoryUserRepo::new());
    users.insert_user("a@x.com", &hasher.hash_password("secret1").await.unwrap());

    let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
        users,
        hasher,
        signer.clone(),
        Arc::new(MemorySessionStore::new(clock.clone())),
        TokenTtls {
            access: Duration::from_secs(60),
            refresh: Duration::from_secs(600),
        },
    ));

    App {
        clock,
        server: Arc::new(Server::new(auth_service, signer)),
    }
}

impl App {
    fn filter(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone + 'static
    {
        api::v1::routes(self.server.clone()).recover(api::v1::recover_error)
    }

    async fn login(&self) -> Value {
        let res = warp::test::request()
            .method("POST")
            .path("/login")
            .json(&json!({"email": "a@x.com", "password": "secret1"}))
            .reply(&self.filter())
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        serde_json::from_slice(res.body()).unwrap()
    }
}

fn bearer(token: &Value) -> String {
    format!("Bearer {}", token.as_str().unwrap())
}

fn message(body: &[u8]) -> String {
    let body: Value = serde_json::from_slice(body).unwrap();
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn secure_route_needs_a_bearer_token() {
    let app = app().await;

    let res = warp::test::request()
        .path("/secure/me")
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(res.body()), "Unauthorized");

    let res = warp::test::request()
        .path("/secure/me")
        .header("authorization", "Bearer not-a-token")
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_me() {
    let app = app().await;
    let tokens = app.login().await;
    assert_eq!(tokens["email"], "a@x.com");

    let res = warp::test::request()
        .path("/secure/me")
        .header("authorization", bearer(&tokens["accessToken"]))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(me["email"], "a@x.com");

    // A refresh token is not an access credential.
    let res = warp::test::request()
        .path("/secure/me")
        .header("authorization", bearer(&tokens["refreshToken"]))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejections() {
    let app = app().await;

    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({"email": "a@x.com", "password": "nope"}))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({"email": "", "password": "secret1"}))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(res.body()), "Bad Request");
}

#[tokio::test]
async fn refresh_rotates_once() {
    let app = app().await;
    let tokens = app.login().await;

    let refresh = |access: &Value, refresh: &Value| {
        warp::test::request()
            .method("POST")
            .path("/refresh")
            .header("authorization", bearer(access))
            .json(&json!({"refreshToken": refresh}))
    };

    // Still-valid access token: too early to refresh.
    let res = refresh(&tokens["accessToken"], &tokens["refreshToken"])
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    app.clock.advance(chrono::Duration::seconds(61));

    let res = refresh(&tokens["accessToken"], &tokens["refreshToken"])
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let rotated: Value = serde_json::from_slice(res.body()).unwrap();
    assert_ne!(rotated["refreshToken"], tokens["refreshToken"]);

    let replay = refresh(&tokens["accessToken"], &tokens["refreshToken"])
        .reply(&app.filter())
        .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .path("/secure/me")
        .header("authorization", bearer(&rotated["accessToken"]))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_and_revoke() {
    let app = app().await;
    let first = app.login().await;
    let second = app.login().await;

    let logout = || {
        warp::test::request()
            .method("POST")
            .path("/logout")
            .header("authorization", bearer(&first["accessToken"]))
            .json(&json!({"refreshToken": first["refreshToken"]}))
    };
    assert_eq!(
        logout().reply(&app.filter()).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        logout().reply(&app.filter()).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let res = warp::test::request()
        .method("POST")
        .path("/revoke")
        .header("authorization", bearer(&second["accessToken"]))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The revoked refresh session can no longer rotate.
    app.clock.advance(chrono::Duration::seconds(61));
    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .header("authorization", bearer(&second["accessToken"]))
        .json(&json!({"refreshToken": second["refreshToken"]}))
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = app().await;

    let res = warp::test::request()
        .path("/health")
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = warp::test::request()
        .path("/nowhere")
        .reply(&app.filter())
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
