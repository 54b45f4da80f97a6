use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use scoreboard_back::{
    config::{Account, AppConfig},
    routes,
    services::storage_supervisor::{self, StoreBackend},
    state::{AppState, SharedState},
};

const SESSION_HEADER: &str = "x-session-token";

async fn setup() -> (SharedState, Router) {
    let config = AppConfig::new(
        vec!["uid-admin".into()],
        Vec::new(),
        vec![
            Account {
                email: "admin@example.com".into(),
                password: "secret".into(),
                uid: "uid-admin".into(),
            },
            Account {
                email: "fan@example.com".into(),
                password: "pw".into(),
                uid: "uid-fan".into(),
            },
        ],
    );
    let state = AppState::new(config);
    let store = StoreBackend::Memory(Default::default())
        .connect()
        .await
        .unwrap();
    storage_supervisor::install(&state, store).await;
    let app = routes::router(state.clone());
    (state, app)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(SESSION_HEADER, token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn anonymous_token(app: &Router) -> String {
    let (status, body) = call(app, Method::POST, "/auth/anonymous", None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/sign-in",
        None,
        Some(json!({"email": "admin@example.com", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    body["token"].as_str().unwrap().to_string()
}

async fn upload(app: &Router, token: &str, schedule: Value) {
    let (status, _) = call(
        app,
        Method::POST,
        "/admin/schedule?confirm=true",
        Some(token),
        Some(schedule),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Poll the scoreboard until `check` accepts it; the view follows store notifications.
async fn wait_for_view(app: &Router, check: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..100 {
        let (_, view) = call(app, Method::GET, "/public/scoreboard", None, None).await;
        if check(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("scoreboard never reached the expected state");
}

#[tokio::test]
async fn second_anonymous_submission_is_a_conflict() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;
    upload(&app, &admin, json!([{"round": 1, "team1": "A & B", "team2": "C & D"}])).await;

    let first = anonymous_token(&app).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/results/0",
        Some(&first),
        Some(json!({"team1": 6, "team2": "3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winner_team"], "team1");

    let second = anonymous_token(&app).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/results/0",
        Some(&second),
        Some(json!({"team1": 1, "team2": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "A result is already recorded for this match. Please contact an admin for corrections."
    );
}

#[tokio::test]
async fn tied_and_non_numeric_scores_are_rejected() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;
    upload(&app, &admin, json!([{"round": 1, "team1": "A", "team2": "B"}])).await;
    let token = anonymous_token(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/results/0",
        Some(&token),
        Some(json!({"team1": 4, "team2": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Scores cannot be tied");

    let (status, _) = call(
        &app,
        Method::POST,
        "/results/0",
        Some(&token),
        Some(json!({"team1": "six", "team2": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_upload_replaces_schedule_and_results() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;
    upload(
        &app,
        &admin,
        json!([
            {"round": 1, "team1": "W & X", "team2": "Y & Z"},
            {"round": 2, "team1": "W & Y", "team2": "X & Z"}
        ]),
    )
    .await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/results/1",
        Some(&admin),
        Some(json!({"team1": 6, "team2": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/admin/schedule",
        Some(&admin),
        Some(json!([{"round": 1, "team1": "A & B", "team2": "C & D"}])),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert!(body["message"].as_str().unwrap().contains("clear all results"));

    upload(&app, &admin, json!([{"round": 1, "team1": "A & B", "team2": "C & D"}])).await;

    let view = wait_for_view(&app, |view| {
        view["matches"].as_array().is_some_and(|rows| rows.len() == 1)
    })
    .await;
    assert_eq!(view["matches"][0]["id"], "0");
    assert_eq!(view["matches"][0]["status"], "Not played");
    assert_eq!(view["options"][0]["label"], "Round 1: A & B vs C & D");
    assert_eq!(view["standings"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn admin_routes_reject_other_roles() {
    let (_state, app) = setup().await;
    let anonymous = anonymous_token(&app).await;

    let (status, _) = call(
        &app,
        Method::DELETE,
        "/admin/results?confirm=true",
        Some(&anonymous),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::DELETE, "/admin/results?confirm=true", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/sign-in",
        None,
        Some(json!({"email": "fan@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "authenticated");
    let fan = body["token"].as_str().unwrap().to_string();
    let (status, _) = call(
        &app,
        Method::POST,
        "/admin/schedule?confirm=true",
        Some(&fan),
        Some(json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rename_with_duplicate_risk_needs_explicit_allowance() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;
    upload(
        &app,
        &admin,
        json!([
            {"round": 1, "team1": "Alice & Bob", "team2": "Carol & Dan"},
            {"round": 1, "team1": "Alice & Eve", "team2": "Bob & Dan"}
        ]),
    )
    .await;

    let (status, preview) = call(
        &app,
        Method::POST,
        "/admin/players/rename/preview",
        Some(&admin),
        Some(json!({"original": "Alice", "new_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["matches"][0]["duplicate_risk"], true);
    assert_eq!(preview["matches"][1]["duplicate_risk"], false);

    let (status, body) = call(
        &app,
        Method::POST,
        "/admin/players/rename",
        Some(&admin),
        Some(json!({"original": "Alice", "new_name": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Update 1 match(es) to rename \"Alice\" -> \"Bob\"?"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/admin/players/rename",
        Some(&admin),
        Some(json!({"original": "Alice", "new_name": "Bob", "confirm": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["renamed"], 1);
    assert_eq!(body["skipped"], json!(["0"]));

    let view = wait_for_view(&app, |view| view["matches"][1]["team1"] == "Bob & Eve").await;
    assert_eq!(view["matches"][0]["team1"], "Alice & Bob");
}

#[tokio::test]
async fn deleting_a_result_reverts_the_match_to_not_played() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;
    upload(&app, &admin, json!([{"round": 1, "team1": "A & B", "team2": "C & D"}])).await;
    let anonymous = anonymous_token(&app).await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/results/0",
        Some(&anonymous),
        Some(json!({"team1": 6, "team2": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_for_view(&app, |view| view["matches"][0]["status"] == "Completed").await;

    let (status, _) = call(&app, Method::DELETE, "/admin/results/0", Some(&admin), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    let (status, _) = call(
        &app,
        Method::DELETE,
        "/admin/results/0?confirm=true",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let view = wait_for_view(&app, |view| view["matches"][0]["status"] == "Not played").await;
    assert_eq!(view["matches"][0]["set"], "-");
    let standings = view["standings"].as_array().unwrap();
    assert!(standings.iter().all(|row| row["MP"] == 0 && row["Raw"] == 0));
}

#[tokio::test]
async fn sign_out_hands_out_an_anonymous_session() {
    let (_state, app) = setup().await;
    let admin = admin_token(&app).await;

    let (status, body) = call(&app, Method::POST, "/auth/sign-out", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["anonymous"], true);
    assert_eq!(body["status"], "Signed in (anonymous viewer)");

    let (status, _) = call(&app, Method::GET, "/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
