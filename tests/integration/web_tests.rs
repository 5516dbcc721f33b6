//! Request surface tests, driven in-process through `tower::ServiceExt`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use roomstock::adapters::mirror::mirror_mailbox;
use roomstock::app::climate::{ClimateCell, ClimateReading};
use roomstock::app::ports::{Led, TagError};
use roomstock::app::session::{OperatorSession, TagAllowList};
use roomstock::web::{WebState, router};

use crate::mock_hw::{Rig, ScriptedReader};

const GOOD_TAG: &str = "85615652294";

fn state(rig: &Rig) -> WebState {
    let session = Arc::new(OperatorSession::new(TagAllowList::new([GOOD_TAG, "0987654321"])));
    WebState::new(rig.service.clone(), session)
}

async fn call(state: &WebState, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn index_lists_rooms_without_resetting() {
    let rig = Rig::new(10);
    let st = state(&rig);
    rig.service.enter(1).unwrap();

    let (status, body) = call(&st, get("/index")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_room"], 1);
    assert_eq!(body["rooms"].as_array().unwrap().len(), 3);
    assert_eq!(body["rooms"][0]["name"], "Room 1");
    assert_eq!(body["rooms"][1]["active"], true);
}

#[tokio::test]
async fn index_shows_latest_climate_sample() {
    let rig = Rig::new(10);
    let (_, body) = call(&state(&rig), get("/index")).await;
    assert_eq!(body["climate"], Value::Null);

    let cell = Arc::new(ClimateCell::new());
    let st = state(&rig).with_climate(cell.clone());
    let (_, body) = call(&st, get("/index")).await;
    assert_eq!(body["climate"], Value::Null, "no sample yet");

    cell.record(ClimateReading {
        temperature_c: 22.5,
        humidity_pct: 41.0,
    });
    let (status, body) = call(&st, get("/index")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["climate"]["temperature_c"], 22.5);
    assert_eq!(body["climate"]["humidity_pct"], 41.0);
}

#[tokio::test]
async fn landing_clears_active_room() {
    let rig = Rig::new(10);
    let st = state(&rig);
    rig.service.enter(2).unwrap();

    let (status, body) = call(&st, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_room"], Value::Null);
    assert!(!rig.indicators.led_on(Led::Room(2)));
}

#[tokio::test]
async fn enter_update_leave_flow() {
    let rig = Rig::new(10);
    let st = state(&rig);

    let (status, body) = call(&st, get("/enter/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["count"], 10);
    assert_eq!(body["max"], 99);
    assert!(rig.indicators.led_on(Led::Room(0)));

    let (status, body) = call(&st, form("/update", "room_id=0&action=remove")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["count"], 9);
    assert_eq!(body["room"]["active"], true);

    let (_, body) = call(&st, form("/update", "room_id=0&action=set&quantity=5")).await;
    assert_eq!(body["room"]["count"], 5);
    assert_eq!(body["room"]["low_stock"], true);

    let (status, body) = call(&st, get("/leave/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_room"], Value::Null);
    assert!(!rig.indicators.led_on(Led::Room(0)));
}

#[tokio::test]
async fn out_of_range_set_and_unknown_action_are_noops() {
    let rig = Rig::new(10);
    let st = state(&rig);

    let (status, body) = call(&st, form("/update", "room_id=1&action=set&quantity=150")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["count"], 10);

    let (status, body) = call(&st, form("/update", "room_id=1&action=juggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["count"], 10);
    assert_eq!(rig.counts(), [10, 10, 10]);
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let rig = Rig::new(10);
    let st = state(&rig);

    let (status, body) = call(&st, form("/update", "action=add")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("bad request"));

    let (status, body) = call(&st, get("/enter/7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown room 7");

    let (status, _) = call(&st, form("/update", "room_id=5&action=add")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_with_posted_tag() {
    let rig = Rig::new(10);
    let st = state(&rig);

    let (status, body) = call(&st, form("/login", &format!("tag_id={GOOD_TAG}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operator"], GOOD_TAG);

    let (status, body) = call(&st, form("/login", "tag_id=1111")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid credential");

    let (status, body) = call(&st, form("/logout", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operator"], Value::Null);
}

#[tokio::test]
async fn login_reads_tag_when_none_posted() {
    let rig = Rig::new(10);
    let st = state(&rig).with_reader(ScriptedReader::new([
        Err(TagError::ReadFailed("timeout".into())),
        Ok("0987654321".to_owned()),
    ]));

    let (status, body) = call(&st, form("/login", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().starts_with("error reading tag"));

    // Retry is allowed.
    let (status, body) = call(&st, form("/login", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operator"], "0987654321");
}

#[tokio::test]
async fn login_without_reader_or_tag_is_unavailable() {
    let rig = Rig::new(10);
    let st = state(&rig);
    let (status, _) = call(&st, form("/login", "")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn sync_requires_mirror() {
    let rig = Rig::new(10);
    let (status, _) = call(&state(&rig), get("/sync")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (tx, rx) = mirror_mailbox();
    let rig = Rig::with_mirror(10, Some(tx));
    let (status, body) = call(&state(&rig), get("/sync")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queued"], true);
    assert!(rx.take_within(std::time::Duration::from_millis(10)).is_some());
}
