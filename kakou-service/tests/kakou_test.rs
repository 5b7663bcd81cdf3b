mod common;

use axum::http::StatusCode;
use common::{basic_auth, crossing, TestApp};
use kakou_service::services::LookupTables;
use std::sync::atomic::Ordering;

fn query(filter: &str) -> String {
    let mut encoded = String::new();
    for byte in filter.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    format!("/kakou?q={}", encoded)
}

#[tokio::test]
async fn list_crossings_filters_by_inclusive_id_range() {
    let app = TestApp::new();
    app.kakou.add_crossings(90, 210);

    let res = app
        .get(&query(r#"{"startid": 100, "endid": 200, "per_page": 50}"#), None)
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 101);
    let items = res.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 50);
    assert_eq!(items[0]["id"], 100);
    assert_eq!(items[49]["id"], 149);
}

#[tokio::test]
async fn list_crossings_pages_through_the_range() {
    let app = TestApp::new();
    app.kakou.add_crossings(1, 45);

    let res = app.get(&query(r#"{"page": 3, "per_page": 20}"#), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 45);
    let ids: Vec<i64> = res.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![41, 42, 43, 44, 45]);
}

#[tokio::test]
async fn empty_page_keeps_real_total() {
    let app = TestApp::new();
    app.kakou.add_crossings(1, 5);

    let res = app.get(&query(r#"{"page": 9}"#), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 5);
    assert!(res.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_filter_object_lists_everything() {
    let app = TestApp::new();
    app.kakou.add_crossings(1, 3);

    let res = app.get(&query("{}"), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 3);
}

#[tokio::test]
async fn malformed_filter_is_bad_request() {
    let app = TestApp::new();

    for uri in [
        "/kakou".to_string(),
        query("not json"),
        query("[1, 2]"),
        query(r#"{"startid": "abc"}"#),
        query(r#"{"page": 0}"#),
        query(r#"{"per_page": 1.5}"#),
    ] {
        let res = app.get(&uri, None).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn oversized_page_is_bad_request() {
    let app = TestApp::new();
    app.kakou.add_crossings(1, 3);

    let res = app.get(&query(r#"{"per_page": 1000000000}"#), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "per_page must not exceed 1000");

    let res = app.get(&query(r#"{"per_page": 1000}"#), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 3);
}

#[tokio::test]
async fn crossing_is_enriched_from_lookup_tables() {
    let app = TestApp::new();
    app.kakou.add_crossing(crossing(7, Some("蓝"), Some(2)));

    let res = app.get("/kakou/7", None).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = &res.body;
    assert_eq!(body["id"], 7);
    assert_eq!(body["hphm"], "粤L00007");
    assert_eq!(body["jgsj"], "2017-03-09 07:05:01");
    assert_eq!(body["hpys"], "蓝牌");
    assert_eq!(body["hpys_id"], 3);
    assert_eq!(body["hpys_code"], "BU");
    assert_eq!(body["fxbh"], "出城");
    assert_eq!(body["fxbh_code"], "CC");
    assert_eq!(body["kkdd"], "江北卡口");
    assert_eq!(body["kkbh"], "441302001");
    assert_eq!(body["kkdd_id"], "441302001");
    assert_eq!(body["clbj"], "F");
    assert_eq!(body["imgurl"], "http://img/7/full.jpg");
    assert_eq!(body["imgurl2"], "http://img/7/plate.jpg");
}

#[tokio::test]
async fn unknown_codes_fall_back_to_other() {
    let app = TestApp::new();
    app.kakou.add_crossing(crossing(8, Some("紫"), Some(42)));
    app.kakou.add_crossing(crossing(9, None, None));

    for id in [8, 9] {
        let res = app.get(&format!("/kakou/{}", id), None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["hpys"], "其他");
        assert_eq!(res.body["hpys_id"], 9);
        assert_eq!(res.body["hpys_code"], "QT");
        assert_eq!(res.body["fxbh"], "其他");
        assert_eq!(res.body["fxbh_code"], "QT");
    }
}

#[tokio::test]
async fn checkpoint_ids_are_mapped_by_configured_tables() {
    let tables = LookupTables::from_json(
        r#"{
            "plate_colors": {},
            "directions": {},
            "checkpoints": {"441302001": "JB01"}
        }"#,
    )
    .unwrap();
    let app = TestApp::with_tables(&[], tables);
    app.kakou.add_crossing(crossing(3, Some("蓝"), Some(1)));

    let res = app.get("/kakou/3", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["kkdd_id"], "JB01");
    assert_eq!(res.body["hpys_code"], "QT");
}

#[tokio::test]
async fn missing_crossing_is_not_found() {
    let app = TestApp::new();

    assert_eq!(app.get("/kakou/12345", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/kakou/abc", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn max_id_reports_highest_record() {
    let app = TestApp::new();

    let res = app.get("/kakou/maxid", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["maxid"].is_null());

    app.kakou.add_crossings(10, 20);
    let res = app.get("/kakou/maxid", None).await;
    assert_eq!(res.body["maxid"], 20);
}

#[tokio::test]
async fn checkpoints_are_listed_with_total() {
    let app = TestApp::new();
    app.kakou.add_checkpoint(1, "441302001", "江北卡口");
    app.kakou.add_checkpoint(2, "441302002", "惠城卡口");

    let res = app.get("/kkdd", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_count"], 2);
    assert_eq!(res.body["items"][1]["kkmc"], "惠城卡口");
    assert_eq!(res.body["items"][0]["wd"], "22.930533");
}

#[tokio::test]
async fn kakou_store_failure_is_internal_error() {
    let app = TestApp::new();
    app.kakou.failing.store(true, Ordering::SeqCst);

    let res = app.get("/kakou/maxid", None).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn kakou_routes_can_require_read_scope() {
    let app = TestApp::with_env(&[("KAKOU_AUTH_REQUIRED", "true")]);
    app.accounts.add_user("reader", "pw", "read", 0);
    app.accounts.add_user("writer", "pw", "write", 0);
    app.kakou.add_crossings(1, 2);

    let res = app.get("/kakou/maxid", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/kakou/maxid", Some(&basic_auth("writer", "pw"))).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    let res = app.get("/kakou/maxid", Some(&basic_auth("reader", "pw"))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["maxid"], 2);
}
