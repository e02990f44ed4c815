mod common;

use actix_web::{http::StatusCode, test, web, App};
use std::sync::Arc;

use common::*;
use inspection_report_server::report::handlers;
use inspection_report_server::AppState;

fn app_state(ws: &Workspace, store: Arc<MockReportStore>) -> web::Data<AppState> {
    web::Data::new(AppState::with_store(store, ws.template_store(), ws.settings()))
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state)
                .service(web::scope("/api").configure(handlers::config)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_generate_returns_file_path_and_status() {
    let ws = Workspace::new();
    let app = init_app!(app_state(&ws, Arc::new(seeded_store())));

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/generate/{}", DAILY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], DAILY_REPORT_ID);
    assert_eq!(body["data"]["status"], "completed");
    assert!(body["data"]["filePath"]
        .as_str()
        .unwrap()
        .ends_with(".pdf"));
    // Tests run without the report font.
    assert!(body["data"]["warnings"].is_array());
}

#[actix_web::test]
async fn test_generate_then_download() {
    let ws = Workspace::new();
    let app = init_app!(app_state(&ws, Arc::new(seeded_store())));

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/generate/{}", DAILY_REPORT_ID))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/reports/download/{}", DAILY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "application/pdf");
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("daily_report_10_"));

    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn test_download_before_generation_is_bad_request() {
    let ws = Workspace::new();
    let app = init_app!(app_state(&ws, Arc::new(seeded_store())));

    let req = test::TestRequest::get()
        .uri(&format!("/api/reports/download/{}", MONTHLY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BadRequest");
}

#[actix_web::test]
async fn test_download_missing_file_and_report() {
    let ws = Workspace::new();
    let mut gone = report(
        DAILY_REPORT_ID,
        "daily",
        chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        "2025年03月14日",
    );
    gone.file_path = Some(
        ws.reports
            .path()
            .join("customer_1/deleted.pdf")
            .display()
            .to_string(),
    );
    let app = init_app!(app_state(&ws, Arc::new(seeded_store().with_report(gone))));

    let req = test::TestRequest::get()
        .uri(&format!("/api/reports/download/{}", DAILY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(!body["message"].as_str().unwrap().contains("deleted.pdf"));

    let req = test::TestRequest::get()
        .uri("/api/reports/download/999")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_generate_error_statuses() {
    let ws = Workspace::new();
    ws.write_template(
        "custom/weekly.json",
        r#"{ "name": "週次", "type": "weekly", "sections": [] }"#,
    );
    let mut weekly = report(
        DAILY_REPORT_ID,
        "daily",
        chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        "2025年03月14日",
    );
    weekly.template_id = Some(5);
    let store = Arc::new(
        seeded_store()
            .with_report(weekly)
            .with_template(template_record(5, "weekly", "custom/weekly.json")),
    );
    let app = init_app!(app_state(&ws, store.clone()));

    let req = test::TestRequest::post()
        .uri("/api/reports/generate/999")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotFound");

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/generate/{}", DAILY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "InvalidTemplate");
    assert!(body["timestamp"].is_string());
    assert_eq!(store.sink_writes(), 0);
}

#[actix_web::test]
async fn test_get_report_metadata() {
    let ws = Workspace::new();
    let app = init_app!(app_state(&ws, Arc::new(seeded_store())));

    let req = test::TestRequest::get()
        .uri(&format!("/api/reports/{}", MONTHLY_REPORT_ID))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["reportType"], "monthly");
    assert_eq!(body["reportPeriod"], "2025年03月");
    assert_eq!(body["status"], "draft");
    assert!(body["filePath"].is_null());

    let req = test::TestRequest::get().uri("/api/reports/12345").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}
