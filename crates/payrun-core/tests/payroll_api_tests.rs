use payrun_core::{
    handler::PayrollApi,
    models::{LogLevel, METADATA_ERRORS, METADATA_PROCESSED},
    ActionHandler, Reporting, StepId,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const MONTH: &str = "January 2026";

async fn api(server: &MockServer) -> PayrollApi {
    PayrollApi::new(&format!("{}/", server.uri())).expect("Failed to build client")
}

#[tokio::test]
async fn test_step_success_maps_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/incentive/calculate"))
        .and(body_json(json!({ "month": MONTH })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Incentive calculation completed",
            "reportUrl": "/reports/incentive.pdf",
            "processed": 1245,
            "errors": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handlers = api(&server).await.handlers();
    assert_eq!(handlers.len(), 8);
    let handler = handlers.get("incentive-calculation").unwrap();
    let outcome = handler.execute(MONTH, None).await.unwrap();

    assert_eq!(outcome.message, "Incentive calculation completed");
    assert_eq!(outcome.artifact_ref.as_deref(), Some("/reports/incentive.pdf"));
    assert_eq!(outcome.metadata[METADATA_PROCESSED], "1245 employees");
    assert_eq!(outcome.metadata[METADATA_ERRORS], "0");
}

#[tokio::test]
async fn test_submit_payload_is_merged_with_month() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/leave-requests/review"))
        .and(body_json(json!({ "month": MONTH, "acknowledged": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let handler = api(&server).await.handlers().get("leave-requests").unwrap();
    let payload = json!({ "acknowledged": true });
    let outcome = handler.execute(MONTH, Some(&payload)).await.unwrap();

    assert_eq!(outcome.message, "Step completed successfully");
    assert_eq!(outcome.artifact_ref, None);
    assert!(outcome.metadata.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/bank-file-transfer"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let handler = api(&server).await.handlers().get("bank-transfer").unwrap();
    let failure = handler.execute(MONTH, None).await.unwrap_err();
    assert_eq!(failure.message, "API Error: Internal Server Error");
}

#[tokio::test]
async fn test_success_false_is_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payroll/lop/push-greythr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "GreytHR rejected the upload"
        })))
        .mount(&server)
        .await;

    let handler = api(&server).await.handlers().get("lop-push").unwrap();
    let failure = handler.execute(MONTH, None).await.unwrap_err();
    assert_eq!(failure.message, "GreytHR rejected the upload");
}

#[tokio::test]
async fn test_fetch_logs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payroll/process/lop-push/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [
                { "timestamp": "2026-01-31 10:00:00", "level": "info", "message": "Started" },
                { "timestamp": "2026-01-31 10:00:05", "level": "warn", "message": "Slow upload" }
            ]
        })))
        .mount(&server)
        .await;

    let logs = api(&server)
        .await
        .fetch_logs(&StepId::from("lop-push"))
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "Started");
    assert_eq!(logs[1].level, LogLevel::Warning);
}

#[tokio::test]
async fn test_fetch_report_sends_month() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payroll/incentive/report"))
        .and(query_param("month", MONTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Incentive Calculation Report is ready",
            "reportUrl": "/reports/incentive-january.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server).await;
    let link = api
        .fetch_report(&StepId::from("incentive-calculation"), MONTH)
        .await
        .unwrap();
    assert_eq!(link.message, "Incentive Calculation Report is ready");
    assert_eq!(link.url.as_deref(), Some("/reports/incentive-january.pdf"));

    let missing = api
        .fetch_report(&StepId::from("bank-transfer"), MONTH)
        .await
        .unwrap_err();
    assert!(missing.message.contains("bank-transfer"));
}
