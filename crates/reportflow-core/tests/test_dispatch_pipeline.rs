/// End-to-end dispatch tests: HTTP services on wiremock, SMTP on a scripted server
#[path = "common/mod.rs"]
mod common;

use common::mock_smtp::MockSmtpServer;
use common::test_data::batch_item;
use reportflow_core::DispatchPipeline;
use reportflow_core::models::{
    BatchSummary, DispatchConfig, MailConfig, ReportKind, ReportflowConfig, SendStatus,
    ServiceEndpoints, SmtpConfig, Token,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    http: MockServer,
    smtp: MockSmtpServer,
}

impl Harness {
    async fn start() -> Self {
        let http = MockServer::start().await;

        for id in ["TR-1", "TR-3"] {
            let token = json!({ "token": format!("tok-{}", id) });
            Mock::given(method("POST"))
                .and(path("/token"))
                .and(body_json(json!({ "transferId": id })))
                .respond_with(ResponseTemplate::new(200).set_body_json(token))
                .mount(&http)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({ "transferId": "TR-2" })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&http)
            .await;

        Mock::given(method("POST"))
            .and(path("/shorten"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "short-link": "https://s.io/abc" } })),
            )
            .mount(&http)
            .await;

        Self {
            http,
            smtp: MockSmtpServer::accepting().await,
        }
    }

    fn config(&self, error_notify_to: Vec<String>) -> ReportflowConfig {
        let mut services = ServiceEndpoints::new(
            format!("{}/token", self.http.uri()),
            format!("{}/shorten", self.http.uri()),
            "https://files.example.com/pdf/",
        );
        services.short_link_retry = common::fast_retry();

        ReportflowConfig {
            smtp: SmtpConfig::new("127.0.0.1", self.smtp.port()).with_retry(common::fast_retry()),
            mail: MailConfig {
                from_address: "no-reply@example.com".to_string(),
                from_name: "Payments".to_string(),
                bcc: vec!["audit@example.com".to_string()],
                default_to: vec!["ops@example.com".to_string()],
                error_notify_to,
            },
            services,
            dispatch: DispatchConfig::default(),
        }
    }
}

#[tokio::test]
async fn test_token_failure_on_second_item() {
    let harness = Harness::start().await;
    let pipeline = DispatchPipeline::from_config(&harness.config(vec![])).unwrap();

    let results = pipeline
        .run(
            ReportKind::Transfer,
            vec![
                batch_item("TR-1", "one@example.com"),
                batch_item("TR-2", "two@example.com"),
                batch_item("TR-3", "three@example.com"),
            ],
        )
        .await;

    assert_eq!(results.len(), 3);
    let ids: Vec<&str> = results.iter().map(|r| r.transfer_id.as_str()).collect();
    assert_eq!(ids, vec!["TR-1", "TR-2", "TR-3"]);

    assert_eq!(results[0].status, SendStatus::Success);
    assert_eq!(results[0].email, "one@example.com");
    assert_eq!(results[0].short_link, "https://s.io/abc");
    assert_eq!(results[0].full_link, "https://files.example.com/pdf/tok-TR-1");

    assert_eq!(results[1].status, SendStatus::Fail);
    assert!(results[1].error.as_deref().unwrap().contains("Token error"));

    assert_eq!(results[2].status, SendStatus::Success);

    let summary = BatchSummary::from_results(&results);
    assert_eq!((summary.total, summary.success, summary.fail), (3, 2, 1));

    let received = harness.smtp.received();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|m| m.rcpt_to.contains(&"audit@example.com".to_string())));
}

#[tokio::test]
async fn test_failure_notice_after_partial_batch() {
    let harness = Harness::start().await;
    let pipeline =
        DispatchPipeline::from_config(&harness.config(vec!["alerts@example.com".to_string()]))
            .unwrap();

    let results = pipeline
        .run(
            ReportKind::Income,
            vec![
                batch_item("TR-1", "one@example.com"),
                batch_item("TR-2", "two@example.com"),
            ],
        )
        .await;

    assert!(results[0].is_success());
    assert!(!results[1].is_success());

    let received = harness.smtp.received();
    assert_eq!(received.len(), 2);
    let notice = received
        .iter()
        .find(|m| m.rcpt_to == vec!["alerts@example.com".to_string()])
        .expect("failure notice delivered");
    assert!(notice.data.contains("<li>Account TR-2</li>"));
}

#[tokio::test]
async fn test_pre_issued_tokens_skip_token_service() {
    let harness = Harness::start().await;
    let pipeline = DispatchPipeline::from_config(&harness.config(vec![])).unwrap();

    let results = pipeline
        .run_with_tokens(
            ReportKind::Transfer,
            vec![Token {
                transfer_id: "TR-9".to_string(),
                token: "given".to_string(),
            }],
        )
        .await;

    assert!(results[0].is_success());
    assert_eq!(results[0].email, "ops@example.com");
    assert_eq!(results[0].full_link, "https://files.example.com/pdf/given");

    let token_calls = harness
        .http
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/token")
        .count();
    assert_eq!(token_calls, 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let harness = Harness::start().await;
    let pipeline = DispatchPipeline::from_config(&harness.config(vec![])).unwrap();

    let results = pipeline.run(ReportKind::Transfer, vec![]).await;

    assert!(results.is_empty());
    assert_eq!(harness.smtp.connections(), 0);
}
