//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, both through the engine directly and
//! through the job runner with a SQLite job store.

use page_inspector::config::{CrawlerConfig, UserAgentConfig};
use page_inspector::crawler::{BrokenLinkEntry, Crawler};
use page_inspector::jobs::{JobHandle, JobOutcome, JobRunner, Submission};
use page_inspector::state::JobStatus;
use page_inspector::storage::{JobStore, SqliteStore};
use chrono::Utc;
use page_inspector::CrawlError;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A port nothing listens on; connections to it are refused immediately
const REFUSED_URL: &str = "http://127.0.0.1:1/nothing";

/// Creates a crawler with short timeouts for testing
fn test_crawler() -> Crawler {
    crawler_with(CrawlerConfig {
        fetch_timeout: 5,
        connect_timeout: 2,
        probe_timeout: 1,
        max_concurrent_probes: 4,
        ..CrawlerConfig::default()
    })
}

fn crawler_with(config: CrawlerConfig) -> Crawler {
    let user_agent = UserAgentConfig {
        crawler_name: "TestInspector".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    Crawler::new(&config, &user_agent).expect("Failed to build crawler")
}

/// Creates a job runner backed by a fresh database in a temp directory
fn test_runner() -> (JobRunner<SqliteStore>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::new(&dir.path().join("jobs.db")).expect("Failed to open store");
    (JobRunner::new(store, test_crawler(), 2), dir)
}

/// Mounts a page linking to `count` pages whose HEAD responses take `delay`
async fn mount_slow_links(server: &MockServer, count: usize, delay: Duration) {
    let anchors: String = (0..count)
        .map(|i| format!(r#"<a href="/slow/{}">slow {}</a>"#, i, i))
        .collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!("<title>Slow links</title>{}", anchors)))
        .mount(server)
        .await;

    for i in 0..count {
        Mock::given(method("HEAD"))
            .and(path(format!("/slow/{}", i)))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(server)
            .await;
    }
}

fn html_response(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html")
}

fn expect_created(submission: Submission) -> JobHandle {
    match submission {
        Submission::Created(handle) => handle,
        Submission::Existing(job) => panic!("expected a new job, got existing job {}", job.id),
    }
}

/// Mounts a page whose links cover every classification and probe outcome
async fn mount_link_page(server: &MockServer) {
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!(
            r##"<!DOCTYPE html>
            <html><head><title>  Link Page </title></head><body>
            <h1>Links</h1>
            <h2>Good</h2><h2>Bad</h2>
            <a href="/ok">ok</a>
            <a href="/missing">missing</a>
            <a href="{base}/ok2">absolute same-site</a>
            <a href="{refused}">refused</a>
            <a href="page.html">relative</a>
            <a href="/ok">repeat</a>
            <a href="#top">fragment</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="  ">blank</a>
            </body></html>"##,
            base = base_url,
            refused = REFUSED_URL
        )))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/ok2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_counts_and_broken_links() {
    let mock_server = MockServer::start().await;
    mount_link_page(&mock_server).await;

    let result = test_crawler()
        .crawl(&mock_server.uri())
        .await
        .expect("Crawl should succeed");

    assert_eq!(result.html_version, "HTML5");
    assert_eq!(result.title, "Link Page");
    assert_eq!(result.h1_count, 1);
    assert_eq!(result.h2_count, 2);
    assert_eq!(result.h3_count, 0);
    assert!(!result.has_login_form);

    // /ok, /missing, {base}/ok2, page.html
    assert_eq!(result.internal_links, 4);
    // the refused 127.0.0.1:1 link
    assert_eq!(result.external_links, 1);

    assert_eq!(result.broken_links, 3);
    assert_eq!(result.broken_links as usize, result.broken_link_details.len());
    assert_eq!(
        result.broken_link_details,
        vec![
            BrokenLinkEntry {
                url: format!("{}/missing", mock_server.uri()),
                status_code: 404,
            },
            BrokenLinkEntry {
                url: REFUSED_URL.to_string(),
                status_code: 0,
            },
            BrokenLinkEntry {
                url: "page.html".to_string(),
                status_code: 0,
            },
        ]
    );
}

#[tokio::test]
async fn test_document_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html_response(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN"
              "http://www.w3.org/TR/html4/loose.dtd">
            <html><head><title>Sign in</title></head><body>
            <h3>a</h3><h3>b</h3><h4>c</h4><h5>d</h5><h6>e</h6>
            <form action="/session" method="post">
              <input type="text" name="user">
              <input type="password" name="pass">
            </form>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let result = test_crawler()
        .crawl(&format!("{}/login", mock_server.uri()))
        .await
        .expect("Crawl should succeed");

    assert_eq!(result.html_version, "HTML 4.01 Transitional");
    assert_eq!(result.title, "Sign in");
    assert_eq!(result.heading_counts(), [0, 0, 2, 1, 1, 1]);
    assert!(result.has_login_form);
    assert_eq!(result.total_links(), 0);
    assert_eq!(result.broken_links, 0);
}

#[tokio::test]
async fn test_target_404_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = test_crawler().crawl(&mock_server.uri()).await;

    match result {
        Err(CrawlError::HttpStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HttpStatus error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_target_is_fatal() {
    let result = test_crawler().crawl(REFUSED_URL).await;
    assert!(matches!(result, Err(CrawlError::Network { .. })));
}

#[tokio::test]
async fn test_binary_target_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![
                    0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00,
                ])
                .insert_header("content-type", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let result = test_crawler()
        .crawl(&format!("{}/logo.png", mock_server.uri()))
        .await;
    assert!(matches!(result, Err(CrawlError::Parse { .. })));
}

#[tokio::test]
async fn test_redirected_target_is_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_response("<!DOCTYPE html><title>Moved</title>"))
        .mount(&mock_server)
        .await;

    let result = test_crawler()
        .crawl(&format!("{}/old", mock_server.uri()))
        .await
        .expect("Crawl should follow the redirect");
    assert_eq!(result.title, "Moved");
}

#[tokio::test]
async fn test_probe_timeout_counts_as_broken() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(r#"<a href="/slow">slow</a><a href="/fast">fast</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let result = test_crawler()
        .crawl(&mock_server.uri())
        .await
        .expect("A slow link must not fail the crawl");

    assert_eq!(result.internal_links, 2);
    assert_eq!(result.broken_links, 1);
    assert_eq!(
        result.broken_link_details[0],
        BrokenLinkEntry {
            url: format!("{}/slow", mock_server.uri()),
            status_code: 0,
        }
    );
}

#[tokio::test]
async fn test_redirected_binary_names_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/file.bin"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
        .mount(&mock_server)
        .await;

    let result = test_crawler()
        .crawl(&format!("{}/download", mock_server.uri()))
        .await;

    match result {
        Err(CrawlError::Parse { url, .. }) => assert!(url.ends_with("/file.bin")),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probes_respect_concurrency_limit() {
    let mock_server = MockServer::start().await;
    mount_slow_links(&mock_server, 3, Duration::from_millis(400)).await;

    let crawler = crawler_with(CrawlerConfig {
        probe_timeout: 5,
        max_concurrent_probes: 1,
        ..CrawlerConfig::default()
    });

    let started = Instant::now();
    let result = crawler
        .crawl(&mock_server.uri())
        .await
        .expect("Crawl should succeed");

    assert_eq!(result.internal_links, 3);
    assert_eq!(result.broken_links, 0);
    // One probe in flight at a time: the three delays add up
    assert!(started.elapsed() >= Duration::from_millis(1200));
}

#[tokio::test]
async fn test_runner_records_done_job() {
    let mock_server = MockServer::start().await;
    mount_link_page(&mock_server).await;
    let (runner, _dir) = test_runner();

    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();

    assert_eq!(handle.wait().await, JobOutcome::Done { broken_links: 3 });

    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.address, mock_server.uri());
    assert_eq!(job.html_version.as_deref(), Some("HTML5"));
    assert_eq!(job.title.as_deref(), Some("Link Page"));
    assert_eq!(job.internal_links, 4);
    assert_eq!(job.external_links, 1);
    assert_eq!(job.broken_links, 3);
    assert_eq!(job.broken_link_details.len(), 3);
    assert_eq!(job.broken_link_details[0].status_code, 404);
    assert_eq!(job.error_message, None);
}

#[tokio::test]
async fn test_runner_returns_existing_job() {
    let mock_server = MockServer::start().await;
    mount_link_page(&mock_server).await;
    let (runner, _dir) = test_runner();

    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();
    handle.wait().await;

    match runner.submit(&mock_server.uri()).unwrap() {
        Submission::Existing(job) => {
            assert_eq!(job.id, job_id);
            assert_eq!(job.status, JobStatus::Done);
        }
        Submission::Created(_) => panic!("expected the existing job"),
    }
    assert_eq!(runner.with_store(|s| s.count_total_jobs()).unwrap(), 1);
}

#[tokio::test]
async fn test_runner_records_failed_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let (runner, _dir) = test_runner();
    let handle = expect_created(runner.submit(&format!("{}/gone", mock_server.uri())).unwrap());
    let job_id = handle.job_id();

    match handle.wait().await {
        JobOutcome::Failed { message } => assert!(message.contains("410")),
        other => panic!("expected a failed job, got {:?}", other),
    }

    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error_message.unwrap_or_default().contains("410"));
    assert_eq!(job.html_version, None);
    assert!(job.broken_link_details.is_empty());
}

#[tokio::test]
async fn test_cancelled_job_returns_to_queued() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response("<title>late</title>").set_delay(Duration::from_secs(4)))
        .mount(&mock_server)
        .await;

    let (runner, _dir) = test_runner();
    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.cancel();

    assert_eq!(handle.wait().await, JobOutcome::Cancelled);

    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.title, None);
}

#[tokio::test]
async fn test_cancel_while_probing_writes_nothing() {
    let mock_server = MockServer::start().await;
    mount_slow_links(&mock_server, 2, Duration::from_secs(4)).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::new(&dir.path().join("jobs.db")).expect("Failed to open store");
    let crawler = crawler_with(CrawlerConfig {
        probe_timeout: 10,
        ..CrawlerConfig::default()
    });
    let runner = JobRunner::new(store, crawler, 1);

    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();

    // The page itself returns at once; by now the probes are outstanding
    tokio::time::sleep(Duration::from_millis(500)).await;
    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Running);

    let started = Instant::now();
    handle.cancel();
    assert_eq!(handle.wait().await, JobOutcome::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(3));

    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.title, None);
    assert_eq!(job.internal_links, 0);
    assert!(job.broken_link_details.is_empty());
    assert_eq!(runner.with_store(|s| s.count_broken_links()).unwrap(), 0);
}

#[tokio::test]
async fn test_recovery_leaves_live_job_alone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html_response("<title>slow page</title>").set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let (runner, _dir) = test_runner();
    let runner = runner.with_lease(Duration::from_millis(300));

    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();

    // Well past the first lease; the heartbeat has kept renewing it
    tokio::time::sleep(Duration::from_millis(800)).await;
    let requeued = runner
        .with_store(|s| s.requeue_interrupted(Utc::now()))
        .unwrap();
    assert_eq!(requeued, 0);

    assert_eq!(handle.wait().await, JobOutcome::Done { broken_links: 0 });
    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.title.as_deref(), Some("slow page"));
}

#[tokio::test]
async fn test_rerun_replaces_results() {
    let mock_server = MockServer::start().await;
    mount_link_page(&mock_server).await;
    let (runner, _dir) = test_runner();

    let handle = expect_created(runner.submit(&mock_server.uri()).unwrap());
    let job_id = handle.job_id();
    handle.wait().await;

    let rerun = runner.rerun(job_id).expect("A finished job can be rerun");
    assert_eq!(rerun.wait().await, JobOutcome::Done { broken_links: 3 });

    let job = runner.with_store(|s| s.get_job(job_id)).unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.broken_link_details.len(), 3);
    assert_eq!(runner.with_store(|s| s.count_broken_links()).unwrap(), 3);
}
