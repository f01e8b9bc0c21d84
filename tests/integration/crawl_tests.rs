//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole site
//! crawls and batches against them end-to-end.

use mailsweep::config::{load_seeds, Config, CrawlerConfig, OutputConfig};
use mailsweep::crawler::{run_batch, BatchScheduler};
use mailsweep::output::ContactRelation;
use mailsweep::state::{FailureKind, SiteState};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts and fast retries
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 3,
            max_pages: 50,
            max_concurrent_sites: 4,
            site_timeout: 20,
            request_timeout: 10,
            connect_timeout: 2,
            retry_attempts: 3,
            retry_backoff: 10,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            csv_path: "./unused.csv".to_string(),
            emit_empty_rows: false,
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mailto_on_homepage_becomes_row() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="mailto:INFO@A.TEST">Mail us</a>"#).await;

    let seed = server.uri();
    let report = run_batch(&create_test_config(), vec![seed.clone()])
        .await
        .expect("batch should start");

    let site = &report.sites[0];
    assert_eq!(site.state, SiteState::Completed);
    assert_eq!(site.pages_visited, 1);

    let relation = ContactRelation::from_results(&report.sites, false);
    let rows: Vec<(&str, &str)> = relation.iter().collect();
    assert_eq!(rows, vec![(seed.as_str(), "info@a.test")]);
}

#[tokio::test]
async fn test_follows_internal_links_breadth_first() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="/about">About</a>
               <a href="{}/team/">Team</a>
               <a href="https://elsewhere.invalid/contact">Partner</a>"#,
            base
        ),
    )
    .await;
    mount_page(&server, "/about", r#"<a href="/">Home</a>"#).await;
    mount_page(
        &server,
        "/team",
        r#"<a href="mailto:press@b.test">Press</a><a href="/about#people">People</a>"#,
    )
    .await;

    let report = run_batch(&create_test_config(), vec![base]).await.unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert_eq!(site.pages_visited, 3);
    assert_eq!(site.emails.iter().collect::<Vec<_>>(), vec!["press@b.test"]);
    assert_eq!(site.failures.total(), 0);
}

#[tokio::test]
async fn test_page_budget_caps_visits() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html(r#"<a href="mailto:info@b.test">x</a>"#))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_pages = 5;

    let report = run_batch(&config, vec![server.uri()]).await.unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Exhausted);
    assert_eq!(site.pages_visited, 5);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_depth_limit_is_respected() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/level1">1</a>"#).await;
    mount_page(
        &server,
        "/level1",
        r#"<a href="/level2">2</a><a href="mailto:team@b.test">t</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.max_depth = 1;

    let report = run_batch(&config, vec![server.uri()]).await.unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert_eq!(site.pages_visited, 2);
    assert!(site.emails.contains("team@b.test"));
}

#[tokio::test]
async fn test_site_timeout_keeps_partial_results() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:info@b.test">Mail</a><a href="/slow">Slow</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html(r#"<a href="mailto:late@b.test">Late</a>"#).set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.site_timeout = 1;

    let report = run_batch(&config, vec![server.uri()]).await.unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::TimedOut);
    assert_eq!(site.pages_visited, 1);
    assert_eq!(site.emails.iter().collect::<Vec<_>>(), vec!["info@b.test"]);
    assert!(site.elapsed < Duration::from_secs(4));
}

#[tokio::test]
async fn test_site_timeout_leaves_siblings_untouched() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;

    mount_page(
        &slow,
        "/",
        r#"<a href="mailto:info@s.test">Mail</a><a href="/slow">Slow</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("").set_delay(Duration::from_secs(5)))
        .mount(&slow)
        .await;

    mount_page(&fast, "/", r#"<a href="/about">About</a>"#).await;
    mount_page(&fast, "/about", r#"<a href="mailto:info@f.test">Mail</a>"#).await;

    let mut config = create_test_config();
    config.crawler.site_timeout = 1;

    let report = run_batch(&config, vec![slow.uri(), fast.uri()])
        .await
        .unwrap();

    let slow_site = &report.sites[0];
    assert_eq!(slow_site.state, SiteState::TimedOut);
    assert_eq!(slow_site.emails.iter().collect::<Vec<_>>(), vec!["info@s.test"]);

    let fast_site = &report.sites[1];
    assert_eq!(fast_site.state, SiteState::Completed);
    assert_eq!(fast_site.pages_visited, 2);
    assert_eq!(fast_site.emails.iter().collect::<Vec<_>>(), vec!["info@f.test"]);
}

#[tokio::test]
async fn test_concurrency_limit_runs_sites_one_at_a_time() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                html(r#"<a href="mailto:info@b.test">Mail</a>"#)
                    .set_delay(Duration::from_millis(1000)),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    let mut config = create_test_config();
    config.crawler.max_concurrent_sites = 1;

    let report = run_batch(&config, vec![first.uri(), second.uri()])
        .await
        .unwrap();

    assert_eq!(report.count_in(SiteState::Completed), 2);
    // Each site holds the only slot for at least its one delayed page
    assert!(report.elapsed >= Duration::from_millis(2000));
    for site in &report.sites {
        assert!(site.elapsed >= Duration::from_millis(1000));
        assert!(site.elapsed < Duration::from_millis(2000));
    }
}

#[tokio::test]
async fn test_malformed_seed_line_fails_only_that_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="mailto:info@b.test">Mail</a>"#).await;

    let dir = tempfile::tempdir().unwrap();
    let seed_file = dir.path().join("seeds.txt");
    std::fs::write(
        &seed_file,
        format!("# firms\n{}/\nnot a url\n", server.uri()),
    )
    .unwrap();

    let seeds = load_seeds(&seed_file).unwrap();
    assert_eq!(seeds, vec![server.uri(), "not a url".to_string()]);

    let report = run_batch(&create_test_config(), seeds).await.unwrap();
    assert_eq!(report.sites[0].state, SiteState::Completed);
    assert!(report.sites[0].emails.contains("info@b.test"));
    assert_eq!(report.sites[1].state, SiteState::Failed);
}

#[tokio::test]
async fn test_unreachable_site_does_not_affect_others() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/", r#"<a href="mailto:info@a.test">a</a>"#).await;
    mount_page(&second, "/", r#"<a href="mailto:info@c.test">c</a>"#).await;

    let seeds = vec![
        first.uri(),
        "http://127.0.0.1:1".to_string(),
        second.uri(),
    ];
    let report = run_batch(&create_test_config(), seeds.clone()).await.unwrap();

    assert_eq!(report.sites.len(), 3);
    assert_eq!(report.sites[0].state, SiteState::Completed);
    assert_eq!(report.sites[1].state, SiteState::Failed);
    assert_eq!(report.sites[2].state, SiteState::Completed);
    assert!(report.sites[1].emails.is_empty());
    assert!(report.sites[1].failures.total() > 0);

    let relation = ContactRelation::from_results(&report.sites, false);
    let rows: Vec<(&str, &str)> = relation.iter().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&(seeds[0].as_str(), "info@a.test")));
    assert!(rows.contains(&(seeds[2].as_str(), "info@c.test")));
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="mailto:hello@b.test">hi</a>"#).await;

    let report = run_batch(&create_test_config(), vec![server.uri()])
        .await
        .unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert!(site.emails.contains("hello@b.test"));
    assert_eq!(site.failures.total(), 0);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_batch(&create_test_config(), vec![server.uri()])
        .await
        .unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Failed);
    assert!(site.emails.is_empty());
    assert_eq!(site.failures.get(FailureKind::NetworkPermanent), 1);
}

#[tokio::test]
async fn test_broken_inner_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/gone">Gone</a><a href="/contact">Contact</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    mount_page(&server, "/contact", r#"<a href="mailto:contact@b.test">c</a>"#).await;

    let report = run_batch(&create_test_config(), vec![server.uri()])
        .await
        .unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert_eq!(site.pages_visited, 3);
    assert!(site.emails.contains("contact@b.test"));
    assert_eq!(site.failures.get(FailureKind::NetworkPermanent), 1);
}

#[tokio::test]
async fn test_oversized_page_is_discarded() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/big">Big</a>"#).await;

    let padding = "x".repeat(4096);
    mount_page(
        &server,
        "/big",
        &format!(r#"<a href="mailto:big@b.test">b</a>{}"#, padding),
    )
    .await;

    let mut config = create_test_config();
    config.crawler.max_body_bytes = 1024;

    let report = run_batch(&config, vec![server.uri()]).await.unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert!(site.emails.is_empty());
    assert_eq!(site.failures.get(FailureKind::PayloadTooLarge), 1);
}

#[tokio::test]
async fn test_non_html_is_scanned_but_not_followed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/notes.txt">Notes</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"see <a href="/hidden">here</a> or <a href="mailto:docs@b.test">mail</a>"#,
            "text/plain",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_batch(&create_test_config(), vec![server.uri()])
        .await
        .unwrap();
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::Completed);
    assert_eq!(site.pages_visited, 2);
    assert!(site.emails.contains("docs@b.test"));
}

#[tokio::test]
async fn test_shutdown_cancels_running_sites() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:info@b.test">Mail</a><a href="/slow">Slow</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("").set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let scheduler = BatchScheduler::new(&create_test_config()).unwrap();
    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();
    });

    let report = scheduler.run(vec![server.uri()]).await;
    let site = &report.sites[0];

    assert_eq!(site.state, SiteState::TimedOut);
    assert!(site.emails.contains("info@b.test"));
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_batch_writes_csv() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:press@b.test">p</a><a href="mailto:info@b.test">i</a>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("emails.csv");

    let seed = server.uri();
    let report = run_batch(&create_test_config(), vec![seed.clone(), "not a url".to_string()])
        .await
        .unwrap();
    assert_eq!(report.sites[1].state, SiteState::Failed);

    ContactRelation::from_results(&report.sites, true)
        .write_csv_file(&csv_path)
        .unwrap();

    let written = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        written,
        format!(
            "website,email\n{seed},info@b.test\n{seed},press@b.test\nnot a url,\n",
            seed = seed
        )
    );
}
