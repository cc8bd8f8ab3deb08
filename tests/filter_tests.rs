use http::header::{CONTENT_TYPE, IF_MODIFIED_SINCE};
use http::{HeaderValue, StatusCode};
use renderware::{
    respond, BufferPool, Handler, HandlerResult, Request, ResponseWriter, RuleSet, TemplateFilter,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::chain::{filter, get, rule, run};
use common::SITE_ROOT;

const PHOTO_PAGE: &str =
    "<!DOCTYPE html><html><head><title>example title</title></head><body>body</body></html>\n";
const HEADER_PAGE: &str =
    "<!DOCTYPE html><html><head><title>{}</title></head><body><h1>Header title</h1>\n</body></html>\n";

fn header_page(title: &str) -> String {
    HEADER_PAGE.replace("{}", title)
}

#[test]
fn test_template_scenarios() {
    let scoped = filter(
        SITE_ROOT,
        vec![
            rule(SITE_ROOT, "/photos", &[".html"]),
            rule(SITE_ROOT, "/images", &[".html", ".htm"]),
        ],
    );
    let site_wide = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/", &[".html"])]);
    let defaults = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/", &[])]);

    let as_it_is = fs::read_to_string("tests/testdata/as_it_is.txt").unwrap();
    let cases: Vec<(&TemplateFilter, &str, StatusCode, String)> = vec![
        (&scoped, "/photos/test.html", StatusCode::OK, PHOTO_PAGE.to_string()),
        (&scoped, "/images/img.htm", StatusCode::OK, header_page("img")),
        (&site_wide, "/root.html", StatusCode::OK, header_page("root")),
        (&site_wide, "/malformed.html", StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        (&site_wide, "/syntax_error.html", StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        (&site_wide, "/as_it_is.txt", StatusCode::OK, as_it_is),
        (&defaults, "/root.html", StatusCode::OK, header_page("root")),
    ];

    for (filter, path, status, body) in cases {
        let rec = run(filter, &get(path));
        assert_eq!(rec.status(), status, "status for {path}");
        assert_eq!(rec.body_string(), body, "body for {path}");
    }
}

#[test]
fn test_content_length_matches_rendered_body() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/photos", &[".html"])]);
    let rec = run(&f, &get("/photos/test.html"));
    assert_eq!(
        rec.header("content-length"),
        Some(PHOTO_PAGE.len().to_string().as_str())
    );
    assert_eq!(rec.header("content-type"), Some("text/html; charset=utf-8"));
    assert!(rec.header("last-modified").is_some());
}

#[test]
fn test_unmatched_scope_is_served_raw() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/photos", &[".html"])]);
    let rec = run(&f, &get("/root.html"));
    assert_eq!(rec.status(), StatusCode::OK);
    assert_eq!(
        rec.body_string(),
        fs::read_to_string("tests/testdata/root.html").unwrap()
    );
}

#[test]
fn test_first_declared_rule_wins() {
    // The site-wide rule only renders .htm, so the photo page is served raw.
    let f = filter(
        SITE_ROOT,
        vec![
            rule(SITE_ROOT, "/", &[".htm"]),
            rule(SITE_ROOT, "/photos", &[".html"]),
        ],
    );
    let rec = run(&f, &get("/photos/test.html"));
    assert!(rec.body_string().starts_with("{% set title"));

    let f = filter(
        SITE_ROOT,
        vec![
            rule(SITE_ROOT, "/photos", &[".html"]),
            rule(SITE_ROOT, "/", &[".htm"]),
        ],
    );
    let rec = run(&f, &get("/photos/test.html"));
    assert_eq!(rec.body_string(), PHOTO_PAGE);
}

#[test]
fn test_directory_request_renders_index() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/docs", &[".html"])]);
    let rec = run(&f, &get("/docs/"));
    assert_eq!(rec.status(), StatusCode::OK);
    assert_eq!(rec.body_string(), "<p>docs index via GET</p>\n");
}

#[test]
fn test_missing_file_passes_through_not_found() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/", &[".html"])]);
    let rec = run(&f, &get("/missing.html"));
    assert_eq!(rec.status(), StatusCode::NOT_FOUND);
    assert!(rec.body().is_empty());
}

fn dynamic(content_type: &'static str, body: &'static str) -> Arc<dyn Handler> {
    Arc::new(move |w: &mut dyn ResponseWriter, _req: &Request| -> HandlerResult {
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        w.write_body(body.as_bytes())?;
        Ok(None)
    })
}

#[test]
fn test_extensionless_request_uses_content_type() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("blog")).unwrap();
    fs::write(dir.path().join("blog/post"), "post {{ 6 * 7 }}").unwrap();
    let site_root = dir.path().to_str().unwrap();

    let rules = RuleSet::new(vec![rule(site_root, "/blog", &[".html"])]);
    let html = TemplateFilter::new(dynamic("text/html; charset=utf-8", "raw"), site_root, rules);
    let rec = respond(&html, &get("/blog/post"));
    assert_eq!(rec.body_string(), "post 42");

    let rules = RuleSet::new(vec![rule(site_root, "/blog", &[".html"])]);
    let json = TemplateFilter::new(dynamic("application/json", "{\"raw\":true}"), site_root, rules);
    let rec = respond(&json, &get("/blog/post"));
    assert_eq!(rec.body_string(), "{\"raw\":true}");
    assert_eq!(rec.header("content-type"), Some("application/json"));
}

#[test]
fn test_rendering_is_idempotent() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/images", &[".htm"])]);
    let first = run(&f, &get("/images/img.htm"));
    let second = run(&f, &get("/images/img.htm"));
    assert_eq!(first.body(), second.body());
    assert_eq!(first.header("content-length"), second.header("content-length"));
}

#[test]
fn test_pool_buffers_returned_on_every_path() {
    let pool = Arc::new(BufferPool::new(4, 1 << 20));
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/", &[".html"])]).with_pool(Arc::clone(&pool));
    for path in ["/root.html", "/malformed.html", "/as_it_is.txt", "/missing.html"] {
        run(&f, &get(path));
        assert_eq!(pool.idle(), 1, "buffer not returned after {path}");
        let buf = pool.acquire();
        assert!(buf.is_empty());
    }
}

#[test]
fn test_next_invoked_once_and_errors_propagate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let next: Arc<dyn Handler> =
        Arc::new(move |w: &mut dyn ResponseWriter, _req: &Request| -> HandlerResult {
            seen.fetch_add(1, Ordering::SeqCst);
            w.write_body(b"partial")?;
            Err(renderware::FilterError::Io(std::io::Error::other("upstream failed")))
        });
    let rules = RuleSet::new(vec![rule(SITE_ROOT, "/", &[".html"])]);
    let f = TemplateFilter::new(next, SITE_ROOT, rules);
    let rec = respond(&f, &get("/root.html"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(rec.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(rec.body().is_empty());
}

#[test]
fn test_if_modified_since_and_head() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/photos", &[".html"])]);
    let first = run(&f, &get("/photos/test.html"));
    let last_modified = first.header("last-modified").unwrap().to_string();

    let conditional = http::Request::get("/photos/test.html")
        .header(IF_MODIFIED_SINCE, last_modified)
        .body(Vec::new())
        .unwrap();
    let rec = run(&f, &conditional);
    assert_eq!(rec.status(), StatusCode::NOT_MODIFIED);
    assert!(rec.body().is_empty());

    let head = http::Request::head("/photos/test.html")
        .body(Vec::new())
        .unwrap();
    let rec = run(&f, &head);
    assert_eq!(rec.status(), StatusCode::OK);
    assert_eq!(
        rec.header("content-length"),
        Some(PHOTO_PAGE.len().to_string().as_str())
    );
    assert!(rec.body().is_empty());
}

#[test]
fn test_percent_encoded_paths_are_rendered() {
    let f = filter(SITE_ROOT, vec![rule(SITE_ROOT, "/photos", &[".html"])]);
    for path in ["/%70hotos/test.html", "/photos/test.htm%6C", "/photos/%74est.html"] {
        let rec = run(&f, &get(path));
        assert_eq!(rec.status(), StatusCode::OK, "status for {path}");
        assert_eq!(rec.body_string(), PHOTO_PAGE, "body for {path}");
        assert_eq!(
            rec.header("content-length"),
            Some(PHOTO_PAGE.len().to_string().as_str())
        );
    }
}

#[test]
fn test_concurrent_requests_share_one_filter() {
    const MAX_IDLE: usize = 4;
    let pool = Arc::new(BufferPool::new(MAX_IDLE, 1 << 20));
    let f = filter(
        SITE_ROOT,
        vec![
            rule(SITE_ROOT, "/photos", &[".html"]),
            rule(SITE_ROOT, "/", &[".html"]),
        ],
    )
    .with_pool(Arc::clone(&pool));

    let as_it_is = fs::read_to_string("tests/testdata/as_it_is.txt").unwrap();
    let cases: Vec<(&str, StatusCode, String)> = vec![
        ("/photos/test.html", StatusCode::OK, PHOTO_PAGE.to_string()),
        ("/%70hotos/test.html", StatusCode::OK, PHOTO_PAGE.to_string()),
        ("/root.html", StatusCode::OK, header_page("root")),
        ("/as_it_is.txt", StatusCode::OK, as_it_is),
        ("/malformed.html", StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        ("/syntax_error.html", StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    ];

    std::thread::scope(|s| {
        for worker in 0..8 {
            let f = &f;
            let cases = &cases;
            s.spawn(move || {
                for round in 0..25 {
                    let (path, status, body) = &cases[(worker + round) % cases.len()];
                    let rec = run(f, &get(path));
                    assert_eq!(rec.status(), *status, "status for {path}");
                    assert_eq!(rec.body_string(), *body, "body for {path}");
                }
            });
        }
    });

    let idle = pool.idle();
    assert!((1..=MAX_IDLE).contains(&idle), "idle buffers: {idle}");
    assert!(pool.acquire().is_empty());
}
