mod common;

use std::fs;
use std::path::Path;

use common::fixtures::{
    distinct_chars, page_with_font_link, page_without_font_link, Site, FONT_HREF,
};
use webfont_trim::{
    discover_routes, process_routes, PageOutcome, Route, TrimError, TrimOptions,
};

#[test]
fn processed_page_requests_only_its_glyphs() {
    let site = Site::new();
    let path = site.write(
        "index.html",
        &page_with_font_link("<h1>Hello World</h1>\n<script>console.log('zzz')</script>"),
    );

    let report = process_routes(&[Route::new(&path)], &TrimOptions::default());
    assert_eq!(
        report.outcome_for(&path),
        Some(&PageOutcome::Processed {
            font_link_rewritten: true,
            unique_chars: 7,
        })
    );

    let out = site.read(&path);
    assert!(
        out.contains(&format!(
            "<link href=\"{FONT_HREF}&amp;text=HeloWrd\" rel=\"stylesheet\">"
        )),
        "rewritten page: {}",
        out
    );
    assert!(out.contains("<script>console.log('zzz')</script>"));
    assert!(out.contains("<link rel=\"preconnect\" href=\"https://fonts.gstatic.com\" crossorigin>"));
}

#[test]
fn only_the_font_link_tag_changes() {
    let site = Site::new();
    let original = page_with_font_link("<p>日本語のテキスト</p>");
    let path = site.write("ja/index.html", &original);

    process_routes(&[Route::new(&path)], &TrimOptions::default());
    let out = site.read(&path);

    let marker = format!("<link href=\"{FONT_HREF}\" rel=\"stylesheet\">");
    let (before, after) = original.split_once(&marker).expect("fixture has font link");
    assert!(out.starts_with(before));
    assert!(out.ends_with(after));
    assert!(out.contains(
        "&amp;text=%E6%97%A5%E6%9C%AC%E8%AA%9E%E3%81%AE%E3%83%86%E3%82%AD%E3%82%B9%E3%83%88\""
    ));
}

#[test]
fn existing_filter_is_replaced_on_rebuild() {
    let site = Site::new();
    let path = site.write("index.html", &page_with_font_link("<p>abc</p>"));
    let opts = TrimOptions::default();

    process_routes(&[Route::new(&path)], &opts);
    let first = site.read(&path);
    process_routes(&[Route::new(&path)], &opts);
    let second = site.read(&path);

    assert_eq!(first, second);
    assert_eq!(second.matches("text=").count(), 1);
}

#[test]
fn page_over_character_limit_is_left_byte_for_byte() {
    let site = Site::new();
    let original = page_with_font_link(&format!("<p>{}</p>", distinct_chars(1001)));
    let path = site.write("big.html", &original);

    let report = process_routes(&[Route::new(&path)], &TrimOptions::default());
    assert_eq!(
        report.outcome_for(&path),
        Some(&PageOutcome::SkippedTooLong { unique_chars: 1001 })
    );
    assert_eq!(fs::read(&path).expect("read"), original.as_bytes());
}

#[test]
fn missing_font_link_still_saves_and_later_pages_continue() {
    let site = Site::new();
    let plain_src = page_without_font_link("<p>plain</p>");
    let plain = site.write("a/plain.html", &plain_src);
    let fonted = site.write("b/fonted.html", &page_with_font_link("<p>xyz</p>"));

    let report = process_routes(
        &[Route::new(&plain), Route::new(&fonted)],
        &TrimOptions::default(),
    );
    assert_eq!(
        report.outcome_for(&plain),
        Some(&PageOutcome::Processed {
            font_link_rewritten: false,
            unique_chars: 5,
        })
    );
    assert_eq!(site.read(&plain), plain_src);
    assert_eq!(report.font_links_rewritten(), 1);
    assert!(site.read(&fonted).contains("&amp;text=xyz\""));
}

#[test]
fn failures_are_isolated_per_route() {
    let site = Site::new();
    let missing = site.root().join("gone.html");
    let broken = site.write("broken.html", "<html><body><p>text<!-- unterminated");
    let headless = site.write("headless.html", "<html><head><title>t</title></head></html>");
    let good = site.write("good.html", &page_with_font_link("<p>ok</p>"));

    let report = process_routes(
        &[
            Route::new(&missing),
            Route::new(&broken),
            Route::new(&headless),
            Route::new(&good),
        ],
        &TrimOptions::default(),
    );

    let code_of = |path: &Path| match report.outcome_for(path) {
        Some(PageOutcome::Failed(err)) => err.code,
        other => panic!("expected failure, got {:?}", other),
    };
    assert_eq!(code_of(missing.as_path()), TrimError::IO_READ_ERROR);
    assert_eq!(code_of(broken.as_path()), TrimError::HTML_TOKENIZE_ERROR);
    assert_eq!(code_of(headless.as_path()), TrimError::NO_BODY_ELEMENT);
    assert_eq!(report.failed(), 3);
    assert_eq!(report.processed(), 1);

    match report.outcome_for(&headless) {
        Some(PageOutcome::Failed(err)) => {
            assert_eq!(err.path.as_deref(), Some(headless.display().to_string().as_str()));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(site.read(&good).contains("&amp;text=ok\""));
}

#[test]
fn non_html_routes_are_skipped() {
    let site = Site::new();
    let css = site.write("style.css", "body{}");
    let report = process_routes(
        &[Route::without_output(), Route::new(&css)],
        &TrimOptions::default(),
    );
    assert_eq!(report.skipped_not_html(), 2);
    assert_eq!(site.read(&css), "body{}");
}

#[test]
fn discovered_build_output_is_processed_in_one_pass() {
    let site = Site::new();
    site.write("index.html", &page_with_font_link("<p>top</p>"));
    site.write("blog/post/index.html", &page_with_font_link("<p>post</p>"));
    site.write("_astro/page.js", "console.log(1)");
    site.write("sitemap.xml", "<urlset/>");

    let routes = discover_routes(site.root()).expect("discover");
    let report = process_routes(&routes, &TrimOptions::default());
    assert_eq!(report.routes.len(), 4);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.font_links_rewritten(), 2);
    assert_eq!(report.skipped_not_html(), 2);
    assert_eq!(report.failed(), 0);
}
