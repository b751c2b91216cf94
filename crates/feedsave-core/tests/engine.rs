//! End-to-end engine tests
//!
//! HTML → DOM → scan/watch → controls → click → handler.

use feedsave_core::{
    ContainerScanner, LifecycleCoordinator, MediaConfig, MediaKind, MediaResolver, PatternStrategy,
    ResolvedUrl, ScanReport, UrlHandler, VideoStrategyKind,
};
use feedsave_dom::{Document, NodeId, SelectorList};
use feedsave_html::HtmlParser;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Default)]
struct Recorder {
    urls: RefCell<Vec<String>>,
}

impl UrlHandler for Recorder {
    fn handle(&self, url: Option<&ResolvedUrl>) {
        if let Some(url) = url {
            self.urls.borrow_mut().push(url.as_str().to_string());
        }
    }
}

fn recorder() -> (Rc<Recorder>, Rc<dyn UrlHandler>) {
    let recorder = Rc::new(Recorder::default());
    let handler: Rc<dyn UrlHandler> = recorder.clone();
    (recorder, handler)
}

fn page(html: &str) -> Document {
    HtmlParser::new().parse_with_url(html, "https://www.instagram.com/")
}

fn controls(doc: &Document) -> Vec<NodeId> {
    let marker = SelectorList::parse(".feedsave-bt").unwrap();
    doc.tree().query_selector_all(doc.tree().root(), &marker)
}

fn scanner(handler: Rc<dyn UrlHandler>) -> ContainerScanner {
    ContainerScanner::new(&MediaConfig::default(), handler).unwrap()
}

fn first_container(doc: &Document) -> Option<NodeId> {
    let containers = SelectorList::parse("article, section").unwrap();
    doc.tree().query_selector(doc.tree().root(), &containers)
}

// ============================================================================
// SCANNER
// ============================================================================

#[test]
fn test_image_end_to_end_click_forwards_once() {
    let mut doc = page(r#"<article><div><img src="https://cdn.example/a.jpg" alt="sunset"></div></article>"#);
    let (recorder, handler) = recorder();
    let scanner = scanner(handler);

    let container = first_container(&doc);
    let report = scanner.scan(&mut doc, container);
    assert_eq!(report.attached, 1);

    let found = controls(&doc);
    assert_eq!(found.len(), 1);

    assert_eq!(doc.click(found[0]), 1);
    assert_eq!(*recorder.urls.borrow(), vec!["https://cdn.example/a.jpg".to_string()]);
}

#[test]
fn test_scan_twice_is_idempotent() {
    let mut doc = page(
        r#"
        <article>
            <div><img src="https://cdn.example/1.jpg" alt="one"></div>
            <div><img src="https://cdn.example/2.jpg" alt="two"></div>
        </article>
        "#,
    );
    let (_, handler) = recorder();
    let scanner = scanner(handler);
    let container = first_container(&doc);

    let first = scanner.scan(&mut doc, container);
    let second = scanner.scan(&mut doc, container);

    assert_eq!(first.attached, 2);
    assert_eq!(second.attached, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(controls(&doc).len(), 2);
}

#[test]
fn test_profile_picture_never_gets_control() {
    let mut doc = page(
        r#"
        <section>
            <div><img src="https://cdn.example/p.jpg" alt="Jane's profile picture"></div>
            <div><img src="https://cdn.example/post.jpg" alt="Photo by Jane on a beach"></div>
        </section>
        "#,
    );
    let (_, handler) = recorder();
    let report = scanner(handler).scan_document(&mut doc);

    assert_eq!(report.attached, 1);
    let control = controls(&doc)[0];
    let img = doc.tree().parent(control).and_then(|p| doc.tree().child_ids(p).first().copied()).unwrap();
    assert_eq!(doc.tree().get_attribute(img, "alt"), Some("Photo by Jane on a beach"));
}

#[test]
fn test_null_container_is_noop() {
    let mut doc = page("<div><img src=\"https://cdn.example/a.jpg\"></div>");
    let (_, handler) = recorder();
    let report = scanner(handler).scan(&mut doc, None);
    assert_eq!(report.containers, 0);
    assert!(controls(&doc).is_empty());
}

#[test]
fn test_relative_image_source_made_absolute() {
    let mut doc = page(r#"<article><div><img src="/media/a.jpg" alt="x"></div></article>"#);
    let (recorder, handler) = recorder();
    scanner(handler).scan_document(&mut doc);

    doc.click(controls(&doc)[0]);
    assert_eq!(*recorder.urls.borrow(), vec!["https://www.instagram.com/media/a.jpg".to_string()]);
}

#[test]
fn test_image_without_source_unresolved() {
    let mut doc = page(r#"<article><div><img alt="lazy"></div><div><img src="  " alt="blank"></div></article>"#);
    let (_, handler) = recorder();
    let report = scanner(handler).scan_document(&mut doc);
    assert_eq!(report.unresolved, 2);
    assert!(controls(&doc).is_empty());
}

// ============================================================================
// VIDEO RESOLUTION
// ============================================================================

#[test]
fn test_video_without_payloads_gets_no_control() {
    let mut doc = page("<article><div><video></video></div></article>");
    let (_, handler) = recorder();
    let report = scanner(handler).scan_document(&mut doc);

    assert_eq!(report.unresolved, 1);
    assert!(controls(&doc).is_empty());
}

#[test]
fn test_video_first_matching_payload_wins() {
    let mut doc = page(
        r#"
        <script type="application/json">{"user":{"url":"https:\/\/www.instagram.com\/jane\/"}}</script>
        <script type="application/json">{"video_versions":[{"url":"https:\/\/cdn.example\/v\/second.mp4?tag=a%2Fb"}]}</script>
        <script type="application/json">{"video_versions":[{"url":"https:\/\/cdn.example\/v\/third.mp4"}]}</script>
        <article><div><video></video></div></article>
        "#,
    );
    let (recorder, handler) = recorder();
    scanner(handler).scan_document(&mut doc);

    let found = controls(&doc);
    assert_eq!(found.len(), 1);
    doc.click(found[0]);
    assert_eq!(
        *recorder.urls.borrow(),
        vec!["https://cdn.example/v/second.mp4?tag=a/b".to_string()]
    );
}

#[test]
fn test_malformed_payload_is_skipped() {
    let doc = page(
        r#"
        <script type="application/json">{"url":"https:\/\/cdn.example\/broken%E0%A4.mp4"}</script>
        <script type="application/json">{"url":"https:\/\/cdn.example\/ok.mp4"}</script>
        <article><video></video></article>
        "#,
    );

    let resolver = MediaResolver::new(&MediaConfig::default()).unwrap();
    let containers = SelectorList::parse("article").unwrap();
    let video = doc
        .tree()
        .query_selector(doc.tree().root(), &SelectorList::parse("video").unwrap())
        .unwrap();
    let media = feedsave_core::MediaElement::from_node(doc.tree(), video, &containers).unwrap();

    let url = resolver.resolve(&doc, &media).unwrap();
    assert_eq!(url.as_str(), "https://cdn.example/ok.mp4");
    assert_eq!(url.kind(), MediaKind::Video);
}

#[test]
fn test_non_json_scripts_ignored() {
    let doc = page(
        r#"
        <script>var x = {"url":"https:\/\/cdn.example\/inline.mp4"};</script>
        <article><video></video></article>
        "#,
    );
    let resolver = MediaResolver::new(&MediaConfig::default()).unwrap();
    let video = doc
        .tree()
        .query_selector(doc.tree().root(), &SelectorList::parse("video").unwrap())
        .unwrap();
    let media = feedsave_core::MediaElement::from_node(doc.tree(), video, &SelectorList::parse("article").unwrap()).unwrap();
    assert!(resolver.resolve(&doc, &media).is_none());
}

#[test]
fn test_structured_strategy_from_config() {
    let mut doc = page(
        r#"
        <script type="application/json">{"broken": </script>
        <script type="application/json">{"items":[{"image":{"url":"https://cdn.example/a.jpg"}},{"url":"https://cdn.example/clip.mp4"}]}</script>
        <article><div><video></video></div></article>
        "#,
    );
    let config = MediaConfig {
        video_strategy: VideoStrategyKind::Structured,
        ..MediaConfig::default()
    };
    let (recorder, handler) = recorder();
    ContainerScanner::new(&config, handler).unwrap().scan_document(&mut doc);

    doc.click(controls(&doc)[0]);
    assert_eq!(*recorder.urls.borrow(), vec!["https://cdn.example/clip.mp4".to_string()]);
}

#[test]
fn test_custom_strategy_through_resolver_seam() {
    let mut doc = page(
        r#"
        <script type="text/x-feed">{"url":"https:\/\/cdn.example\/custom.mp4"}</script>
        <article><div><video></video></div></article>
        "#,
    );
    let (recorder, handler) = recorder();
    let resolver = MediaResolver::with_strategy(
        SelectorList::parse(r#"script[type="text/x-feed"]"#).unwrap(),
        Box::new(PatternStrategy::new(&["mp4".to_string()]).unwrap()),
    );
    scanner(handler).with_resolver(resolver).scan_document(&mut doc);

    doc.click(controls(&doc)[0]);
    assert_eq!(*recorder.urls.borrow(), vec!["https://cdn.example/custom.mp4".to_string()]);
}

// ============================================================================
// WATCHER AND LIFECYCLE
// ============================================================================

#[test]
fn test_infinite_scroll_batch_gets_controls() {
    let mut doc = page(r#"<main id="feed"><article><div><img src="https://cdn.example/1.jpg" alt="a"></div></article></main>"#);
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();

    assert_eq!(session.start(&mut doc).attached, 1);
    assert!(session.is_watching());

    let feed = doc.get_element_by_id("feed").unwrap();
    HtmlParser::new()
        .parse_fragment_into(
            r#"<article><div><img src="https://cdn.example/2.jpg" alt="b"></div></article>
               <article><div><img src="https://cdn.example/3.jpg" alt="c"></div></article>"#,
            &mut doc,
            feed,
        )
        .unwrap();

    let report = session.deliver_mutations(&mut doc);
    assert_eq!(report.containers, 2);
    assert_eq!(report.attached, 2);
    assert_eq!(controls(&doc).len(), 3);

    // Control insertion produced records of its own; they add nothing
    assert_eq!(session.deliver_mutations(&mut doc).attached, 0);
    assert_eq!(session.deliver_mutations(&mut doc), ScanReport::default());
}

#[test]
fn test_large_coalesced_batch() {
    let mut doc = page(r#"<main id="feed"></main>"#);
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    session.start(&mut doc);

    // Sibling images share one parent, so each article gets a single control
    let html: String = (0..300)
        .map(|i| {
            format!(
                r#"<article><div><img src="https://cdn.example/{i}-a.jpg" alt="a"><img src="https://cdn.example/{i}-b.jpg" alt="b"></div></article>"#
            )
        })
        .collect();
    let feed = doc.get_element_by_id("feed").unwrap();
    HtmlParser::new().parse_fragment_into(&html, &mut doc, feed).unwrap();

    let report = session.deliver_mutations(&mut doc);
    assert_eq!(report.containers, 300);
    assert_eq!(report.examined, 600);
    assert_eq!(report.attached, 300);
    assert_eq!(report.skipped, 300);

    let found = controls(&doc);
    assert_eq!(found.len(), 300);
    let articles = SelectorList::parse("article").unwrap();
    for article in doc.tree().query_selector_all(doc.tree().root(), &articles) {
        assert_eq!(doc.tree().query_selector_all(article, &SelectorList::parse(".feedsave-bt").unwrap()).len(), 1);
    }
}

#[test]
fn test_media_added_into_existing_container() {
    let mut doc = page(r#"<article id="post"><div id="slot"></div></article>"#);
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    session.start(&mut doc);

    let slot = doc.get_element_by_id("slot").unwrap();
    let img = doc.tree_mut().create_element("img");
    doc.tree_mut().set_attribute(img, "src", "https://cdn.example/late.jpg").unwrap();
    doc.tree_mut().set_attribute(img, "alt", "late").unwrap();
    doc.tree_mut().append_child(slot, img).unwrap();

    let report = session.deliver_mutations(&mut doc);
    assert_eq!(report.attached, 1);
    assert_eq!(doc.tree().parent(controls(&doc)[0]), Some(slot));
}

#[test]
fn test_stop_discards_queued_batch() {
    let mut doc = page(r#"<main id="feed"></main>"#);
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    session.start(&mut doc);

    let feed = doc.get_element_by_id("feed").unwrap();
    HtmlParser::new()
        .parse_fragment_into(r#"<article><div><img src="https://cdn.example/x.jpg" alt="x"></div></article>"#, &mut doc, feed)
        .unwrap();

    session.stop(&mut doc);
    assert!(!session.is_watching());
    assert_eq!(session.deliver_mutations(&mut doc), ScanReport::default());
    assert!(controls(&doc).is_empty());
}

#[test]
fn test_navigation_rearm_scans_new_content() {
    let mut doc = page(r#"<main id="feed"><article><div><img src="https://cdn.example/home.jpg" alt="home"></div></article></main>"#);
    let (recorder, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    session.start(&mut doc);
    assert_eq!(session.poll(&mut doc), None);

    // Client-side navigation swaps the content and changes the address; the
    // queued batch is never delivered.
    let feed = doc.get_element_by_id("feed").unwrap();
    doc.tree_mut().clear_children(feed).unwrap();
    HtmlParser::new()
        .parse_fragment_into(r#"<article><div><img src="https://cdn.example/post.jpg" alt="post"></div></article>"#, &mut doc, feed)
        .unwrap();
    doc.set_url("https://www.instagram.com/p/abc123/");

    let report = session.poll(&mut doc).expect("address change handled");
    assert_eq!(report.attached, 1);
    assert_eq!(session.current_address(), Some("https://www.instagram.com/p/abc123/"));
    assert!(session.is_watching());

    let found = controls(&doc);
    assert_eq!(found.len(), 1);
    doc.click(found[0]);
    assert_eq!(*recorder.urls.borrow(), vec!["https://cdn.example/post.jpg".to_string()]);
}

#[test]
fn test_timer_respects_interval() {
    let mut doc = page("<main></main>");
    let (_, handler) = recorder();
    let config = MediaConfig {
        poll_interval_ms: 500,
        ..MediaConfig::default()
    };
    let mut session = LifecycleCoordinator::new(&config, handler).unwrap();
    session.start(&mut doc);

    let t0 = Instant::now();
    assert_eq!(session.on_timer(&mut doc, t0), None);

    doc.set_url("https://www.instagram.com/explore/");
    assert_eq!(session.on_timer(&mut doc, t0 + Duration::from_millis(200)), None);
    assert!(session.on_timer(&mut doc, t0 + Duration::from_millis(500)).is_some());
    assert_eq!(session.current_address(), Some("https://www.instagram.com/explore/"));
}

#[test]
fn test_stories_address_suppresses_controls() {
    let mut doc = HtmlParser::new().parse_with_url(
        r#"<section><div><img src="https://cdn.example/story.jpg" alt="story"></div></section>"#,
        "https://www.instagram.com/stories/jane/1/",
    );
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    let report = session.start(&mut doc);
    assert_eq!(report.attached, 0);
    assert!(controls(&doc).is_empty());

    doc.set_url("https://www.instagram.com/");
    let report = session.poll(&mut doc).unwrap();
    assert_eq!(report.attached, 1);
}

#[test]
fn test_restart_does_not_duplicate() {
    let mut doc = page(r#"<article><div><img src="https://cdn.example/a.jpg" alt="a"></div></article>"#);
    let (_, handler) = recorder();
    let mut session = LifecycleCoordinator::new(&MediaConfig::default(), handler).unwrap();
    session.start(&mut doc);
    session.restart(&mut doc);
    session.restart(&mut doc);
    assert_eq!(controls(&doc).len(), 1);
}
