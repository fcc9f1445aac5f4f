//! Placeholder resolution and page ranges
use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::json;
use showtime_scraper::infrastructure::parsing::templater::MAX_PAGES;
use showtime_scraper::infrastructure::parsing::{IterationCap, ParsingContext, Templater};

fn cinema_context() -> ParsingContext {
    let mut context = ParsingContext::root().with_date_format("D. MMMM", "de");
    context.set_var("cinema", json!({ "id": 17, "slug": "schauburg", "open": true }));
    context.set_var("languages", json!(["de", "en"]));
    context.set_index("tab", 1);
    context.date = NaiveDate::from_ymd_opt(2026, 3, 8).and_then(|d| d.and_hms_opt(0, 0, 0));
    context
}

#[test]
fn values_render_by_type() {
    let context = cinema_context();
    assert_eq!(Templater::resolve("id=:cinema.id:&open=:cinema.open:", &context), "id=17&open=true");
    assert_eq!(Templater::resolve("on :date:", &context), "on 8. März");
    assert_eq!(Templater::resolve("lang=:languages:", &context), r#"lang=["de","en"]"#);
}

#[test]
fn times_and_pseudo_classes_are_not_tokens() {
    let context = cinema_context();
    for text in ["18:00 - 20:30", "li:nth-child(2)", "a:not(.hidden):first-child", "12:00:00"] {
        assert_eq!(Templater::resolve(text, &context), text);
    }
}

#[test]
fn object_templates_resolve_at_any_depth() {
    let context = cinema_context();
    let template = json!({
        "cinema": ":cinema.slug:",
        "requests": [{ "url": "/api/:cinema.id:/day/:indexes.tab:", "retries": 2 }]
    });
    assert_eq!(
        Templater::resolve_value(&template, &context),
        json!({
            "cinema": "schauburg",
            "requests": [{ "url": "/api/17/day/1", "retries": 2 }]
        })
    );
}

#[test]
fn page_ranges() {
    assert_eq!(
        Templater::parse_page_range("/p/:page(3,5):", IterationCap::UNBOUNDED),
        Some(vec!["3".to_string(), "4".to_string(), "5".to_string()])
    );
    assert_eq!(Templater::parse_page_range("/p/:page(5,3):", IterationCap::UNBOUNDED), Some(Vec::new()));
    assert_eq!(
        Templater::parse_page_range("/p/:page([today,tomorrow]):", IterationCap::UNBOUNDED),
        Some(vec!["today".to_string(), "tomorrow".to_string()])
    );
    assert_eq!(Templater::parse_page_range("/p/:cinema.slug:", IterationCap::UNBOUNDED), None);
}

#[test]
fn expand_pages_resolves_every_page() {
    let context = cinema_context();
    let urls = Templater::expand_pages("/:cinema.slug:/:page([mo,di]):", &context, IterationCap::UNBOUNDED).unwrap();
    assert_eq!(urls, ["/schauburg/mo", "/schauburg/di"]);
    assert!(Templater::expand_pages("/:cinema.slug:", &context, IterationCap::UNBOUNDED).is_none());
}

#[test]
fn expand_pages_honours_the_iteration_cap() {
    let context = cinema_context();
    let template = "/:cinema.slug:?page=:page(1,3000000):";
    let urls = Templater::expand_pages(template, &context, IterationCap::new(2)).unwrap();
    assert_eq!(urls, ["/schauburg?page=1", "/schauburg?page=2"]);

    let urls = Templater::expand_pages("?page=:page(1,3000000):", &context, IterationCap::UNBOUNDED).unwrap();
    assert_eq!(urls.len(), MAX_PAGES);
}

proptest! {
    #[test]
    fn templates_without_tokens_are_unchanged(text in "[a-zA-Z0-9 .#>()\\[\\]=-]{0,40}") {
        let context = cinema_context();
        prop_assert_eq!(Templater::resolve(&text, &context), text);
    }

    #[test]
    fn unknown_tokens_are_left_in_place(name in "[a-z]{1,8}", prefix in "[a-z/ ]{0,10}") {
        let context = ParsingContext::root();
        let template = format!("{prefix}:unknown_{name}:");
        prop_assert_eq!(Templater::resolve(&template, &context), template);
    }
}
