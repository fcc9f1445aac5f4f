//! Sequential tab iteration
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use showtime_scraper::infrastructure::parsing::{
    IterationCap, ParsingContext, ParsingError, TabVisitor, TabsConfig, TabsParser,
};

const PAGE: &str = r#"
<main>
  <nav>
    <button data-day="2026-11-20">Fr</button>
    <button data-day="2026-11-21">Sa</button>
    <button>So</button>
    <button data-day="2026-11-20">Fr (late)</button>
  </nav>
  <div class="day" data-for="2026-11-20"><p>Dune</p></div>
  <div class="day" data-for="2026-11-21"><p>Heat</p></div>
</main>"#;

fn tabs_config(value: Value) -> TabsConfig {
    serde_json::from_value(value).unwrap()
}

fn default_config() -> TabsConfig {
    tabs_config(json!({
        "buttons": { "box": "nav button", "id": "@data-day" },
        "cards": { "box": ".day[data-for=\":tabId:\"]" }
    }))
}

fn main_element(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("main").unwrap()).next().unwrap()
}

#[derive(Default)]
struct Journal {
    steps: Vec<String>,
    fail_button: Option<usize>,
    fail_card: Option<String>,
}

#[async_trait(?Send)]
impl TabVisitor for Journal {
    async fn visit_button(&mut self, button: ElementRef<'_>, context: &mut ParsingContext) -> anyhow::Result<()> {
        let index = context.index("tab").unwrap_or_default();
        tokio::task::yield_now().await;
        if self.fail_button == Some(index) {
            anyhow::bail!("button {index} exploded");
        }
        let label: String = button.text().collect();
        self.steps.push(format!("button {index} {label}"));
        context.set_var("label", label);
        Ok(())
    }

    async fn visit_card(&mut self, card: ElementRef<'_>, context: &mut ParsingContext) -> anyhow::Result<()> {
        let tab_id = context.var("tabId").and_then(Value::as_str).unwrap_or_default().to_string();
        if self.fail_card.as_deref() == Some(tab_id.as_str()) {
            anyhow::bail!("card {tab_id} exploded");
        }
        let label = context.var("label").and_then(Value::as_str).unwrap_or_default().to_string();
        self.steps.push(format!("card {label} {}", card.text().collect::<String>()));
        Ok(())
    }
}

#[tokio::test]
async fn buttons_run_before_cards_in_order() {
    let html = Html::parse_document(PAGE);
    let parser = TabsParser::new(default_config(), IterationCap::UNBOUNDED).unwrap();
    let root = ParsingContext::root();
    let mut journal = Journal::default();

    let tabs = parser.parse_tabs(main_element(&html), &root, &mut journal).await.unwrap();

    assert_eq!(
        journal.steps,
        [
            "button 0 Fr",
            "button 1 Sa",
            "button 2 So",
            "button 3 Fr (late)",
            "card Fr (late) Dune",
            "card Sa Heat",
        ]
    );
    // the repeated id keeps its first position but the latest context
    assert_eq!(tabs.ids().collect::<Vec<_>>(), ["2026-11-20", "2026-11-21", "2"]);
    assert_eq!(tabs.get("2026-11-20").and_then(|c| c.index("tab")), Some(3));
}

#[tokio::test]
async fn missing_ids_and_cards_become_warnings() {
    let html = Html::parse_document(PAGE);
    let parser = TabsParser::new(default_config(), IterationCap::UNBOUNDED).unwrap();
    let root = ParsingContext::root();

    let tabs = parser.parse_tabs(main_element(&html), &root, &mut Journal::default()).await.unwrap();

    let codes: Vec<String> = root.warnings().into_iter().map(|w| w.code).collect();
    assert_eq!(codes, ["TAB_ID_MISSING", "TAB_CARD_MISSING"]);
    let sunday = tabs.get("2").unwrap();
    assert_eq!(sunday.var("tabId"), Some(&json!("2")));
    assert_eq!(sunday.warnings().len(), 2);
}

#[tokio::test]
async fn button_failure_aborts_the_sequence() {
    let html = Html::parse_document(PAGE);
    let parser = TabsParser::new(default_config(), IterationCap::UNBOUNDED).unwrap();
    let mut journal = Journal { fail_button: Some(1), ..Journal::default() };

    let err = parser
        .parse_tabs(main_element(&html), &ParsingContext::root(), &mut journal)
        .await
        .unwrap_err();

    assert!(matches!(err, ParsingError::TabButtonFailed { index: 1, .. }));
    assert_eq!(journal.steps, ["button 0 Fr"]);
}

#[test]
fn card_failure_names_the_tab() {
    let html = Html::parse_document(PAGE);
    let parser = TabsParser::new(default_config(), IterationCap::UNBOUNDED).unwrap();
    let mut journal = Journal { fail_card: Some("2026-11-21".to_string()), ..Journal::default() };

    let result = tokio_test::block_on(parser.parse_tabs(main_element(&html), &ParsingContext::root(), &mut journal));

    match result {
        Err(ParsingError::TabCardFailed { tab_id, source }) => {
            assert_eq!(tab_id, "2026-11-21");
            assert!(source.to_string().contains("exploded"));
        }
        other => panic!("expected a card failure, got {other:?}"),
    }
    assert_eq!(journal.steps.last().map(String::as_str), Some("card Fr (late) Dune"));
}

#[tokio::test]
async fn iteration_cap_limits_cards_only() {
    let html = Html::parse_document(PAGE);
    let parser = TabsParser::new(default_config(), IterationCap::new(1)).unwrap();
    let mut journal = Journal::default();

    let tabs = parser
        .parse_tabs(main_element(&html), &ParsingContext::root(), &mut journal)
        .await
        .unwrap();

    assert_eq!(tabs.len(), 3);
    assert_eq!(journal.steps.iter().filter(|s| s.starts_with("card")).count(), 1);
}

#[tokio::test]
async fn without_cards_only_buttons_are_visited() {
    let html = Html::parse_document(PAGE);
    let config = tabs_config(json!({ "buttons": { "box": "nav button" } }));
    let parser = TabsParser::new(config, IterationCap::UNBOUNDED).unwrap();
    let root = ParsingContext::root();
    let mut journal = Journal::default();

    let tabs = parser.parse_tabs(main_element(&html), &root, &mut journal).await.unwrap();

    assert_eq!(tabs.ids().collect::<Vec<_>>(), ["0", "1", "2", "3"]);
    assert_eq!(journal.steps.len(), 4);
    assert!(root.warnings().is_empty());
}
