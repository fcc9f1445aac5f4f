//! Sequential iteration over tabbed program pages
//!
//! Many cinema sites render one tab button per day and one card per tab
//! holding that day's screenings. Buttons are visited first, strictly one
//! after another, each building a per-tab context; cards are then visited
//! against the context of their tab.

use async_trait::async_trait;
use scraper::ElementRef;
use serde_json::Value;
use tracing::{debug, info};

use super::config::{IterationCap, TabsConfig};
use super::context::ParsingContext;
use super::dom::compile_selector;
use super::templater::Templater;
use super::value_grabber::ValueGrabber;
use super::{ParsingError, ParsingResult};

/// Caller-supplied work for each tab button and card.
///
/// Every call is awaited before the next one starts, so implementations may
/// freely mutate the tab context they are handed.
#[async_trait(?Send)]
pub trait TabVisitor {
    async fn visit_button(&mut self, button: ElementRef<'_>, context: &mut ParsingContext) -> anyhow::Result<()>;

    async fn visit_card(&mut self, _card: ElementRef<'_>, _context: &mut ParsingContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Tab contexts keyed by tab id, in button order
#[derive(Debug, Default)]
pub struct TabContexts {
    entries: Vec<(String, ParsingContext)>,
}

impl TabContexts {
    /// Insert a tab, replacing an earlier tab with the same id in place
    fn insert(&mut self, tab_id: String, context: ParsingContext) {
        match self.entries.iter_mut().find(|(id, _)| *id == tab_id) {
            Some(entry) => entry.1 = context,
            None => self.entries.push((tab_id, context)),
        }
    }

    pub fn get(&self, tab_id: &str) -> Option<&ParsingContext> {
        self.entries.iter().find(|(id, _)| id == tab_id).map(|(_, context)| context)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsingContext)> {
        self.entries.iter().map(|(id, context)| (id.as_str(), context))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, ParsingContext)> {
        self.entries
    }
}

pub struct TabsParser {
    config: TabsConfig,
    id_grabber: Option<ValueGrabber>,
    cap: IterationCap,
}

impl TabsParser {
    pub fn new(config: TabsConfig, cap: IterationCap) -> ParsingResult<Self> {
        if config.buttons.box_selector.trim().is_empty() {
            return Err(ParsingError::configuration("tabs.buttons.box", "selector must not be empty"));
        }
        if config.cards.as_ref().is_some_and(|cards| cards.box_selector.trim().is_empty()) {
            return Err(ParsingError::configuration("tabs.cards.box", "selector must not be empty"));
        }
        let id_grabber = config.buttons.id.as_ref().map(|id| ValueGrabber::from_config(Some(id)));
        Ok(Self { config, id_grabber, cap })
    }

    /// Visit every tab button, then every tab card, below `container`.
    ///
    /// The first visitor error aborts the remaining steps and is returned.
    pub async fn parse_tabs<V>(
        &self,
        container: ElementRef<'_>,
        context: &ParsingContext,
        visitor: &mut V,
    ) -> ParsingResult<TabContexts>
    where
        V: TabVisitor + ?Sized,
    {
        let mut tabs = TabContexts::default();

        let buttons_selector = Templater::resolve(&self.config.buttons.box_selector, context);
        let Some(buttons) = compile_selector(&buttons_selector, context) else {
            return Ok(tabs);
        };

        for (index, button) in container.select(&buttons).enumerate() {
            let mut tab_context = context.branch();
            tab_context.set_index("tab", index);

            let tab_id = self.tab_id(button, &tab_context, index);
            tab_context.set_var("tabId", tab_id.clone());
            tab_context.push_frame(&format!("tab:{tab_id}"));

            visitor
                .visit_button(button, &mut tab_context)
                .await
                .map_err(|source| ParsingError::TabButtonFailed { index, source })?;

            if tabs.get(&tab_id).is_some() {
                debug!("Tab id '{}' seen again at index {}, replacing", tab_id, index);
            }
            tabs.insert(tab_id, tab_context);
        }

        let Some(cards) = &self.config.cards else {
            info!("Collected {} tabs", tabs.len());
            return Ok(tabs);
        };

        let limit = self.cap.clamp(None).unwrap_or(usize::MAX);
        for (tab_id, tab_context) in tabs.entries.iter_mut().take(limit) {
            let card_selector = Templater::resolve(&cards.box_selector, tab_context);
            let card = compile_selector(&card_selector, tab_context).and_then(|s| container.select(&s).next());

            match card {
                Some(card) => visitor
                    .visit_card(card, tab_context)
                    .await
                    .map_err(|source| ParsingError::TabCardFailed {
                        tab_id: tab_id.clone(),
                        source,
                    })?,
                None => tab_context.add_warning(
                    "TAB_CARD_MISSING",
                    format!("No card matches '{card_selector}' for tab '{tab_id}'"),
                ),
            }
        }

        info!("Collected {} tabs", tabs.len());
        Ok(tabs)
    }

    fn tab_id(&self, button: ElementRef<'_>, context: &ParsingContext, index: usize) -> String {
        let Some(grabber) = &self.id_grabber else {
            return index.to_string();
        };
        match grabber.grab_first(button, context) {
            Value::Null => {
                context.add_warning("TAB_ID_MISSING", format!("Tab button {index} has no id, using its index"));
                index.to_string()
            }
            Value::String(id) => id,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::config::{FieldConfig, TabButtonsConfig, TabCardsConfig};
    use scraper::{Html, Selector};

    const PROGRAM: &str = r#"
        <div id="program">
            <ul><li class="tab" data-day="mon">Mo</li><li class="tab" data-day="tue">Di</li></ul>
            <section id="day-mon"><p>Alien</p></section>
            <section id="day-tue"><p>Heat</p></section>
        </div>"#;

    fn config(cards: bool) -> TabsConfig {
        TabsConfig {
            buttons: TabButtonsConfig {
                box_selector: "li.tab".to_string(),
                id: Some(FieldConfig::Shorthand("@data-day".to_string())),
            },
            cards: cards.then(|| TabCardsConfig { box_selector: "#day-:tabId:".to_string() }),
        }
    }

    #[derive(Default)]
    struct Recorder {
        buttons: Vec<String>,
        cards: Vec<String>,
    }

    #[async_trait(?Send)]
    impl TabVisitor for Recorder {
        async fn visit_button(&mut self, button: ElementRef<'_>, context: &mut ParsingContext) -> anyhow::Result<()> {
            self.buttons.push(button.text().collect());
            context.set_var("label", button.text().collect::<String>());
            Ok(())
        }

        async fn visit_card(&mut self, card: ElementRef<'_>, context: &mut ParsingContext) -> anyhow::Result<()> {
            let label = context.var("label").and_then(Value::as_str).unwrap_or_default().to_string();
            self.cards.push(format!("{label}:{}", card.text().collect::<String>()));
            Ok(())
        }
    }

    fn container(html: &Html) -> ElementRef<'_> {
        html.select(&Selector::parse("#program").unwrap()).next().unwrap()
    }

    #[tokio::test]
    async fn test_buttons_then_cards() {
        let html = Html::parse_fragment(PROGRAM);
        let parser = TabsParser::new(config(true), IterationCap::UNBOUNDED).unwrap();
        let mut recorder = Recorder::default();
        let root = ParsingContext::root();

        let tabs = parser.parse_tabs(container(&html), &root, &mut recorder).await.unwrap();

        assert_eq!(tabs.ids().collect::<Vec<_>>(), ["mon", "tue"]);
        assert_eq!(tabs.get("tue").and_then(|c| c.index("tab")), Some(1));
        assert_eq!(recorder.buttons, ["Mo", "Di"]);
        assert_eq!(recorder.cards, ["Mo:Alien", "Di:Heat"]);
        assert!(root.warnings().is_empty());
    }

    #[test]
    fn test_empty_button_selector_is_rejected() {
        let mut config = config(false);
        config.buttons.box_selector = " ".to_string();
        assert!(matches!(
            TabsParser::new(config, IterationCap::UNBOUNDED),
            Err(ParsingError::ConfigurationError { .. })
        ));
    }
}
