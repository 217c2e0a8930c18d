//! Ticket section extraction
//!
//! Turns a fetched page into an ordered list of titled sections, each holding
//! ticket items normalised to `label / descriptor / link`.
//! - Section-scoped mode: container elements found through a fallback chain
//! - Heading-anchored mode: `h3` headings walked up to their container
//!
//! Selector choices are page-specific, so they live in [`SelectorProfile`]
//! rather than being hardcoded.

mod item_normalizer;
mod section_extractor;

pub use item_normalizer::*;
pub use section_extractor::*;

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A titled group of ticket items, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Empty when no heading candidate matched
    pub title: String,
    pub items: Vec<Item>,
}

/// One ticket-like entry. Missing sub-elements are always `""`, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub label: String,
    pub descriptor: String,
    pub link: String,
}

/// How sections are located inside the scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Container elements found via `containers`, items via `items`
    #[default]
    Sections,
    /// Each `anchor_heading` is walked up to its `anchor_container`;
    /// item parts are paired positionally
    Headings,
}

/// Page-specific selector set. Every list is an ordered fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorProfile {
    pub mode: ExtractionMode,
    /// Section containers, relative to the scope. First non-empty wins.
    pub containers: Vec<String>,
    /// Section title candidates. First with non-empty text wins.
    pub titles: Vec<String>,
    /// Item candidates per section. First with any match wins.
    pub items: Vec<String>,
    pub anchor_heading: String,
    pub anchor_container: String,
    pub label: String,
    pub descriptor: String,
    pub link: String,
}

impl Default for SelectorProfile {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Sections,
            containers: vec![
                "div.container div.tickets".to_string(),
                "div.container div.ticket-container".to_string(),
            ],
            titles: vec!["h3".to_string(), "h2".to_string()],
            items: vec![".ticket-row".to_string(), ".find-ticket-items".to_string()],
            anchor_heading: "h3".to_string(),
            anchor_container: "div.tickets".to_string(),
            label: "h4".to_string(),
            descriptor: "p".to_string(),
            link: "a".to_string(),
        }
    }
}

impl SelectorProfile {
    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Compile every selector, prefixing the section locators with `scope`.
    ///
    /// Fails on the first selector that does not parse, so callers can reject
    /// bad input before doing any I/O.
    pub fn compile(&self, scope: &str) -> Result<CompiledProfile> {
        let scope = scope.trim();
        let scoped = |suffix: &str| parse_selector(&format!("{scope} {suffix}"));

        Ok(CompiledProfile {
            mode: self.mode,
            containers: self
                .containers
                .iter()
                .map(|c| scoped(c))
                .collect::<Result<_>>()?,
            titles: parse_all(&self.titles)?,
            items: parse_all(&self.items)?,
            anchor_heading: scoped(&self.anchor_heading)?,
            anchor_container: parse_selector(&self.anchor_container)?,
            parts: ItemSelectors {
                label: parse_selector(&self.label)?,
                descriptor: parse_selector(&self.descriptor)?,
                link: parse_selector(&self.link)?,
            },
        })
    }
}

/// Selectors for the three parts of an item
#[derive(Debug, Clone)]
pub struct ItemSelectors {
    pub label: Selector,
    pub descriptor: Selector,
    pub link: Selector,
}

/// A [`SelectorProfile`] bound to one scope, ready to run against a document
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub mode: ExtractionMode,
    pub containers: Vec<Selector>,
    pub titles: Vec<Selector>,
    pub items: Vec<Selector>,
    pub anchor_heading: Selector,
    pub anchor_container: Selector,
    pub parts: ItemSelectors,
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn parse_all(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| parse_selector(s)).collect()
}

/// First element under `scope` matched by the earliest candidate that matches anything
pub fn first_match<'a>(scope: ElementRef<'a>, candidates: &[Selector]) -> Option<ElementRef<'a>> {
    candidates
        .iter()
        .find_map(|candidate| scope.select(candidate).next())
}

/// All elements under `scope` for the earliest candidate that matches anything
pub fn first_nonempty<'a>(scope: ElementRef<'a>, candidates: &[Selector]) -> Vec<ElementRef<'a>> {
    candidates
        .iter()
        .map(|candidate| scope.select(candidate).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Trimmed text of the earliest candidate whose first match has non-empty text
pub fn first_text(scope: ElementRef<'_>, candidates: &[Selector]) -> String {
    candidates
        .iter()
        .filter_map(|candidate| scope.select(candidate).next())
        .map(element_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Concatenated text content, trimmed
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
