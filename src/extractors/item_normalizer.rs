//! Item normalisation: element → `label / descriptor / link`

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{element_text, Item, ItemSelectors};

/// How a non-empty href is written into the link cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStyle {
    /// `=HYPERLINK("<url>", "Click here")`. Required for anything written to a sheet.
    #[default]
    Formula,
    /// The href as found; only for read-only previews
    Raw,
}

const LINK_TEXT: &str = "Click here";

/// Spreadsheet formula for a clickable link.
///
/// Quotes in the URL are doubled so the formula stays valid; for such URLs the
/// output deliberately differs from a verbatim `=HYPERLINK("<href>", ...)`.
/// Quote-free URLs are embedded unchanged.
pub fn hyperlink_formula(url: &str) -> String {
    format!("=HYPERLINK(\"{}\", \"{}\")", url.replace('"', "\"\""), LINK_TEXT)
}

/// Builds [`Item`]s from matched elements
#[derive(Debug, Clone, Copy)]
pub struct ItemNormalizer<'a> {
    parts: &'a ItemSelectors,
    style: LinkStyle,
    /// Set for browser-rendered pages, where links are reported absolute
    base_url: Option<&'a Url>,
}

impl<'a> ItemNormalizer<'a> {
    pub fn new(parts: &'a ItemSelectors, style: LinkStyle, base_url: Option<&'a Url>) -> Self {
        Self {
            parts,
            style,
            base_url,
        }
    }

    pub fn parts(&self) -> &'a ItemSelectors {
        self.parts
    }

    /// First heading, first paragraph and first anchor inside `item`
    pub fn normalize(&self, item: ElementRef<'_>) -> Item {
        let label = item.select(&self.parts.label).next().map(element_text);
        let descriptor = item.select(&self.parts.descriptor).next().map(element_text);
        let href = item
            .select(&self.parts.link)
            .next()
            .and_then(|a| a.value().attr("href"));

        self.from_parts(label, descriptor, href)
    }

    /// Assemble an item from optional parts; anything missing becomes `""`
    pub fn from_parts(
        &self,
        label: Option<String>,
        descriptor: Option<String>,
        href: Option<&str>,
    ) -> Item {
        Item {
            label: label.unwrap_or_default(),
            descriptor: descriptor.unwrap_or_default(),
            link: self.encode_link(href),
        }
    }

    /// Empty or missing href always yields `""`, never a formula with an empty URL
    pub fn encode_link(&self, href: Option<&str>) -> String {
        let href = match href.map(str::trim) {
            Some(h) if !h.is_empty() => h,
            _ => return String::new(),
        };

        let url = match self.base_url {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };

        match self.style {
            LinkStyle::Formula => hyperlink_formula(&url),
            LinkStyle::Raw => url,
        }
    }
}
