//! Section discovery in both traversal modes

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use super::{
    element_text, first_nonempty, first_text, CompiledProfile, ExtractionMode, Item,
    ItemNormalizer, LinkStyle, Section,
};

/// Title and sections of one fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedPage {
    pub title: String,
    pub sections: Vec<Section>,
}

/// Parse `html` and extract its title and sections.
///
/// The parsed tree only lives for the duration of this call.
pub fn extract_page(
    html: &str,
    base_url: Option<&Url>,
    profile: &CompiledProfile,
    style: LinkStyle,
) -> ExtractedPage {
    let document = Html::parse_document(html);
    let normalizer = ItemNormalizer::new(&profile.parts, style, base_url);

    ExtractedPage {
        title: page_title(&document),
        sections: extract_sections(&document, profile, &normalizer),
    }
}

/// Trimmed `<title>` text, or `""`
pub fn page_title(document: &Html) -> String {
    match Selector::parse("title") {
        Ok(sel) => document
            .select(&sel)
            .next()
            .map(element_text)
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Sections in document order. Never fails: anything missing degrades to
/// empty strings or an empty list.
pub fn extract_sections(
    document: &Html,
    profile: &CompiledProfile,
    normalizer: &ItemNormalizer<'_>,
) -> Vec<Section> {
    match profile.mode {
        ExtractionMode::Sections => extract_scoped_sections(document, profile, normalizer),
        ExtractionMode::Headings => extract_anchored_sections(document, profile, normalizer),
    }
}

fn extract_scoped_sections(
    document: &Html,
    profile: &CompiledProfile,
    normalizer: &ItemNormalizer<'_>,
) -> Vec<Section> {
    let containers = profile
        .containers
        .iter()
        .map(|candidate| document.select(candidate).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    containers
        .into_iter()
        .map(|container| Section {
            title: first_text(container, &profile.titles),
            items: first_nonempty(container, &profile.items)
                .into_iter()
                .map(|item| normalizer.normalize(item))
                .collect(),
        })
        .collect()
}

/// Items are built by pairing the i-th label, descriptor and link found under
/// the container, regardless of how they are nested. Shorter lists pad with `""`.
fn extract_anchored_sections(
    document: &Html,
    profile: &CompiledProfile,
    normalizer: &ItemNormalizer<'_>,
) -> Vec<Section> {
    document
        .select(&profile.anchor_heading)
        .map(|heading| {
            let title = element_text(heading);
            let items = match closest(heading, &profile.anchor_container) {
                Some(container) => positional_items(container, normalizer),
                None => Vec::new(),
            };
            Section { title, items }
        })
        .collect()
}

fn positional_items(container: ElementRef<'_>, normalizer: &ItemNormalizer<'_>) -> Vec<Item> {
    let parts = normalizer.parts();
    let descriptors: Vec<_> = container.select(&parts.descriptor).collect();
    let links: Vec<_> = container.select(&parts.link).collect();

    container
        .select(&parts.label)
        .enumerate()
        .map(|(i, label)| {
            normalizer.from_parts(
                Some(element_text(label)),
                descriptors.get(i).map(|p| element_text(*p)),
                links.get(i).and_then(|a| a.value().attr("href")),
            )
        })
        .collect()
}

/// Nearest element, starting from `element` itself, that matches `selector`
pub fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|candidate| selector.matches(candidate))
}
