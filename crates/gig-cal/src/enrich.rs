//! Display strings and links pulled out of event descriptions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::NormalizedEvent;
use crate::options::ResolvedOptions;
use crate::temporal::display_string;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>()\[\]]+"#).expect("valid link regex"));

const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp", ".avif",
];

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// A normalized event plus what the display layer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEvent {
    pub event: NormalizedEvent,
    pub start_as_display_string: String,
    pub urls: Vec<String>,
    pub images: Vec<String>,
}

/// Attach a display string and extracted links to `event`.
pub fn enrich(event: NormalizedEvent, options: &ResolvedOptions) -> EnrichedEvent {
    let start_as_display_string = match event.zone {
        Some(tz) if options.time_zone_by_event => display_string(&event.start, &tz),
        _ => options.viewer_zone.render(&event.start),
    };

    let links = if options.extract_urls || options.extract_images {
        event
            .raw
            .description
            .as_deref()
            .map(extract_links)
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let images = if options.extract_images {
        links.iter().filter(|l| is_image_link(l)).cloned().collect()
    } else {
        Vec::new()
    };
    let urls = if options.extract_urls { links } else { Vec::new() };

    EnrichedEvent {
        event,
        start_as_display_string,
        urls,
        images,
    }
}

/// Every `http(s)` link in `text`, in order of first appearance, deduplicated.
///
/// # Examples
///
/// ```
/// use gig_cal::enrich::extract_links;
///
/// let text = r#"Tickets: <a href="https://example.com/t">https://example.com/t</a>."#;
/// assert_eq!(extract_links(text), vec!["https://example.com/t"]);
/// ```
pub fn extract_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for m in LINK_RE.find_iter(text) {
        let link = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if !links.iter().any(|seen| seen == link) {
            links.push(link.to_string());
        }
    }
    links
}

/// Whether `url` points at an image, judged by its path extension.
pub fn is_image_link(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
