//! WhatsApp-style markup to display HTML.
//!
//! The rewrite is an ordered pipeline: headings, bold, italics, links, then
//! line breaks. Each stage runs on the output of the previous one, so a span
//! wrapped early is no longer a candidate for a later pattern. Content is
//! operator-authored and passed through without escaping.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\*(.*?)\*_").expect("valid heading pattern"));
static STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid strong pattern"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.*?)_").expect("valid emphasis pattern"));
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<]+").expect("valid url pattern"));
static VIDEO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:youtube\.com/(?:watch\?v=|shorts/)|youtu\.be/)")
        .expect("valid video url pattern")
});

/// What kind of links a translated guide carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    #[default]
    Plain,
    Links,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub html: String,
    pub class: ContentClass,
}

pub fn translate(raw: &str) -> String {
    translate_with_class(raw).html
}

pub fn translate_with_class(raw: &str) -> Translation {
    let text = HEADING.replace_all(raw, "<h3>$1</h3>");
    let text = STRONG.replace_all(&text, "<strong>$1</strong>");
    let text = EMPHASIS.replace_all(&text, "<em>$1</em>");

    let mut class = ContentClass::Plain;
    let text = URL.replace_all(&text, |caps: &Captures<'_>| {
        let url = &caps[0];
        if is_video_url(url) {
            class = class.max(ContentClass::Video);
            video_link(url)
        } else {
            class = class.max(ContentClass::Links);
            format!(r#"<a href="{url}" target="_blank">{url}</a>"#)
        }
    });
    let html = text.replace('\n', "<br>");
    Translation { html, class }
}

pub fn is_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

fn video_link(url: &str) -> String {
    format!(
        r#"<a href="{url}" target="_blank" class="youtube-link"><i class="fab fa-youtube"></i> Watch Training Video <i class="fas fa-external-link-alt"></i></a>"#
    )
}

/// Terminal flavour of the same dialect, for markdown renderers.
pub fn to_markdown(raw: &str) -> String {
    let text = HEADING.replace_all(raw, "\n### $1\n");
    let text = STRONG.replace_all(&text, "**$1**");
    let text = EMPHASIS.replace_all(&text, "*$1*");
    text.into_owned()
}
