//! Live-value substitution for guide content and the scrolling notice.

use once_cell::sync::Lazy;
use regex::Regex;

/// Token operators write wherever the visitor's referral id belongs.
pub const REFERRAL_PLACEHOLDER: &str = "TYPE-YOUR-REFERRAL-ID-HERE";

static TEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[tel:([\d\s+-]+)\]").expect("valid tel pattern"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[link:(.*?)\|(.*?)\]").expect("valid link pattern"));

/// Replace every referral placeholder with `ref_id`. A missing or empty id
/// leaves the placeholder visible so the reader can still fill it in by hand.
pub fn resolve(content: &str, ref_id: Option<&str>) -> String {
    match ref_id.filter(|id| !id.is_empty()) {
        Some(id) => content.replace(REFERRAL_PLACEHOLDER, id),
        None => content.to_string(),
    }
}

/// Expand `[tel:NUMBER]` and `[link:URL|LABEL]` in scrolling notice content.
pub fn resolve_notice(content: &str) -> String {
    let text = TEL.replace_all(content, r#"<a href="tel:$1" class="marquee-link tel-link">$1</a>"#);
    let text = LINK.replace_all(
        &text,
        r#"<a href="$1" target="_blank" class="marquee-link web-link">$2</a>"#,
    );
    text.into_owned()
}
