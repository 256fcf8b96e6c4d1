//! Page tree for a guide document.
//!
//! `RenderContext` owns the mount point and the resolved guide list; the
//! session mutates the tree only through the methods here.

use crate::accordion::{AccordionController, ContentChanged};
use crate::dom::Element;
use crate::form::{self, BuiltForm, COPY_KEY_ATTR, CopyButton, FormBinding, GENERATED_LABEL};
use crate::guide::{GuideEntry, GuideSource, LoadError, ScrollingNotice};
use crate::markup::{self, ContentClass};
use crate::placeholder;
use crate::strategy::{self, CopyTarget, FieldValues, StrategyRegistry};
use crate::timing::{SEARCH_PROMPTS, VIDEO_HUB_TEXTS};
use tracing::error;

pub const LOAD_FAILURE_MESSAGE: &str =
    "Failed to load instructions. Please check the file and try again.";
pub const NO_RESULTS_MESSAGE: &str = "No guides found. Try a different search term.";
pub const DEFAULT_VIDEO_HUB_URL: &str = "https://dammieoptimus.github.io/tgr-playbook/videos.html";

pub const SEARCH_INPUT_ID: &str = "searchInput";
pub const NO_RESULTS_ID: &str = "no-results-message";
pub const ACCORDION_ID: &str = "accordion-container";
pub const MARQUEE_ID: &str = "marquee-container";
pub const VIDEO_HUB_CLASS: &str = "video-hub-link";
pub const COUNTER_CLASS: &str = "click-counter";
pub const HIGHLIGHT_CLASS: &str = "deeplink-highlight";
pub const PLACEHOLDER_FADE_CLASS: &str = "placeholder-fade-out";
pub const TEXT_FADE_CLASS: &str = "text-fade-out";

/// Per-page inputs that are not part of the guide document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub ref_id: Option<String>,
    pub playbook_url: String,
    pub video_hub_url: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            ref_id: None,
            playbook_url: strategy::DEFAULT_PLAYBOOK_URL.to_string(),
            video_hub_url: DEFAULT_VIDEO_HUB_URL.to_string(),
        }
    }
}

pub fn item_id(index: usize) -> String {
    format!("guide-{index}")
}

fn content_inner_id(index: usize) -> String {
    format!("content-inner-{index}")
}

pub fn counter_label(count: u64) -> String {
    format!("Total Clicks: {count}")
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    root: Element,
    guides: Vec<GuideEntry>,
    classes: Vec<ContentClass>,
    forms: Vec<BuiltForm>,
    load_error: Option<String>,
}

impl RenderContext {
    /// Resolve, translate and mount every guide in document order.
    pub fn render(source: &GuideSource, options: &PageOptions, registry: &StrategyRegistry) -> Self {
        let mut container = Element::new("div").with_id(ACCORDION_ID);
        let mut guides = Vec::with_capacity(source.len());
        let mut classes = Vec::with_capacity(source.len());
        let mut forms = Vec::new();

        for (idx, entry) in source.instructions.iter().enumerate() {
            let index = idx + 1;
            let content = placeholder::resolve(&entry.content, options.ref_id.as_deref());
            let translation = markup::translate_with_class(&content);
            let mut inner = Element::new("div")
                .with_class("accordion-content-inner")
                .with_id(content_inner_id(index))
                .with_markup(translation.html);
            match &entry.form {
                Some(descriptor) => forms.push(form::build(descriptor, index, &mut inner, registry)),
                None => inner.push(form::copy_button(&CopyButton::Guide(index), "copy-button")),
            }
            container.push(accordion_item(index, &entry.title, inner));
            guides.push(GuideEntry {
                title: entry.title.clone(),
                content,
                form: entry.form.clone(),
            });
            classes.push(translation.class);
        }

        let notice = source
            .scrolling_notice
            .as_ref()
            .filter(|notice| notice.enabled);
        Self {
            root: page_tree(options, notice, container),
            guides,
            classes,
            forms,
            load_error: None,
        }
    }

    /// The static failure page. Nothing from a partial document is shown.
    pub fn failed(err: &LoadError, options: &PageOptions) -> Self {
        error!(error = %err, "failed to load guide document");
        let container = Element::new("div").with_id(ACCORDION_ID).with_child(
            Element::new("p")
                .with_class("load-error")
                .with_text(LOAD_FAILURE_MESSAGE),
        );
        Self {
            root: page_tree(options, None, container),
            guides: Vec::new(),
            classes: Vec::new(),
            forms: Vec::new(),
            load_error: Some(err.to_string()),
        }
    }

    pub fn from_result(
        result: Result<GuideSource, LoadError>,
        options: &PageOptions,
        registry: &StrategyRegistry,
    ) -> Self {
        match result {
            Ok(source) => Self::render(&source, options, registry),
            Err(err) => Self::failed(&err, options),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_error.is_none()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn html(&self) -> String {
        self.root.to_html()
    }

    /// Visit every element of the page, parents first.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        self.root.walk_mut(visit);
    }

    /// Every copy control currently on the page.
    pub fn copy_buttons(&self) -> Vec<CopyButton> {
        let mut buttons: Vec<CopyButton> = self
            .guides
            .iter()
            .enumerate()
            .filter(|(_, guide)| guide.form.is_none())
            .map(|(idx, _)| CopyButton::Guide(idx + 1))
            .collect();
        for built in &self.forms {
            match &built.binding {
                FormBinding::Action { .. } => {
                    buttons.push(CopyButton::Generated(built.form_id.clone()))
                }
                FormBinding::Toolkit(_) => buttons.extend(
                    CopyTarget::ALL
                        .into_iter()
                        .map(|target| CopyButton::Toolkit(built.form_id.clone(), target)),
                ),
                FormBinding::Unbound => {}
            }
        }
        buttons.retain(|button| self.has_copy_button(button));
        buttons
    }

    /// Guides after placeholder substitution, in display order.
    pub fn guides(&self) -> &[GuideEntry] {
        &self.guides
    }

    pub fn content_class(&self, index: usize) -> Option<ContentClass> {
        index.checked_sub(1).and_then(|idx| self.classes.get(idx)).copied()
    }

    pub fn forms(&self) -> &[BuiltForm] {
        &self.forms
    }

    pub fn form(&self, form_id: &str) -> Option<&BuiltForm> {
        self.forms.iter().find(|built| built.form_id == form_id)
    }

    /// Fresh accordion sized from the current panel contents.
    pub fn accordion(&self) -> AccordionController {
        AccordionController::new((1..=self.guides.len()).map(|index| self.panel_height(index)))
    }

    pub fn panel_height(&self, index: usize) -> u32 {
        self.root
            .find_by_id(&content_inner_id(index))
            .map(Element::natural_height)
            .unwrap_or(0)
    }

    /// Mirror accordion state onto the tree.
    pub fn sync(&mut self, accordion: &AccordionController, no_results: bool) {
        for item in accordion.items() {
            let Some(el) = self.root.find_by_id_mut(&item_id(item.index)) else {
                continue;
            };
            if item.is_open {
                el.add_class("active");
            } else {
                el.remove_class("active");
            }
            el.set_hidden(!item.is_visible);
            if let Some(content) = el.find_by_class_mut("accordion-content") {
                content.set_attr("data-max-height", item.max_height.to_string());
                content.set_attr("style", format!("max-height: {}px", item.max_height));
            }
        }
        if let Some(message) = self.root.find_by_id_mut(NO_RESULTS_ID) {
            message.set_hidden(!no_results);
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        if let Some(input) = self.root.find_by_id_mut(SEARCH_INPUT_ID) {
            input.set_value(term);
        }
    }

    pub fn set_search_placeholder(&mut self, prompt: &str, faded: bool) {
        if let Some(input) = self.root.find_by_id_mut(SEARCH_INPUT_ID) {
            input.set_attr("placeholder", prompt);
            toggle_class(input, PLACEHOLDER_FADE_CLASS, faded);
        }
    }

    pub fn set_video_hub_text(&mut self, text: &str, faded: bool) {
        if let Some(span) = self
            .root
            .find_by_class_mut(VIDEO_HUB_CLASS)
            .and_then(|link| link.find_mut(&|el| el.tag() == "span"))
        {
            span.set_text(text);
            toggle_class(span, TEXT_FADE_CLASS, faded);
        }
    }

    pub fn set_counter(&mut self, count: u64) {
        if let Some(span) = self.root.find_by_class_mut(COUNTER_CLASS) {
            span.set_text(counter_label(count));
        }
    }

    pub fn set_highlight(&mut self, index: usize, on: bool) {
        if let Some(item) = self.root.find_by_id_mut(&item_id(index)) {
            toggle_class(item, HIGHLIGHT_CLASS, on);
        }
    }

    /// Write a control's value. Returns false when no such control exists.
    pub fn set_field(&mut self, id: &str, value: &str) -> bool {
        match self
            .root
            .find_mut(&|el| el.id() == Some(id) && matches!(el.tag(), "input" | "select"))
        {
            Some(control) => {
                control.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Current values of an input form's controls, read from the tree.
    pub fn field_values(&self, form_id: &str) -> FieldValues {
        let mut values = FieldValues::new();
        let Some((form, _)) = self.form(form_id).and_then(BuiltForm::input_form) else {
            return values;
        };
        for field in &form.fields {
            if let Some(value) = self.root.find_by_id(&field.id).and_then(Element::value) {
                values.insert(field.id.clone(), value.to_string());
            }
        }
        values
    }

    pub fn show_result(&mut self, form_id: &str, message: &str) -> Option<ContentChanged> {
        let built = self.forms.iter().find(|built| built.form_id == form_id)?;
        built.show_result(&mut self.root, message)
    }

    /// Swap an action control between its resting text and "Generated!".
    pub fn set_generated_feedback(&mut self, form_id: &str, active: bool) {
        let Some((form, _)) = self.form(form_id).and_then(BuiltForm::input_form) else {
            return;
        };
        let (button_id, resting) = (form.button.id.clone(), form.button.text.clone());
        if let Some(button) = self.root.find_by_id_mut(&button_id) {
            if active {
                button.clear();
                button.push_markup(GENERATED_LABEL);
            } else {
                button.set_text(resting);
            }
            toggle_class(button, "generated", active);
        }
    }

    pub fn has_copy_button(&self, button: &CopyButton) -> bool {
        self.root.find_by_attr(COPY_KEY_ATTR, &button.key()).is_some()
    }

    pub fn set_copy_feedback(&mut self, button: &CopyButton, active: bool) {
        let Some(el) = self.root.find_by_attr_mut(COPY_KEY_ATTR, &button.key()) else {
            return;
        };
        el.clear();
        el.push_markup(if active { button.copied_label() } else { button.label() });
        if let Some(class) = button.copied_class() {
            toggle_class(el, class, active);
        }
    }

    /// Exact text a copy control writes, or `None` if it has nothing to copy.
    pub fn copy_text(&self, button: &CopyButton) -> Option<String> {
        match button {
            CopyButton::Guide(index) => index
                .checked_sub(1)
                .and_then(|idx| self.guides.get(idx))
                .filter(|guide| guide.form.is_none())
                .map(|guide| guide.content.clone()),
            CopyButton::Generated(form_id) => {
                let (form, _) = self.form(form_id)?.input_form()?;
                self.root
                    .find_by_id(&form.result.id)
                    .and_then(Element::value)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            }
            CopyButton::Toolkit(form_id, target) => match &self.form(form_id)?.binding {
                FormBinding::Toolkit(blocks) => Some(strategy::toolkit_copy_text(blocks, *target)),
                _ => None,
            },
        }
    }
}

fn toggle_class(el: &mut Element, class: &str, on: bool) {
    if on {
        el.add_class(class);
    } else {
        el.remove_class(class);
    }
}

fn accordion_item(index: usize, title: &str, inner: Element) -> Element {
    let header = Element::new("div")
        .with_class("accordion-header")
        .with_child(
            Element::new("div")
                .with_class("accordion-number")
                .with_text(index.to_string()),
        )
        .with_child(Element::new("h2").with_text(title))
        .with_child(
            Element::new("i")
                .with_class("icon")
                .with_class("fas")
                .with_class("fa-chevron-down"),
        );
    let content = Element::new("div")
        .with_class("accordion-content")
        .with_attr("data-max-height", "0")
        .with_attr("style", "max-height: 0px")
        .with_child(inner);
    Element::new("div")
        .with_id(item_id(index))
        .with_class("accordion-item")
        .with_attr("data-guide-index", index.to_string())
        .with_child(header)
        .with_child(content)
}

/// Notice content is written twice so the marquee can loop seamlessly.
fn marquee(notice: &ScrollingNotice) -> Element {
    let content = placeholder::resolve_notice(&notice.content);
    let block = Element::new("div")
        .with_class("marquee-content-block")
        .with_markup(content);
    Element::new("div").with_class("marquee-bar").with_child(
        Element::new("div")
            .with_class("marquee-content")
            .with_child(block.clone())
            .with_child(block),
    )
}

fn page_tree(options: &PageOptions, notice: Option<&ScrollingNotice>, container: Element) -> Element {
    let mut marquee_container = Element::new("div").with_id(MARQUEE_ID);
    if let Some(notice) = notice {
        marquee_container.push(marquee(notice));
    }
    let video_hub = Element::new("div")
        .with_class("video-hub")
        .with_child(
            Element::new("a")
                .with_class(VIDEO_HUB_CLASS)
                .with_attr("href", &options.video_hub_url)
                .with_attr("target", "_blank")
                .with_markup(r#"<i class="fab fa-youtube"></i> "#)
                .with_child(Element::new("span").with_text(VIDEO_HUB_TEXTS[0])),
        )
        .with_child(
            Element::new("span")
                .with_class(COUNTER_CLASS)
                .with_text(counter_label(0)),
        );
    let search = Element::new("div")
        .with_class("search-container")
        .with_child(
            Element::new("input")
                .with_id(SEARCH_INPUT_ID)
                .with_attr("type", "search")
                .with_attr("placeholder", SEARCH_PROMPTS[0])
                .with_attr("autocomplete", "off"),
        )
        .with_child(
            Element::new("p")
                .with_id(NO_RESULTS_ID)
                .with_text(NO_RESULTS_MESSAGE)
                .hidden(true),
        );
    Element::new("div")
        .with_id("playbook")
        .with_child(marquee_container)
        .with_child(video_hub)
        .with_child(search)
        .with_child(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::REFERRAL_PLACEHOLDER;
    use crate::strategy::CopyTarget;

    fn source() -> GuideSource {
        GuideSource::from_json(&format!(
            r#"{{
                "scrolling_notice": {{ "enabled": true, "content": "Call [tel:0800]" }},
                "instructions": [
                    {{ "title": "Register", "content": "Use https://x.example/?ref={REFERRAL_PLACEHOLDER}\n*now*" }},
                    {{ "title": "Toolkit", "content": "Copy these", "form": {{
                        "id": "kit",
                        "text_blocks": {{ "plans": "P", "details": "D" }},
                        "calculation_logic": "setupRegistrationToolkit" }} }}
                ]
            }}"#
        ))
        .unwrap()
    }

    fn options(ref_id: Option<&str>) -> PageOptions {
        PageOptions {
            ref_id: ref_id.map(str::to_string),
            ..PageOptions::default()
        }
    }

    #[test]
    fn renders_indexed_items_with_translated_content() {
        let ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        assert!(ctx.is_loaded());
        let html = ctx.html();
        assert!(html.contains(r#"id="guide-1" class="accordion-item" data-guide-index="1""#));
        assert!(html.contains(r#"data-guide-index="2""#));
        assert!(html.contains("<strong>now</strong>"));
        assert!(html.contains(r#"<div class="accordion-number">2</div>"#));
        assert_eq!(ctx.content_class(1), Some(ContentClass::Links));
        assert!(ctx.has_copy_button(&CopyButton::Guide(1)));
        assert!(!ctx.has_copy_button(&CopyButton::Guide(2)));
    }

    #[test]
    fn referral_id_reaches_content_and_copy_text() {
        let ctx = RenderContext::render(&source(), &options(Some("ada01")), &StrategyRegistry::default());
        let copied = ctx.copy_text(&CopyButton::Guide(1)).unwrap();
        assert!(copied.contains("ref=ada01"));
        assert!(copied.contains("*now*"));
        assert!(!ctx.html().contains(REFERRAL_PLACEHOLDER));

        let ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        assert!(ctx.copy_text(&CopyButton::Guide(1)).unwrap().contains(REFERRAL_PLACEHOLDER));
    }

    #[test]
    fn notice_is_rendered_twice_when_enabled() {
        let ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        assert_eq!(ctx.html().matches("marquee-content-block").count(), 2);
        assert!(ctx.html().contains("tel-link"));

        let mut disabled = source();
        disabled.scrolling_notice.as_mut().unwrap().enabled = false;
        let ctx = RenderContext::render(&disabled, &options(None), &StrategyRegistry::default());
        assert!(!ctx.html().contains("marquee-bar"));
    }

    #[test]
    fn load_failure_renders_single_message() {
        let err = GuideSource::from_json("{").unwrap_err();
        let ctx = RenderContext::failed(&err, &PageOptions::default());
        assert!(!ctx.is_loaded());
        let html = ctx.html();
        assert!(html.contains(LOAD_FAILURE_MESSAGE));
        assert!(!html.contains("accordion-item"));
        assert!(ctx.guides().is_empty());
    }

    #[test]
    fn sync_mirrors_accordion_state() {
        let mut ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        let mut accordion = ctx.accordion();
        accordion.activate(2);
        let outcome = accordion.filter("register", ctx.guides());
        ctx.sync(&accordion, outcome.no_results);
        let second = ctx.root().find_by_id("guide-2").unwrap();
        assert!(second.has_class("active"));
        assert!(second.is_hidden());
        assert!(!ctx.root().find_by_id("guide-1").unwrap().is_hidden());
        assert!(ctx.root().find_by_id(NO_RESULTS_ID).unwrap().is_hidden());
        assert!(ctx.panel_height(2) > 0);
    }

    #[test]
    fn toolkit_copy_texts_come_from_binding() {
        let ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        let all = CopyButton::Toolkit("kit".to_string(), CopyTarget::All);
        assert_eq!(ctx.copy_text(&all).as_deref(), Some("P\n\nD"));
        assert_eq!(ctx.copy_text(&CopyButton::Generated("kit".to_string())), None);
        let buttons = ctx.copy_buttons();
        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[0], CopyButton::Guide(1));
    }

    #[test]
    fn copy_feedback_swaps_label_and_class() {
        let mut ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        let button = CopyButton::Guide(1);
        ctx.set_copy_feedback(&button, true);
        let el = ctx.root().find_by_attr(COPY_KEY_ATTR, &button.key()).unwrap();
        assert!(el.has_class("copied"));
        assert!(el.text_content().contains("Copied!"));
        ctx.set_copy_feedback(&button, false);
        let el = ctx.root().find_by_attr(COPY_KEY_ATTR, &button.key()).unwrap();
        assert!(!el.has_class("copied"));
        assert!(el.text_content().contains("Copy for WhatsApp"));
    }

    #[test]
    fn chrome_shows_counter_and_rotating_texts() {
        let mut ctx = RenderContext::render(&source(), &options(None), &StrategyRegistry::default());
        assert!(ctx.html().contains("Total Clicks: 0"));
        ctx.set_counter(12);
        ctx.set_video_hub_text(VIDEO_HUB_TEXTS[1], true);
        ctx.set_search_placeholder(SEARCH_PROMPTS[2], false);
        let html = ctx.html();
        assert!(html.contains("Total Clicks: 12"));
        assert!(html.contains(VIDEO_HUB_TEXTS[1]));
        assert!(html.contains(TEXT_FADE_CLASS));
        assert!(html.contains("Looking for &#39;commissions&#39;?"));
    }
}
