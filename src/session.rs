//! One page's worth of interactive state.
//!
//! `PageSession` receives user events (header activations, search input,
//! field edits, action and copy clicks) and advances timed sequences on a
//! virtual clock. All rendering goes through the owned `RenderContext`.

use crate::accordion::{AccordionController, ContentChanged};
use crate::counter::{ClickCounter, Subscription};
use crate::form::CopyButton;
use crate::guide::{GuideSource, LoadError};
use crate::render::{PageOptions, RenderContext};
use crate::strategy::{Activation, StrategyRegistry};
use crate::timing::{
    ACK_REVERT, DEEP_LINK_DELAY, FADE, FadeRotator, HIGHLIGHT, PLACEHOLDER_INTERVAL, SEARCH_PROMPTS,
    Scheduler, TimerHandle, VIDEO_HUB_INTERVAL, VIDEO_HUB_TEXTS,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Write access to the system clipboard.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardError {
    message: String,
}

impl ClipboardError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clipboard write failed: {}", self.message)
    }
}

impl std::error::Error for ClipboardError {}

/// No clipboard at all; every write fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::new("no clipboard available"))
    }
}

/// In-process clipboard that remembers the last write.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rotation {
    VideoHub,
    SearchPrompt,
}

impl Rotation {
    fn key(self) -> &'static str {
        match self {
            Rotation::VideoHub => "video-hub",
            Rotation::SearchPrompt => "search-prompt",
        }
    }

    fn interval(self) -> Duration {
        match self {
            Rotation::VideoHub => VIDEO_HUB_INTERVAL,
            Rotation::SearchPrompt => PLACEHOLDER_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerEvent {
    RevertGenerated(String),
    RevertCopy(CopyButton),
    OpenDeepLink(usize),
    ClearHighlight(usize),
    Rotate(Rotation),
    Swap(Rotation),
    Settle(Rotation),
}

pub struct PageSession<C: Clipboard = NoClipboard> {
    ctx: RenderContext,
    accordion: AccordionController,
    clipboard: C,
    playbook_url: String,
    timers: Scheduler<TimerEvent>,
    pending: HashMap<String, TimerHandle>,
    search_term: String,
    no_results: bool,
    notice: Option<String>,
    video_hub: FadeRotator,
    prompts: FadeRotator,
    counter: Option<(ClickCounter, Subscription)>,
    counter_value: Arc<AtomicU64>,
}

impl<C: Clipboard> PageSession<C> {
    pub fn new(ctx: RenderContext, options: &PageOptions, clipboard: C) -> Self {
        let accordion = ctx.accordion();
        let mut session = Self {
            ctx,
            accordion,
            clipboard,
            playbook_url: options.playbook_url.clone(),
            timers: Scheduler::new(),
            pending: HashMap::new(),
            search_term: String::new(),
            no_results: false,
            notice: None,
            video_hub: FadeRotator::new(VIDEO_HUB_TEXTS),
            prompts: FadeRotator::new(SEARCH_PROMPTS),
            counter: None,
            counter_value: Arc::new(AtomicU64::new(0)),
        };
        for rotation in [Rotation::VideoHub, Rotation::SearchPrompt] {
            session.reschedule(
                format!("rotate:{}", rotation.key()),
                rotation.interval(),
                TimerEvent::Rotate(rotation),
            );
        }
        session.sync();
        session
    }

    /// Load-or-fail page construction.
    pub fn load(
        source: Result<GuideSource, LoadError>,
        options: &PageOptions,
        registry: &StrategyRegistry,
        clipboard: C,
    ) -> Self {
        let ctx = RenderContext::from_result(source, options, registry);
        Self::new(ctx, options, clipboard)
    }

    /// Show the shared counter and follow its updates.
    pub fn with_counter(mut self, counter: ClickCounter) -> Self {
        let value = Arc::clone(&self.counter_value);
        let subscription = counter.subscribe(move |count| value.store(count, Ordering::Release));
        self.counter = Some((counter, subscription));
        self.refresh_counter();
        self
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.ctx
    }

    pub fn accordion(&self) -> &AccordionController {
        &self.accordion
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn no_results(&self) -> bool {
        self.no_results
    }

    /// Blocking message raised by the last action, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn html(&mut self) -> String {
        self.refresh_counter();
        self.ctx.html()
    }

    pub fn activate_header(&mut self, index: usize) -> bool {
        let changed = self.accordion.activate(index);
        if changed {
            self.sync();
        }
        changed
    }

    /// Filter on every keystroke; the empty term shows everything. The
    /// failure page has nothing to filter.
    pub fn search(&mut self, term: &str) {
        if !self.ctx.is_loaded() {
            return;
        }
        self.search_term = term.to_string();
        self.ctx.set_search_term(term);
        let outcome = self.accordion.filter(term, self.ctx.guides());
        self.no_results = outcome.no_results;
        self.sync();
    }

    pub fn set_field(&mut self, id: &str, value: &str) -> bool {
        self.ctx.set_field(id, value)
    }

    /// Click on an input form's action control.
    pub fn activate_action(&mut self, form_id: &str) -> Option<Activation> {
        let (form, strategy) = self
            .ctx
            .form(form_id)?
            .input_form()
            .map(|(form, strategy)| (form.clone(), strategy.clone()))?;
        let values = self.ctx.field_values(form_id);
        let activation = strategy.activate(&form, &values, &self.playbook_url);
        match &activation {
            Activation::Generated(message) => {
                if let Some(change) = self.ctx.show_result(form_id, message) {
                    self.content_changed(change);
                }
                self.ctx.set_generated_feedback(form_id, true);
                self.reschedule(
                    format!("generated:{form_id}"),
                    ACK_REVERT,
                    TimerEvent::RevertGenerated(form_id.to_string()),
                );
            }
            Activation::Rejected(err) => self.notice = Some(err.message.clone()),
            Activation::Ignored => debug!(form = form_id, strategy = strategy.name(), "action ignored"),
        }
        Some(activation)
    }

    pub fn copy_text(&self, button: &CopyButton) -> Option<String> {
        self.ctx.copy_text(button)
    }

    /// Click on a copy control. Feedback is only shown when the write succeeds.
    pub fn copy(&mut self, button: &CopyButton) -> bool {
        if !self.ctx.has_copy_button(button) {
            return false;
        }
        let Some(text) = self.ctx.copy_text(button) else {
            return false;
        };
        if let Err(err) = self.clipboard.write_text(&text) {
            warn!(error = %err, control = %button.key(), "copy failed");
            return false;
        }
        self.ctx.set_copy_feedback(button, true);
        self.reschedule(
            format!("copy:{}", button.key()),
            ACK_REVERT,
            TimerEvent::RevertCopy(button.clone()),
        );
        true
    }

    /// Schedule opening of the guide named by a `guide` query value.
    pub fn deep_link(&mut self, requested: Option<&str>) -> Option<usize> {
        let index = self.accordion.deep_link_target(requested?)?;
        self.reschedule(
            "deep-link".to_string(),
            DEEP_LINK_DELAY,
            TimerEvent::OpenDeepLink(index),
        );
        Some(index)
    }

    pub fn click_video_hub(&mut self) -> Option<u64> {
        let value = self.counter.as_ref()?.0.increment();
        self.refresh_counter();
        Some(value)
    }

    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        self.tick(until);
    }

    /// Fire every callback due by `now`, including ones scheduled by earlier
    /// callbacks in the same tick.
    pub fn tick(&mut self, now: Duration) {
        while let Some((handle, event)) = self.timers.next_due(now) {
            self.pending.retain(|_, pending| *pending != handle);
            self.fire(event);
        }
        self.timers.settle_at(now);
    }

    fn fire(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::RevertGenerated(form_id) => self.ctx.set_generated_feedback(&form_id, false),
            TimerEvent::RevertCopy(button) => self.ctx.set_copy_feedback(&button, false),
            TimerEvent::OpenDeepLink(index) => {
                self.activate_header(index);
                self.ctx.set_highlight(index, true);
                self.reschedule(
                    format!("highlight:{index}"),
                    HIGHLIGHT,
                    TimerEvent::ClearHighlight(index),
                );
            }
            TimerEvent::ClearHighlight(index) => self.ctx.set_highlight(index, false),
            TimerEvent::Rotate(rotation) => {
                self.rotator(rotation).start_fade();
                self.show_rotation(rotation);
                self.reschedule(
                    format!("fade:{}", rotation.key()),
                    FADE,
                    TimerEvent::Swap(rotation),
                );
                self.reschedule(
                    format!("rotate:{}", rotation.key()),
                    rotation.interval(),
                    TimerEvent::Rotate(rotation),
                );
            }
            TimerEvent::Swap(rotation) => {
                let rotator = self.rotator(rotation);
                rotator.swap();
                rotator.fade_in();
                self.show_rotation(rotation);
                self.reschedule(
                    format!("fade:{}", rotation.key()),
                    FADE,
                    TimerEvent::Settle(rotation),
                );
            }
            TimerEvent::Settle(rotation) => self.rotator(rotation).settle(),
        }
    }

    fn rotator(&mut self, rotation: Rotation) -> &mut FadeRotator {
        match rotation {
            Rotation::VideoHub => &mut self.video_hub,
            Rotation::SearchPrompt => &mut self.prompts,
        }
    }

    fn show_rotation(&mut self, rotation: Rotation) {
        match rotation {
            Rotation::VideoHub => {
                let (text, faded) = (self.video_hub.current(), self.video_hub.is_faded());
                self.ctx.set_video_hub_text(text, faded);
            }
            Rotation::SearchPrompt => {
                let (text, faded) = (self.prompts.current(), self.prompts.is_faded());
                self.ctx.set_search_placeholder(text, faded);
            }
        }
    }

    fn content_changed(&mut self, change: ContentChanged) {
        let height = self.ctx.panel_height(change.guide);
        self.accordion.on_content_changed(change, height);
        self.sync();
    }

    fn reschedule(&mut self, key: String, delay: Duration, event: TimerEvent) {
        let mut slot = self.pending.remove(&key);
        self.timers.reschedule(&mut slot, delay, event);
        if let Some(handle) = slot {
            self.pending.insert(key, handle);
        }
    }

    fn refresh_counter(&mut self) {
        if self.counter.is_some() {
            self.ctx.set_counter(self.counter_value.load(Ordering::Acquire));
        }
    }

    fn sync(&mut self) {
        self.ctx.sync(&self.accordion, self.no_results);
    }
}
