//! Progressive help center: JSON guides rendered as an exclusive-open
//! accordion, with WhatsApp-style markup, referral link substitution, search,
//! deep links and small form-driven message generators.

pub mod accordion;
pub mod config;
pub mod counter;
pub mod dom;
pub mod form;
pub mod guide;
pub mod markup;
pub mod placeholder;
pub mod render;
pub mod session;
pub mod strategy;
pub mod timing;
#[cfg(feature = "web")]
pub mod web;

pub use accordion::{AccordionController, AccordionItemState, ContentChanged, SearchOutcome};
pub use config::{GuidesLocation, PlaybookConfig, embedded_guides};
pub use counter::{ClickCounter, Subscription};
pub use form::{BuiltForm, CopyButton, FormBinding};
pub use guide::{FormDescriptor, GuideEntry, GuideSource, LoadError, ScrollingNotice};
pub use markup::{ContentClass, Translation, translate, translate_with_class};
pub use placeholder::REFERRAL_PLACEHOLDER;
pub use render::{PageOptions, RenderContext};
pub use session::{Clipboard, ClipboardError, MemoryClipboard, NoClipboard, PageSession};
pub use strategy::{Activation, CopyTarget, Strategy, StrategyRegistry, ValidationError};
