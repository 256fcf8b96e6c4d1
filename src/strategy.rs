//! Named calculation strategies bound to form descriptors.

use crate::guide::{InputForm, TextBlocks};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub const WELCOME_MESSAGE: &str = "generateWelcomeMessage";
pub const REGISTRATION_TOOLKIT: &str = "setupRegistrationToolkit";

pub const NAME_FIELD: &str = "newMemberName";
pub const HANDLE_FIELD: &str = "newMemberUsername";
pub const PACKAGE_FIELD: &str = "packageType";

pub const DEFAULT_PLAYBOOK_URL: &str = "https://dammieoptimus.github.io/tgr-playbook/";

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Field id to current value, as read from a form's inputs.
pub type FieldValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    WelcomeMessage,
    RegistrationToolkit,
    /// Unrecognized `calculation_logic`; activation does nothing.
    Noop(String),
}

impl Strategy {
    pub fn name(&self) -> &str {
        match self {
            Strategy::WelcomeMessage => WELCOME_MESSAGE,
            Strategy::RegistrationToolkit => REGISTRATION_TOOLKIT,
            Strategy::Noop(name) => name,
        }
    }

    /// Run the strategy bound to an input form's action control.
    pub fn activate(&self, form: &InputForm, values: &FieldValues, playbook_url: &str) -> Activation {
        match self {
            Strategy::WelcomeMessage => {
                let name = values.get(NAME_FIELD).map(String::as_str).unwrap_or_default();
                let handle = values.get(HANDLE_FIELD).map(String::as_str).unwrap_or_default();
                let package = form
                    .field(PACKAGE_FIELD)
                    .and_then(|field| field.option_label(values.get(PACKAGE_FIELD).map(String::as_str)))
                    .unwrap_or_default();
                match generate_welcome_message(name, handle, package, playbook_url) {
                    Ok(message) => Activation::Generated(message),
                    Err(err) => Activation::Rejected(err),
                }
            }
            Strategy::RegistrationToolkit | Strategy::Noop(_) => Activation::Ignored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Generated(String),
    Rejected(ValidationError),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Maps `calculation_logic` names to strategies.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Strategy>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(WELCOME_MESSAGE, Strategy::WelcomeMessage);
        registry.register(REGISTRATION_TOOLKIT, Strategy::RegistrationToolkit);
        registry
    }
}

impl StrategyRegistry {
    pub fn register(&mut self, name: impl Into<String>, strategy: Strategy) {
        self.strategies.insert(name.into(), strategy);
    }

    pub fn resolve(&self, name: &str) -> Strategy {
        self.strategies
            .get(name)
            .cloned()
            .unwrap_or_else(|| Strategy::Noop(name.to_string()))
    }
}

/// Which toolkit block a copy action writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyTarget {
    Plans,
    Details,
    All,
}

impl CopyTarget {
    pub const ALL: [CopyTarget; 3] = [CopyTarget::Plans, CopyTarget::Details, CopyTarget::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyTarget::Plans => "plans",
            CopyTarget::Details => "details",
            CopyTarget::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|target| target.as_str() == value)
    }
}

/// Exact clipboard text for each toolkit copy action.
pub fn toolkit_copy_text(blocks: &TextBlocks, target: CopyTarget) -> String {
    match target {
        CopyTarget::Plans => blocks.plans.clone(),
        CopyTarget::Details => blocks.details.clone(),
        CopyTarget::All => format!("{}\n\n{}", blocks.plans, blocks.details),
    }
}

/// Capitalize the first letter of every word delimited by whitespace, `-` or
/// `'`; everything else is lowercased.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if at_word_start && !ch.is_whitespace() {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = ch.is_whitespace() || ch == '-' || ch == '\'';
    }
    out
}

pub fn playbook_link(base_url: &str, handle: &str) -> String {
    format!("{base_url}?refid={}", utf8_percent_encode(handle, QUERY_VALUE))
}

pub fn generate_welcome_message(
    name: &str,
    handle: &str,
    package_label: &str,
    playbook_url: &str,
) -> Result<String, ValidationError> {
    let name = name.trim();
    let handle = handle.trim();
    if name.is_empty() || handle.is_empty() {
        return Err(ValidationError::new(
            "Please fill in both the name and username.",
        ));
    }
    let name = title_case(name);
    let link = playbook_link(playbook_url, handle);
    Ok(format!(
        "🎉🎉🎉 *BOOM‼️ BOOM‼️ BOOM‼️* 🎉🎉🎉

My dear *TGR FAMILY*, please help me give a *GRAND WELCOME* to our newest superstar 🌟

👨‍🚀 *{name}*
🔑 *Username: {handle}* 🚀

...who just joined *TGR* with the *{package_label}*

🎊🎊 *You're officially WELCOME to your* 🛢️ *TELECOMS SECTOR OIL WELL* 🛢️📲💰
May this journey bring you *MASSIVE EARNINGS* and *UNSTOPPABLE SUCCESS*! 💸🔥

💃🏽🕺🏽💰📞📲🛢️💎🥳


📘 *_All the Information You Need to Use TGR is Here_*
👇🏽👇🏽👇🏽👇🏽

🔗 {link} ✅

_Everything you need — guides, videos, and tools — all in one place!_ 💡📲"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::{ButtonDescriptor, FieldDescriptor, FieldKind, ResultDescriptor, SelectOption};

    fn welcome_form() -> InputForm {
        InputForm {
            id: "welcomeForm".to_string(),
            fields: vec![
                FieldDescriptor {
                    id: NAME_FIELD.to_string(),
                    label: "Name".to_string(),
                    kind: FieldKind::Input("text".to_string()),
                    placeholder: None,
                    options: Vec::new(),
                },
                FieldDescriptor {
                    id: PACKAGE_FIELD.to_string(),
                    label: "Package".to_string(),
                    kind: FieldKind::Select,
                    placeholder: None,
                    options: vec![
                        SelectOption { value: "silver".to_string(), text: "Silver".to_string() },
                        SelectOption { value: "gold".to_string(), text: "Gold".to_string() },
                    ],
                },
            ],
            button: ButtonDescriptor { id: "go".to_string(), text: "Go".to_string() },
            result: ResultDescriptor { id: "out".to_string(), kind: "textarea".to_string() },
            calculation_logic: WELCOME_MESSAGE.to_string(),
        }
    }

    #[test]
    fn welcome_message_normalizes_name_and_embeds_link() {
        let message =
            generate_welcome_message(" john doe ", "jd99", "Gold", DEFAULT_PLAYBOOK_URL).unwrap();
        assert!(message.contains("*John Doe*"));
        assert!(message.contains("Username: jd99"));
        assert!(message.contains("*Gold*"));
        assert!(message.contains("tgr-playbook/?refid=jd99"));
    }

    #[test]
    fn welcome_message_rejects_blank_inputs() {
        for (name, handle) in [("", "jd99"), ("John", ""), ("   ", "jd99"), ("John", " \t ")] {
            let err = generate_welcome_message(name, handle, "Gold", DEFAULT_PLAYBOOK_URL)
                .unwrap_err();
            assert_eq!(err.message, "Please fill in both the name and username.");
        }
    }

    #[test]
    fn title_case_handles_hyphens_and_apostrophes() {
        assert_eq!(title_case("mary-jane o'NEIL"), "Mary-Jane O'Neil");
        assert_eq!(title_case("ADA  obi"), "Ada  Obi");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn playbook_link_encodes_handle() {
        assert_eq!(
            playbook_link("https://x.example/", "a b&c"),
            "https://x.example/?refid=a%20b%26c"
        );
    }

    #[test]
    fn activation_reads_selected_package_label() {
        let form = welcome_form();
        let mut values = FieldValues::new();
        values.insert(NAME_FIELD.to_string(), "ada".to_string());
        values.insert(HANDLE_FIELD.to_string(), "ada01".to_string());
        values.insert(PACKAGE_FIELD.to_string(), "gold".to_string());
        match Strategy::WelcomeMessage.activate(&form, &values, DEFAULT_PLAYBOOK_URL) {
            Activation::Generated(message) => assert!(message.contains("*Gold*")),
            other => panic!("expected message, got {other:?}"),
        }
        values.remove(PACKAGE_FIELD);
        match Strategy::WelcomeMessage.activate(&form, &values, DEFAULT_PLAYBOOK_URL) {
            Activation::Generated(message) => assert!(message.contains("*Silver*")),
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_resolve_to_noop() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.resolve(WELCOME_MESSAGE), Strategy::WelcomeMessage);
        let strategy = registry.resolve("calculateCommission");
        assert_eq!(strategy, Strategy::Noop("calculateCommission".to_string()));
        assert_eq!(strategy.name(), "calculateCommission");
        assert_eq!(
            strategy.activate(&welcome_form(), &FieldValues::new(), DEFAULT_PLAYBOOK_URL),
            Activation::Ignored
        );
    }

    #[test]
    fn toolkit_copy_texts_are_exact() {
        let blocks = TextBlocks {
            plans: "P".to_string(),
            details: "D".to_string(),
        };
        assert_eq!(toolkit_copy_text(&blocks, CopyTarget::Plans), "P");
        assert_eq!(toolkit_copy_text(&blocks, CopyTarget::Details), "D");
        assert_eq!(toolkit_copy_text(&blocks, CopyTarget::All), "P\n\nD");
        assert_eq!(CopyTarget::parse("all"), Some(CopyTarget::All));
        assert_eq!(CopyTarget::parse("x"), None);
    }
}
