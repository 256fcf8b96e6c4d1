//! Typed model of the guide document.
//!
//! The same file is compiled into `build.rs` to validate the embedded
//! document, so it must only depend on `serde`, `serde_json` and `std`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The whole JSON document: an optional scrolling notice and the ordered guides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrolling_notice: Option<ScrollingNotice>,
    pub instructions: Vec<GuideEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideEntry {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollingNotice {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub content: String,
}

/// A form embedded in a guide. Descriptors carrying `fields` are input forms;
/// anything else is a zero-input toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormDescriptor {
    Input(InputForm),
    Toolkit(ToolkitForm),
}

impl FormDescriptor {
    pub fn id(&self) -> &str {
        match self {
            FormDescriptor::Input(form) => &form.id,
            FormDescriptor::Toolkit(form) => &form.id,
        }
    }

    pub fn calculation_logic(&self) -> &str {
        match self {
            FormDescriptor::Input(form) => &form.calculation_logic,
            FormDescriptor::Toolkit(form) => &form.calculation_logic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputForm {
    pub id: String,
    pub fields: Vec<FieldDescriptor>,
    pub button: ButtonDescriptor,
    pub result: ResultDescriptor,
    #[serde(default)]
    pub calculation_logic: String,
}

impl InputForm {
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolkitForm {
    pub id: String,
    pub text_blocks: TextBlocks,
    #[serde(default)]
    pub calculation_logic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlocks {
    pub plans: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FieldDescriptor {
    /// Display label of the option whose value is `value`, falling back to the
    /// first option the way a browser preselects it.
    pub fn option_label(&self, value: Option<&str>) -> Option<&str> {
        value
            .and_then(|value| self.options.iter().find(|opt| opt.value == value))
            .or_else(|| self.options.first())
            .map(|opt| opt.text.as_str())
    }
}

/// `select` enumerates options; every other type renders as an `<input>` whose
/// native type mirrors the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Select,
    Input(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Select => "select",
            FieldKind::Input(kind) => kind,
        }
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        if value == "select" {
            FieldKind::Select
        } else {
            FieldKind::Input(value)
        }
    }
}

impl From<FieldKind> for String {
    fn from(value: FieldKind) -> Self {
        match value {
            FieldKind::Select => "select".to_string(),
            FieldKind::Input(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDescriptor {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Embedded(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read guide document: {err}"),
            LoadError::Json(err) => write!(f, "malformed guide document: {err}"),
            LoadError::Embedded(message) => write!(f, "embedded guide document: {message}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Json(err) => Some(err),
            LoadError::Embedded(_) => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(value: std::io::Error) -> Self {
        LoadError::Io(value)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        LoadError::Json(value)
    }
}

impl GuideSource {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Guide by its 1-based display index.
    pub fn guide(&self, index: usize) -> Option<&GuideEntry> {
        index
            .checked_sub(1)
            .and_then(|idx| self.instructions.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "scrolling_notice": { "enabled": true, "content": "Call [tel:+234 800 000]" },
        "instructions": [
            { "title": "Plain", "content": "*Hello*" },
            {
                "title": "Welcome",
                "content": "Fill the form",
                "form": {
                    "id": "welcomeForm",
                    "fields": [
                        { "id": "newMemberName", "label": "Name", "type": "text", "placeholder": "e.g. Ada" },
                        { "id": "packageType", "label": "Package", "type": "select",
                          "options": [ { "value": "gold", "text": "Gold" }, { "value": "silver", "text": "Silver" } ] }
                    ],
                    "button": { "id": "generateBtn", "text": "Generate" },
                    "result": { "id": "welcomeResult", "type": "textarea" },
                    "calculation_logic": "generateWelcomeMessage"
                }
            },
            {
                "title": "Toolkit",
                "content": "Copy these",
                "form": {
                    "id": "regToolkit",
                    "text_blocks": { "plans": "Plans", "details": "Details" },
                    "calculation_logic": "setupRegistrationToolkit"
                }
            }
        ]
    }"#;

    #[test]
    fn parses_both_form_shapes() {
        let source = GuideSource::from_json(SAMPLE).expect("sample parses");
        assert_eq!(source.len(), 3);
        assert!(source.guide(1).unwrap().form.is_none());
        match source.guide(2).unwrap().form.as_ref().unwrap() {
            FormDescriptor::Input(form) => {
                assert_eq!(form.fields.len(), 2);
                assert_eq!(form.fields[1].kind, FieldKind::Select);
                assert_eq!(form.fields[0].kind, FieldKind::Input("text".to_string()));
                assert_eq!(form.calculation_logic, "generateWelcomeMessage");
            }
            other => panic!("expected input form, got {other:?}"),
        }
        match source.guide(3).unwrap().form.as_ref().unwrap() {
            FormDescriptor::Toolkit(form) => assert_eq!(form.text_blocks.details, "Details"),
            other => panic!("expected toolkit, got {other:?}"),
        }
    }

    #[test]
    fn guide_index_is_one_based() {
        let source = GuideSource::from_json(SAMPLE).unwrap();
        assert!(source.guide(0).is_none());
        assert_eq!(source.guide(3).unwrap().title, "Toolkit");
        assert!(source.guide(4).is_none());
    }

    #[test]
    fn option_label_falls_back_to_first_option() {
        let source = GuideSource::from_json(SAMPLE).unwrap();
        let Some(FormDescriptor::Input(form)) = &source.guide(2).unwrap().form else {
            panic!("expected input form");
        };
        let field = form.field("packageType").unwrap();
        assert_eq!(field.option_label(Some("silver")), Some("Silver"));
        assert_eq!(field.option_label(Some("unknown")), Some("Gold"));
        assert_eq!(field.option_label(None), Some("Gold"));
    }

    #[test]
    fn missing_instructions_is_a_load_error() {
        let err = GuideSource::from_json(r#"{ "scrolling_notice": null }"#).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
        assert!(err.to_string().contains("malformed"));
    }
}
