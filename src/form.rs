//! Builds interactive widgets from form descriptors.

use crate::accordion::ContentChanged;
use crate::dom::Element;
use crate::guide::{FieldDescriptor, FieldKind, FormDescriptor, InputForm, TextBlocks, ToolkitForm};
use crate::strategy::{CopyTarget, Strategy, StrategyRegistry};
use tracing::debug;

pub const COPY_KEY_ATTR: &str = "data-copy-key";
pub const COPIED_LABEL: &str = r#"<i class="fas fa-check"></i> Copied!"#;
pub const GENERATED_LABEL: &str = r#"<i class="fas fa-check"></i> Generated!"#;

/// A form after it has been materialized under a guide's content container.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltForm {
    pub guide: usize,
    pub form_id: String,
    pub binding: FormBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormBinding {
    /// Input form: the action control dispatches to `strategy`.
    Action {
        form: InputForm,
        strategy: Strategy,
    },
    /// Toolkit whose content was fixed at build time.
    Toolkit(TextBlocks),
    /// Toolkit shape with a strategy that does not build toolkits.
    Unbound,
}

/// Every copy control on a page, addressable by a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CopyButton {
    Guide(usize),
    Generated(String),
    Toolkit(String, CopyTarget),
}

impl CopyButton {
    pub fn key(&self) -> String {
        match self {
            CopyButton::Guide(index) => format!("guide:{index}"),
            CopyButton::Generated(form_id) => format!("generated:{form_id}"),
            CopyButton::Toolkit(form_id, target) => format!("toolkit:{form_id}:{}", target.as_str()),
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (kind, rest) = key.split_once(':')?;
        match kind {
            "guide" => rest.parse().ok().map(CopyButton::Guide),
            "generated" => Some(CopyButton::Generated(rest.to_string())),
            "toolkit" => {
                let (form_id, target) = rest.rsplit_once(':')?;
                CopyTarget::parse(target).map(|t| CopyButton::Toolkit(form_id.to_string(), t))
            }
            _ => None,
        }
    }

    /// Resting label markup of the control.
    pub fn label(&self) -> &'static str {
        match self {
            CopyButton::Guide(_) => r#"<i class="fas fa-copy"></i> <span>Copy for WhatsApp</span>"#,
            CopyButton::Generated(_) => r#"<i class="fas fa-copy"></i> Copy Message"#,
            CopyButton::Toolkit(_, CopyTarget::Plans) => {
                r#"<i class="fas fa-copy"></i> Copy Plans &amp; Benefits"#
            }
            CopyButton::Toolkit(_, CopyTarget::Details) => {
                r#"<i class="fas fa-copy"></i> Copy Registration Form"#
            }
            CopyButton::Toolkit(_, CopyTarget::All) => {
                r#"<i class="fas fa-clipboard-list"></i> Copy Both Messages Together"#
            }
        }
    }

    /// Acknowledgement shown for two seconds after a successful copy.
    pub fn copied_label(&self) -> &'static str {
        match self {
            CopyButton::Guide(_) => r#"<i class="fas fa-copy"></i> <span>Copied!</span>"#,
            _ => COPIED_LABEL,
        }
    }

    /// The generated-message control swaps its label only.
    pub fn copied_class(&self) -> Option<&'static str> {
        match self {
            CopyButton::Generated(_) => None,
            _ => Some("copied"),
        }
    }
}

pub fn copy_button(button: &CopyButton, class: &str) -> Element {
    Element::new("button")
        .with_class(class)
        .with_attr("type", "button")
        .with_attr(COPY_KEY_ATTR, button.key())
        .with_markup(button.label())
}

/// Materialize `descriptor` under `mount` and bind its strategy.
pub fn build(
    descriptor: &FormDescriptor,
    guide: usize,
    mount: &mut Element,
    registry: &StrategyRegistry,
) -> BuiltForm {
    let strategy = registry.resolve(descriptor.calculation_logic());
    if let Strategy::Noop(name) = &strategy {
        debug!(form = descriptor.id(), strategy = %name, "unknown calculation strategy; binding no-op");
    }
    let (wrapper, binding) = match descriptor {
        FormDescriptor::Input(form) => (
            build_input_form(form),
            FormBinding::Action {
                form: form.clone(),
                strategy,
            },
        ),
        FormDescriptor::Toolkit(form) => match strategy {
            Strategy::RegistrationToolkit => {
                (build_toolkit(form), FormBinding::Toolkit(form.text_blocks.clone()))
            }
            _ => (form_wrapper(&form.id), FormBinding::Unbound),
        },
    };
    mount.push(wrapper);
    BuiltForm {
        guide,
        form_id: descriptor.id().to_string(),
        binding,
    }
}

fn form_wrapper(id: &str) -> Element {
    Element::new("div").with_class("form-in-guide").with_id(id)
}

fn build_input_form(form: &InputForm) -> Element {
    let mut wrapper = form_wrapper(&form.id);
    for field in &form.fields {
        wrapper.push(build_field(field));
    }
    wrapper.push(
        Element::new("button")
            .with_id(&form.button.id)
            .with_class("form-action-btn")
            .with_attr("type", "button")
            .with_text(&form.button.text),
    );
    let mut result = Element::new("div").with_class("form-result-wrapper").hidden(true);
    if form.result.kind == "textarea" {
        result.push(
            Element::new("textarea")
                .with_id(&form.result.id)
                .with_attr("readonly", "readonly"),
        );
    }
    wrapper.push(result);
    wrapper
}

fn build_field(field: &FieldDescriptor) -> Element {
    let label = Element::new("label")
        .with_attr("for", &field.id)
        .with_text(&field.label);
    let control = match &field.kind {
        FieldKind::Select => field.options.iter().fold(
            Element::new("select").with_id(&field.id),
            |select, opt| {
                select.with_child(
                    Element::new("option")
                        .with_attr("value", &opt.value)
                        .with_text(&opt.text),
                )
            },
        ),
        FieldKind::Input(kind) => Element::new("input")
            .with_id(&field.id)
            .with_attr("type", kind)
            .with_attr("placeholder", field.placeholder.as_deref().unwrap_or_default()),
    };
    Element::new("div")
        .with_class("form-group")
        .with_child(label)
        .with_child(control)
}

fn build_toolkit(form: &ToolkitForm) -> Element {
    let section = |heading: &str, text: &str, target: CopyTarget| {
        Element::new("div")
            .with_class("toolkit-section")
            .with_child(Element::new("h4").with_text(heading))
            .with_child(
                Element::new("textarea")
                    .with_attr("readonly", "readonly")
                    .with_value(text),
            )
            .with_child(
                copy_button(&CopyButton::Toolkit(form.id.clone(), target), "toolkit-copy-btn")
                    .with_attr("data-copy-target", target.as_str()),
            )
    };
    form_wrapper(&form.id)
        .with_child(section(
            "Plans & Benefits Message",
            &form.text_blocks.plans,
            CopyTarget::Plans,
        ))
        .with_child(section(
            "Registration Details Form",
            &form.text_blocks.details,
            CopyTarget::Details,
        ))
        .with_child(
            copy_button(&CopyButton::Toolkit(form.id.clone(), CopyTarget::All), "form-action-btn")
                .with_attr("data-copy-target", CopyTarget::All.as_str()),
        )
}

impl BuiltForm {
    pub fn input_form(&self) -> Option<(&InputForm, &Strategy)> {
        match &self.binding {
            FormBinding::Action { form, strategy } => Some((form, strategy)),
            _ => None,
        }
    }

    /// Write a generated message into the result surface, reveal it and attach
    /// the copy control once.
    pub fn show_result(&self, mount: &mut Element, message: &str) -> Option<ContentChanged> {
        let (form, _) = self.input_form()?;
        let wrapper = mount.find_by_id_mut(&self.form_id)?;
        let result = wrapper.find_by_class_mut("form-result-wrapper")?;
        result.find_by_id_mut(&form.result.id)?.set_value(message);
        result.set_hidden(false);
        let copy = CopyButton::Generated(self.form_id.clone());
        if result.find_by_attr(COPY_KEY_ATTR, &copy.key()).is_none() {
            result.push(copy_button(&copy, "copy-generated-text-btn"));
        }
        Some(ContentChanged { guide: self.guide })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::GuideSource;

    fn forms() -> GuideSource {
        GuideSource::from_json(
            r#"{ "instructions": [
                { "title": "W", "content": "", "form": {
                    "id": "welcomeForm",
                    "fields": [
                        { "id": "newMemberName", "label": "Name", "type": "text" },
                        { "id": "age", "label": "Age", "type": "number", "placeholder": "42" },
                        { "id": "packageType", "label": "Package", "type": "select",
                          "options": [ { "value": "s", "text": "Silver" }, { "value": "g", "text": "Gold" } ] }
                    ],
                    "button": { "id": "go", "text": "Generate" },
                    "result": { "id": "out", "type": "textarea" },
                    "calculation_logic": "generateWelcomeMessage" } },
                { "title": "T", "content": "", "form": {
                    "id": "kit",
                    "text_blocks": { "plans": "P & more", "details": "D" },
                    "calculation_logic": "setupRegistrationToolkit" } },
                { "title": "X", "content": "", "form": {
                    "id": "mystery",
                    "fields": [],
                    "button": { "id": "m", "text": "M" },
                    "result": { "id": "mo", "type": "textarea" },
                    "calculation_logic": "doesNotExist" } }
            ] }"#,
        )
        .unwrap()
    }

    fn build_guide(index: usize) -> (Element, BuiltForm) {
        let source = forms();
        let descriptor = source.guide(index).unwrap().form.clone().unwrap();
        let mut mount = Element::new("div");
        let built = build(&descriptor, index, &mut mount, &StrategyRegistry::default());
        (mount, built)
    }

    #[test]
    fn input_form_materializes_fields_and_hidden_result() {
        let (mount, built) = build_guide(1);
        assert!(matches!(
            built.binding,
            FormBinding::Action { strategy: Strategy::WelcomeMessage, .. }
        ));
        let html = mount.to_html();
        assert!(html.starts_with(r#"<div><div id="welcomeForm" class="form-in-guide">"#));
        assert!(html.contains(r#"<input id="age" type="number" placeholder="42">"#));
        assert!(html.contains(r#"<input id="newMemberName" type="text" placeholder="">"#));
        assert!(html.contains(r#"<option value="g">Gold</option>"#));
        let result = mount.find_by_id("out").unwrap();
        assert_eq!(result.tag(), "textarea");
        let wrapper = mount
            .find(&|el| el.has_class("form-result-wrapper"))
            .unwrap();
        assert!(wrapper.is_hidden());
    }

    #[test]
    fn toolkit_is_fully_built_with_three_copy_controls() {
        let (mount, built) = build_guide(2);
        assert!(matches!(built.binding, FormBinding::Toolkit(_)));
        for target in CopyTarget::ALL {
            let key = CopyButton::Toolkit("kit".to_string(), target).key();
            let button = mount.find_by_attr(COPY_KEY_ATTR, &key).unwrap();
            assert_eq!(button.attr("data-copy-target"), Some(target.as_str()));
        }
        assert!(mount.to_html().contains("P &amp; more"));
    }

    #[test]
    fn unknown_strategy_binds_noop() {
        let (_, built) = build_guide(3);
        let (_, strategy) = built.input_form().unwrap();
        assert_eq!(strategy, &Strategy::Noop("doesNotExist".to_string()));
    }

    #[test]
    fn toolkit_with_foreign_strategy_stays_empty() {
        let descriptor = FormDescriptor::Toolkit(ToolkitForm {
            id: "kit2".to_string(),
            text_blocks: TextBlocks {
                plans: "P".to_string(),
                details: "D".to_string(),
            },
            calculation_logic: "generateWelcomeMessage".to_string(),
        });
        let mut mount = Element::new("div");
        let built = build(&descriptor, 1, &mut mount, &StrategyRegistry::default());
        assert_eq!(built.binding, FormBinding::Unbound);
        assert!(mount.find_by_id("kit2").unwrap().children().is_empty());
    }

    #[test]
    fn show_result_reveals_and_attaches_copy_once() {
        let (mut mount, built) = build_guide(1);
        let before = mount.natural_height();
        let changed = built.show_result(&mut mount, "hello\nworld").unwrap();
        assert_eq!(changed.guide, 1);
        assert!(mount.natural_height() > before);
        built.show_result(&mut mount, "again").unwrap();
        let copies = mount.to_html().matches("copy-generated-text-btn").count();
        assert_eq!(copies, 1);
        assert_eq!(mount.find_by_id("out").unwrap().value(), Some("again"));
    }

    #[test]
    fn copy_keys_round_trip() {
        for button in [
            CopyButton::Guide(4),
            CopyButton::Generated("welcomeForm".to_string()),
            CopyButton::Toolkit("kit".to_string(), CopyTarget::Details),
        ] {
            assert_eq!(CopyButton::parse(&button.key()), Some(button));
        }
        assert_eq!(CopyButton::parse("guide:x"), None);
        assert_eq!(CopyButton::parse("nope"), None);
    }
}
