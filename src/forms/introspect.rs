use crate::dom::{collapse_whitespace, Document, NodeId};
use crate::models::{FieldDescriptor, FormDescriptor, SelectOption};
use crate::page::Page;
use crate::recording::synthesize_selector;

/// Input types that never carry user-entered data
const EXCLUDED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Describe every form on the page that has at least one fillable field
pub fn introspect_forms(page: &Page) -> Vec<FormDescriptor> {
    let doc = page.document();

    doc.elements_by_tag_name(doc.root(), "form")
        .into_iter()
        .enumerate()
        .filter_map(|(index, form)| {
            let fields: Vec<FieldDescriptor> = doc
                .descendants(form)
                .into_iter()
                .filter_map(|node| describe_field(doc, node))
                .collect();
            if fields.is_empty() {
                return None;
            }

            let id = doc
                .element(form)
                .and_then(|e| e.non_empty_attr("id"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("form-{}", index));

            Some(FormDescriptor {
                id,
                selector: synthesize_selector(doc, form),
                action: page.form_action(form),
                method: page.form_method(form),
                fields,
            })
        })
        .collect()
}

fn describe_field(doc: &Document, node: NodeId) -> Option<FieldDescriptor> {
    let element = doc.element(node)?;
    let field_type = match element.tag() {
        "input" => {
            let input_type = element.input_type();
            if EXCLUDED_INPUT_TYPES.contains(&input_type.as_str()) {
                return None;
            }
            input_type
        }
        "textarea" => "textarea".to_string(),
        "select" if element.has_attr("multiple") => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        _ => return None,
    };

    let name = element
        .non_empty_attr("name")
        .or_else(|| element.non_empty_attr("id"))
        .unwrap_or("")
        .to_string();

    let options = if element.tag() == "select" {
        doc.options(node)
            .into_iter()
            .map(|option| SelectOption {
                value: doc.option_value(option),
                text: doc.option_text(option),
                selected: doc.option_selected(option),
            })
            .collect()
    } else {
        Vec::new()
    };

    Some(FieldDescriptor {
        name,
        value: doc.value(node),
        label: resolve_label(doc, node),
        required: element.has_attr("required"),
        selector: synthesize_selector(doc, node),
        placeholder: element.attr("placeholder").unwrap_or("").to_string(),
        checked: element.is_toggle().then(|| doc.checked(node)),
        options,
        field_type,
    })
}

/// Associated label, then `label[for=id]`, then placeholder, then aria-label
fn resolve_label(doc: &Document, control: NodeId) -> String {
    let labelled = doc
        .labels(control)
        .into_iter()
        .map(|label| label_text(doc, label))
        .find(|text| !text.is_empty());
    if let Some(text) = labelled {
        return text;
    }

    if let Some(id) = doc.element(control).and_then(|e| e.non_empty_attr("id")) {
        let by_for = doc
            .elements_by_tag_name(doc.root(), "label")
            .into_iter()
            .filter(|label| doc.attr(*label, "for") == Some(id))
            .map(|label| label_text(doc, label))
            .find(|text| !text.is_empty());
        if let Some(text) = by_for {
            return text;
        }
    }

    ["placeholder", "aria-label"]
        .iter()
        .filter_map(|attr| doc.attr(control, attr))
        .map(collapse_whitespace)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Label text without the text of controls nested in it (select options)
fn label_text(doc: &Document, label: NodeId) -> String {
    let (mut copy, label) = doc.clone_subtree(label);
    for nested in copy.descendants(label) {
        if matches!(copy.tag_name(nested), Some("select" | "textarea")) {
            copy.detach(nested);
        }
    }
    collapse_whitespace(&copy.text_content(label))
}
