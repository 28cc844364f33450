use crate::error::DomError;

use super::selector::SelectorList;

/// Index of a node inside its owning [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An element: tag, attributes in source order, and live form-control state
#[derive(Debug, Clone)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    /// Dirty value of an input/textarea, `None` until assigned
    value: Option<String>,
    checked: bool,
    selected: bool,
}

impl ElementData {
    pub fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let attrs: Vec<(String, String)> = attrs
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let checked = attrs.iter().any(|(name, _)| name == "checked");
        let selected = attrs.iter().any(|(name, _)| name == "selected");
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value: None,
            checked,
            selected,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attribute value, treating an empty string as absent
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(attr_name, _)| *attr_name == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.non_empty_attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Lowercased `type` of an input, defaulting to "text"
    pub fn input_type(&self) -> String {
        self.non_empty_attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn is_toggle(&self) -> bool {
        self.tag == "input" && matches!(self.input_type().as_str(), "checkbox" | "radio")
    }
}

/// Arena-backed HTML document with live form state
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Create a detached element; attach it with [`Document::append_child`]
    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag, attrs)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        // a childless node can't be an ancestor of `parent`
        let has_children = !self.children(child).is_empty();
        if parent == child || (has_children && self.contains(child, parent)) {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove a node (and its subtree) from its parent. The node stays in the arena.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|c| *c == node)?;
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(ElementData::tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Inclusive containment check
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Element ancestors, nearest first
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(node), move |n| self.parent_element(*n))
    }

    /// Element descendants of `node` in tree order (excluding `node`)
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            if self.is_element(current) {
                out.push(current);
                pending.extend(self.children(current).iter().rev());
            }
        }
        out
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root).next()
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|c| self.tag_name(*c) == Some("head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|c| self.tag_name(*c) == Some("body"))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.element(*n).and_then(ElementData::id) == Some(id))
    }

    pub fn elements_by_tag_name(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.tag_name(*n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            match self.nodes.get(current.0).map(|n| &n.data) {
                Some(NodeData::Text(text)) => out.push_str(text),
                Some(_) => pending.extend(self.children(current).iter().rev()),
                None => {}
            }
        }
        out
    }

    /// Document title with whitespace collapsed
    pub fn title(&self) -> String {
        self.elements_by_tag_name(self.root, "title")
            .first()
            .map(|t| collapse_whitespace(&self.text_content(*t)))
            .unwrap_or_default()
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        self.query_selector_in(self.root, selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.query_selector_all_in(self.root, selector)
    }

    pub fn query_selector_in(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|n| list.matches(self, *n)))
    }

    pub fn query_selector_all_in(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|n| list.matches(self, *n))
            .collect())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.is_element(node) && list.matches(self, node))
    }

    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|n| self.is_element(*n) && list.matches(self, *n)))
    }

    /// Deep-copy `node` into a fresh document; returns the copy and the new id of `node`
    pub fn clone_subtree(&self, node: NodeId) -> (Document, NodeId) {
        let mut copy = Document::new();
        let root = copy.root();
        let mut cloned = root;
        let mut pending = vec![(root, node)];
        while let Some((parent, source)) = pending.pop() {
            let data = match &self.nodes[source.0].data {
                NodeData::Document => NodeData::Element(ElementData::new("div", Vec::new())),
                other => other.clone(),
            };
            let copied = copy.push_node(data);
            copy.append_child(parent, copied);
            if source == node {
                cloned = copied;
            }
            pending.extend(self.children(source).iter().rev().map(|child| (copied, *child)));
        }
        (copy, cloned)
    }

    // Form-control state

    /// The `value` property of a form control
    pub fn value(&self, node: NodeId) -> String {
        let Some(element) = self.element(node) else {
            return String::new();
        };
        match element.tag() {
            "input" => {
                if let Some(value) = &element.value {
                    return value.clone();
                }
                match element.attr("value") {
                    Some(value) => value.to_string(),
                    None if element.is_toggle() => "on".to_string(),
                    None => String::new(),
                }
            }
            "textarea" => element
                .value
                .clone()
                .unwrap_or_else(|| self.text_content(node)),
            "select" => self
                .selected_option(node)
                .map(|o| self.option_value(o))
                .unwrap_or_default(),
            "option" => self.option_value(node),
            _ => element.attr("value").unwrap_or("").to_string(),
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let tag = self.tag_name(node).ok_or(DomError::NotAnElement)?.to_string();
        match tag.as_str() {
            "input" | "textarea" => {
                if let Some(element) = self.element_mut(node) {
                    element.value = Some(value.to_string());
                }
                Ok(())
            }
            "select" => {
                let option = self
                    .options(node)
                    .into_iter()
                    .find(|o| self.option_value(*o) == value);
                match option {
                    Some(option) => self.select_option(node, option),
                    None => self.clear_selection(node),
                }
                Ok(())
            }
            other => Err(DomError::NotAFormField(other.to_string())),
        }
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|e| e.checked)
    }

    /// Set checkedness; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        element.checked = checked;

        if !checked {
            return;
        }
        for other in self.radio_group(node) {
            if other == node {
                continue;
            }
            if let Some(element) = self.element_mut(other) {
                element.checked = false;
            }
        }
    }

    /// Radios sharing `node`'s name within the same form owner (including `node`).
    /// Empty when `node` is not a named radio.
    pub fn radio_group(&self, node: NodeId) -> Vec<NodeId> {
        let Some(element) = self.element(node) else {
            return Vec::new();
        };
        if element.tag() != "input" || element.input_type() != "radio" {
            return Vec::new();
        }
        let Some(name) = element.non_empty_attr("name") else {
            return Vec::new();
        };
        let owner = self.form_owner(node);
        self.descendants(owner.unwrap_or(self.root))
            .into_iter()
            .filter(|n| {
                self.element(*n).is_some_and(|e| {
                    e.tag() == "input" && e.input_type() == "radio" && e.attr("name") == Some(name)
                })
            })
            .filter(|n| self.form_owner(*n) == owner)
            .collect()
    }

    /// Nearest ancestor `<form>`
    pub fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .find(|a| self.tag_name(*a) == Some("form"))
    }

    /// `<option>` elements of a select, including those inside `<optgroup>`
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.tag_name(*n) == Some("option"))
            .collect()
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self.option_text(option),
        }
    }

    /// Option label text with whitespace collapsed
    pub fn option_text(&self, option: NodeId) -> String {
        collapse_whitespace(&self.text_content(option))
    }

    pub fn option_selected(&self, option: NodeId) -> bool {
        self.element(option).is_some_and(|e| e.selected)
    }

    /// Selected option, falling back to the first one for single selects
    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|o| self.option_selected(*o))
            .or_else(|| {
                if self.has_attr(select, "multiple") {
                    None
                } else {
                    options.first().copied()
                }
            })
    }

    pub fn select_option(&mut self, select: NodeId, option: NodeId) {
        let single = !self.has_attr(select, "multiple");
        for other in self.options(select) {
            if let Some(element) = self.element_mut(other) {
                if other == option {
                    element.selected = true;
                } else if single {
                    element.selected = false;
                }
            }
        }
    }

    fn clear_selection(&mut self, select: NodeId) {
        for option in self.options(select) {
            if let Some(element) = self.element_mut(option) {
                element.selected = false;
            }
        }
    }

    /// Labels associated with a control, in tree order
    pub fn labels(&self, control: NodeId) -> Vec<NodeId> {
        let id = self.element(control).and_then(ElementData::id);
        self.elements_by_tag_name(self.root, "label")
            .into_iter()
            .filter(|label| match self.attr(*label, "for") {
                Some(target) => id == Some(target),
                None => self.labeled_control(*label) == Some(control),
            })
            .collect()
    }

    /// First labelable descendant of a `<label>` without a `for` attribute
    fn labeled_control(&self, label: NodeId) -> Option<NodeId> {
        self.descendants(label).into_iter().find(|n| {
            self.element(*n).is_some_and(|e| match e.tag() {
                "input" => e.input_type() != "hidden",
                "textarea" | "select" | "button" | "meter" | "output" | "progress" => true,
                _ => false,
            })
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim and collapse runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn sample() -> Document {
        parse_html(
            r#"<html><head><title> Sign
            up </title></head><body>
            <form id="signup">
              <label for="email">Email</label>
              <input id="email" name="email" value="a@b.c">
              <label>Agree <input type="checkbox" name="tos"></label>
              <input type="radio" name="plan" value="free" checked>
              <input type="radio" name="plan" value="pro">
              <select name="size"><option>S</option><option value="m" selected>Medium</option></select>
              <textarea name="bio">hello</textarea>
            </form>
            </body></html>"#,
        )
    }

    #[test]
    fn test_structure_lookups() {
        let doc = sample();
        assert!(doc.body().is_some());
        assert_eq!(doc.title(), "Sign up");
        let form = doc.get_element_by_id("signup").unwrap();
        assert_eq!(doc.tag_name(form), Some("form"));
        let email = doc.get_element_by_id("email").unwrap();
        assert_eq!(doc.form_owner(email), Some(form));
    }

    #[test]
    fn test_form_values() {
        let mut doc = sample();
        let email = doc.get_element_by_id("email").unwrap();
        assert_eq!(doc.value(email), "a@b.c");
        doc.set_value(email, "x@y.z").unwrap();
        assert_eq!(doc.value(email), "x@y.z");
        // attribute is untouched
        assert_eq!(doc.attr(email, "value"), Some("a@b.c"));

        let bio = doc.query_selector("textarea").unwrap().unwrap();
        assert_eq!(doc.value(bio), "hello");

        let size = doc.query_selector("select").unwrap().unwrap();
        assert_eq!(doc.value(size), "m");
        doc.set_value(size, "S").unwrap();
        assert_eq!(doc.value(size), "S");
    }

    #[test]
    fn test_radio_group_exclusive() {
        let mut doc = sample();
        let radios = doc.query_selector_all("input[type=radio]").unwrap();
        assert!(doc.checked(radios[0]));
        doc.set_checked(radios[1], true);
        assert!(!doc.checked(radios[0]));
        assert!(doc.checked(radios[1]));
    }

    #[test]
    fn test_labels() {
        let doc = sample();
        let email = doc.get_element_by_id("email").unwrap();
        let labels = doc.labels(email);
        assert_eq!(labels.len(), 1);
        assert_eq!(doc.text_content(labels[0]), "Email");

        let tos = doc.query_selector("[name=tos]").unwrap().unwrap();
        let labels = doc.labels(tos);
        assert_eq!(labels.len(), 1);
        assert_eq!(collapse_whitespace(&doc.text_content(labels[0])), "Agree");
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let doc = sample();
        let form = doc.get_element_by_id("signup").unwrap();
        let (mut copy, copied_form) = doc.clone_subtree(form);
        let input = copy.query_selector_in(copied_form, "textarea").unwrap().unwrap();
        copy.detach(input);
        assert!(copy.query_selector("textarea").unwrap().is_none());
        assert!(doc.query_selector("textarea").unwrap().is_some());
    }

    #[test]
    fn test_detached_nodes_are_not_queried() {
        let mut doc = sample();
        let email = doc.get_element_by_id("email").unwrap();
        doc.detach(email);
        assert!(!doc.is_connected(email));
        assert!(doc.query_selector("#email").unwrap().is_none());
    }
}
