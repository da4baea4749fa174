use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// ============================================================================
// Arena-backed page model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub node_type: NodeType,
}

/// Live state of a form control. Attributes hold the markup defaults,
/// this holds what the user has typed, ticked or attached since.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub control: ControlState,
}

/// Event types a listener can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Submit,
    Click,
    Input,
    Change,
    BeforeUnload,
}

/// Where a heuristic looks: inside one form, or across the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Form(NodeId),
    Document,
}

#[derive(Debug, Clone)]
pub struct Dom {
    url: String,
    title: String,
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    added: Vec<NodeId>,
    listeners: HashMap<NodeId, Vec<EventType>>,
}

impl Dom {
    pub fn new(url: &str, title: &str) -> Self {
        let mut dom = Self {
            url: url.to_string(),
            title: title.to_string(),
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            added: Vec::new(),
            listeners: HashMap::new(),
        };
        dom.head = dom.create_element(dom.root, "head", &[]);
        dom.body = dom.create_element(dom.root, "body", &[]);
        dom.added.clear();
        dom
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Lowercased host of the page URL, empty when the URL has none.
    pub fn hostname(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn scope_root(&self, scope: Scope) -> NodeId {
        match scope {
            Scope::Form(id) => id,
            Scope::Document => self.root,
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        self.added.push(id);
        id
    }

    pub fn create_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.create_element_with(parent, tag, attrs)
    }

    pub fn create_element_with(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        let tag = tag.to_lowercase();
        let attrs: BTreeMap<String, String> = attrs
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let control = ControlState {
            value: attrs.get("value").cloned().unwrap_or_default(),
            checked: attrs.contains_key("checked") || (tag == "option" && attrs.contains_key("selected")),
            disabled: attrs.contains_key("disabled"),
            files: Vec::new(),
        };
        self.create_node(
            Some(parent),
            NodeType::Element(Element {
                tag,
                attrs,
                control,
            }),
        )
    }

    pub fn create_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text.to_string()))
    }

    /// Drain the nodes created since the last call.
    pub fn take_added(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.added)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    pub fn add_listener(&mut self, node: NodeId, event: EventType) {
        self.listeners.entry(node).or_default().push(event);
    }

    pub fn remove_listener(&mut self, node: NodeId, event: EventType) {
        if let Some(events) = self.listeners.get_mut(&node) {
            events.retain(|e| *e != event);
        }
    }

    pub fn listener_count(&self, node: NodeId, event: EventType) -> usize {
        self.listeners
            .get(&node)
            .map(|events| events.iter().filter(|e| **e == event).count())
            .unwrap_or(0)
    }

    pub fn has_listener(&self, node: NodeId, event: EventType) -> bool {
        self.listener_count(node, event) > 0
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes below `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `root` whose tag is one of `tags`.
    pub fn descendants_by_tag(&self, root: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.tag(*id).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// Descendant elements of the whole document, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    pub fn forms(&self) -> Vec<NodeId> {
        self.descendants_by_tag(self.root, &["form"])
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_tag(current, tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// First element under `scope` with the given `id` attribute.
    pub fn by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(scope)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    // ------------------------------------------------------------------
    // Attributes & text
    // ------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attrs.get(name))
            .map(|v| v.as_str())
    }

    /// Attribute value lowercased, empty when absent.
    pub fn attr_lower(&self, id: NodeId, name: &str) -> String {
        self.attr(id, name).unwrap_or("").to_lowercase()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.insert(name.to_lowercase(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.remove(name);
        }
    }

    /// `[class*=fragment i]`
    pub fn class_contains(&self, id: NodeId, fragment: &str) -> bool {
        self.attr_lower(id, "class").contains(&fragment.to_lowercase())
    }

    /// `.token`
    pub fn has_class(&self, id: NodeId, token: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == token))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Text(text) => text.clone(),
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &node.children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
        }
    }

    /// Trimmed text content, the `innerText` a user would read.
    pub fn normalized_text(&self, id: NodeId) -> String {
        self.text_content(id).trim().to_string()
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if self.element(id).is_none() {
            return;
        }
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
        let text_id = self.create_node(Some(id), NodeType::Text(text.to_string()));
        self.added.retain(|n| *n != text_id);
    }

    pub fn body_text(&self) -> String {
        self.text_content(self.body)
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    pub fn control(&self, id: NodeId) -> Option<&ControlState> {
        self.element(id).map(|e| &e.control)
    }

    pub fn control_mut(&mut self, id: NodeId) -> Option<&mut ControlState> {
        self.element_mut(id).map(|e| &mut e.control)
    }

    pub fn is_form_control(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some("input" | "select" | "textarea"))
    }

    /// Lowercased `type` attribute, empty when absent.
    pub fn input_type(&self, id: NodeId) -> String {
        self.attr_lower(id, "type")
    }

    /// Form controls under `root` in document order.
    pub fn controls(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants_by_tag(root, &["input", "select", "textarea"])
    }

    /// Named controls under `root` whose `name` attribute equals `name`.
    pub fn controls_named(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.controls(root)
            .into_iter()
            .filter(|id| self.attr(*id, "name") == Some(name))
            .collect()
    }

    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants_by_tag(select, &["option"])
    }

    /// Value an option submits: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.normalized_text(option),
        }
    }

    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|o| self.control(*o).is_some_and(|c| c.checked))
            .or_else(|| options.first().copied())
    }

    pub fn select_option(&mut self, select: NodeId, option: NodeId) {
        for o in self.options(select) {
            if let Some(control) = self.control_mut(o) {
                control.checked = o == option;
            }
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(control) = self.control_mut(id) {
            control.value = value.to_string();
        }
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(control) = self.control_mut(id) {
            control.checked = checked;
        }
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(control) = self.control_mut(id) {
            control.disabled = disabled;
        }
    }

    pub fn attach_file(&mut self, id: NodeId, file_name: &str) {
        if let Some(control) = self.control_mut(id) {
            control.files.push(file_name.to_string());
            control.value = format!("C:\\fakepath\\{}", file_name);
        }
    }

    /// First control under `root` matched by `name` or `id` attribute.
    pub fn find_control(&self, root: NodeId, key: &str) -> Option<NodeId> {
        self.controls(root)
            .into_iter()
            .find(|id| self.attr(*id, "name") == Some(key) || self.attr(*id, "id") == Some(key))
    }
}
