use job_tracker::{
    dom::dom_model::{Dom, NodeId},
    protect::identity::FormIdentity,
    watch::{registry::BindingRegistry, watcher::DomWatcher},
};

fn page_with_form() -> (Dom, NodeId) {
    let mut dom = Dom::new("https://example.com/jobs/1", "");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[("id", "a")]);
    dom.create_element(form, "input", &[("name", "x")]);
    (dom, form)
}

#[test]
fn initial_scan_returns_all_forms_and_clears_the_log() {
    let (mut dom, form) = page_with_form();
    let mut watcher = DomWatcher::new();

    assert_eq!(watcher.initial_forms(&mut dom), vec![form]);
    assert!(watcher.rescan(&mut dom).is_empty());
    assert_eq!(watcher.scans(), 2);
}

#[test]
fn rescan_finds_forms_nested_in_inserted_subtrees() {
    let (mut dom, _) = page_with_form();
    let mut watcher = DomWatcher::new();
    watcher.initial_forms(&mut dom);

    let body = dom.body();
    let outer = dom.create_element(body, "div", &[]);
    let inner = dom.create_element(outer, "section", &[]);
    let late = dom.create_element(inner, "form", &[]);

    assert_eq!(watcher.rescan(&mut dom), vec![late]);
}

#[test]
fn rescan_reports_a_form_that_gained_a_field() {
    let (mut dom, form) = page_with_form();
    let mut watcher = DomWatcher::new();
    watcher.initial_forms(&mut dom);

    let group = dom.create_element(form, "fieldset", &[]);
    dom.create_element(group, "input", &[("type", "file")]);

    assert_eq!(watcher.rescan(&mut dom), vec![form]);
}

#[test]
fn rescan_ignores_insertions_outside_forms() {
    let (mut dom, _) = page_with_form();
    let mut watcher = DomWatcher::new();
    watcher.initial_forms(&mut dom);

    let body = dom.body();
    let p = dom.create_element(body, "p", &[]);
    dom.create_text(p, "Loading...");

    assert!(watcher.rescan(&mut dom).is_empty());
}

#[test]
fn registry_keeps_the_first_binding_for_an_identity() {
    let mut registry = BindingRegistry::new();
    let identity = FormIdentity::new("apply");

    assert!(registry.register(identity.clone(), NodeId(3), 100));
    assert!(!registry.register(identity.clone(), NodeId(9), 200));

    let binding = registry.get(&identity).unwrap();
    assert_eq!(binding.node, NodeId(3));
    assert_eq!(binding.bound_at, 100);
    assert_eq!(registry.len(), 1);
    assert!(registry.is_bound_node(NodeId(3)));
    assert!(!registry.is_bound_node(NodeId(9)));
    assert_eq!(registry.identity_of(NodeId(3)), Some(&identity));
}
