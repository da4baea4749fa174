use crate::dom::dom_model::{Dom, NodeId};
use crate::extract::record::WorkMode;

/// Values guessed from the page as a whole rather than from form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageGuess {
    pub title: String,
    pub company: String,
    pub location: String,
    pub work_mode: WorkMode,
}

/// Header and navigation spots where a company brand usually sits,
/// tried in order.
enum BrandSpot {
    /// `<ancestor tag> [class*=fragment]`
    InsideTag(&'static str, &'static str),
    /// `.token`
    Class(&'static str),
    /// `[data-test*=fragment]`
    DataTest(&'static str),
    /// `[class*=outer] [class*=inner]`
    InsideClass(&'static str, &'static str),
}

const BRAND_SPOTS: &[BrandSpot] = &[
    BrandSpot::InsideTag("header", "logo"),
    BrandSpot::InsideTag("header", "brand"),
    BrandSpot::InsideTag("header", "company"),
    BrandSpot::InsideTag("nav", "logo"),
    BrandSpot::InsideTag("nav", "brand"),
    BrandSpot::Class("logo"),
    BrandSpot::Class("brand"),
    BrandSpot::DataTest("logo"),
    BrandSpot::DataTest("brand"),
    BrandSpot::InsideClass("header", "company"),
    BrandSpot::InsideClass("navbar", "company"),
];

const MAX_BRAND_LEN: usize = 50;

pub fn page_heuristics(dom: &Dom) -> PageGuess {
    PageGuess {
        title: page_title(dom),
        company: page_company(dom),
        location: page_location(dom),
        work_mode: WorkMode::detect(&dom.body_text()),
    }
}

fn page_title(dom: &Dom) -> String {
    let meta = meta_content(dom, |d, m| {
        d.attr(m, "property") == Some("og:title") || d.attr(m, "name") == Some("title")
    });
    match meta {
        Some(content) if !content.is_empty() => content,
        _ => dom.title().trim().to_string(),
    }
}

fn page_company(dom: &Dom) -> String {
    let meta = meta_content(dom, |d, m| {
        d.attr(m, "property") == Some("og:site_name")
            || d.attr(m, "name") == Some("author")
            || d.attr(m, "property") == Some("article:author")
    });
    if let Some(content) = meta.filter(|c| !c.is_empty()) {
        return content;
    }

    for spot in BRAND_SPOTS {
        let found = dom.elements().into_iter().find(|id| spot.matches(dom, *id));
        if let Some(id) = found {
            let text = dom.normalized_text(id);
            let len = text.chars().count();
            if len > 0 && len < MAX_BRAND_LEN {
                return text;
            }
        }
    }

    let marked = dom.elements().into_iter().find(|id| {
        dom.attr(*id, "data-company-name").is_some()
            || dom.class_contains(*id, "company")
            || dom.class_contains(*id, "employer")
    });
    if let Some(id) = marked {
        let text = dom.normalized_text(id);
        if !text.is_empty() {
            return text;
        }
    }

    company_from_hostname(&dom.hostname()).unwrap_or_default()
}

fn page_location(dom: &Dom) -> String {
    dom.elements()
        .into_iter()
        .find(|id| {
            dom.class_contains(*id, "location") || dom.attr_lower(*id, "data-test").contains("location")
        })
        .map(|id| dom.normalized_text(id))
        .unwrap_or_default()
}

/// Capitalised second-level domain, e.g. `jobs.acme.com` → `Acme`.
/// Local hosts and labels of two characters or fewer yield nothing.
pub fn company_from_hostname(hostname: &str) -> Option<String> {
    if hostname.is_empty() || hostname.contains("localhost") || hostname.contains("127.0.0.1") {
        return None;
    }
    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    let label = parts[parts.len() - 2];
    if label.chars().count() <= 2 {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

fn meta_content(dom: &Dom, pred: impl Fn(&Dom, NodeId) -> bool) -> Option<String> {
    dom.descendants_by_tag(dom.root(), &["meta"])
        .into_iter()
        .find(|m| pred(dom, *m))
        .map(|m| dom.attr(m, "content").unwrap_or("").trim().to_string())
}

impl BrandSpot {
    fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        match self {
            BrandSpot::InsideTag(tag, fragment) => {
                dom.class_contains(id, fragment) && has_ancestor(dom, id, |a| dom.is_tag(a, tag))
            }
            BrandSpot::Class(token) => dom.has_class(id, token),
            BrandSpot::DataTest(fragment) => dom.attr_lower(id, "data-test").contains(fragment),
            BrandSpot::InsideClass(outer, inner) => {
                dom.class_contains(id, inner) && has_ancestor(dom, id, |a| dom.class_contains(a, outer))
            }
        }
    }
}

fn has_ancestor(dom: &Dom, id: NodeId, pred: impl Fn(NodeId) -> bool) -> bool {
    let mut cursor = dom.parent(id);
    while let Some(current) = cursor {
        if pred(current) {
            return true;
        }
        cursor = dom.parent(current);
    }
    false
}
