use crate::breakpoint::BreakPoint;
use crate::error::ResponsiveError;
use indexmap::IndexSet;
use kuchiki::{NodeData, NodeRef};

// Style classes and id of a tracked element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetStyles {
    pub primary_style: String,
    pub styles: Vec<String>,
    pub id: Option<String>,
}

impl TargetStyles {
    pub fn new(primary_style: impl Into<String>) -> Self {
        Self {
            primary_style: primary_style.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    // The first class token is the primary style, the rest are secondary
    // styles.
    pub fn from_element(node: &NodeRef) -> Result<Self, ResponsiveError> {
        let Some(element) = node.as_element() else {
            return Err(ResponsiveError::MissingElement(node_kind(node).to_string()));
        };
        let attrs = element.attributes.borrow();
        let mut classes = attrs.get("class").unwrap_or("").split_ascii_whitespace();
        let primary_style = classes.next().unwrap_or("").to_string();
        let styles = classes.map(str::to_string).collect();
        let id = attrs
            .get("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Ok(Self {
            primary_style,
            styles,
            id,
        })
    }
}

pub(crate) fn node_kind(node: &NodeRef) -> &'static str {
    match node.data() {
        NodeData::Element(_) => "element",
        NodeData::Text(_) => "#text",
        NodeData::Comment(_) => "#comment",
        NodeData::ProcessingInstruction(_) => "#processing-instruction",
        NodeData::Doctype(_) => "#doctype",
        NodeData::Document(_) => "#document",
        NodeData::DocumentFragment => "#document-fragment",
    }
}

// Flat selector strings a range declaration may use to address the target.
// Lowercased, since the scanned cache is lowercased.
pub fn applicable_selectors(target: &TargetStyles) -> IndexSet<String> {
    let primary = target.primary_style.as_str();
    let mut selectors = IndexSet::new();
    selectors.insert(format!(".{primary}"));
    for style in &target.styles {
        selectors.insert(format!(".{style}"));
        selectors.insert(format!(".{primary}.{style}"));
        selectors.insert(format!(".{style}.{primary}"));
        selectors.insert(format!(".{primary}-{style}"));
    }
    if let Some(id) = &target.id {
        selectors.insert(format!("#{id}"));
    }
    selectors
        .into_iter()
        .map(|selector| selector.to_lowercase())
        .collect()
}

// Breakpoints of `cache` whose selector is literally one of `selectors`, in
// cache order.
pub fn match_breakpoints<'c>(
    selectors: &IndexSet<String>,
    cache: &'c IndexSet<BreakPoint>,
) -> Vec<&'c BreakPoint> {
    cache
        .iter()
        .filter(|bp| selectors.contains(&bp.selector))
        .collect()
}
