use crate::units::LengthProbe;
use html5ever::{LocalName, Namespace, QualName};
use kuchiki::{Attribute, ExpandedName, NodeRef};
use lightningcss::properties::Property;
use lightningcss::properties::font::{AbsoluteFontSize, FontSize, RelativeFontSize};
use lightningcss::properties::size::Size;
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};
use lightningcss::values::length::{LengthPercentage, LengthValue};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const PROBE_STYLE: &str = "position:absolute;visibility:hidden;padding:0;border:0;";
const DEFAULT_FONT_SIZE_PX: f32 = 16.0;
const EX_RATIO: f32 = 0.5;
const CH_RATIO: f32 = 0.5;

// Reports the rendered width of a node that is attached to the document.
pub trait ProbeLayout {
    fn offset_width(&self, node: &NodeRef) -> Option<i32>;
}

// Measures relative lengths by attaching a hidden probe element to the
// reference element and asking the layout for its width.
pub struct DomProbe<'a> {
    reference: NodeRef,
    layout: &'a dyn ProbeLayout,
}

impl<'a> DomProbe<'a> {
    pub fn new(reference: NodeRef, layout: &'a dyn ProbeLayout) -> Self {
        Self { reference, layout }
    }

    pub fn reference(&self) -> &NodeRef {
        &self.reference
    }
}

impl std::fmt::Debug for DomProbe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomProbe").finish_non_exhaustive()
    }
}

impl LengthProbe for DomProbe<'_> {
    fn probe_width(&self, length: &str) -> Option<i32> {
        let probe = AttachedProbe::attach(&self.reference, length)?;
        self.layout.offset_width(probe.node())
    }
}

// Detaches the probe when dropped, so the document never keeps it past the
// measurement, including when layout bails out or unwinds.
struct AttachedProbe(NodeRef);

impl AttachedProbe {
    fn attach(parent: &NodeRef, length: &str) -> Option<Self> {
        parent.as_element()?;
        let style = (
            ExpandedName::new("", "style"),
            Attribute {
                prefix: None,
                value: format!("{PROBE_STYLE}width:{length}"),
            },
        );
        let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("div"));
        let node = NodeRef::new_element(name, [style]);
        parent.append(node.clone());
        Some(Self(node))
    }

    fn node(&self) -> &NodeRef {
        &self.0
    }
}

impl Drop for AttachedProbe {
    fn drop(&mut self) {
        self.0.detach();
    }
}

// Minimal layout for documents without a rendering engine: a node's width is
// its inline `width`, and font-relative units follow the inline `font-size`
// declarations of the node and its ancestors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InlineStyleLayout {
    pub default_font_size: f32,
}

impl Default for InlineStyleLayout {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE_PX,
        }
    }
}

impl InlineStyleLayout {
    // Returns (font size of `node`, font size of the outermost element).
    fn font_sizes(&self, node: &NodeRef) -> (f32, f32) {
        let chain: Vec<NodeRef> = node
            .inclusive_ancestors()
            .filter(|n| n.as_element().is_some())
            .collect();
        let mut size = self.default_font_size;
        let mut root_size = self.default_font_size;
        for (depth, element) in chain.iter().rev().enumerate() {
            if let Some(font_size) = with_inline_style(element, last_font_size) {
                if let Some(px) = resolve_font_size(&font_size, size, root_size) {
                    size = px;
                }
            }
            if depth == 0 {
                root_size = size;
            }
        }
        (size, root_size)
    }
}

impl ProbeLayout for InlineStyleLayout {
    fn offset_width(&self, node: &NodeRef) -> Option<i32> {
        let width = with_inline_style(node, last_width)?;
        let (font_size, root_size) = self.font_sizes(node);
        let px = match &width {
            LengthValue::Em(v) => v * font_size,
            LengthValue::Rem(v) => v * root_size,
            LengthValue::Ex(v) => v * font_size * EX_RATIO,
            LengthValue::Ch(v) => v * font_size * CH_RATIO,
            other => other.to_px()?,
        };
        let px = px.round();
        px.is_finite().then_some(px as i32)
    }
}

fn with_inline_style<T>(node: &NodeRef, pick: fn(&[Property]) -> Option<T>) -> Option<T> {
    let element = node.as_element()?;
    let attrs = element.attributes.borrow();
    let inline = attrs.get("style")?;
    let style = StyleAttribute::parse(inline, ParserOptions::default()).ok()?;
    let important = pick(&style.declarations.important_declarations);
    important.or_else(|| pick(&style.declarations.declarations))
}

fn last_width(props: &[Property]) -> Option<LengthValue> {
    props.iter().rev().find_map(|prop| match prop {
        Property::Width(Size::LengthPercentage(LengthPercentage::Dimension(length))) => {
            Some(length.clone())
        }
        _ => None,
    })
}

fn last_font_size(props: &[Property]) -> Option<FontSize> {
    props.iter().rev().find_map(|prop| match prop {
        Property::FontSize(size) => Some(size.clone()),
        _ => None,
    })
}

fn resolve_font_size(value: &FontSize, parent: f32, root: f32) -> Option<f32> {
    match value {
        FontSize::Length(LengthPercentage::Percentage(pct)) => Some(pct.0 * parent),
        FontSize::Length(LengthPercentage::Dimension(length)) => match length {
            LengthValue::Em(v) => Some(v * parent),
            LengthValue::Rem(v) => Some(v * root),
            LengthValue::Ex(v) => Some(v * parent * EX_RATIO),
            LengthValue::Ch(v) => Some(v * parent * CH_RATIO),
            other => other.to_px(),
        },
        FontSize::Length(LengthPercentage::Calc(_)) => None,
        FontSize::Absolute(size) => Some(absolute_font_size(*size)),
        FontSize::Relative(RelativeFontSize::Smaller) => Some(parent * 0.8),
        FontSize::Relative(RelativeFontSize::Larger) => Some(parent * 1.2),
    }
}

fn absolute_font_size(size: AbsoluteFontSize) -> f32 {
    match size {
        AbsoluteFontSize::XXSmall => 9.0,
        AbsoluteFontSize::XSmall => 10.0,
        AbsoluteFontSize::Small => 13.0,
        AbsoluteFontSize::Medium => 16.0,
        AbsoluteFontSize::Large => 18.0,
        AbsoluteFontSize::XLarge => 24.0,
        AbsoluteFontSize::XXLarge => 32.0,
        AbsoluteFontSize::XXXLarge => 40.0,
    }
}
