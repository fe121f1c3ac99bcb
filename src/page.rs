use crate::assets::AssetBundle;
use kuchiki::NodeData;
use kuchiki::traits::TendrilSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStyleSheet {
    pub name: String,
    pub css: String,
}

// The stylesheets a page exposes, in document order.
#[derive(Debug, Clone, Default)]
pub struct PageStyles {
    sheets: Vec<PageStyleSheet>,
}

impl PageStyles {
    pub fn new() -> Self {
        Self::default()
    }

    // Collects `<style>` blocks and `<link rel="stylesheet">` targets the way
    // `document.styleSheets` lists them. Link targets are looked up in the
    // bundle; anything the bundle cannot provide is skipped.
    pub fn from_html(html: &str, bundle: &AssetBundle) -> Self {
        let document = kuchiki::parse_html().one(html);
        let mut page = PageStyles::new();
        let Ok(nodes) = document.select("style, link[rel][href]") else {
            return page;
        };
        let mut inline_count = 0usize;
        for node in nodes {
            let name = node.name.local.as_ref().to_ascii_lowercase();
            if name == "style" {
                let nested_in_svg = node.as_node().ancestors().any(|ancestor| {
                    if let NodeData::Element(el) = ancestor.data() {
                        el.name.local.as_ref().eq_ignore_ascii_case("svg")
                    } else {
                        false
                    }
                });
                if nested_in_svg {
                    continue;
                }
                inline_count += 1;
                page.push(
                    format!("<style>#{inline_count}"),
                    node.as_node().text_contents(),
                );
                continue;
            }

            let attrs = node.attributes.borrow();
            let is_stylesheet = attrs
                .get("rel")
                .map(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
                })
                .unwrap_or(false);
            if !is_stylesheet {
                continue;
            }
            let href = attrs.get("href").unwrap_or("").trim();
            match bundle.get(href) {
                Some(asset) => page.push(asset.name.clone(), asset.css.clone()),
                None => log::warn!("[responsive][page] stylesheet link not in bundle: {href}"),
            }
        }
        page
    }

    pub fn push(&mut self, name: impl Into<String>, css: impl Into<String>) {
        self.sheets.push(PageStyleSheet {
            name: name.into(),
            css: css.into(),
        });
    }

    pub fn sheets(&self) -> &[PageStyleSheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
