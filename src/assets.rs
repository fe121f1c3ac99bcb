#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssAsset {
    pub name: String,
    pub css: String,
    pub source: Option<String>,
}

impl CssAsset {
    pub fn new(name: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            css: css.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn bytes_len(&self) -> usize {
        self.css.len()
    }
}

// Stylesheets addressable by name, used to resolve `<link href>` targets and
// `@import` urls. Lookups are exact; the last asset registered under a name wins.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    pub assets: Vec<CssAsset>,
}

impl AssetBundle {
    pub fn add(&mut self, asset: CssAsset) {
        self.assets.push(asset);
    }

    pub fn add_css(&mut self, name: impl Into<String>, css: impl Into<String>) {
        self.add(CssAsset::new(name, css));
    }

    pub fn get(&self, name: &str) -> Option<&CssAsset> {
        let name = name.trim();
        self.assets.iter().rev().find(|asset| asset.name == name)
    }

    pub fn extend(&mut self, other: AssetBundle) {
        self.assets.extend(other.assets);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
