use crate::assets::AssetBundle;
use crate::breakpoint::{BreakPoint, Dimension, RangeCache};
use crate::debug::DebugLogger;
use crate::page::PageStyles;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use regex::{Regex, RegexBuilder};
use serde_json::json;
use std::sync::Arc;

const REORDERING_APP_NAME: &str = "Microsoft Internet Explorer";

// Where a serializer puts the range attribute relative to the class/id part
// of a compound selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorGrouping {
    // `.card[width-range~="480px-900px"]`
    #[default]
    Standard,
    // `[width-range~="480px-900px"].card`, as legacy IE re-serializes rules.
    Reordered,
}

impl SelectorGrouping {
    pub fn detect(app_name: &str) -> Self {
        if app_name == REORDERING_APP_NAME {
            SelectorGrouping::Reordered
        } else {
            SelectorGrouping::Standard
        }
    }

    fn pattern(&self, dimension: Dimension) -> String {
        let attr = format!(
            r#"\[{}-range~?=["'](.*?)-(.*)["']\]"#,
            dimension.as_str()
        );
        match self {
            SelectorGrouping::Standard => format!(r"([.#]\S+){attr}"),
            SelectorGrouping::Reordered => format!(r"{attr}([.#]\S+)"),
        }
    }

    // Capture group indices of (selector, min, max).
    fn groups(&self) -> (usize, usize, usize) {
        match self {
            SelectorGrouping::Standard => (1, 2, 3),
            SelectorGrouping::Reordered => (3, 1, 2),
        }
    }
}

#[derive(Debug, Clone)]
struct RangePattern {
    dimension: Dimension,
    regex: Regex,
}

#[derive(Debug, Clone)]
pub struct RangeScanner {
    grouping: SelectorGrouping,
    patterns: [RangePattern; 2],
    debug: Option<Arc<DebugLogger>>,
}

impl RangeScanner {
    pub fn new(grouping: SelectorGrouping) -> Self {
        let patterns = Dimension::ALL.map(|dimension| RangePattern {
            dimension,
            regex: RegexBuilder::new(&grouping.pattern(dimension))
                .case_insensitive(true)
                .build()
                .expect("range selector pattern is valid"),
        });
        Self {
            grouping,
            patterns,
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        self.debug = debug;
        self
    }

    pub fn grouping(&self) -> SelectorGrouping {
        self.grouping
    }

    // Builds both caches from every stylesheet on the page. Imports are
    // followed depth first at the position they appear.
    pub fn scan(&self, page: &PageStyles, bundle: &AssetBundle) -> RangeCache {
        let mut cache = RangeCache::new();
        for sheet in page.sheets() {
            let mut import_stack = vec![sheet.name.clone()];
            self.scan_sheet(&sheet.name, &sheet.css, bundle, &mut import_stack, &mut cache);
        }
        log::debug!(
            "[responsive][scan] {} sheet(s): {} width / {} height breakpoint(s)",
            page.len(),
            cache.width().len(),
            cache.height().len()
        );
        cache
    }

    fn scan_sheet(
        &self,
        name: &str,
        css: &str,
        bundle: &AssetBundle,
        import_stack: &mut Vec<String>,
        cache: &mut RangeCache,
    ) {
        let options = ParserOptions {
            filename: name.to_string(),
            error_recovery: true,
            ..ParserOptions::default()
        };
        let sheet = match StyleSheet::parse(css, options) {
            Ok(sheet) => sheet,
            Err(err) => {
                log::warn!("[responsive][scan] skipping unparsable stylesheet {name}: {err}");
                if let Some(logger) = self.debug.as_deref() {
                    logger.increment("range.scan.sheets_failed", 1);
                }
                return;
            }
        };
        if let Some(logger) = self.debug.as_deref() {
            logger.log_event(&json!({
                "type": "range.sheet",
                "name": name,
                "depth": import_stack.len() - 1,
                "rules": sheet.rules.0.len(),
            }));
            logger.increment("range.scan.sheets", 1);
        }
        self.scan_rules(&sheet.rules, bundle, import_stack, cache);
    }

    fn scan_rules(
        &self,
        rules: &CssRuleList,
        bundle: &AssetBundle,
        import_stack: &mut Vec<String>,
        cache: &mut RangeCache,
    ) {
        for rule in &rules.0 {
            match rule {
                CssRule::Import(import) => {
                    let url: &str = &import.url;
                    if import_stack.iter().any(|seen| seen == url) {
                        log::warn!("[responsive][scan] import cycle through {url}");
                        continue;
                    }
                    let Some(asset) = bundle.get(url) else {
                        log::warn!("[responsive][scan] @import target not in bundle: {url}");
                        if let Some(logger) = self.debug.as_deref() {
                            logger.log_event(&json!({
                                "type": "range.import_missing",
                                "url": url,
                            }));
                        }
                        continue;
                    };
                    import_stack.push(url.to_string());
                    self.scan_sheet(&asset.name, &asset.css, bundle, import_stack, cache);
                    import_stack.pop();
                }
                CssRule::Style(style) => {
                    let Ok(selectors) = style.selectors.to_css_string(PrinterOptions::default())
                    else {
                        continue;
                    };
                    if let Some(logger) = self.debug.as_deref() {
                        logger.increment("range.scan.rules", 1);
                    }
                    self.scan_selector_text(&selectors, cache);
                }
                _ => {}
            }
        }
    }

    // Extracts range breakpoints from one rule's selector text and adds them
    // to `cache`. Fragments without a range attribute are ignored. Returns
    // the number of breakpoints that were new to the cache.
    pub fn scan_selector_text(&self, selector_text: &str, cache: &mut RangeCache) -> usize {
        let (selector_group, min_group, max_group) = self.grouping.groups();
        let mut added = 0usize;
        for fragment in selector_text.to_lowercase().split(',') {
            for pattern in &self.patterns {
                let Some(captures) = pattern.regex.captures(fragment) else {
                    continue;
                };
                let group = |index: usize| {
                    captures
                        .get(index)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                };
                let breakpoint =
                    BreakPoint::new(group(selector_group), group(min_group), group(max_group));
                if let Some(logger) = self.debug.as_deref() {
                    logger.log_event(&json!({
                        "type": "range.breakpoint",
                        "dimension": pattern.dimension.as_str(),
                        "selector": breakpoint.selector,
                        "min": breakpoint.min,
                        "max": breakpoint.max,
                    }));
                }
                if cache.insert(pattern.dimension, breakpoint) {
                    added += 1;
                }
            }
        }
        added
    }
}

impl Default for RangeScanner {
    fn default() -> Self {
        Self::new(SelectorGrouping::default())
    }
}
