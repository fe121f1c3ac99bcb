mod assets;
mod breakpoint;
mod debug;
mod error;
mod page;
mod probe;
mod resolve;
mod scan;
mod selector;
mod tracker;
mod units;

pub use assets::{AssetBundle, CssAsset};
pub use breakpoint::{BreakPoint, Dimension, RangeCache, RangeContext};
use debug::DebugLogger;
pub use error::ResponsiveError;
use kuchiki::NodeRef;
pub use page::{PageStyleSheet, PageStyles};
pub use probe::{DomProbe, InlineStyleLayout, ProbeLayout};
pub use resolve::{Resolution, resolve_bound, resolve_breakpoint, resolve_breakpoints};
pub use scan::{RangeScanner, SelectorGrouping};
pub use selector::{TargetStyles, applicable_selectors, match_breakpoints};
use std::path::PathBuf;
use std::sync::Arc;
pub use tracker::{RangeTracker, RangeUpdate};
pub use units::{FontMetrics, LengthProbe, to_pixels};

// Application root for range tracking on one page. Owns the shared range
// cache, which is scanned from the page's stylesheets the first time an
// element is extended.
#[derive(Debug)]
pub struct ResponsiveRanges {
    context: RangeContext,
    scanner: RangeScanner,
    page: PageStyles,
    asset_bundle: AssetBundle,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Debug, Clone, Default)]
pub struct ResponsiveRangesBuilder {
    grouping: SelectorGrouping,
    page_html: Option<String>,
    stylesheets: Vec<(String, String)>,
    asset_bundle: AssetBundle,
    debug_path: Option<PathBuf>,
}

impl ResponsiveRanges {
    pub fn builder() -> ResponsiveRangesBuilder {
        ResponsiveRangesBuilder::new()
    }

    pub fn grouping(&self) -> SelectorGrouping {
        self.scanner.grouping()
    }

    pub fn page(&self) -> &PageStyles {
        &self.page
    }

    pub fn is_scanned(&self) -> bool {
        self.context.is_initialized()
    }

    pub fn range_cache(&self) -> Arc<RangeCache> {
        self.context.initialize_once(|| {
            let cache = self.scanner.scan(&self.page, &self.asset_bundle);
            if let Some(logger) = self.debug.as_deref() {
                logger.increment("range.cache.width", cache.width().len() as u64);
                logger.increment("range.cache.height", cache.height().len() as u64);
            }
            cache
        })
    }

    // Starts tracking an element. The first call on a page builds the range
    // cache; later calls reuse it.
    pub fn extend(&self, target: &TargetStyles) -> RangeTracker {
        let cache = self.range_cache();
        RangeTracker::attach(target, &cache).with_debug(self.debug.clone())
    }

    pub fn extend_element(&self, element: &NodeRef) -> Result<RangeTracker, ResponsiveError> {
        let target = TargetStyles::from_element(element)?;
        Ok(self.extend(&target))
    }

    pub fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary(context);
            logger.flush();
        }
    }
}

impl ResponsiveRangesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grouping(mut self, grouping: SelectorGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    // Picks the selector grouping from the navigator's application name.
    pub fn detect_grouping(mut self, app_name: &str) -> Self {
        self.grouping = SelectorGrouping::detect(app_name);
        self
    }

    // `<style>` blocks and `<link rel="stylesheet">` targets of this document
    // come first, in document order; link targets resolve through the bundle.
    pub fn page_html(mut self, html: impl Into<String>) -> Self {
        self.page_html = Some(html.into());
        self
    }

    // Extra stylesheets, scanned after the page's own.
    pub fn stylesheet(mut self, name: impl Into<String>, css: impl Into<String>) -> Self {
        self.stylesheets.push((name.into(), css.into()));
        self
    }

    pub fn register_bundle(mut self, bundle: AssetBundle) -> Self {
        self.asset_bundle.extend(bundle);
        self
    }

    // JSON-lines trace of scanning and resizing, with a summary record per
    // `emit_debug_summary` call.
    pub fn debug_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ResponsiveRanges, ResponsiveError> {
        if let Some(asset) = self
            .asset_bundle
            .assets
            .iter()
            .find(|asset| asset.name.trim().is_empty())
        {
            return Err(ResponsiveError::InvalidConfiguration(format!(
                "css asset without a name ({} bytes)",
                asset.bytes_len()
            )));
        }
        let debug = match &self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };

        let mut page = match &self.page_html {
            Some(html) => PageStyles::from_html(html, &self.asset_bundle),
            None => PageStyles::new(),
        };
        for (name, css) in self.stylesheets {
            page.push(name, css);
        }

        Ok(ResponsiveRanges {
            context: RangeContext::new(),
            scanner: RangeScanner::new(self.grouping).with_debug(debug.clone()),
            page,
            asset_bundle: self.asset_bundle,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchiki::traits::TendrilSink;
    use std::time::{SystemTime, UNIX_EPOCH};

    const CARD_CSS: &str =
        r#".card[width-range~="480px-900px"],.card[width-range~="900px-"] { padding: 8px; }"#;

    fn card_ranges() -> ResponsiveRanges {
        ResponsiveRanges::builder()
            .stylesheet("card.css", CARD_CSS)
            .build()
            .expect("build")
    }

    #[test]
    fn card_width_ranges_follow_the_element_size() {
        let ranges = card_ranges();
        let mut tracker = ranges.extend(&TargetStyles::new("card"));
        let metrics = FontMetrics::default();

        let update = tracker.on_resize(850, 400, &metrics);
        assert_eq!(update.width_range.as_deref(), Some("480px-900px"));
        assert_eq!(update.height_range, None);

        let update = tracker.on_resize(1200, 400, &metrics);
        assert_eq!(update.width_range.as_deref(), Some("900px-"));

        let update = tracker.on_resize(300, 400, &metrics);
        assert_eq!(update.width_range, None);
    }

    #[test]
    fn cache_is_scanned_lazily_and_shared() {
        let ranges = card_ranges();
        assert!(!ranges.is_scanned());
        let first = ranges.extend(&TargetStyles::new("card"));
        assert!(ranges.is_scanned());
        let second = ranges.extend(&TargetStyles::new("other"));
        assert_eq!(first.breakpoints(Dimension::Width).len(), 2);
        assert!(second.breakpoints(Dimension::Width).is_empty());
        assert!(Arc::ptr_eq(&ranges.range_cache(), &ranges.range_cache()));
    }

    #[test]
    fn class_case_differences_still_match() {
        let ranges = ResponsiveRanges::builder()
            .stylesheet("app.css", r#".Wide-Card[width-range~="0-100px"] {}"#)
            .build()
            .expect("build");
        let mut tracker = ranges.extend(&TargetStyles::new("Wide").with_style("Card"));
        let update = tracker.on_resize(50, 50, &FontMetrics::default());
        assert_eq!(update.width_range.as_deref(), Some("0-100px"));
    }

    #[test]
    fn reordering_browser_reads_attribute_first_selectors() {
        let ranges = ResponsiveRanges::builder()
            .detect_grouping("Microsoft Internet Explorer")
            .build()
            .expect("build");
        assert_eq!(ranges.grouping(), SelectorGrouping::Reordered);
    }

    #[test]
    fn html_page_with_links_and_imports_drives_dom_attributes() {
        let mut bundle = AssetBundle::default();
        bundle.add_css(
            "layout.css",
            r#"@import "type.css"; #sidebar[width-range~="0-20em"] { display: none; }"#,
        );
        bundle.add_css(
            "type.css",
            r#".panel.compact[height-range~="100px-"], .panel[width-range~="2in-"] {}"#,
        );
        let html = r#"
        <html>
          <head>
            <link rel="stylesheet" href="layout.css">
            <style>.panel-wide[width-range~='10xyz-'] {}</style>
          </head>
          <body>
            <div id="sidebar" class="panel compact wide" style="font-size: 10px"></div>
          </body>
        </html>
        "#;
        let ranges = ResponsiveRanges::builder()
            .page_html(html)
            .register_bundle(bundle)
            .build()
            .expect("build");
        assert_eq!(ranges.page().len(), 2);

        let doc = kuchiki::parse_html().one(html);
        let sidebar = doc.select_first("#sidebar").expect("sidebar").as_node().clone();
        let mut tracker = ranges.extend_element(&sidebar).expect("extend");
        assert_eq!(tracker.breakpoints(Dimension::Width).len(), 3);
        assert_eq!(tracker.breakpoints(Dimension::Height).len(), 1);

        let layout = InlineStyleLayout::default();
        // 20em at 10px is 200px; 2in is 192px.
        let update = tracker
            .on_element_resize(&sidebar, 195, 120, &layout)
            .expect("resize");
        assert_eq!(update.width_range.as_deref(), Some("2in- 0-20em"));
        assert_eq!(update.height_range.as_deref(), Some("100px-"));

        tracker
            .on_element_resize(&sidebar, 250, 20, &layout)
            .expect("resize");
        let attrs = sidebar.as_element().expect("element").attributes.borrow();
        assert_eq!(attrs.get("width-range"), Some("2in-"));
        assert_eq!(attrs.get("height-range"), None);
    }

    #[test]
    fn unnamed_assets_are_rejected() {
        let mut bundle = AssetBundle::default();
        bundle.add_css("  ", ".a {}");
        let err = ResponsiveRanges::builder()
            .register_bundle(bundle)
            .build()
            .expect_err("unnamed asset");
        assert!(matches!(err, ResponsiveError::InvalidConfiguration(_)));
    }

    #[test]
    fn debug_log_records_scan_attach_and_resize() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("responsive_ranges_e2e_{nanos}.jsonl"));
        let ranges = ResponsiveRanges::builder()
            .stylesheet("card.css", CARD_CSS)
            .stylesheet("odd.css", r#".card[width-range~="10xyz-"] {}"#)
            .debug_path(&path)
            .build()
            .expect("build");
        let mut tracker = ranges.extend(&TargetStyles::new("card"));
        tracker.on_resize(850, 10, &FontMetrics::default());
        ranges.emit_debug_summary("test");

        let text = std::fs::read_to_string(&path).expect("read log");
        let kinds: Vec<String> = text
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect();
        for expected in [
            "range.sheet",
            "range.breakpoint",
            "range.attach",
            "range.resize",
            "range.unresolved",
            "debug.summary",
        ] {
            assert!(
                kinds.iter().any(|kind| kind == expected),
                "missing {expected} in {kinds:?}"
            );
        }
        let summary = text
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .find(|event| event["type"] == "debug.summary")
            .expect("summary");
        assert_eq!(summary["counts"]["range.unresolved"], 1);
        let _ = std::fs::remove_file(path);
    }
}
