use indexmap::IndexSet;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Width,
    Height,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Width, Dimension::Height];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Width => "width",
            Dimension::Height => "height",
        }
    }

    // Name of the element attribute that carries the resolved ranges.
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Dimension::Width => "width-range",
            Dimension::Height => "height-range",
        }
    }
}

// One `SELECTOR[DIM-range~="MIN-MAX"]` declaration. `min` and `max` keep the
// author's raw length text; an empty string or `"0"` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakPoint {
    pub selector: String,
    pub min: String,
    pub max: String,
}

impl BreakPoint {
    pub fn new(
        selector: impl Into<String>,
        min: impl Into<String>,
        max: impl Into<String>,
    ) -> Self {
        Self {
            selector: selector.into(),
            min: min.into(),
            max: max.into(),
        }
    }
}

// Every range breakpoint found on the page, one insertion-ordered set per
// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeCache {
    width: IndexSet<BreakPoint>,
    height: IndexSet<BreakPoint>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns false when an identical breakpoint was already present.
    pub fn insert(&mut self, dimension: Dimension, breakpoint: BreakPoint) -> bool {
        match dimension {
            Dimension::Width => self.width.insert(breakpoint),
            Dimension::Height => self.height.insert(breakpoint),
        }
    }

    pub fn width(&self) -> &IndexSet<BreakPoint> {
        &self.width
    }

    pub fn height(&self) -> &IndexSet<BreakPoint> {
        &self.height
    }

    pub fn for_dimension(&self, dimension: Dimension) -> &IndexSet<BreakPoint> {
        match dimension {
            Dimension::Width => &self.width,
            Dimension::Height => &self.height,
        }
    }

    pub fn len(&self) -> usize {
        self.width.len() + self.height.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_empty() && self.height.is_empty()
    }
}

// Owner of the page-wide cache. The cache is built on first use and is
// read-only afterwards; concurrent first calls run the builder once.
#[derive(Debug, Default)]
pub struct RangeContext {
    cache: OnceLock<Arc<RangeCache>>,
}

impl RangeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_once<F>(&self, build: F) -> Arc<RangeCache>
    where
        F: FnOnce() -> RangeCache,
    {
        Arc::clone(self.cache.get_or_init(|| Arc::new(build())))
    }

    pub fn get(&self) -> Option<Arc<RangeCache>> {
        self.cache.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn identical_declarations_are_stored_once_in_scan_order() {
        let mut cache = RangeCache::new();
        assert!(cache.insert(
            Dimension::Width,
            BreakPoint::new(".card", "480px", "900px")
        ));
        assert!(cache.insert(Dimension::Width, BreakPoint::new(".card", "900px", "")));
        assert!(!cache.insert(
            Dimension::Width,
            BreakPoint::new(".card", "480px", "900px")
        ));
        assert!(cache.insert(Dimension::Height, BreakPoint::new(".card", "480px", "900px")));

        let widths: Vec<&str> = cache.width().iter().map(|bp| bp.min.as_str()).collect();
        assert_eq!(widths, vec!["480px", "900px"]);
        assert_eq!(cache.for_dimension(Dimension::Height).len(), 1);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn context_builds_the_cache_only_once() {
        let context = RangeContext::new();
        assert!(!context.is_initialized());
        assert!(context.get().is_none());

        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            let mut cache = RangeCache::new();
            cache.insert(Dimension::Width, BreakPoint::new("#main", "0", "600px"));
            cache
        };
        let first = context.initialize_once(build);
        let second = context.initialize_once(|| {
            builds.fetch_add(1, Ordering::SeqCst);
            RangeCache::new()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.width().len(), 1);
        assert!(context.is_initialized());
    }

    #[test]
    fn concurrent_first_calls_share_one_cache() {
        let context = Arc::new(RangeContext::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let context = Arc::clone(&context);
                let builds = Arc::clone(&builds);
                std::thread::spawn(move || {
                    context.initialize_once(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        RangeCache::new()
                    })
                })
            })
            .collect();
        let caches: Vec<Arc<RangeCache>> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(caches.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn attribute_names_follow_dimension() {
        assert_eq!(Dimension::Width.attribute_name(), "width-range");
        assert_eq!(Dimension::Height.attribute_name(), "height-range");
        assert_eq!(Dimension::ALL.map(|d| d.as_str()), ["width", "height"]);
    }
}
