use crate::breakpoint::{BreakPoint, Dimension, RangeCache};
use crate::debug::DebugLogger;
use crate::error::ResponsiveError;
use crate::probe::{DomProbe, ProbeLayout};
use crate::resolve::{Resolution, resolve_breakpoints};
use crate::selector::{TargetStyles, applicable_selectors, match_breakpoints, node_kind};
use crate::units::LengthProbe;
use indexmap::IndexSet;
use kuchiki::NodeRef;
use serde_json::json;
use std::sync::Arc;

// Attribute values computed for one resize. `None` means the attribute is
// removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeUpdate {
    pub width_range: Option<String>,
    pub height_range: Option<String>,
}

impl RangeUpdate {
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Width => self.width_range.as_deref(),
            Dimension::Height => self.height_range.as_deref(),
        }
    }

    pub fn apply(&self, element: &NodeRef) -> Result<(), ResponsiveError> {
        let Some(data) = element.as_element() else {
            return Err(ResponsiveError::MissingElement(node_kind(element).to_string()));
        };
        let mut attrs = data.attributes.borrow_mut();
        for dimension in Dimension::ALL {
            match self.get(dimension) {
                Some(value) => {
                    attrs.insert(dimension.attribute_name(), value.to_string());
                }
                None => {
                    attrs.remove(dimension.attribute_name());
                }
            }
        }
        Ok(())
    }
}

// Range tracking for one element: its breakpoints, picked from the shared
// cache when the element is attached, and the ranges of the last resize.
#[derive(Debug, Clone)]
pub struct RangeTracker {
    selectors: IndexSet<String>,
    width_breakpoints: Vec<BreakPoint>,
    height_breakpoints: Vec<BreakPoint>,
    current_width_ranges: String,
    current_height_ranges: String,
    debug: Option<Arc<DebugLogger>>,
}

impl RangeTracker {
    pub fn attach(target: &TargetStyles, cache: &RangeCache) -> Self {
        let selectors = applicable_selectors(target);
        let pick = |dimension: Dimension| {
            match_breakpoints(&selectors, cache.for_dimension(dimension))
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        };
        let width_breakpoints = pick(Dimension::Width);
        let height_breakpoints = pick(Dimension::Height);
        Self {
            selectors,
            width_breakpoints,
            height_breakpoints,
            current_width_ranges: String::new(),
            current_height_ranges: String::new(),
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: Option<Arc<DebugLogger>>) -> Self {
        if let Some(logger) = debug.as_deref() {
            logger.log_event(&json!({
                "type": "range.attach",
                "selectors": self.selectors.iter().collect::<Vec<_>>(),
                "width_breakpoints": self.width_breakpoints.len(),
                "height_breakpoints": self.height_breakpoints.len(),
            }));
            logger.increment("range.attach", 1);
        }
        self.debug = debug;
        self
    }

    pub fn selectors(&self) -> &IndexSet<String> {
        &self.selectors
    }

    pub fn breakpoints(&self, dimension: Dimension) -> &[BreakPoint] {
        match dimension {
            Dimension::Width => &self.width_breakpoints,
            Dimension::Height => &self.height_breakpoints,
        }
    }

    pub fn current_ranges(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Width => &self.current_width_ranges,
            Dimension::Height => &self.current_height_ranges,
        }
    }

    // Every call recomputes both dimensions; successive resizes are not
    // coalesced.
    pub fn on_resize(&mut self, width: i32, height: i32, probe: &dyn LengthProbe) -> RangeUpdate {
        let widths = resolve_breakpoints(Dimension::Width, width, &self.width_breakpoints, probe);
        let heights =
            resolve_breakpoints(Dimension::Height, height, &self.height_breakpoints, probe);

        if let Some(logger) = self.debug.as_deref() {
            log_unresolved(logger, Dimension::Width, &widths);
            log_unresolved(logger, Dimension::Height, &heights);
            logger.log_event(&json!({
                "type": "range.resize",
                "width": width,
                "height": height,
                "width_range": widths.ranges,
                "height_range": heights.ranges,
            }));
            logger.increment("range.resize", 1);
        }

        self.current_width_ranges = widths.ranges;
        self.current_height_ranges = heights.ranges;
        RangeUpdate {
            width_range: non_empty(&self.current_width_ranges),
            height_range: non_empty(&self.current_height_ranges),
        }
    }

    // Resize callback for a DOM element: relative lengths are measured
    // against `element`, and the resulting attributes are written to it.
    pub fn on_element_resize(
        &mut self,
        element: &NodeRef,
        width: i32,
        height: i32,
        layout: &dyn ProbeLayout,
    ) -> Result<RangeUpdate, ResponsiveError> {
        if element.as_element().is_none() {
            return Err(ResponsiveError::MissingElement(node_kind(element).to_string()));
        }
        let probe = DomProbe::new(element.clone(), layout);
        let update = self.on_resize(width, height, &probe);
        update.apply(element)?;
        Ok(update)
    }
}

fn log_unresolved(logger: &DebugLogger, dimension: Dimension, resolution: &Resolution<'_>) {
    for bp in &resolution.unresolved {
        logger.log_event(&json!({
            "type": "range.unresolved",
            "dimension": dimension.as_str(),
            "selector": bp.selector,
            "min": bp.min,
            "max": bp.max,
        }));
        logger.increment("range.unresolved", 1);
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
