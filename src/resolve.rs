use crate::breakpoint::{BreakPoint, Dimension};
use crate::units::{LengthProbe, to_pixels};

// Pixel value of one breakpoint bound. Empty and `"0"` are unbounded (0).
// `None` when the length cannot be converted.
pub fn resolve_bound(raw: &str, probe: &dyn LengthProbe) -> Option<i32> {
    if raw.is_empty() || raw == "0" {
        return Some(0);
    }
    match raw.strip_suffix("px") {
        Some(number) => leading_integer(number),
        None => to_pixels(raw, probe),
    }
}

fn leading_integer(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    raw[..end].parse::<i32>().ok()
}

// Attribute text for one dimension, plus the breakpoints that were left out
// because a bound could not be converted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution<'b> {
    pub ranges: String,
    pub unresolved: Vec<&'b BreakPoint>,
}

// Space-separated list of the breakpoints that contain `size`, in the order
// given. Bounded ranges are inclusive on both ends; a zero max leaves the
// range open upwards. Breakpoints with an unconvertible bound are skipped.
pub fn resolve_breakpoint(
    dimension: Dimension,
    size: i32,
    breakpoints: &[BreakPoint],
    probe: &dyn LengthProbe,
) -> String {
    resolve_breakpoints(dimension, size, breakpoints, probe).ranges
}

pub fn resolve_breakpoints<'b>(
    dimension: Dimension,
    size: i32,
    breakpoints: &'b [BreakPoint],
    probe: &dyn LengthProbe,
) -> Resolution<'b> {
    let mut ranges = String::new();
    let mut unresolved = Vec::new();
    for bp in breakpoints {
        let bounds = resolve_bound(&bp.min, probe).zip(resolve_bound(&bp.max, probe));
        let Some((min, max)) = bounds else {
            log::debug!(
                "[responsive][resolve] {} breakpoint {} skipped: cannot convert {:?}-{:?}",
                dimension.as_str(),
                bp.selector,
                bp.min,
                bp.max
            );
            unresolved.push(bp);
            continue;
        };

        let token = if max > 0 {
            (min <= size && size <= max).then(|| format!("{}-{}", bp.min, bp.max))
        } else {
            (min <= size).then(|| format!("{}-", bp.min))
        };
        if let Some(token) = token {
            ranges.push(' ');
            ranges.push_str(&token);
        }
    }
    Resolution {
        ranges: ranges.trim().to_string(),
        unresolved,
    }
}
