// Measures lengths that depend on the rendering context (font metrics,
// root font size) by laying out a probe styled `width: <length>`.
pub trait LengthProbe {
    // Rendered width in whole pixels of a probe with the given CSS width, or
    // `None` when the context cannot measure it.
    fn probe_width(&self, length: &str) -> Option<i32>;
}

const PX_PER_IN: i32 = 96;
const PT_PER_IN: i32 = 72;
const PT_PER_PC: i32 = 12;

// Converts a CSS length to whole pixels. Font-relative units go through the
// probe; absolute units use the integer part of the value. `None` means the
// unit is not recognised.
pub fn to_pixels(length: &str, probe: &dyn LengthProbe) -> Option<i32> {
    let parsed = parse_length(length)?;
    match parsed.unit.as_str() {
        "em" | "rem" | "ex" | "ch" => return probe.probe_width(length),
        "" | "px" | "in" | "cm" | "mm" | "pt" | "pc" => {}
        _ => return None,
    }
    let value = parsed.integer;
    let px = match parsed.unit.as_str() {
        "" | "px" => value,
        "in" => value.checked_mul(PX_PER_IN)?,
        "cm" => (value as f64 * 37.8) as i32,
        "mm" => (value as f64 * 3.78) as i32,
        "pt" => value.checked_mul(PX_PER_IN)? / PT_PER_IN,
        "pc" => (value.checked_mul(PX_PER_IN)? / PT_PER_IN).checked_mul(PT_PER_PC)?,
        _ => return None,
    };
    Some(px)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedLength {
    integer: i32,
    unit: String,
}

// `<digits>? (.<digits>)? <unit of 0-3 chars>`. The fractional part is
// accepted but dropped; conversions work on the integer part.
fn parse_length(raw: &str) -> Option<ParsedLength> {
    let raw = raw.trim();
    let int_end = raw
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    let (int_part, rest) = raw.split_at(int_end);
    let rest = match rest.strip_prefix('.') {
        Some(after_dot) => {
            let frac_len = after_dot
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(after_dot.len());
            if frac_len == 0 {
                return None;
            }
            &after_dot[frac_len..]
        }
        None => rest,
    };
    if int_part.is_empty() && rest.len() == raw.len() {
        return None;
    }
    if rest.chars().count() > 3 {
        return None;
    }
    let integer = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<i32>().ok()?
    };
    Some(ParsedLength {
        integer,
        unit: rest.to_ascii_lowercase(),
    })
}

// Arithmetic stand-in for a rendering surface: resolves font-relative units
// from fixed metrics instead of laying out a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub font_size: f32,
    pub root_font_size: f32,
    pub ex_ratio: f32,
    pub ch_ratio: f32,
}

impl FontMetrics {
    pub fn new(font_size: f32, root_font_size: f32) -> Self {
        Self {
            font_size,
            root_font_size,
            ..Self::default()
        }
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            root_font_size: 16.0,
            ex_ratio: 0.5,
            ch_ratio: 0.5,
        }
    }
}

impl LengthProbe for FontMetrics {
    fn probe_width(&self, length: &str) -> Option<i32> {
        let raw = length.trim().to_ascii_lowercase();
        let (number, scale) = if let Some(value) = raw.strip_suffix("rem") {
            (value, self.root_font_size)
        } else if let Some(value) = raw.strip_suffix("em") {
            (value, self.font_size)
        } else if let Some(value) = raw.strip_suffix("ex") {
            (value, self.font_size * self.ex_ratio)
        } else if let Some(value) = raw.strip_suffix("ch") {
            (value, self.font_size * self.ch_ratio)
        } else if let Some(value) = raw.strip_suffix("px") {
            (value, 1.0)
        } else {
            return None;
        };
        let value = number.trim().parse::<f32>().ok()?;
        let px = (value * scale).round();
        px.is_finite().then_some(px as i32)
    }
}
