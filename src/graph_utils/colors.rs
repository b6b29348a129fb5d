//! Risk grading: maps a numeric score onto one of four severity bands and the
//! color, width and title used to render that band.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    Low = 0,
    Moderate = 1,
    High = 2,
    Critical = 3,
}

impl Grade {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn threshold(self) -> &'static Threshold {
        &THRESHOLDS[self.index()]
    }

    pub fn title(self) -> &'static str {
        self.threshold().label
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub grade: Grade,
    // Inclusive-looking but compared with a strict `>` against the normalized value
    pub upper_bound: f64,
    // Hue in [0, 1]
    pub hue: f64,
    pub width: f64,
    pub label: &'static str,
}

pub const THRESHOLDS: [Threshold; 4] = [
    Threshold { grade: Grade::Low, upper_bound: 0.4, hue: 60.0 / 360.0, width: 5.0, label: "LOW" },
    Threshold { grade: Grade::Moderate, upper_bound: 0.8, hue: 30.0 / 360.0, width: 10.0, label: "MODERATE" },
    Threshold { grade: Grade::High, upper_bound: 0.95, hue: 0.0, width: 15.0, label: "HIGH" },
    Threshold { grade: Grade::Critical, upper_bound: 1.0, hue: 280.0 / 360.0, width: 20.0, label: "CRITICAL" },
];

pub const DEFAULT_LUMINANCE: f64 = 0.5;
pub const PERCENT_LUMINANCE: f64 = 0.75;
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

const LINK_COLOR_LOW: &str = "#444";
const LINK_COLOR_MODERATE: &str = "#faf263";

/// Linear rescale of `value` from `source` onto `target`. No clamping.
pub fn map_to_range(value: f64, source: (f64, f64), target: (f64, f64)) -> f64 {
    let (s0, s1) = source;
    let (t0, t1) = target;
    t0 + (value - s0) * (t1 - t0) / (s1 - s0)
}

fn normalize(value: f64, range: (f64, f64)) -> f64 {
    map_to_range(value, range, (0.0, 1.0)).clamp(0.0, 1.0)
}

pub fn get_grade(value: f64, range: (f64, f64)) -> Grade {
    let v = normalize(value, range);
    if v == 1.0 {
        return Grade::Critical;
    }
    // NaN (degenerate range) compares false everywhere and lands on LOW
    THRESHOLDS
        .iter()
        .find(|t| t.upper_bound > v)
        .map(|t| t.grade)
        .unwrap_or(Grade::Low)
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let mut t = t;
    if t < 0.0 { t += 1.0; }
    if t > 1.0 { t -= 1.0; }
    if t < 1.0 / 6.0 { return p + (q - p) * 6.0 * t; }
    if t < 0.5 { return q; }
    if t < 2.0 / 3.0 { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    p
}

/// HSL (all components in [0, 1]) to 8-bit RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    if s == 0.0 {
        let c = to_byte(l);
        return (c, c, c);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn grade_color(grade: Grade, luminance: f64) -> String {
    let (r, g, b) = hsl_to_rgb(grade.threshold().hue, 1.0, luminance);
    format!("rgba({}, {}, {}, 1)", r, g, b)
}

pub fn to_color(value: f64, range: (f64, f64), luminance: Option<f64>) -> String {
    grade_color(get_grade(value, range), luminance.unwrap_or(DEFAULT_LUMINANCE))
}

/// Edge color variant: the two lowest grades use fixed colors that read well
/// on the canvas, everything else uses the computed grade color.
pub fn to_graph_link_color(value: f64, range: (f64, f64), luminance: Option<f64>) -> String {
    let grade = get_grade(value, range);
    match grade {
        Grade::Low => LINK_COLOR_LOW.to_string(),
        Grade::Moderate => LINK_COLOR_MODERATE.to_string(),
        _ => grade_color(grade, luminance.unwrap_or(DEFAULT_LUMINANCE)),
    }
}

pub fn to_width(value: f64, range: (f64, f64)) -> f64 {
    get_grade(value, range).threshold().width
}

pub fn to_title(value: f64, range: (f64, f64)) -> &'static str {
    get_grade(value, range).title()
}

// Percent helpers: fixed [0, 100] input range.
pub fn percent_to_grade(percent: f64) -> Grade {
    get_grade(percent, PERCENT_RANGE)
}

pub fn percent_to_color(percent: f64) -> String {
    to_color(percent, PERCENT_RANGE, Some(PERCENT_LUMINANCE))
}

pub fn percent_to_width(percent: f64) -> f64 {
    to_width(percent, PERCENT_RANGE)
}

pub fn percent_to_title(percent: f64) -> &'static str {
    to_title(percent, PERCENT_RANGE)
}

// Text color drawn over a percent-colored background.
pub fn percent_to_contrast_color(percent: f64) -> &'static str {
    if percent < 80.0 { "#000" } else { "#fff" }
}
