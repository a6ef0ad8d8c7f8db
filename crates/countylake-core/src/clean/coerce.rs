// Cell coercion: numeric parsing with placeholder handling, county keys

/// Tokens the source agencies use for suppressed or unavailable values
const PLACEHOLDER_TOKENS: &[&str] = &["-", "N", "(X)", "*", "**", "***", "NA", "N/A", "null"];

/// Outcome of coercing one numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric<T> {
    /// Empty or a known placeholder token
    Missing,
    Value(T),
    /// Present but not a number; stored as null and counted
    Malformed,
}

impl<T> Numeric<T> {
    /// Collapse to an optional value, incrementing `malformed` when needed
    pub fn tally(self, malformed: &mut usize) -> Option<T> {
        match self {
            Numeric::Value(v) => Some(v),
            Numeric::Missing => None,
            Numeric::Malformed => {
                *malformed += 1;
                None
            }
        }
    }
}

pub fn is_placeholder(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || PLACEHOLDER_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(trimmed))
}

fn numeric_text(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    Some(
        raw.trim()
            .trim_end_matches('%')
            .chars()
            .filter(|c| *c != ',')
            .collect(),
    )
}

/// Parse a floating point measure
pub fn parse_measure(raw: &str) -> Numeric<f64> {
    let Some(text) = numeric_text(raw) else {
        return Numeric::Missing;
    };
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Numeric::Value(v),
        _ => Numeric::Malformed,
    }
}

/// Parse an integer count; integral decimals such as `601.0` are accepted
pub fn parse_count(raw: &str) -> Numeric<i64> {
    let Some(text) = numeric_text(raw) else {
        return Numeric::Missing;
    };
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Numeric::Value(v);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 => Numeric::Value(v as i64),
        _ => Numeric::Malformed,
    }
}

/// Normalize a county or district name into the shared join key
///
/// Drops everything from the first comma (the state suffix), removes the
/// word "County" in any case, collapses whitespace and title-cases each
/// remaining word: `"DeKalb County, Georgia"` becomes `"Dekalb"`.
pub fn normalize_county(raw: &str) -> Option<String> {
    let head = raw.split(',').next().unwrap_or_default();
    let words: Vec<String> = head
        .split_whitespace()
        .filter(|w| !w.eq_ignore_ascii_case("county"))
        .map(title_case)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
