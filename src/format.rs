/// Renders `1234567` as `1,234,567`.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn thousands_f64(value: f64) -> String {
    if value < 0.0 {
        return format!("-{}", thousands((-value).round() as u64));
    }
    thousands(value.round() as u64)
}

/// Compact axis label: `950`, `1.2K`, `3.4M`, `5B`.
pub fn compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let magnitude = value.abs();
    for (scale, suffix) in UNITS {
        if magnitude >= scale {
            return format!("{}{suffix}", trim_fraction(value / scale, 1));
        }
    }
    trim_fraction(value, 1)
}

/// Percentage with at most one fraction digit and no trailing `.0`.
pub fn percentage(value: f64) -> String {
    trim_fraction(value, 1)
}

/// Escapes text for HTML and SVG element content and attribute values.
/// Braces are escaped too so text never forms a `{{...}}` template slot.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

fn trim_fraction(value: f64, digits: usize) -> String {
    let rendered = format!("{value:.digits$}");
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
