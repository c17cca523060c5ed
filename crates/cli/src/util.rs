use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Shorten `s` to at most `width` terminal columns, ending in ".." when cut.
/// Product names are often CJK, so widths are display columns, not chars.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad with spaces (or truncate) to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let truncated = truncate_display(s, width);
    let used = UnicodeWidthStr::width(truncated.as_str());
    format!("{}{}", truncated, " ".repeat(width.saturating_sub(used)))
}

/// Spreadsheet letter for a 1-based column position (1 -> A, 27 -> AA).
pub(crate) fn column_letter(position: usize) -> String {
    let mut letters = Vec::new();
    let mut n = position;
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Volumes in human output: up to 6 decimals, trailing zeros dropped.
pub(crate) fn format_volume(v: f64) -> String {
    let s = format!("{:.6}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
