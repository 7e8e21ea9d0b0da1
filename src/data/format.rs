//! Brazilian number formatting and text progress bars.

const FILLED_BLOCK: char = '▰';
const EMPTY_BLOCK: char = '▱';
const BAR_BLOCKS: i64 = 10;

/// Format with `.` as thousands separator and `,` as decimal separator.
pub fn format_br(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let digits = int_part.len();
    let mut out = String::with_capacity(fixed.len() + digits / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Bar label in billions, e.g. `12,3 bi`.
pub fn billions_label(value: f64) -> String {
    format!("{} bi", format_br(value / 1e9, 1))
}

/// Bar label in millions, e.g. `1.234,5 mi`.
pub fn millions_label(value: f64) -> String {
    format!("{} mi", format_br(value / 1e6, 1))
}

/// Ten-block bar for a percentage: one filled block per full 10%.
/// Over 100% keeps adding filled blocks; non-finite input renders empty.
pub fn block_bar(pct: f64) -> String {
    if !pct.is_finite() {
        return String::new();
    }
    let blocks = (pct / 10.0).floor() as i64;
    let filled = blocks.max(0) as usize;
    let empty = (BAR_BLOCKS - blocks).max(0) as usize;

    let mut out = String::with_capacity((filled + empty) * FILLED_BLOCK.len_utf8());
    out.extend(std::iter::repeat(FILLED_BLOCK).take(filled));
    out.extend(std::iter::repeat(EMPTY_BLOCK).take(empty));
    out
}
