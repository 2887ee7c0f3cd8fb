//! Turning numbers and dates into text for templates.
//!
//! Numbers use printf conventions (`d`, `.2f`, `5.1f km`, ...), dates use
//! the moment-style tokens note users already write in their settings
//! (`YYYY-MM-DD`, `ddd D MMM`, `[week] W`, ...).

use time::Date;

use crate::error::{Error, Reason, Result};

fn format_error(format: &str, reason: Reason) -> Error {
    Error::Format {
        format: format.to_string(),
        reason,
    }
}

/// Format `value` with a printf specification given without its leading
/// `%`, so `.1f` reads as `%.1f`.
pub fn format_number(value: f64, format: &str) -> Result<String> {
    let spec = format!("%{format}");
    let mut out = String::new();
    let mut used = false;
    let mut chars = spec.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        if chars.peek().is_none() {
            return Err(format_error(format, Reason::Invalid));
        }
        if used {
            return Err(format_error(format, Reason::MultipleValues));
        }
        used = true;

        let mut conv = Conversion::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => conv.left_align = true,
                '+' => conv.plus_sign = true,
                ' ' => conv.space_sign = true,
                '0' => conv.zero_pad = true,
                _ => break,
            }
            chars.next();
        }
        conv.width = read_digits(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            conv.precision = Some(read_digits(&mut chars).unwrap_or(0));
        }
        let kind = chars
            .next()
            .ok_or_else(|| format_error(format, Reason::Invalid))?;
        let body = conv
            .render(kind, value)
            .ok_or_else(|| format_error(format, Reason::Invalid))?;
        out.push_str(&body);
    }

    Ok(out)
}

fn read_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(c) = chars.peek().filter(|c| c.is_ascii_digit()) {
        digits.push(*c);
        chars.next();
    }
    digits.parse().ok()
}

#[derive(Debug, Default)]
struct Conversion {
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
}

impl Conversion {
    /// `None` for an unknown conversion character.
    fn render(&self, kind: char, value: f64) -> Option<String> {
        let (negative, digits) = match kind {
            'd' | 'i' => {
                let n = value.trunc();
                (n < 0.0, format!("{}", n.abs()))
            }
            'f' | 'F' => {
                let precision = self.precision.unwrap_or(6);
                (value < 0.0, format!("{:.*}", precision, value.abs()))
            }
            'e' | 'E' => {
                let body = exponential(value.abs(), self.precision);
                let body = if kind == 'E' { body.to_uppercase() } else { body };
                (value < 0.0, body)
            }
            'g' | 'G' => {
                let body = general(value.abs(), self.precision);
                let body = if kind == 'G' { body.to_uppercase() } else { body };
                (value < 0.0, body)
            }
            'u' => return Some(self.pad("", &format!("{}", as_u32(value)))),
            'x' => return Some(self.pad("", &format!("{:x}", as_u32(value)))),
            'X' => return Some(self.pad("", &format!("{:X}", as_u32(value)))),
            'o' => return Some(self.pad("", &format!("{:o}", as_u32(value)))),
            'b' => return Some(self.pad("", &format!("{:b}", as_u32(value)))),
            's' => {
                let mut text = format!("{value}");
                if let Some(precision) = self.precision {
                    text = text.chars().take(precision).collect();
                }
                return Some(self.pad_text(&text));
            }
            _ => return None,
        };

        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };
        Some(self.pad(sign, &digits))
    }

    fn pad(&self, sign: &str, digits: &str) -> String {
        let len = sign.len() + digits.chars().count();
        if len >= self.width {
            return format!("{sign}{digits}");
        }
        let fill = self.width - len;
        if self.left_align {
            format!("{sign}{digits}{}", " ".repeat(fill))
        } else if self.zero_pad {
            format!("{sign}{}{digits}", "0".repeat(fill))
        } else {
            format!("{}{sign}{digits}", " ".repeat(fill))
        }
    }

    fn pad_text(&self, text: &str) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text.to_string();
        }
        let fill = " ".repeat(self.width - len);
        if self.left_align {
            format!("{text}{fill}")
        } else {
            format!("{fill}{text}")
        }
    }
}

/// Wraps like an unsigned 32 bits shift would.
fn as_u32(value: f64) -> u32 {
    value.trunc() as i64 as u32
}

/// `1.50e+2` style exponent notation.
fn exponential(value: f64, precision: Option<usize>) -> String {
    let raw = match precision {
        Some(precision) => format!("{:.*e}", precision, value),
        None => format!("{:e}", value),
    };
    match raw.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => raw,
    }
}

/// Shortest representation, rounded to `precision` significant digits.
fn general(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(precision) => {
            let rounded = format!("{:.*e}", precision.max(1) - 1, value);
            let rounded: f64 = rounded.parse().unwrap_or(value);
            format!("{rounded}")
        }
        None => format!("{value}"),
    }
}

const TOKENS: &[&str] = &[
    "YYYY", "YY", "Q", "MMMM", "MMM", "MM", "M", "DDDD", "DDD", "Do", "DD", "D", "dddd", "ddd",
    "dd", "d", "E", "GGGG", "WW", "W", "HH", "H", "mm", "m", "ss", "s",
];

/// Format `date` with moment-style tokens. Text between `[` and `]` is
/// copied as is. Dates carry no time of day, so hours, minutes and seconds
/// read as midnight.
pub fn format_date(date: Date, format: &str) -> Result<String> {
    let mut out = String::new();
    let mut rest = format;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            let end = rest
                .find(']')
                .ok_or_else(|| format_error(format, Reason::Invalid))?;
            out.push_str(&rest[1..end]);
            rest = &rest[end + 1..];
            continue;
        }
        match TOKENS.iter().find(|token| rest.starts_with(**token)) {
            Some(token) => {
                out.push_str(&render_token(date, token));
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    Ok(out)
}

fn render_token(date: Date, token: &str) -> String {
    let month = date.month();
    let weekday = date.weekday();
    let (iso_year, iso_week, _) = date.to_iso_week_date();
    match token {
        "YYYY" => format!("{:04}", date.year()),
        "YY" => format!("{:02}", date.year().rem_euclid(100)),
        "Q" => format!("{}", (month as u8 - 1) / 3 + 1),
        "MMMM" => month.to_string(),
        "MMM" => month.to_string()[..3].to_string(),
        "MM" => format!("{:02}", month as u8),
        "M" => format!("{}", month as u8),
        "DDDD" => format!("{:03}", date.ordinal()),
        "DDD" => format!("{}", date.ordinal()),
        "Do" => ordinal(date.day()),
        "DD" => format!("{:02}", date.day()),
        "D" => format!("{}", date.day()),
        "dddd" => weekday.to_string(),
        "ddd" => weekday.to_string()[..3].to_string(),
        "dd" => weekday.to_string()[..2].to_string(),
        "d" => format!("{}", weekday.number_days_from_sunday()),
        "E" => format!("{}", weekday.number_from_monday()),
        "GGGG" => format!("{:04}", iso_year),
        "WW" => format!("{:02}", iso_week),
        "W" => format!("{}", iso_week),
        "HH" | "mm" | "ss" => "00".to_string(),
        "H" | "m" | "s" => "0".to_string(),
        _ => token.to_string(),
    }
}

fn ordinal(day: u8) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}
