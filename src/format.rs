//! Display formatting for sizes, timestamps and cells.

use chrono::{DateTime, Local, Utc};

use crate::store::{CellValue, ColumnKind};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human readable size, base 1024, at most two decimals with trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(&format!("{value:.2}")), SIZE_UNITS[unit])
}

fn trim_decimals(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// "Mar 4, 09:15 AM" in local time.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%b %-d, %I:%M %p").to_string()
}

pub fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let len = s.len();
    if len <= 3 {
        return s;
    }
    let first_len = len % 3;
    let first_len = if first_len == 0 { 3 } else { first_len };
    let mut out = s[..first_len].to_string();
    for i in (first_len..len).step_by(3) {
        out.push(',');
        out.push_str(&s[i..i + 3]);
    }
    out
}

fn format_signed_with_commas(n: i64) -> String {
    if n < 0 {
        format!("-{}", format_with_commas(n.unsigned_abs()))
    } else {
        format_with_commas(n as u64)
    }
}

/// Cell formatting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFormat {
    pub thousands_separator: bool,
    pub float_precision: usize,
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            thousands_separator: true,
            float_precision: 2,
        }
    }
}

impl CellFormat {
    pub fn format(&self, value: &CellValue, kind: ColumnKind) -> String {
        match value {
            CellValue::Null => String::new(),
            CellValue::Int(v) if self.thousands_separator && kind.is_numeric() => {
                format_signed_with_commas(*v)
            }
            CellValue::Float(v) if v.is_finite() => {
                let fixed = format!("{:.*}", self.float_precision, v);
                if !self.thousands_separator {
                    return fixed;
                }
                let (int_part, frac) = match fixed.split_once('.') {
                    Some((i, f)) => (i, Some(f)),
                    None => (fixed.as_str(), None),
                };
                let (sign, digits) = match int_part.strip_prefix('-') {
                    Some(d) => ("-", d),
                    None => ("", int_part),
                };
                let grouped = digits
                    .parse::<u64>()
                    .map(format_with_commas)
                    .unwrap_or_else(|_| digits.to_string());
                match frac {
                    Some(f) => format!("{sign}{grouped}.{f}"),
                    None => format!("{sign}{grouped}"),
                }
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 + 1), "3 GB");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1000), "1,000");
        assert_eq!(format_with_commas(1234567), "1,234,567");
        assert_eq!(format_signed_with_commas(-1234), "-1,234");
    }

    #[test]
    fn test_cell_format() {
        let fmt = CellFormat::default();
        assert_eq!(fmt.format(&CellValue::Int(12345), ColumnKind::Integer), "12,345");
        assert_eq!(
            fmt.format(&CellValue::Float(-1234.5), ColumnKind::Float),
            "-1,234.50"
        );
        assert_eq!(fmt.format(&CellValue::Null, ColumnKind::Text), "");
        assert_eq!(
            fmt.format(&CellValue::Text("east".into()), ColumnKind::Text),
            "east"
        );

        let plain = CellFormat {
            thousands_separator: false,
            float_precision: 1,
        };
        assert_eq!(plain.format(&CellValue::Int(12345), ColumnKind::Integer), "12345");
        assert_eq!(plain.format(&CellValue::Float(2.75), ColumnKind::Float), "2.8");
    }
}
