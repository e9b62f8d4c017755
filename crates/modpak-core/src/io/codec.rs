//! Symmetric codec for one flat record line.
//!
//! Free-format lines are whitespace-delimited and numeric fields render
//! with Rust's shortest round-trip formatting, so no precision is lost on a
//! write/read cycle. Fixed-format lines give each field a caller-specified
//! column width; decoding slices at byte offsets rather than splitting on
//! whitespace, because legacy files may omit delimiters between adjacent
//! numeric fields.

use crate::records::{FieldType, Value};
use thiserror::Error;

/// Malformed text line.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("line is {actual} characters but the layout declares {expected}")]
    LineTooShort { expected: usize, actual: usize },

    #[error("expected {expected} fields but found {found}")]
    MissingTokens { expected: usize, found: usize },

    #[error("invalid integer in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },

    #[error("invalid real number in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },

    #[error("value '{value}' does not fit in a {width}-character field")]
    FieldOverflow { value: String, width: usize },
}

/// Column layout of one field: width (fixed mode) and scalar type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLayout {
    pub width: usize,
    pub ty: FieldType,
}

impl FieldLayout {
    /// Default MODFLOW field width of ten characters.
    pub fn new(ty: FieldType) -> Self {
        FieldLayout { width: 10, ty }
    }

    pub fn with_width(ty: FieldType, width: usize) -> Self {
        FieldLayout { width, ty }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => {
            if v.is_finite() && *v == v.trunc() && v.abs() < 1e15 {
                format!("{:.1}", v)
            } else {
                format!("{}", v)
            }
        }
    }
}

fn format_fixed(value: &Value, width: usize) -> Result<String, FormatError> {
    let s = format_value(value);
    if s.len() <= width {
        return Ok(format!("{s:>width$}"));
    }
    if let Value::Float(v) = value {
        // Shrink scientific precision until the field fits.
        for prec in (0..=width).rev() {
            let s = format!("{v:.prec$e}");
            if s.len() <= width {
                return Ok(format!("{s:>width$}"));
            }
        }
    }
    Err(FormatError::FieldOverflow { value: s, width })
}

/// Encodes one record into a text line.
///
/// In free mode every field is right-justified to its layout width and the
/// fields are joined by single spaces; in fixed mode fields are concatenated
/// with no separator. An optional trailing comment is appended after two
/// spaces; it never participates in decoding.
pub fn encode_line(
    values: &[Value],
    layout: &[FieldLayout],
    free: bool,
    comment: Option<&str>,
) -> Result<String, FormatError> {
    if values.len() != layout.len() {
        return Err(FormatError::MissingTokens {
            expected: layout.len(),
            found: values.len(),
        });
    }
    let mut line = String::new();
    for (i, (value, field)) in values.iter().zip(layout).enumerate() {
        if free {
            if i > 0 {
                line.push(' ');
            }
            let s = format_value(value);
            line.push_str(&format!("{s:>width$}", width = field.width.saturating_sub(1)));
        } else {
            line.push_str(&format_fixed(value, field.width)?);
        }
    }
    if let Some(comment) = comment {
        line.push_str("  ");
        line.push_str(comment);
    }
    Ok(line)
}

fn parse_value(token: &str, ty: FieldType, columns: &str) -> Result<Value, FormatError> {
    match ty {
        FieldType::Int => token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| FormatError::InvalidInt {
                columns: columns.to_string(),
                value: token.to_string(),
            }),
        FieldType::Float => {
            // Legacy Fortran decks write exponents as D; accept both.
            let normalized;
            let token = if token.contains(['D', 'd']) {
                normalized = token.replace(['D', 'd'], "e");
                normalized.as_str()
            } else {
                token
            };
            token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| FormatError::InvalidFloat {
                    columns: columns.to_string(),
                    value: token.to_string(),
                })
        }
    }
}

/// Decodes one text line into typed values.
///
/// Trailing extra tokens (free mode) or columns (fixed mode) are ignored;
/// this is a tolerant reader for a legacy format whose lines frequently
/// carry end-of-line commentary.
pub fn decode_line(
    line: &str,
    layout: &[FieldLayout],
    free: bool,
) -> Result<Vec<Value>, FormatError> {
    if free {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < layout.len() {
            return Err(FormatError::MissingTokens {
                expected: layout.len(),
                found: tokens.len(),
            });
        }
        layout
            .iter()
            .zip(&tokens)
            .enumerate()
            .map(|(i, (field, token))| parse_value(token, field.ty, &format!("field {}", i + 1)))
            .collect()
    } else {
        let total: usize = layout.iter().map(|f| f.width).sum();
        if line.len() < total {
            return Err(FormatError::LineTooShort {
                expected: total,
                actual: line.len(),
            });
        }
        let mut values = Vec::with_capacity(layout.len());
        let mut start = 0;
        for field in layout {
            let end = start + field.width;
            let columns = format!("{}-{}", start + 1, end);
            let token = line.get(start..end).unwrap_or("").trim();
            values.push(parse_value(token, field.ty, &columns)?);
            start = end;
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(types: &[FieldType]) -> Vec<FieldLayout> {
        types.iter().map(|&ty| FieldLayout::new(ty)).collect()
    }

    #[test]
    fn fixed_encode_right_justifies_into_declared_widths() {
        let layout = layout(&[FieldType::Int, FieldType::Int, FieldType::Float]);
        let line = encode_line(
            &[Value::Int(3), Value::Int(12), Value::Float(10.5)],
            &layout,
            false,
            None,
        )
        .unwrap();
        assert_eq!(line, "         3        12      10.5");
    }

    #[test]
    fn fixed_decode_slices_fields_without_delimiters() {
        // Adjacent numeric fields packed with no spaces between them.
        let layout = [
            FieldLayout::with_width(FieldType::Int, 5),
            FieldLayout::with_width(FieldType::Float, 10),
            FieldLayout::with_width(FieldType::Float, 10),
        ];
        let values = decode_line("    3-1234.5678-9876.5432", &layout, false).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Int(3),
                Value::Float(-1234.5678),
                Value::Float(-9876.5432)
            ]
        );
    }

    #[test]
    fn fixed_decode_rejects_short_line() {
        let layout = layout(&[FieldType::Int, FieldType::Float]);
        let err = decode_line("       3", &layout, false).unwrap_err();
        assert_eq!(
            err,
            FormatError::LineTooShort {
                expected: 20,
                actual: 8
            }
        );
    }

    #[test]
    fn fixed_decode_ignores_trailing_columns() {
        let layout = [FieldLayout::with_width(FieldType::Int, 5)];
        let values = decode_line("    7  end of period", &layout, false).unwrap();
        assert_eq!(values, vec![Value::Int(7)]);
    }

    #[test]
    fn free_decode_rejects_float_token_in_int_slot() {
        let layout = layout(&[FieldType::Int]);
        let err = decode_line("10.0", &layout, true).unwrap_err();
        assert!(matches!(err, FormatError::InvalidInt { .. }));
    }

    #[test]
    fn free_decode_rejects_missing_tokens() {
        let layout = layout(&[FieldType::Int, FieldType::Float, FieldType::Float]);
        let err = decode_line("1 2.0", &layout, true).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingTokens {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn free_decode_ignores_trailing_tokens() {
        let layout = layout(&[FieldType::Int, FieldType::Int]);
        let values = decode_line("         1         0  Stress period 1", &layout, true).unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::Int(0)]);
    }

    #[test]
    fn free_round_trip_preserves_float_exactly() {
        let layout = layout(&[FieldType::Float]);
        let v = 0.1234567890123456_f64;
        let line = encode_line(&[Value::Float(v)], &layout, true, None).unwrap();
        let values = decode_line(&line, &layout, true).unwrap();
        assert_eq!(values[0], Value::Float(v));
    }

    #[test]
    fn fortran_double_exponent_is_accepted() {
        let layout = layout(&[FieldType::Float]);
        let values = decode_line("1.5D-3", &layout, true).unwrap();
        assert_eq!(values[0], Value::Float(1.5e-3));
    }

    #[test]
    fn comment_is_appended_but_never_decoded() {
        let layout = layout(&[FieldType::Int]);
        let line = encode_line(&[Value::Int(4)], &layout, true, Some("Stress period 2")).unwrap();
        assert!(line.ends_with("  Stress period 2"));
        let values = decode_line(&line, &layout, true).unwrap();
        assert_eq!(values, vec![Value::Int(4)]);
    }

    #[test]
    fn fixed_encode_rejects_oversized_integer() {
        let layout = [FieldLayout::with_width(FieldType::Int, 3)];
        let err = encode_line(&[Value::Int(12345)], &layout, false, None).unwrap_err();
        assert!(matches!(err, FormatError::FieldOverflow { .. }));
    }

    #[test]
    fn fixed_encode_shrinks_wide_float_to_fit() {
        let layout = [FieldLayout::with_width(FieldType::Float, 10)];
        let line =
            encode_line(&[Value::Float(0.000012345678901)], &layout, false, None).unwrap();
        assert_eq!(line.len(), 10);
        let back = decode_line(&line, &layout, false).unwrap();
        let Value::Float(v) = back[0] else { panic!() };
        assert!((v - 0.000012345678901).abs() < 1e-8);
    }
}
