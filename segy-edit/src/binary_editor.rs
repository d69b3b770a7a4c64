//! Binary-header editor
//!
//! Resolves plan edits against the field table (or an explicit byte
//! span), range-checks every value before the header is touched, and
//! reports one change event per field whose value moved.

use segy_format::header::span_range;
use segy_format::{binary_field, binary_field_at, BinaryHeader, FieldDef};

use crate::error::{Error, Result};
use crate::event::{ChangeEvent, Region};
use crate::plan::BinaryFieldEdit;

/// A binary edit with its destination resolved.
#[derive(Debug, Clone)]
pub enum ResolvedBinaryEdit {
    Named { def: &'static FieldDef, value: i64 },
    Custom { offset: u16, width: u8, signed: bool, value: i64 },
}

impl ResolvedBinaryEdit {
    fn display_name(&self) -> String {
        match self {
            ResolvedBinaryEdit::Named { def, .. } => def.name.to_string(),
            ResolvedBinaryEdit::Custom { offset, .. } => match binary_field_at(*offset) {
                Some(def) => format!("{} (byte {})", def.name, offset),
                None => format!("byte_offset_{offset}"),
            },
        }
    }
}

/// Resolve and pre-check a list of plan edits. Unknown names and
/// constant values outside the destination width fail here, before
/// any file is opened.
pub fn prepare(edits: &[BinaryFieldEdit]) -> Result<Vec<ResolvedBinaryEdit>> {
    let mut resolved = Vec::with_capacity(edits.len());
    for edit in edits {
        let item = match (&edit.name, edit.offset) {
            (Some(name), None) => {
                let def = binary_field(name)
                    .ok_or_else(|| segy_format::Error::UnknownField(name.clone()))?;
                check_range(def.name, def.width, def.signed, edit.value)?;
                ResolvedBinaryEdit::Named { def, value: edit.value }
            }
            (None, Some(offset)) => {
                let width = edit.width.ok_or_else(|| Error::Plan {
                    path: "fields.width".to_string(),
                    reason: "custom byte-offset edits require 'width'".to_string(),
                })?;
                let signed = edit.signed.unwrap_or(true);
                if !matches!(width, 1 | 2 | 4) {
                    return Err(segy_format::Error::UnsupportedWidth(width).into());
                }
                if offset == 0 || offset as usize + width as usize - 1 > 400 {
                    return Err(segy_format::Error::SpanOutOfBounds {
                        offset,
                        width,
                        block_len: 400,
                    }
                    .into());
                }
                check_range(&format!("offset_{offset}"), width, signed, edit.value)?;
                ResolvedBinaryEdit::Custom { offset, width, signed, value: edit.value }
            }
            (Some(_), Some(_)) => {
                return Err(Error::Plan {
                    path: "fields".to_string(),
                    reason: "give either 'name' or 'offset', not both".to_string(),
                })
            }
            (None, None) => {
                return Err(Error::Plan {
                    path: "fields".to_string(),
                    reason: "binary field edit needs a 'name' or an 'offset'".to_string(),
                })
            }
        };
        resolved.push(item);
    }
    Ok(resolved)
}

fn check_range(field: &str, width: u8, signed: bool, value: i64) -> Result<()> {
    let (min, max) = span_range(width, signed);
    if value < min || value > max {
        return Err(segy_format::Error::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        }
        .into());
    }
    Ok(())
}

/// Apply resolved edits to the header, in order.
pub fn apply(
    header: &mut BinaryHeader,
    edits: &[ResolvedBinaryEdit],
) -> Result<Vec<ChangeEvent>> {
    let mut events = Vec::new();
    for edit in edits {
        let (old, new) = match edit {
            ResolvedBinaryEdit::Named { def, value } => {
                let old = header.get(def);
                header.set(def, *value)?;
                (old, *value)
            }
            ResolvedBinaryEdit::Custom { offset, width, signed, value } => {
                let old = header.get_at(*offset, *width, *signed)?;
                header.set_at(*offset, *width, *signed, *value)?;
                (old, *value)
            }
        };
        if old != new {
            events.push(ChangeEvent {
                region: Region::Binary,
                trace_index: None,
                field: edit.display_name(),
                old_value: old.to_string(),
                new_value: new.to_string(),
            });
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, value: i64) -> BinaryFieldEdit {
        BinaryFieldEdit {
            name: Some(name.to_string()),
            offset: None,
            width: None,
            signed: None,
            value,
        }
    }

    #[test]
    fn named_edit_changes_bytes() {
        let edits = prepare(&[named("sample_interval", 2000)]).unwrap();
        let mut header = BinaryHeader::default();
        header.set_named("sample_interval", 4000).unwrap();
        let events = apply(&mut header, &edits).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field, "sample_interval");
        assert_eq!(events[0].old_value, "4000");
        assert_eq!(events[0].new_value, "2000");
        assert_eq!(&header.as_bytes()[16..18], &[0x07, 0xD0]);
    }

    #[test]
    fn unchanged_value_emits_nothing() {
        let edits = prepare(&[named("format_code", 5)]).unwrap();
        let mut header = BinaryHeader::default();
        header.set_named("format_code", 5).unwrap();
        assert!(apply(&mut header, &edits).unwrap().is_empty());
    }

    #[test]
    fn unknown_name_fails_at_prepare() {
        let err = prepare(&[named("sampel_interval", 1)]).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(segy_format::Error::UnknownField(_))
        ));
    }

    #[test]
    fn constant_out_of_range_fails_at_prepare() {
        assert!(prepare(&[named("sample_interval", 32767)]).is_ok());
        let err = prepare(&[named("sample_interval", 32768)]).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(segy_format::Error::OutOfRange { value: 32768, .. })
        ));
    }

    #[test]
    fn custom_offset_edit() {
        let edit = BinaryFieldEdit {
            name: None,
            offset: Some(17),
            width: Some(2),
            signed: Some(true),
            value: 1500,
        };
        let edits = prepare(&[edit]).unwrap();
        let mut header = BinaryHeader::default();
        let events = apply(&mut header, &edits).unwrap();
        assert_eq!(events[0].field, "sample_interval (byte 17)");
        assert_eq!(header.get_named("sample_interval").unwrap(), 1500);
    }

    #[test]
    fn custom_offset_bounds_checked() {
        let edit = BinaryFieldEdit {
            name: None,
            offset: Some(399),
            width: Some(4),
            signed: Some(true),
            value: 1,
        };
        assert!(matches!(
            prepare(&[edit]),
            Err(Error::Format(segy_format::Error::SpanOutOfBounds { .. }))
        ));
    }

    #[test]
    fn name_and_offset_together_rejected() {
        let edit = BinaryFieldEdit {
            name: Some("job_id".to_string()),
            offset: Some(1),
            width: Some(4),
            signed: None,
            value: 1,
        };
        assert!(matches!(prepare(&[edit]), Err(Error::Plan { .. })));
    }
}
