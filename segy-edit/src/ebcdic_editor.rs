//! Textual-header editor
//!
//! Works on the decoded 40-line array; the engine splices re-encoded
//! bytes back over the original region so untouched lines stay
//! byte-identical.

use segy_format::ebcdic::{COLS, LINES};

use crate::error::{Error, Result};
use crate::event::{ChangeEvent, Region};
use crate::plan::{EbcdicEdit, EbcdicMode};

/// Apply one EBCDIC edit to the line array in place.
///
/// Returns the 0-based indexes of lines whose content changed, in
/// order, alongside one [`ChangeEvent`] per changed line.
pub fn apply(lines: &mut [String], edit: &EbcdicEdit) -> Result<(Vec<usize>, Vec<ChangeEvent>)> {
    let new_lines = match edit.mode {
        EbcdicMode::Lines => merged_lines(lines, edit)?,
        EbcdicMode::Template => template_lines(edit)?,
    };

    let mut changed = Vec::new();
    let mut events = Vec::new();
    for (i, new_line) in new_lines.into_iter().enumerate() {
        if normalize(&lines[i]) == normalize(&new_line) {
            continue;
        }
        events.push(ChangeEvent {
            region: Region::Ebcdic,
            trace_index: None,
            field: format!("line_{:02}", i + 1),
            old_value: lines[i].trim_end().to_string(),
            new_value: new_line.trim_end().to_string(),
        });
        lines[i] = new_line;
        changed.push(i);
    }
    Ok((changed, events))
}

fn merged_lines(current: &[String], edit: &EbcdicEdit) -> Result<Vec<String>> {
    let mut lines: Vec<String> = current.to_vec();
    for (key, text) in &edit.lines {
        let index: usize = key.parse().map_err(|_| Error::Plan {
            path: format!("lines.{key}"),
            reason: "line index must be an integer in 0..=39".to_string(),
        })?;
        if index >= LINES {
            return Err(Error::Plan {
                path: format!("lines.{key}"),
                reason: format!("line index must be in 0..=39, got {index}"),
            });
        }
        lines[index] = text.clone();
    }
    Ok(lines)
}

fn template_lines(edit: &EbcdicEdit) -> Result<Vec<String>> {
    let template = edit.template.as_ref().ok_or_else(|| Error::Plan {
        path: "template".to_string(),
        reason: "template mode requires a 'template' line array".to_string(),
    })?;
    if template.len() != LINES {
        return Err(Error::TemplateShape { actual: template.len() });
    }

    let mut lines = Vec::with_capacity(LINES);
    for line in template {
        let mut text = line.clone();
        for (key, value) in &edit.replacements {
            text = text.replace(&format!("{{{{{key}}}}}"), value);
        }
        lines.push(text);
    }
    Ok(lines)
}

/// Compare lines the way they will land on disk: cut to 80 columns,
/// trailing blanks ignored.
fn normalize(line: &str) -> String {
    line.chars().take(COLS).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn blank_lines() -> Vec<String> {
        vec![" ".repeat(COLS); LINES]
    }

    fn lines_edit(pairs: &[(&str, &str)]) -> EbcdicEdit {
        EbcdicEdit {
            mode: EbcdicMode::Lines,
            lines: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            template: None,
            replacements: BTreeMap::new(),
        }
    }

    #[test]
    fn lines_mode_merges_and_preserves_rest() {
        let mut lines = blank_lines();
        lines[10] = "EXISTING TEXT".to_string();
        let (changed, events) = apply(
            &mut lines,
            &lines_edit(&[("0", "FIRST"), ("1", "SECOND")]),
        )
        .unwrap();
        assert_eq!(changed, vec![0, 1]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].field, "line_01");
        assert_eq!(events[0].new_value, "FIRST");
        assert_eq!(lines[10], "EXISTING TEXT");
    }

    #[test]
    fn unchanged_line_emits_no_event() {
        let mut lines = blank_lines();
        lines[3] = "SAME".to_string();
        let (changed, events) = apply(&mut lines, &lines_edit(&[("3", "SAME   ")])).unwrap();
        assert!(changed.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn bad_line_index_rejected() {
        let mut lines = blank_lines();
        assert!(matches!(
            apply(&mut lines, &lines_edit(&[("40", "X")])),
            Err(Error::Plan { .. })
        ));
        assert!(matches!(
            apply(&mut lines, &lines_edit(&[("first", "X")])),
            Err(Error::Plan { .. })
        ));
    }

    #[test]
    fn template_mode_replaces_everything() {
        let mut lines = blank_lines();
        lines[5] = "OLD".to_string();
        let template: Vec<String> = (0..LINES).map(|i| format!("T{i:02}")).collect();
        let edit = EbcdicEdit {
            mode: EbcdicMode::Template,
            lines: BTreeMap::new(),
            template: Some(template),
            replacements: BTreeMap::new(),
        };
        let (changed, _) = apply(&mut lines, &edit).unwrap();
        assert_eq!(changed.len(), LINES);
        assert_eq!(lines[5], "T05");
    }

    #[test]
    fn template_replacements_substituted() {
        let mut lines = blank_lines();
        let mut template: Vec<String> = vec![String::new(); LINES];
        template[0] = "CLIENT: {{client}} LINE {{line}}".to_string();
        let edit = EbcdicEdit {
            mode: EbcdicMode::Template,
            lines: BTreeMap::new(),
            template: Some(template),
            replacements: [
                ("client".to_string(), "ACME".to_string()),
                ("line".to_string(), "042".to_string()),
            ]
            .into(),
        };
        apply(&mut lines, &edit).unwrap();
        assert_eq!(lines[0], "CLIENT: ACME LINE 042");
    }

    #[test]
    fn template_wrong_shape_rejected() {
        let mut lines = blank_lines();
        let edit = EbcdicEdit {
            mode: EbcdicMode::Template,
            lines: BTreeMap::new(),
            template: Some(vec![String::new(); 39]),
            replacements: BTreeMap::new(),
        };
        assert!(matches!(
            apply(&mut lines, &edit),
            Err(Error::TemplateShape { actual: 39 })
        ));
    }
}
