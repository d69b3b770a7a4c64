//! Trace-header editor
//!
//! Prepares the plan's trace operations once (name resolution,
//! expression parsing, variable validation, constant range checks) and
//! then applies them to each trace as it streams by. Within one
//! operation, expressions and copies read a snapshot taken when the
//! operation started; conditions see the live view left by earlier
//! operations.

use std::path::PathBuf;

use segy_format::{trace_field, FieldDef, TraceHeader};

use crate::csv::CsvCache;
use crate::error::{Error, Result};
use crate::event::{ChangeEvent, Region};
use crate::expr::{Env, Expression};
use crate::plan::{EditOperation, TraceFieldEdit};

/// Coordinate destinations where CSV cells may fall back to doubles.
const COORDINATE_FIELDS: &[&str] =
    &["source_x", "source_y", "group_x", "group_y", "cdp_x", "cdp_y"];

/// One field action with its destination resolved.
#[derive(Debug)]
enum FieldAction {
    Constant {
        def: &'static FieldDef,
        value: i64,
    },
    Expr {
        def: &'static FieldDef,
        expr: Expression,
    },
    Copy {
        def: &'static FieldDef,
        source: &'static FieldDef,
    },
    Csv {
        def: &'static FieldDef,
        file: PathBuf,
        column: String,
        key: Option<&'static FieldDef>,
        allow_float: bool,
    },
}

#[derive(Debug)]
struct TraceOp {
    /// Index of the operation within the plan's edit list, for
    /// warning deduplication.
    plan_index: usize,
    condition: Option<Expression>,
    fields: Vec<FieldAction>,
}

/// A per-trace error annotated with the operation that produced it.
#[derive(Debug)]
pub struct TraceApplyError {
    /// Plan-level index of the failing operation.
    pub op: usize,
    pub error: Error,
}

/// All trace operations of a plan, resolved and ready to stream.
#[derive(Debug, Default)]
pub struct TraceOps {
    ops: Vec<TraceOp>,
    csv: CsvCache,
}

impl TraceOps {
    /// Resolve every trace-header operation in the plan. All
    /// fatal-before-streaming failures happen here: unknown fields,
    /// expression syntax errors, unknown functions, unknown variables,
    /// and constants outside their destination width.
    pub fn prepare(edits: &[EditOperation]) -> Result<Self> {
        let mut ops = Vec::new();
        for (plan_index, op) in edits.iter().enumerate() {
            let EditOperation::TraceHeader { condition, fields } = op else {
                continue;
            };
            let condition = condition
                .as_deref()
                .map(|src| parse_checked(src))
                .transpose()?;
            let fields = fields
                .iter()
                .map(prepare_field)
                .collect::<Result<Vec<_>>>()?;
            ops.push(TraceOp { plan_index, condition, fields });
        }
        Ok(Self { ops, csv: CsvCache::new() })
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply all operations to one trace header.
    ///
    /// On success the header holds the edited bytes and the returned
    /// events describe every field that differs from the original.
    /// On error the header is left exactly as it came in, so a `skip`
    /// or `warn` policy can keep streaming the original trace.
    pub fn apply(
        &mut self,
        index: u64,
        header: &mut TraceHeader,
    ) -> std::result::Result<Vec<ChangeEvent>, TraceApplyError> {
        let original = header.clone();
        let mut working = header.clone();
        let mut touched: Vec<&'static FieldDef> = Vec::new();

        for op in &self.ops {
            apply_op(op, index, &mut working, &mut touched, &mut self.csv)
                .map_err(|error| TraceApplyError { op: op.plan_index, error })?;
        }

        let mut events = Vec::new();
        let mut seen = Vec::new();
        for def in touched {
            if seen.contains(&def.offset) {
                continue;
            }
            seen.push(def.offset);
            let old = original.get(def);
            let new = working.get(def);
            if old != new {
                events.push(ChangeEvent {
                    region: Region::Trace,
                    trace_index: Some(index),
                    field: def.name.to_string(),
                    old_value: old.to_string(),
                    new_value: new.to_string(),
                });
            }
        }

        *header = working;
        Ok(events)
    }

    /// Row-bound CSV tables longer than the file, for the end-of-run
    /// overflow warning.
    pub fn csv_row_overflow(&self, trace_count: u64) -> Vec<(PathBuf, usize)> {
        self.csv.row_overflow(trace_count)
    }
}

fn apply_op(
    op: &TraceOp,
    index: u64,
    working: &mut TraceHeader,
    touched: &mut Vec<&'static FieldDef>,
    csv: &mut CsvCache,
) -> Result<()> {
    if let Some(condition) = &op.condition {
        let env = HeaderEnv { header: working, index };
        if !condition.evaluate_condition(&env)? {
            return Ok(());
        }
    }

    // Expressions and copies read this snapshot, not each other's
    // output, so field edits within one operation commute.
    let snapshot = working.clone();

    for action in &op.fields {
        let (def, value) = match action {
            FieldAction::Constant { def, value } => (*def, *value),
            FieldAction::Expr { def, expr } => {
                let env = HeaderEnv { header: &snapshot, index };
                (*def, expr.evaluate(&env)?.to_assignment())
            }
            FieldAction::Copy { def, source } => (*def, snapshot.get(source)),
            FieldAction::Csv { def, file, column, key, allow_float } => {
                let value = match key {
                    None => csv.value_by_row(file, column, index, *allow_float)?,
                    Some(key_def) => {
                        let key_value = working.get(key_def);
                        csv.value_by_key(file, column, key_def.name, key_value, *allow_float)?
                    }
                };
                (*def, value)
            }
        };
        working.set(def, value)?;
        touched.push(def);
    }
    Ok(())
}

fn prepare_field(edit: &TraceFieldEdit) -> Result<FieldAction> {
    let def = resolve_field(&edit.name)?;

    let selectors = [
        edit.value.is_some(),
        edit.expression.is_some(),
        edit.copy_from.is_some(),
        edit.csv_file.is_some(),
    ]
    .iter()
    .filter(|&&s| s)
    .count();
    if selectors != 1 {
        return Err(Error::Plan {
            path: format!("fields.{}", edit.name),
            reason: "give exactly one of 'value', 'expression', 'copy_from' or 'csv_file'"
                .to_string(),
        });
    }

    if let Some(value) = edit.value {
        let (min, max) = def.value_range();
        if value < min || value > max {
            return Err(segy_format::Error::OutOfRange {
                field: def.name.to_string(),
                value,
                min,
                max,
            }
            .into());
        }
        return Ok(FieldAction::Constant { def, value });
    }

    if let Some(src) = &edit.expression {
        return Ok(FieldAction::Expr { def, expr: parse_checked(src)? });
    }

    if let Some(source) = &edit.copy_from {
        return Ok(FieldAction::Copy { def, source: resolve_field(source)? });
    }

    if let Some(file) = &edit.csv_file {
        let column = edit
            .csv_column
            .clone()
            .unwrap_or_else(|| edit.name.clone());
        let key = edit
            .key_column
            .as_deref()
            .map(resolve_field)
            .transpose()?;
        return Ok(FieldAction::Csv {
            def,
            file: file.clone(),
            column,
            key,
            allow_float: COORDINATE_FIELDS.contains(&def.name),
        });
    }

    unreachable!("selector count checked above")
}

fn resolve_field(name: &str) -> Result<&'static FieldDef> {
    trace_field(name).ok_or_else(|| segy_format::Error::UnknownField(name.to_string()).into())
}

/// Parse an expression and reject variables outside the trace-header
/// environment, before any trace is read.
fn parse_checked(src: &str) -> Result<Expression> {
    let expr = Expression::parse(src)?;
    expr.check_variables(|name| name == "trace_index" || trace_field(name).is_some())?;
    Ok(expr)
}

/// Expression environment over one trace header.
struct HeaderEnv<'a> {
    header: &'a TraceHeader,
    index: u64,
}

impl Env for HeaderEnv<'_> {
    fn lookup(&self, name: &str) -> Option<i64> {
        if name == "trace_index" {
            return Some(self.index as i64);
        }
        trace_field(name).map(|def| self.header.get(def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::EditOperation;

    fn field(name: &str) -> TraceFieldEdit {
        TraceFieldEdit {
            name: name.to_string(),
            value: None,
            expression: None,
            copy_from: None,
            csv_file: None,
            csv_column: None,
            key_column: None,
        }
    }

    fn trace_op(condition: Option<&str>, fields: Vec<TraceFieldEdit>) -> EditOperation {
        EditOperation::TraceHeader {
            condition: condition.map(str::to_string),
            fields,
        }
    }

    fn header_with(pairs: &[(&str, i64)]) -> TraceHeader {
        let mut header = TraceHeader::default();
        for (name, value) in pairs {
            header.set_named(name, *value).unwrap();
        }
        header
    }

    #[test]
    fn constant_and_expression() {
        let mut ops = TraceOps::prepare(&[trace_op(
            None,
            vec![
                {
                    let mut f = field("inline");
                    f.value = Some(7);
                    f
                },
                {
                    let mut f = field("source_x");
                    f.expression = Some("source_x * 10".to_string());
                    f
                },
            ],
        )])
        .unwrap();

        let mut header = header_with(&[("source_x", 500)]);
        let events = ops.apply(0, &mut header).unwrap();
        assert_eq!(header.get_named("inline").unwrap(), 7);
        assert_eq!(header.get_named("source_x").unwrap(), 5000);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].old_value, "500");
        assert_eq!(events[1].new_value, "5000");
    }

    #[test]
    fn condition_gates_the_operation() {
        let mut ops = TraceOps::prepare(&[trace_op(Some("trace_sequence_line > 100"), vec![{
            let mut f = field("cdp_x");
            f.copy_from = Some("source_x".to_string());
            f
        }])])
        .unwrap();

        let mut low = header_with(&[("trace_sequence_line", 50), ("source_x", 999)]);
        assert!(ops.apply(0, &mut low).unwrap().is_empty());
        assert_eq!(low.get_named("cdp_x").unwrap(), 0);

        let mut high = header_with(&[("trace_sequence_line", 150), ("source_x", 999)]);
        let events = ops.apply(1, &mut high).unwrap();
        assert_eq!(high.get_named("cdp_x").unwrap(), 999);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trace_index, Some(1));
    }

    #[test]
    fn expressions_read_the_operation_snapshot() {
        // Both expressions see the pre-operation source_x, so the swap
        // works without a temporary.
        let mut ops = TraceOps::prepare(&[trace_op(
            None,
            vec![
                {
                    let mut f = field("source_x");
                    f.expression = Some("source_y".to_string());
                    f
                },
                {
                    let mut f = field("source_y");
                    f.expression = Some("source_x".to_string());
                    f
                },
            ],
        )])
        .unwrap();

        let mut header = header_with(&[("source_x", 1), ("source_y", 2)]);
        ops.apply(0, &mut header).unwrap();
        assert_eq!(header.get_named("source_x").unwrap(), 2);
        assert_eq!(header.get_named("source_y").unwrap(), 1);
    }

    #[test]
    fn later_operations_see_earlier_results() {
        let mut ops = TraceOps::prepare(&[
            trace_op(None, vec![{
                let mut f = field("source_x");
                f.value = Some(100);
                f
            }]),
            trace_op(None, vec![{
                let mut f = field("source_y");
                f.expression = Some("source_x * 2".to_string());
                f
            }]),
        ])
        .unwrap();

        let mut header = TraceHeader::default();
        ops.apply(0, &mut header).unwrap();
        assert_eq!(header.get_named("source_y").unwrap(), 200);
    }

    #[test]
    fn trace_index_variable() {
        let mut ops = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("trace_sequence_file");
            f.expression = Some("trace_index + 1".to_string());
            f
        }])])
        .unwrap();
        let mut header = TraceHeader::default();
        ops.apply(41, &mut header).unwrap();
        assert_eq!(header.get_named("trace_sequence_file").unwrap(), 42);
    }

    #[test]
    fn unknown_destination_fails_at_prepare() {
        let err = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("sorce_x");
            f.value = Some(1);
            f
        }])])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Format(segy_format::Error::UnknownField(_))
        ));
    }

    #[test]
    fn unknown_variable_fails_at_prepare() {
        let err = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("source_x");
            f.expression = Some("bogus * 2".to_string());
            f
        }])])
        .unwrap_err();
        assert!(matches!(err, Error::UnknownVariable(name) if name == "bogus"));
    }

    #[test]
    fn constant_out_of_range_fails_at_prepare() {
        let err = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("trace_id_code");
            f.value = Some(40000); // i16 destination
            f
        }])])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Format(segy_format::Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn per_trace_out_of_range_leaves_header_untouched() {
        let mut ops = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("trace_id_code");
            f.expression = Some("source_x * 1000".to_string());
            f
        }])])
        .unwrap();

        let mut header = header_with(&[("source_x", 1000)]);
        let err = ops.apply(0, &mut header).unwrap_err();
        assert_eq!(err.op, 0);
        assert!(err.error.is_per_trace());
        assert_eq!(header.get_named("trace_id_code").unwrap(), 0);
        assert_eq!(header.get_named("source_x").unwrap(), 1000);
    }

    #[test]
    fn division_by_zero_is_per_trace() {
        let mut ops = TraceOps::prepare(&[trace_op(None, vec![{
            let mut f = field("source_x");
            f.expression = Some("source_x / source_y".to_string());
            f
        }])])
        .unwrap();
        let mut header = header_with(&[("source_x", 10)]);
        let err = ops.apply(0, &mut header).unwrap_err();
        assert!(matches!(err.error, Error::DivisionByZero));
    }

    #[test]
    fn selector_must_be_unique() {
        let mut f = field("source_x");
        f.value = Some(1);
        f.expression = Some("2".to_string());
        let err = TraceOps::prepare(&[trace_op(None, vec![f])]).unwrap_err();
        assert!(matches!(err, Error::Plan { .. }));
    }
}
