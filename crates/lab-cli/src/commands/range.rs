use lab_core::entities::{FieldSchema, ResultValue};
use lab_core::enums::DataType;
use lab_core::ids::FieldId;
use lab_core::range::{ReferenceExpression, evaluate_range};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RangeArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct RangeReport {
    pub value: ResultValue,
    pub reference: String,
    pub expression: Option<ReferenceExpression>,
    pub out_of_range: bool,
}

/// Handle `labx range`.
pub fn handle(args: &RangeArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = evaluate(&args.value, &args.reference, args.data_type.into())?;
    output(&report, flags.format)
}

/// Parse `raw` as `data_type` and evaluate it against `reference`.
///
/// # Errors
///
/// Fails if `raw` does not parse as `data_type`.
pub fn evaluate(raw: &str, reference: &str, data_type: DataType) -> anyhow::Result<RangeReport> {
    let field = FieldSchema {
        id: FieldId(0),
        name: "value".into(),
        data_type,
        unit: None,
        reference: Some(reference.to_string()),
        section: None,
        order: 0,
        required: false,
        options: Vec::new(),
    };
    let value = ResultValue::parse(&field, raw)?;
    let out_of_range = evaluate_range(&value, Some(reference));

    Ok(RangeReport {
        value,
        reference: reference.to_string(),
        expression: ReferenceExpression::parse(reference),
        out_of_range,
    })
}
