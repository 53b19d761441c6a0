use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable value in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Raw => serde_json::to_string(value)?,
    };
    Ok(text)
}

/// Render and print to stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_is_single_line() {
        let value = json!({"code": "GLU", "fields": [1, 2]});
        let raw = render(&value, OutputFormat::Raw).expect("render");
        assert!(!raw.contains('\n'));
    }

    #[test]
    fn json_is_pretty() {
        let value = json!({"code": "GLU"});
        let pretty = render(&value, OutputFormat::Json).expect("render");
        assert!(pretty.contains("\n  \"code\""));
    }
}
