//! Output formatting for CLI results

use serde_json::Value;

/// Render a JSON result: pretty-printed with `--json`, compact otherwise
pub fn render(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// Print a JSON result to stdout
pub fn display(value: &Value, pretty: bool) {
    println!("{}", render(value, pretty));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_modes() {
        let value = json!({"valid": true});
        assert_eq!(render(&value, false), r#"{"valid":true}"#);
        assert_eq!(render(&value, true), "{\n  \"valid\": true\n}");
    }
}
