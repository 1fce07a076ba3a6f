use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. Object `data` is
/// merged into the JSON response.
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ collection_name: [] }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Format a price in minor units as dollars
pub fn format_price(minor_units: i32) -> String {
    format!("${}.{:02}", minor_units / 100, (minor_units % 100).abs())
}

/// Limit column text; `None` is unlimited
pub fn format_limit(limit: Option<i32>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prices_and_limits() {
        assert_eq!(format_price(2900), "$29.00");
        assert_eq!(format_price(999), "$9.99");
        assert_eq!(format_limit(None), "unlimited");
        assert_eq!(format_limit(Some(500)), "500");
    }
}
