use ::csv::{QuoteStyle, WriterBuilder};

fn needs_formula_guard(value: &str) -> bool {
    matches!(value.chars().next(), Some('=' | '+' | '-' | '@'))
}

/// Prefixes spreadsheet formula triggers so exported cells stay inert.
pub fn sanitize_cell(value: &str) -> String {
    if needs_formula_guard(value) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Serializes a header and rows into a CSV document with every cell quoted.
pub fn write_csv(headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| sanitize_cell(cell)))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_cells_are_prefixed() {
        assert_eq!(sanitize_cell("=SUM(A1:A2)"), "'=SUM(A1:A2)");
        assert_eq!(sanitize_cell("-3"), "'-3");
        assert_eq!(sanitize_cell("@cmd"), "'@cmd");
        assert_eq!(sanitize_cell("Madrid"), "Madrid");
    }

    #[test]
    fn write_csv_quotes_and_escapes() {
        let bytes = write_csv(
            &["name", "note"],
            &[vec!["Ana \"Ace\"".to_string(), "+34 600".to_string()]],
        )
        .expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            text,
            "\"name\",\"note\"\n\"Ana \"\"Ace\"\"\",\"'+34 600\"\n"
        );
    }
}
