use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet has no header row")]
    MissingHeader,
    #[error("sheet parse failed: {0}")]
    Parse(String),
}

/// A plain row/column view of a tabular source file. All cells are strings;
/// typing happens later in normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
    }
}

/// Parses source-file bytes into a [`Table`]. The upstream export job
/// flattens workbooks to CSV, so this is the only format the ingest path
/// has to understand. Short rows are padded so every row matches the
/// header width.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Table, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| SheetError::Parse(err.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(SheetError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| SheetError::Parse(err.to_string()))?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let data = b"SKU,PART_NAME\n100,Fender Liner\n200,Grille\n";
        let table = parse_spreadsheet(data).expect("parse");
        assert_eq!(table.headers, vec!["SKU", "PART_NAME"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(&table.rows[0], "PART_NAME"), Some("Fender Liner"));
    }

    #[test]
    fn pads_short_rows_to_header_width() {
        let data = b"SKU,PART_NAME,BRAND\n100,Fender Liner\n";
        let table = parse_spreadsheet(data).expect("parse");
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.cell(&table.rows[0], "BRAND"), Some(""));
    }
}
