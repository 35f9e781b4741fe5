//! Source loading: delimited text and workbook sheets into [`Table`]s.
//!
//! CSV files get encoding and delimiter auto-detection; workbooks are read
//! through [`sheet`]. Both produce the same shape: ordered headers plus one
//! JSON object per data row.

pub mod sheet;

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{LoadError, LoadResult, SchemaError};

/// A rectangular table loaded from a source file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Label used in errors and logs (file name, plus `#sheet` for workbooks).
    pub name: String,
    /// Column headers, in source order, unique.
    pub headers: Vec<String>,
    /// One JSON object per data row, keyed by header.
    pub records: Vec<Value>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            headers,
            records,
        }
    }

    /// Build a table from raw rows: `rows[0]` is the header row.
    ///
    /// Short rows are padded with null, long rows are truncated to the header.
    pub fn from_rows(name: impl Into<String>, mut rows: Vec<Vec<Value>>) -> LoadResult<Self> {
        let name = name.into();
        if rows.is_empty() {
            return Err(LoadError::Empty(name));
        }
        let header_cells = rows.remove(0);
        let headers = normalize_headers(header_cells.iter().map(header_text).collect());

        let records = rows
            .into_iter()
            .filter(|row| row.iter().any(|v| !is_blank(v)))
            .map(|row| {
                let mut obj = Map::new();
                for (i, header) in headers.iter().enumerate() {
                    obj.insert(header.clone(), row.get(i).cloned().unwrap_or(Value::Null));
                }
                Value::Object(obj)
            })
            .collect();

        Ok(Self {
            name,
            headers,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Check that every listed column is present in the header row.
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), SchemaError> {
        for column in columns {
            if !self.has_column(column) {
                return Err(SchemaError::MissingColumn {
                    table: self.name.clone(),
                    column: (*column).to_string(),
                    found: self.headers.join(", "),
                });
            }
        }
        Ok(())
    }
}

/// Result of parsing a CSV file with detection metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Blank header cells become `column_<N>` (1-based), duplicates get `.<k>`.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.into_iter().enumerate() {
        let base = {
            let trimmed = header.trim();
            if trimmed.is_empty() {
                format!("column_{}", i + 1)
            } else {
                trimmed.to_string()
            }
        };
        let mut candidate = base.clone();
        let mut k = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, k);
            k += 1;
        }
        seen.push(candidate);
    }
    seen
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Null or whitespace-only string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// The first record is the header row. Empty cells become null.
///
/// # Example
/// ```ignore
/// let table = parse_csv_str("postcode,state\n2000,NSW", ',', "postcodes")?;
/// assert_eq!(table.records[0]["state"], "NSW");
/// ```
pub fn parse_csv_str(content: &str, delimiter: char, name: &str) -> LoadResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let row = record
            .iter()
            .map(|field| {
                let field = field.trim();
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Table::from_rows(name, rows)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8], name: &str) -> LoadResult<ParseResult> {
    if bytes.is_empty() {
        return Err(LoadError::Empty(name.to_string()));
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter, name)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> LoadResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_bytes_auto(&bytes, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv_str("postcode,state\n2000,NSW\n3000,VIC", ',', "pc").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.headers, vec!["postcode", "state"]);
        assert_eq!(table.records[0]["postcode"], "2000");
        assert_eq!(table.records[1]["state"], "VIC");
    }

    #[test]
    fn test_quoted_values_with_delimiter() {
        let csv = "name,fuel\n\"Bayswater\",\"Bagasse, wood\"";
        let table = parse_csv_str(csv, ',', "t").unwrap();

        assert_eq!(table.records[0]["fuel"], "Bagasse, wood");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_csv_str("a,b\n1,2\n\n3,4\n,\n", ',', "t").unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_values_are_null() {
        let table = parse_csv_str("a,b,c\n1,,3\n4", ',', "t").unwrap();

        assert_eq!(table.records[0]["b"], Value::Null);
        assert_eq!(table.records[1]["c"], Value::Null);
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let headers = normalize_headers(vec![
            "".into(),
            "Wind".into(),
            " ".into(),
            "Wind".into(),
        ]);
        assert_eq!(headers, vec!["column_1", "Wind", "column_3", "Wind.1"]);
    }

    #[test]
    fn test_require_columns() {
        let table = parse_csv_str("postcode,state\n2000,NSW", ',', "pc").unwrap();
        assert!(table.require_columns(&["postcode", "state"]).is_ok());

        let err = table.require_columns(&["lat"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'lat'"));
        assert!(msg.contains("postcode, state"));
    }

    #[test]
    fn test_empty_input_error() {
        assert!(matches!(parse_bytes_auto(b"", "x.csv"), Err(LoadError::Empty(_))));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse_with_bom() {
        let bytes = b"\xEF\xBB\xBFpostcode;state\n0800;NT";
        let result = parse_bytes_auto(bytes, "pc.csv").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.headers, vec!["postcode", "state"]);
        assert_eq!(result.table.records[0]["postcode"], "0800");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }
}
