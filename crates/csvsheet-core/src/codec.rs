//! CSV text <-> rows of strings.
//!
//! Tokenizing and quoting are delegated to the `csv` crate. This module adds
//! what the editor needs around it: byte-order-mark stripping, structured
//! quote errors, flexible (ragged) records, and a configurable output dialect
//! shared by the parser and the serializer.

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{CsvError, ParseIssue};

/// Unicode byte-order mark written by some spreadsheet exporters
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// When fields are wrapped in quotes on output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMode {
    /// Quote every field, matching the new-file template
    #[default]
    Always,
    /// Quote only fields containing delimiters, quotes or line breaks
    Necessary,
}

/// Record terminator on output (input accepts both)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

/// CSV dialect shared by parsing and serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvDialect {
    pub delimiter: char,
    pub quote_mode: QuoteMode,
    pub line_ending: LineEnding,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_mode: QuoteMode::Always,
            line_ending: LineEnding::Lf,
        }
    }
}

impl CsvDialect {
    fn delimiter_byte(&self) -> Result<u8, CsvError> {
        if self.delimiter.is_ascii() && !matches!(self.delimiter, '"' | '\n' | '\r') {
            Ok(self.delimiter as u8)
        } else {
            Err(CsvError::InvalidDelimiter(self.delimiter))
        }
    }
}

/// Build the template for a new file: `cols` lines of `rows` empty quoted fields.
pub fn empty_csv(rows: usize, cols: usize) -> String {
    let line = vec!["\"\""; rows].join(",");
    let mut csv = String::with_capacity((line.len() + 1) * cols);
    for _ in 0..cols {
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

/// Remove a leading byte-order mark, if any
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text)
}

/// Parse headerless CSV text into rows of strings.
///
/// Rows may have different lengths. A blank line is kept as a row with one
/// empty cell. Any structural quote problem is reported
/// as a [`CsvError::Parse`] listing every issue found, and no rows are
/// returned in that case.
pub fn parse(text: &str, dialect: &CsvDialect) -> Result<Vec<Vec<String>>, CsvError> {
    let text = strip_bom(text);
    let delimiter = dialect.delimiter_byte()?;

    let issues = check_quotes(text, dialect.delimiter);
    if !issues.is_empty() {
        return Err(CsvError::Parse(issues));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let to_row = |row: usize, record: csv::Result<csv::StringRecord>| {
        record
            .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
            .map_err(|e| CsvError::Parse(vec![ParseIssue::malformed(row, e.to_string())]))
    };

    // the reader skips blank lines; put them back where they were
    let mut records = reader.records();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for blank in line_layout(text, dialect.delimiter) {
        if blank {
            rows.push(vec![String::new()]);
            continue;
        }
        match records.next() {
            Some(record) => rows.push(to_row(rows.len(), record)?),
            None => break,
        }
    }
    for record in records {
        rows.push(to_row(rows.len(), record)?);
    }

    Ok(rows)
}

/// One entry per line, ignoring line breaks inside quoted fields: `true`
/// for a blank line, `false` for a line that starts a record.
/// Expects input that passed [`check_quotes`].
fn line_layout(text: &str, delimiter: char) -> Vec<bool> {
    let mut layout = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line_start = true;
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        if line_start {
            layout.push(c == '\n' || c == '\r');
            line_start = false;
        }

        match c {
            '"' if at_field_start => {
                while let Some(q) = chars.next() {
                    if q == '"' && chars.next_if_eq(&'"').is_none() {
                        break;
                    }
                }
                at_field_start = false;
            }
            '\n' | '\r' => {
                if c == '\r' {
                    chars.next_if_eq(&'\n');
                }
                line_start = true;
                at_field_start = true;
            }
            c if c == delimiter => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    layout
}

/// Serialize rows with the given dialect. Every row, including the last,
/// ends with the dialect's line terminator.
pub fn serialize(rows: &[Vec<String>], dialect: &CsvDialect) -> Result<String, CsvError> {
    let delimiter = dialect.delimiter_byte()?;
    let quote_style = match dialect.quote_mode {
        QuoteMode::Always => QuoteStyle::Always,
        QuoteMode::Necessary => QuoteStyle::Necessary,
    };
    let terminator = match dialect.line_ending {
        LineEnding::Lf => Terminator::Any(b'\n'),
        LineEnding::Crlf => Terminator::CRLF,
    };

    let mut writer = WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .quote_style(quote_style)
        .terminator(terminator)
        .from_writer(Vec::new());

    for row in rows {
        if row.is_empty() {
            // keep the line; a zero-field record would vanish on re-read
            writer.write_record([""])?;
        } else {
            writer.write_record(row)?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| CsvError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Scan the quote structure of `text` and collect every problem.
///
/// A field is quoted only when its first character is a quote. Inside a
/// quoted field a doubled quote is an escaped quote; a single quote closes
/// the field and must be followed by the delimiter, a line break, or the end
/// of input.
pub fn check_quotes(text: &str, delimiter: char) -> Vec<ParseIssue> {
    let mut issues = Vec::new();
    let mut chars = text.chars().peekable();
    let mut row = 0;
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        if at_field_start && c == '"' {
            let start_row = row;
            let mut closed = false;
            while let Some(q) = chars.next() {
                if q != '"' {
                    continue;
                }
                match chars.peek() {
                    Some('"') => {
                        chars.next();
                    }
                    None | Some('\n') | Some('\r') => {
                        closed = true;
                        break;
                    }
                    Some(&next) if next == delimiter => {
                        closed = true;
                        break;
                    }
                    Some(_) => {
                        issues.push(ParseIssue::invalid_quotes(row));
                        closed = true;
                        break;
                    }
                }
            }
            if !closed {
                issues.push(ParseIssue::missing_quotes(start_row));
                break;
            }
            at_field_start = false;
            continue;
        }

        match c {
            '\n' => {
                row += 1;
                at_field_start = true;
            }
            '\r' => at_field_start = true,
            c if c == delimiter => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_empty_csv_shape() {
        assert_eq!(empty_csv(1, 1), "\"\"\n");
        assert_eq!(empty_csv(3, 2), "\"\",\"\",\"\"\n\"\",\"\",\"\"\n");

        let csv = empty_csv(4, 5);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        for line in lines {
            assert_eq!(line.split(',').count(), 4);
            assert!(line.split(',').all(|field| field == "\"\""));
        }
    }

    #[test]
    fn test_empty_csv_parses_to_blank_grid() {
        let parsed = parse(&empty_csv(4, 4), &CsvDialect::default()).unwrap();
        assert_eq!(parsed.len(), 4);
        assert!(parsed.iter().all(|row| row.len() == 4));
        assert!(parsed.iter().flatten().all(String::is_empty));
    }

    #[test]
    fn test_parse_quoted_and_plain() {
        let parsed = parse("\"a\",b\n\"x, y\",\"say \"\"hi\"\"\"\n", &CsvDialect::default()).unwrap();
        assert_eq!(parsed, rows(&[&["a", "b"], &["x, y", "say \"hi\""]]));
    }

    #[test]
    fn test_parse_ragged_rows() {
        let parsed = parse("a,b,c\n1\n2,3\n", &CsvDialect::default()).unwrap();
        assert_eq!(parsed, rows(&[&["a", "b", "c"], &["1"], &["2", "3"]]));
    }

    #[test]
    fn test_parse_multiline_field() {
        let parsed = parse("\"line one\nline two\",x\n", &CsvDialect::default()).unwrap();
        assert_eq!(parsed, rows(&[&["line one\nline two", "x"]]));
    }

    #[test]
    fn test_trailing_newline_adds_no_row() {
        let with = parse("a,b\n1,2\n", &CsvDialect::default()).unwrap();
        let without = parse("a,b\n1,2", &CsvDialect::default()).unwrap();
        assert_eq!(with, without);
        assert_eq!(with.len(), 2);
    }

    #[test]
    fn test_bom_is_ignored() {
        let plain = "\"a\",\"b\"\n\"1\",\"2\"\n";
        let with_bom = format!("{}{}", BYTE_ORDER_MARK, plain);
        assert_eq!(
            parse(&with_bom, &CsvDialect::default()).unwrap(),
            parse(plain, &CsvDialect::default()).unwrap()
        );
        assert_eq!(strip_bom(&with_bom), plain);
        assert_eq!(strip_bom(plain), plain);
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let err = parse("a,b\n\"open,c\n", &CsvDialect::default()).unwrap_err();
        match err {
            CsvError::Parse(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].code, "MissingQuotes");
                assert_eq!(issues[0].row, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_after_closing_quote_is_reported() {
        let issues = check_quotes("\"ab\"c,d\n", ',');
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "InvalidQuotes");
        assert_eq!(issues[0].row, 0);
    }

    #[test]
    fn test_quotes_inside_unquoted_field_are_fine() {
        assert!(check_quotes("5\" pipe,x\n", ',').is_empty());
        assert!(check_quotes("\"a\"\r\n\"b\"", ',').is_empty());
        assert!(check_quotes("a;\"b;c\"\n", ';').is_empty());
    }

    #[test]
    fn test_serialize_always_quotes() {
        let data = rows(&[&["a", "b"], &["1", "2"]]);
        let text = serialize(&data, &CsvDialect::default()).unwrap();
        assert_eq!(text, "\"a\",\"b\"\n\"1\",\"2\"\n");
    }

    #[test]
    fn test_serialize_necessary_quotes_and_crlf() {
        let dialect = CsvDialect {
            quote_mode: QuoteMode::Necessary,
            line_ending: LineEnding::Crlf,
            ..CsvDialect::default()
        };
        let data = rows(&[&["a", "b,c"], &["say \"hi\"", "2"]]);
        let text = serialize(&data, &dialect).unwrap();
        assert_eq!(text, "a,\"b,c\"\r\n\"say \"\"hi\"\"\",2\r\n");
    }

    #[test]
    fn test_round_trip_preserves_cells() {
        let data = rows(&[
            &["name", "note", ""],
            &["x, y", "multi\nline", "quote \" here"],
            &["ragged"],
            &["**bold**", "[[link]]", "  padded  "],
        ]);
        for dialect in [
            CsvDialect::default(),
            CsvDialect {
                quote_mode: QuoteMode::Necessary,
                ..CsvDialect::default()
            },
            CsvDialect {
                delimiter: ';',
                line_ending: LineEnding::Crlf,
                ..CsvDialect::default()
            },
        ] {
            let text = serialize(&data, &dialect).unwrap();
            assert_eq!(parse(&text, &dialect).unwrap(), data);
        }
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let text = "\"a\",\"b\"\n\n\"1\",\"2\"\n";
        let parsed = parse(text, &CsvDialect::default()).unwrap();
        assert_eq!(parsed, rows(&[&["a", "b"], &[""], &["1", "2"]]));
        assert_eq!(serialize(&parsed, &CsvDialect::default()).unwrap(), "\"a\",\"b\"\n\"\"\n\"1\",\"2\"\n");

        let crlf = parse("\r\na\r\n\r\n\r\nb\r\n", &CsvDialect::default()).unwrap();
        assert_eq!(crlf, rows(&[&[""], &["a"], &[""], &[""], &["b"]]));

        let tail = parse("a\n\n", &CsvDialect::default()).unwrap();
        assert_eq!(tail, rows(&[&["a"], &[""]]));
    }

    #[test]
    fn test_line_breaks_inside_quotes_are_not_blank_lines() {
        let parsed = parse("\"x\n\n\"\"y\"\"\",z\n\nw\n", &CsvDialect::default()).unwrap();
        assert_eq!(parsed, rows(&[&["x\n\n\"y\"", "z"], &[""], &["w"]]));
    }

    #[test]
    fn test_round_trip_with_blank_rows() {
        let data = rows(&[&["h1", "h2"], &[""], &["1", "2"], &[""]]);
        for dialect in [
            CsvDialect::default(),
            CsvDialect {
                quote_mode: QuoteMode::Necessary,
                line_ending: LineEnding::Crlf,
                ..CsvDialect::default()
            },
        ] {
            let text = serialize(&data, &dialect).unwrap();
            assert_eq!(parse(&text, &dialect).unwrap(), data);
        }
    }

    #[test]
    fn test_invalid_delimiter_is_rejected() {
        let dialect = CsvDialect {
            delimiter: '§',
            ..CsvDialect::default()
        };
        assert!(matches!(
            parse("a", &dialect),
            Err(CsvError::InvalidDelimiter('§'))
        ));
        assert!(matches!(
            serialize(&[], &dialect),
            Err(CsvError::InvalidDelimiter('§'))
        ));

        for delimiter in ['"', '\n', '\r'] {
            let dialect = CsvDialect {
                delimiter,
                ..CsvDialect::default()
            };
            assert!(matches!(
                parse("a", &dialect),
                Err(CsvError::InvalidDelimiter(c)) if c == delimiter
            ));
        }
    }

    #[test]
    fn test_dialect_from_json_defaults() {
        let dialect: CsvDialect = serde_json::from_str(r#"{"quoteMode":"necessary"}"#).unwrap();
        assert_eq!(dialect.delimiter, ',');
        assert_eq!(dialect.quote_mode, QuoteMode::Necessary);
        assert_eq!(dialect.line_ending, LineEnding::Lf);
    }
}
