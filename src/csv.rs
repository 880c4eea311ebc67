//! CSV parsing and writing on the [`Value`] tree.
//!
//! The reader is a small hand-written RFC-4180 scanner: quoted fields,
//! doubled-quote escapes, LF / CR / CRLF record ends, configurable
//! delimiter. All parsed fields are strings; interpreting them is the
//! caller's business.

use crate::error::FormatError;
use crate::text;
use crate::value::Value;
use miette::NamedSource;
use std::collections::BTreeMap;

/// Options for [`parse`] and [`stringify`].
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: char,
    /// When set, the first record is a header and every following record
    /// becomes a mapping keyed by it.
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            has_header: true,
        }
    }
}

/// Parses a CSV document.
///
/// With a header the result is a sequence of mappings; without, a
/// sequence of sequences of strings.
///
/// # Errors
///
/// Returns `csv::unclosed_quote` for a quoted field that never closes and
/// `csv::uneven_row` when a data row's width disagrees with the header;
/// both carry spans into the document.
pub fn parse(input: &str, options: &CsvOptions) -> Result<Value, FormatError> {
    let records = Scanner::new(input, options.delimiter).scan()?;

    if !options.has_header {
        let rows = records
            .into_iter()
            .map(|record| {
                Value::Array(record.fields.into_iter().map(Value::String).collect())
            })
            .collect();
        return Ok(Value::Array(rows));
    }

    let mut records = records.into_iter();
    let header = match records.next() {
        Some(record) => record.fields,
        None => return Ok(Value::Array(Vec::new())),
    };

    let mut rows = Vec::new();
    for (row_number, record) in records.enumerate() {
        if record.fields.len() != header.len() {
            return Err(FormatError::UnevenRow {
                row: row_number + 1,
                expected: header.len(),
                found: record.fields.len(),
                src: NamedSource::new("document.csv", input.to_string()),
                span: (record.pos_start, record.pos_end - record.pos_start).into(),
            });
        }
        let mut map = BTreeMap::new();
        for (key, field) in header.iter().zip(record.fields) {
            map.insert(key.clone(), Value::String(field));
        }
        rows.push(Value::Object(map));
    }
    log::debug!("parsed {} csv rows against a {}-column header", rows.len(), header.len());
    Ok(Value::Array(rows))
}

/// Writes rows as CSV, quoting only fields that need it. Rows may be a
/// sequence of mappings (projected through `header`) or a sequence of
/// sequences; scalar cells are stringified.
///
/// # Errors
///
/// Returns `csv::unsupported_shape` for anything that is not one of those
/// two shapes.
pub fn stringify(header: &[String], rows: &Value, options: &CsvOptions) -> Result<String, FormatError> {
    let rows = match rows {
        Value::Array(rows) => rows,
        other => {
            return Err(FormatError::UnsupportedShape {
                found: text::kind_name(other).to_string(),
            })
        }
    };

    let mut out = String::new();
    if !header.is_empty() {
        write_record(&mut out, header.iter().map(String::as_str), options.delimiter);
    }

    let mut cells: Vec<String> = Vec::new();
    for row in rows {
        cells.clear();
        match row {
            Value::Object(map) => {
                for key in header {
                    let cell = map.get(key).map(text::stringify).unwrap_or_default();
                    cells.push(cell);
                }
            }
            Value::Array(items) => {
                cells.extend(items.iter().map(text::stringify));
            }
            other => {
                return Err(FormatError::UnsupportedShape {
                    found: text::kind_name(other).to_string(),
                })
            }
        }
        write_record(&mut out, cells.iter().map(String::as_str), options.delimiter);
    }
    Ok(out)
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>, delimiter: char) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        if field.contains(delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            out.push('"');
            for c in field.chars() {
                if c == '"' {
                    out.push('"');
                }
                out.push(c);
            }
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

/// One scanned record with its byte range in the input.
struct Record {
    fields: Vec<String>,
    pos_start: usize,
    pos_end: usize,
}

struct Scanner<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    delimiter: char,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, delimiter: char) -> Self {
        Scanner {
            input,
            chars: input.chars().peekable(),
            position: 0,
            delimiter,
        }
    }

    fn scan(mut self) -> Result<Vec<Record>, FormatError> {
        let mut records = Vec::new();
        while self.peek().is_some() {
            let record = self.read_record()?;
            records.push(record);
        }
        Ok(records)
    }

    fn read_record(&mut self) -> Result<Record, FormatError> {
        let pos_start = self.position;
        let delimiter = self.delimiter;
        let mut fields = Vec::new();

        loop {
            fields.push(self.read_field()?);
            match self.peek() {
                Some(&c) if c == delimiter => {
                    self.advance();
                }
                Some(&'\r') => {
                    self.advance();
                    if self.peek() == Some(&'\n') {
                        self.advance();
                    }
                    break;
                }
                Some(&'\n') => {
                    self.advance();
                    break;
                }
                Some(_) => unreachable!("read_field stops at delimiters and record ends"),
                None => break,
            }
        }

        Ok(Record {
            fields,
            pos_start,
            pos_end: self.position,
        })
    }

    fn read_field(&mut self) -> Result<String, FormatError> {
        if self.peek() == Some(&'"') {
            return self.read_quoted_field();
        }

        let mut field = String::new();
        while let Some(&c) = self.peek() {
            if c == self.delimiter || c == '\n' || c == '\r' {
                break;
            }
            field.push(c);
            self.advance();
        }
        Ok(field)
    }

    fn read_quoted_field(&mut self) -> Result<String, FormatError> {
        let quote_pos = self.position;
        self.advance(); // opening quote

        let mut field = String::new();
        loop {
            match self.advance() {
                Some('"') => {
                    if self.peek() == Some(&'"') {
                        self.advance();
                        field.push('"');
                    } else {
                        break;
                    }
                }
                Some(c) => field.push(c),
                None => {
                    return Err(FormatError::UnclosedQuote {
                        src: NamedSource::new("document.csv", self.input.to_string()),
                        span: (quote_pos, 1).into(),
                    })
                }
            }
        }

        // Lenient about stray characters between the closing quote and
        // the next delimiter; they join the field.
        while let Some(&c) = self.peek() {
            if c == self.delimiter || c == '\n' || c == '\r' {
                break;
            }
            field.push(c);
            self.advance();
        }
        Ok(field)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }
}
