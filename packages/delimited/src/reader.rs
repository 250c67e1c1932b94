//! Streaming record reader.

use std::io::BufRead;

use crate::tokenize::{QuoteScanner, clean_field, split_record};
use crate::{ParseError, ReaderOptions, UnterminatedQuote};

/// One logical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number where the record starts.
    pub line: usize,
    /// The record text exactly as read, without its final line break.
    /// Embedded line breaks are normalized to `\n`.
    pub raw: String,
    /// Cleaned field values.
    pub fields: Vec<String>,
}

impl Record {
    /// Whether every field is empty after cleaning.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(String::is_empty)
    }

    /// Field at `index`, or `None` past the end of a short row.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Lazy, non-restartable iterator of [`Record`]s over a buffered reader.
///
/// After an error item has been yielded the iterator is exhausted.
#[derive(Debug)]
pub struct DelimitedReader<R> {
    input: R,
    options: ReaderOptions,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> DelimitedReader<R> {
    #[must_use]
    pub const fn new(input: R, options: ReaderOptions) -> Self {
        Self {
            input,
            options,
            line_number: 0,
            finished: false,
        }
    }

    /// Number of physical lines consumed so far.
    #[must_use]
    pub const fn lines_read(&self) -> usize {
        self.line_number
    }

    fn read_record(&mut self) -> Result<Option<Record>, ParseError> {
        let mut pending = String::new();
        let mut start_line = 0;
        let mut quotes = QuoteScanner::new(self.options.quote);
        let mut line = String::new();

        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                if pending.is_empty() {
                    return Ok(None);
                }
                return match self.options.unterminated {
                    UnterminatedQuote::Fail => {
                        Err(ParseError::UnterminatedQuote { line: start_line })
                    }
                    UnterminatedQuote::Skip => {
                        log::warn!(
                            "Dropping unterminated quoted record starting at line {start_line}"
                        );
                        Ok(None)
                    }
                };
            }

            self.line_number += 1;
            let content = line
                .strip_suffix('\n')
                .map_or(line.as_str(), |l| l.strip_suffix('\r').unwrap_or(l));

            if start_line == 0 {
                start_line = self.line_number;
                pending.push_str(content);
            } else {
                pending.push('\n');
                pending.push_str(content);
            }

            if quotes.feed(content) {
                let fields = split_record(&pending, self.options.delimiter, self.options.quote)
                    .iter()
                    .map(|f| clean_field(f).to_owned())
                    .collect();
                return Ok(Some(Record {
                    line: start_line,
                    raw: pending,
                    fields,
                }));
            }
        }
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(text: &str, options: ReaderOptions) -> Vec<Result<Record, ParseError>> {
        DelimitedReader::new(text.as_bytes(), options).collect()
    }

    fn fields(text: &str) -> Vec<Vec<String>> {
        read_all(text, ReaderOptions::semicolon())
            .into_iter()
            .map(|r| r.unwrap().fields)
            .collect()
    }

    #[test]
    fn quoted_field_spans_lines() {
        let rows = fields("\"Smith; \"\"Jr.\"\"\nEnd\";5");
        assert_eq!(rows, vec![vec!["Smith; \"Jr.\"\nEnd".to_string(), "5".to_string()]]);
    }

    #[test]
    fn handles_crlf_and_lf() {
        let rows = fields("a;b\r\nc;d\ne;f");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
                vec!["e".to_string(), "f".to_string()],
            ]
        );
    }

    #[test]
    fn strips_bom_from_first_field_only_after_tokenizing() {
        let rows = fields("\u{FEFF}\"UJAHR\" ; UMONAT\n2022;3\n");
        assert_eq!(rows[0], vec!["UJAHR".to_string(), "UMONAT".to_string()]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn records_keep_raw_text_and_start_line() {
        let records: Vec<Record> = read_all("h1;h2\n\"x\ny\";2\nz;3", ReaderOptions::semicolon())
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records[1].line, 2);
        assert_eq!(records[1].raw, "\"x\ny\";2");
        assert_eq!(records[2].line, 4);
    }

    #[test]
    fn blank_lines_are_blank_records() {
        let records: Vec<Record> = read_all("a;b\n\n ; \nc;d", ReaderOptions::semicolon())
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(records.len(), 4);
        assert!(records[1].is_blank());
        assert!(records[2].is_blank());
        assert!(!records[3].is_blank());
    }

    #[test]
    fn strict_mode_fails_on_unterminated_quote() {
        let results = read_all("a;b\n\"open;1\nstill open", ReaderOptions::semicolon().strict());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ParseError::UnterminatedQuote { line: 2 })
        ));
    }

    #[test]
    fn lenient_mode_skips_unterminated_quote() {
        let results = read_all("a;b\n\"open;1\nstill open", ReaderOptions::semicolon());
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn stray_quote_scans_each_line_once() {
        let mut text = String::from("a;b\n\"stray;1\n");
        for i in 0..200_000 {
            text.push_str(&format!("{i};x\n"));
        }

        let mut reader = DelimitedReader::new(text.as_bytes(), ReaderOptions::semicolon().strict());
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(ParseError::UnterminatedQuote { line: 2 }))
        ));
        assert_eq!(reader.lines_read(), 200_002);
        assert!(reader.next().is_none());
    }

    #[test]
    fn custom_delimiter_and_quote() {
        let rows: Vec<Vec<String>> = read_all(
            "'a|b'|c",
            ReaderOptions::new('|').with_quote('\''),
        )
        .into_iter()
        .map(|r| r.unwrap().fields)
        .collect();
        assert_eq!(rows, vec![vec!["a|b".to_string(), "c".to_string()]]);
    }

    #[test]
    fn short_rows_return_none_past_end() {
        let record = fields("only").remove(0);
        assert_eq!(record.len(), 1);
        let record = Record {
            line: 1,
            raw: "only".into(),
            fields: record,
        };
        assert_eq!(record.get(0), Some("only"));
        assert_eq!(record.get(3), None);
    }
}
