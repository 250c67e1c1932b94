//! Record-level scanning: completeness check, field splitting, cleaning.

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Running quote state of a logical record that is fed one physical line
/// at a time.
///
/// A doubled quote inside a quoted span is an escaped literal and does not
/// toggle the state. Line breaks separate every fed chunk, so a quote pair
/// never spans two chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteScanner {
    quote: char,
    inside_quotes: bool,
}

impl QuoteScanner {
    #[must_use]
    pub const fn new(quote: char) -> Self {
        Self {
            quote,
            inside_quotes: false,
        }
    }

    /// Scans `chunk` and returns whether the record is balanced after it.
    pub fn feed(&mut self, chunk: &str) -> bool {
        let mut chars = chunk.chars().peekable();
        while let Some(c) = chars.next() {
            if c != self.quote {
                continue;
            }
            if self.inside_quotes && chars.peek() == Some(&self.quote) {
                chars.next();
                continue;
            }
            self.inside_quotes = !self.inside_quotes;
        }
        !self.inside_quotes
    }

    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        !self.inside_quotes
    }
}

/// Returns `true` if `record` does not end inside a quoted span.
#[must_use]
pub fn is_complete_record(record: &str, quote: char) -> bool {
    QuoteScanner::new(quote).feed(record)
}

/// Splits one complete logical record into raw (uncleaned) fields.
///
/// Quote characters are removed, doubled quotes collapse into one, and the
/// delimiter and line breaks inside quoted spans are kept as content.
#[must_use]
pub fn split_record(record: &str, delimiter: char, quote: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(c) = chars.next() {
        if c == quote {
            if inside_quotes && chars.peek() == Some(&quote) {
                current.push(quote);
                chars.next();
            } else {
                inside_quotes = !inside_quotes;
            }
            continue;
        }

        if c == delimiter && !inside_quotes {
            fields.push(std::mem::take(&mut current));
            continue;
        }

        current.push(c);
    }

    fields.push(current);
    fields
}

/// Strips a leading byte-order mark and surrounding whitespace.
#[must_use]
pub fn clean_field(value: &str) -> &str {
    value.strip_prefix(BYTE_ORDER_MARK).unwrap_or(value).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_open_quotes() {
        assert!(is_complete_record("a;b;c", '"'));
        assert!(is_complete_record("\"a;b\";c", '"'));
        assert!(!is_complete_record("\"a;b", '"'));
        assert!(is_complete_record("\"say \"\"hi\"\"\"", '"'));
        assert!(!is_complete_record("\"say \"\"hi\"\"", '"'));
    }

    #[test]
    fn scanner_carries_state_across_lines() {
        let mut scanner = QuoteScanner::new('"');
        assert!(!scanner.feed("a;\"first"));
        assert!(!scanner.feed("say \"\"hi\"\""));
        assert!(scanner.feed("end\";b"));
        assert!(scanner.is_balanced());
        assert!(!scanner.feed("\""));
        assert!(scanner.feed("\""));
    }

    #[test]
    fn splits_quoted_delimiters() {
        assert_eq!(
            split_record("\"a;b\";c;;d", ';', '"'),
            vec!["a;b", "c", "", "d"]
        );
    }

    #[test]
    fn collapses_doubled_quotes() {
        assert_eq!(
            split_record("\"He said \"\"no\"\"\";x", ';', '"'),
            vec!["He said \"no\"", "x"]
        );
    }

    #[test]
    fn trailing_delimiter_yields_empty_field() {
        assert_eq!(split_record("a;", ';', '"'), vec!["a", ""]);
    }

    #[test]
    fn cleans_bom_and_whitespace() {
        assert_eq!(clean_field("\u{FEFF}UJAHR "), "UJAHR");
        assert_eq!(clean_field("  2022\t"), "2022");
        assert_eq!(clean_field(""), "");
    }
}
