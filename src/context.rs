use crate::error::FormatError;

/// Cursor over one input text, shared by the grammar parsers.
///
/// Line-oriented grammars walk it with [`ParserContext::next_line`]; token
/// stream grammars map byte offsets back to lines with [`ParserContext::line_of`].
pub(crate) struct ParserContext<'a> {
    input: &'a str,
    line_starts: Vec<usize>,
    cursor: usize,
}

impl<'a> ParserContext<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .filter(|&start| start < input.len() || start == 0)
            .collect();
        Self {
            input,
            line_starts,
            cursor: 0,
        }
    }

    pub(crate) fn input(&self) -> &'a str {
        self.input
    }

    /// Number of lines in the input
    pub(crate) fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based line, without its terminator
    pub(crate) fn line_text(&self, line: usize) -> &'a str {
        let Some(&start) = self.line_starts.get(line.wrapping_sub(1)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.input.len());
        self.input[start..end].trim_end_matches(['\n', '\r'])
    }

    /// 1-based line containing the byte offset
    pub(crate) fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }

    /// Next line that is not blank, as (1-based line number, text)
    pub(crate) fn next_line(&mut self) -> Option<(usize, &'a str)> {
        while self.cursor < self.line_starts.len() {
            self.cursor += 1;
            let text = self.line_text(self.cursor);
            if !text.trim().is_empty() {
                return Some((self.cursor, text));
            }
        }
        None
    }

    /// Like [`ParserContext::next_line`] without consuming the line
    pub(crate) fn peek_line(&self) -> Option<(usize, &'a str)> {
        ((self.cursor + 1)..=self.line_starts.len())
            .map(|line| (line, self.line_text(line)))
            .find(|(_, text)| !text.trim().is_empty())
    }

    pub(crate) fn malformed(&self, line: usize, message: impl Into<String>) -> FormatError {
        FormatError::Malformed {
            line,
            text: self.line_text(line).trim().to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn malformed_at(&self, offset: usize, message: impl Into<String>) -> FormatError {
        self.malformed(self.line_of(offset), message)
    }

    pub(crate) fn eof(&self, expected: impl Into<String>) -> FormatError {
        FormatError::UnexpectedEof {
            line: self.line_count(),
            expected: expected.into(),
        }
    }
}
