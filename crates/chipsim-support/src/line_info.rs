/// Line break information for a source text, recorded as the offsets at
/// which each line starts. Used to turn byte offsets from the lexer into
/// positions a person can find.
#[derive(Eq, PartialEq, Debug, Hash, Clone)]
pub struct LineInfo {
    /// The offset of the first byte of each line. Never empty.
    starts: Vec<usize>,
}

/// A 1-based line and column.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl LineInfo {
    pub fn from_str(text: &str) -> LineInfo {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut cursor = 0;
        while cursor < bytes.len() {
            match bytes[cursor] {
                b'\n' => starts.push(cursor + 1),
                // A lone CR is a break too; CRLF breaks once, at the LF.
                b'\r' if bytes.get(cursor + 1) != Some(&b'\n') => starts.push(cursor + 1),
                _ => {}
            }
            cursor += 1;
        }
        LineInfo { starts }
    }

    /// The number of lines.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The 0-based line containing `offset`. Offsets past the end land on
    /// the last line.
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset) - 1
    }

    /// 0-based line and byte column.
    pub fn loc(&self, offset: usize) -> (usize, usize) {
        let line = self.line(offset);
        (line, offset - self.starts[line])
    }

    /// 1-based line and column, for messages.
    pub fn position(&self, offset: usize) -> Position {
        let (line, column) = self.loc(offset);
        Position {
            line: line + 1,
            column: column + 1,
        }
    }
}
