use super::{Code, Position};
use once_cell::unsync::OnceCell;

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Code::new(value)
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Code::new(value)
    }
}

impl Code {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            line_starts: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Byte offsets at which each line of the input begins.
    pub fn obtain_line_starts(&self) -> &Vec<usize> {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0];
            for (index, byte) in self.value.bytes().enumerate() {
                if byte == b'\n' {
                    starts.push(index + 1);
                }
            }
            starts
        })
    }

    /// Obtain 1-based line and column information for a byte offset.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let pointer = pointer.min(self.value.len());
        let starts = self.obtain_line_starts();
        let line_index = match starts.binary_search(&pointer) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let column = self.value[starts[line_index]..pointer].chars().count() + 1;
        Position::new(line_index + 1, column)
    }

    /// A short slice of the input following the given offset, used in diagnostics.
    pub fn snippet(&self, pointer: usize) -> &str {
        let mut start = pointer.min(self.value.len());
        while !self.value.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = (start + 24).min(self.value.len());
        while !self.value.is_char_boundary(end) {
            end += 1;
        }
        self.value[start..end].lines().next().unwrap_or("")
    }
}
