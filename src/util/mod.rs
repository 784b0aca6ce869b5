//! Source position bookkeeping and leveled debug logging shared by the lexer,
//! the grammar front-ends and the parse driver.
mod code;
mod logger;
mod position;

use once_cell::unsync::OnceCell;

/// A wrapper for the input text to be tokenized with lazily computed line information.
pub struct Code {
    value: String,
    line_starts: OnceCell<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at a code point.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// An enum structure to assign multiple level debugging to the builders and runtime engines.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
