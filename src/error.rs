use crate::{Conflict, ConflictKind, GrammarError, ParseError, ParseErrorKind, SerializationError};
use std::fmt::{Display, Formatter};

impl ParseError {
    pub fn new(kind: ParseErrorKind, pointer: usize, message: String) -> Self {
        Self {
            kind,
            pointer,
            message,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == ParseErrorKind::UnexpectedEof
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            ParseErrorKind::UnknownToken
            | ParseErrorKind::ZeroLengthMatch
            | ParseErrorKind::InvalidPointer => "LexerError",
            ParseErrorKind::UnexpectedToken | ParseErrorKind::UnexpectedEof => "SyntaxError",
            ParseErrorKind::Handler => "HandlerError",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            ConflictKind::ShiftShift => "shift/shift",
            ConflictKind::ReduceReduce => "reduce/reduce",
            ConflictKind::ShiftReduce => "shift/reduce",
        };
        write!(
            f,
            "{:?} {} conflict at state {} on '{}' between [{}] and [{}]",
            self.mode, label, self.state, self.terminal, self.items[0], self.items[1]
        )
    }
}

impl GrammarError {
    pub(crate) fn definition(what: &str, message: String) -> Self {
        GrammarError::Definition {
            what: what.to_string(),
            message,
        }
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::Syntax { pointer, message } => {
                write!(f, "GrammarSyntaxError at offset {}: {}", pointer, message)
            }
            GrammarError::Conflict(conflict) => write!(f, "GrammarConflict: {}", conflict),
            GrammarError::Conflicts(conflicts) => {
                writeln!(f, "GrammarConflict: the grammar fits no table mode.")?;
                for conflict in conflicts {
                    writeln!(f, "  {}", conflict)?;
                }
                Ok(())
            }
            GrammarError::InvalidProductionIndex { index, message } => {
                write!(f, "InvalidProductionIndex {}: {}", index, message)
            }
            GrammarError::Definition { what, message } => {
                write!(f, "GrammarDefinitionError: {}-{}", what, message)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

impl Display for SerializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::MissingHandler { id } => {
                write!(f, "SerializationError: handler '{}' is not registered.", id)
            }
            SerializationError::UnserializableHandler { what } => {
                write!(f, "SerializationError: {}.", what)
            }
            SerializationError::Malformed { message } => {
                write!(f, "SerializationError: {}", message)
            }
        }
    }
}

impl std::error::Error for SerializationError {}
