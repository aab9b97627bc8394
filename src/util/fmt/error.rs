//! Long-form rendering of located errors.

use std::fmt;

use crate::{
    codegen::{self, plural},
    lexer, parser,
    token::{SourceLocation, Spanned},
    types,
};

/// Explains an error beyond its one-line message.
pub trait Describe {
    /// What went wrong, one line per entry.
    fn description(&self) -> Vec<String>;

    /// Suggested fixes, if there are any.
    fn resolution(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Describe for lexer::Error {
    fn description(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    fn resolution(&self) -> Vec<String> {
        use lexer::Error::*;
        let line = match self {
            UnterminatedComment => "Close the comment with '*/'.",
            UnterminatedString => "Close the string with '\"'.",
            UnknownEscape(_) => {
                "Known escapes are \\\" \\' \\\\ \\0 \\a \\b \\f \\n \\r and \\t."
            }
            NumberOutOfRange(_) => "Integer literals must fit in 64 bits.",
            RepeatedDecimalPoint(_) => "Remove the extra '.'.",
            MalformedNumber(_) | UnexpectedChar(_) => return Vec::new(),
        };
        vec![line.to_owned()]
    }
}

impl Describe for parser::Error {
    fn description(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    fn resolution(&self) -> Vec<String> {
        use parser::Error::*;
        match self {
            InvalidLambdaParameters => {
                vec!["Lambda parameters are names, optionally followed by ': type'.".to_owned()]
            }
            DuplicateCapture(name) => vec![format!("Capture '{name}' only once.")],
            Unexpected { .. } | UnexpectedEnd { .. } | InvalidInteger(_) | InvalidFloat(_) => {
                Vec::new()
            }
        }
    }
}

impl Describe for types::Error {
    fn description(&self) -> Vec<String> {
        vec![self.to_string()]
    }

    fn resolution(&self) -> Vec<String> {
        match self {
            types::Error::UnknownType(_) => vec![
                "Built-in types are void, bool, int8, uint8, int16, uint16, int, uint,".to_owned(),
                "int32, uint32, int64, uint64, float, double and string.".to_owned(),
            ],
            types::Error::TooBig { to, .. } => {
                vec![format!("Only constants that fit in '{to}' narrow implicitly.")]
            }
            types::Error::Unsupported { .. } => Vec::new(),
        }
    }
}

impl Describe for codegen::Error {
    fn description(&self) -> Vec<String> {
        use codegen::Error::*;
        match self {
            Type(error) => error.description(),
            Redefinition { .. } => vec![
                self.to_string(),
                "A name is bound once per scope, but inner blocks may shadow it.".to_owned(),
            ],
            FunctionRedefinition { .. } => vec![
                self.to_string(),
                "Functions in one scope share a namespace with its variables.".to_owned(),
            ],
            _ => vec![self.to_string()],
        }
    }

    fn resolution(&self) -> Vec<String> {
        use codegen::Error::*;
        match self {
            Type(error) => error.resolution(),
            Redefinition { .. } | FunctionRedefinition { .. } => {
                vec!["Rename one of the definitions.".to_owned()]
            }
            ImmutableTarget(name) => {
                vec![format!("Declare '{name}' with 'var' to make it mutable.")]
            }
            MissingParameterType { param, .. } => {
                vec![format!("Annotate the parameter as '{param}: <type>'.")]
            }
            MissingReturnValue { ty, .. } => {
                vec![format!("End the body with an expression of type '{ty}'.")]
            }
            AssignmentArity {
                identifiers,
                expressions,
            } => {
                let line = if expressions < identifiers {
                    let missing = identifiers - expressions;
                    format!("Add {missing} more {}.", plural(&missing, "expression"))
                } else {
                    let extra = expressions - identifiers;
                    format!("Discard {extra} {}.", plural(&extra, "result"))
                };
                vec![line]
            }
            OuterLocal(name) => vec![format!("Pass '{name}' in as a parameter.")],
            NonConstantGlobal(_) => {
                vec!["Compute the value inside a function instead.".to_owned()]
            }
            _ => Vec::new(),
        }
    }
}

/// A located error ready to be shown to a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub description: Vec<String>,
    pub resolution: Vec<String>,
}

impl Diagnostic {
    pub fn new<E: Describe>(error: &Spanned<E>) -> Diagnostic {
        Diagnostic {
            location: error.location,
            description: error.inner.description(),
            resolution: error.inner.resolution(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SourceLocation { line, column } = self.location;
        writeln!(f, "At Line {line} Pos {column}:")?;
        for entry in &self.description {
            writeln!(f, "| D | {entry}")?;
        }
        for entry in &self.resolution {
            writeln!(f, "| S | {entry}")?;
        }
        Ok(())
    }
}
