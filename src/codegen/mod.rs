//! Code generation.
//!
//! Walks the AST in two passes (prototypes first, then bodies) and emits IR
//! through a [`Backend`](interface::Backend). Expression results travel on an
//! operand stack of symbols.

use crate::{
    ast::{BinaryOperator, Root, UnaryOperator},
    symbols::ScopeError,
    token::{SourceLocation, Spanned},
    types::{self, IrType},
};

mod generator;
pub mod interface;
#[cfg(test)]
mod tests;

use generator::Generator;
use interface::Backend;

/// Name of the function emitted to call `main`.
pub const DEFAULT_ENTRY_STUB: &str = "__lore_entrypoint__";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Emit an `i32 ()` stub under this name that calls `main`.
    pub entry_stub: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            entry_stub: Some(DEFAULT_ENTRY_STUB.to_owned()),
        }
    }
}

/// Compiles `root` into the builder's module.
pub fn generate<B: Backend>(
    builder: &mut B,
    root: &Root,
    options: &Options,
) -> Result<(), Spanned<Error>> {
    Generator::new(builder).generate(root, options)
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("redefinition of '{name}', previously defined at {previous}")]
    Redefinition {
        name: Box<str>,
        previous: SourceLocation,
    },
    #[error("redefinition of function '{name}', previously defined at {previous}")]
    FunctionRedefinition {
        name: Box<str>,
        previous: SourceLocation,
    },
    #[error("use of undefined variable '{0}'")]
    UndefinedVariable(Box<str>),
    #[error("call to undefined function '{0}'")]
    UndefinedFunction(Box<str>),
    #[error("'{0}' is not callable")]
    NotCallable(Box<str>),
    #[error("only named functions can be called")]
    IndirectCall,
    #[error("cannot assign to immutable variable '{0}'")]
    ImmutableTarget(Box<str>),
    #[error("left side of assignment is not assignable")]
    NotAnLvalue,
    #[error(transparent)]
    Type(#[from] types::Error),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("parameter '{param}' of function '{function}' has no type")]
    MissingParameterType { function: Box<str>, param: Box<str> },
    #[error("operator '{op}' is not supported between '{lhs}' and '{rhs}'")]
    UnsupportedBinary {
        op: BinaryOperator,
        lhs: IrType,
        rhs: IrType,
    },
    #[error("operator '{op}' is not supported for '{operand}'")]
    UnsupportedUnary { op: UnaryOperator, operand: IrType },
    #[error("function '{function}' must return a value of type '{ty}'")]
    MissingReturnValue { function: Box<str>, ty: Box<str> },
    #[error("function '{function}' returns {expected} values, but only {found} were produced")]
    ReturnArity {
        function: Box<str>,
        expected: usize,
        found: usize,
    },
    #[error("function '{function}' failed verification: {reason}")]
    VerificationFailed { function: Box<str>, reason: String },
    #[error("module failed verification: {0}")]
    ModuleVerificationFailed(String),
    #[error(
        "attempt to assign {expressions} {} to {identifiers} {}",
        plural(.expressions, "expression"),
        plural(.identifiers, "identifier")
    )]
    AssignmentArity {
        identifiers: usize,
        expressions: usize,
    },
    #[error(
        "function '{function}' takes {expected} {}, but {found} were given",
        plural(.expected, "argument")
    )]
    CallArity {
        function: Box<str>,
        expected: usize,
        found: usize,
    },
    #[error("initializer of global '{0}' must be a number literal")]
    NonConstantGlobal(Box<str>),
    #[error("expressions are only allowed inside functions")]
    ExpressionOutsideFunction,
    #[error("variable '{0}' belongs to an enclosing function")]
    OuterLocal(Box<str>),
    #[error("expression produces several values where one is expected")]
    MultipleValues,
    #[error("{0} are not supported yet")]
    Unsupported(&'static str),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn plural(count: &usize, noun: &str) -> String {
    if *count == 1 {
        noun.to_owned()
    } else {
        format!("{noun}s")
    }
}
