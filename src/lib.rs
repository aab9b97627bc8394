/// The lexer maps source text into a sequence of lexemes.
pub mod lexer;

/// The parser maps a sequence of lexemes into an AST.
pub mod parser;

/// The code generator lowers an AST into IR through an abstract builder.
pub mod codegen;

/// An in-memory IR builder, printable as LLVM-flavoured text.
pub mod ir;

pub mod ast;
pub mod driver;
pub mod module;
pub mod source;
pub mod symbols;
pub mod token;
pub mod types;

mod error;
pub use error::Error;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
