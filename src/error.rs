use crate::{
    codegen, lexer, parser,
    token::{SourceLocation, Spanned},
    util::fmt::error::Diagnostic,
};

/// Any error the pipeline can stop at.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] Spanned<lexer::Error>),
    #[error(transparent)]
    Parse(#[from] Spanned<parser::Error>),
    #[error(transparent)]
    Compile(#[from] Spanned<codegen::Error>),
}

impl Error {
    pub fn location(&self) -> SourceLocation {
        match self {
            Error::Lex(error) => error.location,
            Error::Parse(error) => error.location,
            Error::Compile(error) => error.location,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            Error::Lex(error) => Diagnostic::new(error),
            Error::Parse(error) => Diagnostic::new(error),
            Error::Compile(error) => Diagnostic::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use pretty_assertions::assert_eq;

    #[test]
    fn each_stage_reports_its_own_kind() {
        let options = driver::Options::default();

        let error = driver::compile("fn f() { \"open }", &options).unwrap_err();
        assert!(matches!(error, Error::Lex(_)));
        assert_eq!(error.location(), SourceLocation::new(1, 10));

        let error = driver::compile("fn f( { }", &options).unwrap_err();
        assert!(matches!(error, Error::Parse(_)));

        let error = driver::compile("fn f() { g() }", &options).unwrap_err();
        assert!(matches!(error, Error::Compile(_)));
        assert_eq!(error.to_string(), "1:10: call to undefined function 'g'");
    }

    #[test]
    fn diagnostics_carry_the_location() {
        let error =
            driver::compile("val x = 1; val x = 2", &driver::Options::default()).unwrap_err();
        let diagnostic = error.diagnostic();
        assert_eq!(diagnostic.location, SourceLocation::new(1, 16));
        assert_eq!(
            diagnostic.description,
            vec![
                "redefinition of 'x', previously defined at 1:5",
                "A name is bound once per scope, but inner blocks may shadow it."
            ]
        );
        assert_eq!(diagnostic.resolution, vec!["Rename one of the definitions."]);
    }
}
