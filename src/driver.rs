//! Runs the whole pipeline: source text to a verified IR module.

use tracing::{debug, debug_span};

use crate::{
    ast::Root,
    codegen, ir, lexer,
    module::SourceModule,
    parser,
    token::Lexeme,
    Error,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub lexer: lexer::Options,
    /// Name of the produced IR module.
    pub module_name: String,
    /// See [`codegen::Options::entry_stub`].
    pub entry_stub: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options::for_module(&SourceModule::anonymous())
    }
}

impl Options {
    pub fn for_module(module: &SourceModule) -> Options {
        Options {
            lexer: lexer::Options::default(),
            module_name: module.name.clone(),
            entry_stub: Some(codegen::DEFAULT_ENTRY_STUB.to_owned()),
        }
    }
}

pub fn lex(src: &str, options: &Options) -> Result<Vec<Lexeme>, Error> {
    Ok(lexer::lex_with(src, &options.lexer)?)
}

pub fn parse(src: &str, options: &Options) -> Result<Root, Error> {
    let lexemes = lex(src, options)?;
    parser::parse_program(&lexemes)
}

pub fn compile(src: &str, options: &Options) -> Result<ir::Module, Error> {
    let _span = debug_span!("compile", module = %options.module_name).entered();

    let root = parse(src, options)?;
    let mut module = ir::Module::new(options.module_name.as_str());
    let codegen_options = codegen::Options {
        entry_stub: options.entry_stub.clone(),
    };
    codegen::generate(&mut module, &root, &codegen_options)?;

    debug!("compiled module");
    Ok(module)
}
