use tracing::debug;

use crate::{
    ast::{
        AssignStatement, BinaryOperator, Capture, CodeBlock, Expr, ExprKind, FunctionDeclaration,
        Ident, IntegerSize, Lambda, NamedParameter, ReturnType, Root, Stmt, StmtKind,
        UnaryOperator,
    },
    codegen,
    token::{Lexeme, SourceLocation, TokenKind},
};

type Result<T, E = crate::Error> = std::result::Result<T, E>;

/// Parses a whole compilation unit.
pub fn parse_program(lexemes: &[Lexeme]) -> Result<Root> {
    let root = Parser::new(lexemes).parse_program()?;
    debug!(statements = root.statements.len(), "parsed program");
    Ok(root)
}

/// Parses a single expression, which must span all of the input.
pub fn parse_expr(lexemes: &[Lexeme]) -> Result<Expr> {
    let mut p = Parser::new(lexemes);
    let expr = p.parse_expr()?;
    p.skip_semicolons();
    match p.peek() {
        Some(lexeme) => Err(p.unexpected(lexeme, "end of input")),
        None => Ok(expr),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expected {expected}, but got {found}")]
    Unexpected { found: Box<str>, expected: Box<str> },
    #[error("expected {expected}, but reached the end of input")]
    UnexpectedEnd { expected: Box<str> },
    #[error("invalid lambda parameter list")]
    InvalidLambdaParameters,
    #[error("symbol '{0}' was captured multiple times")]
    DuplicateCapture(Box<str>),
    #[error("invalid integer literal '{0}'")]
    InvalidInteger(Box<str>),
    #[error("invalid float literal '{0}'")]
    InvalidFloat(Box<str>),
}

/// Binary operator levels, loosest first. Assignment and lambda arrows sit
/// above these and prefix operators below.
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &[">", ">=", "<", "<="],
    &["<<", ">>"],
    &["+", "-"],
    &["*", "/", "%"],
];

struct Parser<'lex> {
    lexemes: &'lex [Lexeme],
    cursor: usize,
}

impl Parser<'_> {
    fn parse_program(&mut self) -> Result<Root> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.peek().is_none() {
                break;
            }
            statements.push(self.parse_statement(true)?);
        }
        Ok(Root { statements })
    }

    fn parse_statement(&mut self, global: bool) -> Result<Stmt> {
        let location = self.location();
        let Some(lexeme) = self.peek() else {
            return Err(self.unexpected_end("statement"));
        };

        let kind = if lexeme.is_keyword("fn") {
            StmtKind::Function(self.parse_function()?)
        } else if lexeme.is_keyword("val") || lexeme.is_keyword("var") {
            StmtKind::Assign(self.parse_assignment_statement(global)?)
        } else if lexeme.kind == TokenKind::OpenBracket {
            let captures = self.parse_captures()?;
            let mut block = CodeBlock::new(location);
            block.captures = captures;
            block.merge(self.parse_block()?);
            StmtKind::Block(block)
        } else if lexeme.kind == TokenKind::OpenBrace {
            StmtKind::Block(self.parse_block()?)
        } else {
            let expr = self.parse_expr()?;
            self.take(TokenKind::Semicolon);
            StmtKind::Expr(expr)
        };

        Ok(Stmt { kind, location })
    }

    /// `{ statements }`
    fn parse_block(&mut self) -> Result<CodeBlock> {
        let open = self.consume(TokenKind::OpenBrace)?;
        let mut block = CodeBlock::new(open.location);
        loop {
            self.skip_semicolons();
            match self.peek() {
                Some(lexeme) if lexeme.kind == TokenKind::CloseBrace => break,
                Some(_) => block.statements.push(self.parse_statement(false)?),
                None => return Err(self.unexpected_end("'}'")),
            }
        }
        self.consume(TokenKind::CloseBrace)?;
        Ok(block)
    }

    fn parse_function(&mut self) -> Result<FunctionDeclaration> {
        self.advance(); // fn
        let name = self.parse_ident()?;

        let params = if self.take(TokenKind::OpenParen) {
            let params = self.parse_list(TokenKind::CloseParen, Parser::parse_named_parameter)?;
            self.consume(TokenKind::CloseParen)?;
            params
        } else {
            Vec::new()
        };

        let returns = if self.take_operator("->") {
            let mut types = vec![self.parse_ident()?];
            while self.take(TokenKind::Comma) {
                types.push(self.parse_ident()?);
            }
            if types.len() == 1 {
                ReturnType::Single(types.remove(0))
            } else {
                ReturnType::Tuple(types)
            }
        } else {
            ReturnType::Void
        };

        let body = self.parse_function_body()?;
        Ok(FunctionDeclaration {
            name,
            params,
            returns,
            body,
        })
    }

    /// `[captures]? ({ statements } | => expression)`
    fn parse_function_body(&mut self) -> Result<CodeBlock> {
        let location = self.location();
        let captures = if self.is(TokenKind::OpenBracket) {
            self.parse_captures()?
        } else {
            Vec::new()
        };

        let mut body = CodeBlock::new(location);
        body.captures = captures;
        if self.is_operator("=>") {
            let arrow = self.advance_or("'=>'")?;
            let expr = self.parse_expr()?;
            self.take(TokenKind::Semicolon);
            body.statements.push(Stmt {
                kind: StmtKind::Expr(expr),
                location: arrow.location,
            });
        } else {
            body.merge(self.parse_block()?);
        }
        Ok(body)
    }

    /// `[a, b, =]`
    fn parse_captures(&mut self) -> Result<Vec<Capture>> {
        self.consume(TokenKind::OpenBracket)?;
        let entries = self.parse_list(TokenKind::CloseBracket, |p| {
            let lexeme = p.advance_or("capture")?;
            match lexeme.kind {
                TokenKind::Identifier => Ok(Capture::Name(Ident::new(
                    lexeme.text.as_str(),
                    lexeme.location,
                ))),
                _ if lexeme.is_operator("=") => Ok(Capture::All),
                _ => Err(p.unexpected(lexeme, "capture")),
            }
        })?;
        self.consume(TokenKind::CloseBracket)?;

        let mut captures: Vec<Capture> = Vec::with_capacity(entries.len());
        for capture in entries {
            if let Capture::Name(ident) = &capture {
                if captures.iter().any(|c| c.name() == Some(&*ident.name)) {
                    let error = Error::DuplicateCapture(ident.name.clone());
                    return Err(ident.location.wrap(error).into());
                }
            } else if captures.contains(&Capture::All) {
                continue;
            }
            captures.push(capture);
        }
        Ok(captures)
    }

    /// `val`/`var` targets `=` values
    fn parse_assignment_statement(&mut self, global: bool) -> Result<AssignStatement> {
        let keyword = self.advance_or("'val' or 'var'")?;
        let mutable = keyword.is_keyword("var");

        let mut targets = vec![self.parse_named_parameter()?];
        while self.take(TokenKind::Comma) {
            targets.push(self.parse_named_parameter()?);
        }
        self.consume_operator("=")?;
        let mut values = vec![self.parse_expr()?];
        while self.take(TokenKind::Comma) {
            values.push(self.parse_expr()?);
        }
        self.take(TokenKind::Semicolon);

        if targets.len() != values.len() {
            let error = codegen::Error::AssignmentArity {
                identifiers: targets.len(),
                expressions: values.len(),
            };
            return Err(keyword.location.wrap(error).into());
        }

        Ok(AssignStatement {
            targets,
            values,
            mutable,
            global,
        })
    }

    fn parse_named_parameter(&mut self) -> Result<NamedParameter> {
        let name = self.parse_ident()?;
        let ty = if self.take(TokenKind::Colon) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        Ok(NamedParameter { name, ty })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let lexeme = self.consume(TokenKind::Identifier)?;
        Ok(Ident::new(lexeme.text.as_str(), lexeme.location))
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    /// Right associative `=`, or a lambda when the left side is followed by
    /// `=>`.
    fn parse_assignment(&mut self) -> Result<Expr> {
        let lhs = self.parse_binary(0)?;

        if self.is_operator("=") {
            self.advance();
            let rhs = self.parse_assignment()?;
            let location = lhs.location;
            let kind = ExprKind::Binary {
                op: BinaryOperator::Assign,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            return Ok(Expr::new(kind, location));
        }

        if self.is_operator("=>") {
            let location = lhs.location;
            let params = ParenList::single(lhs).into_lambda_parameters()?;
            return self.parse_lambda(params, location);
        }

        Ok(lhs)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr> {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.parse_unary();
        };

        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(op) = self.take_any_operator(operators) {
            let rhs = self.parse_binary(level + 1)?;
            let location = lhs.location;
            let kind = ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            lhs = Expr::new(kind, location);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = self
            .peek()
            .filter(|l| l.kind == TokenKind::Operator)
            .and_then(|l| UnaryOperator::from_symbol(&l.text));
        let Some(op) = op else {
            return self.parse_call();
        };

        let location = self.location();
        self.advance();
        let operand = self.parse_unary()?;
        let kind = ExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok(Expr::new(kind, location))
    }

    /// A term followed by any number of argument lists.
    fn parse_call(&mut self) -> Result<Expr> {
        let mut expr = self.parse_term()?;
        while self.take(TokenKind::OpenParen) {
            let args = self.parse_list(TokenKind::CloseParen, Parser::parse_expr)?;
            self.consume(TokenKind::CloseParen)?;
            let location = expr.location;
            let kind = ExprKind::Call {
                target: Box::new(expr),
                args,
            };
            expr = Expr::new(kind, location);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let Some(lexeme) = self.peek() else {
            return Err(self.unexpected_end("expression"));
        };
        let location = lexeme.location;

        let kind = match lexeme.kind {
            TokenKind::Identifier => {
                self.advance();
                ExprKind::Name(lexeme.text.as_str().into())
            }
            TokenKind::IntLiteral => {
                self.advance();
                let Ok(value) = lexeme.text.parse::<u64>() else {
                    let error = Error::InvalidInteger(lexeme.text.as_str().into());
                    return Err(location.wrap(error).into());
                };
                ExprKind::Integer {
                    value,
                    size: IntegerSize::of(value),
                }
            }
            TokenKind::FloatLiteral => {
                self.advance();
                let Ok(value) = lexeme.text.parse::<f64>() else {
                    let error = Error::InvalidFloat(lexeme.text.as_str().into());
                    return Err(location.wrap(error).into());
                };
                ExprKind::Float(value)
            }
            TokenKind::StringLiteral => {
                self.advance();
                ExprKind::String(lexeme.text.as_str().into())
            }
            TokenKind::OpenBracket => {
                self.advance();
                let items = self.parse_list(TokenKind::CloseBracket, Parser::parse_expr)?;
                self.consume(TokenKind::CloseBracket)?;
                ExprKind::List(items)
            }
            TokenKind::OpenParen => return self.parse_parenthesized(),
            TokenKind::Operator if lexeme.is_operator("=>") => {
                return self.parse_lambda(Vec::new(), location);
            }
            _ => return Err(self.unexpected(lexeme, "expression")),
        };
        Ok(Expr::new(kind, location))
    }

    /// `(` starts a grouped expression, a tuple or a lambda parameter list.
    /// The items are collected first and shaped once the token after `)` is
    /// known.
    fn parse_parenthesized(&mut self) -> Result<Expr> {
        let open = self.consume(TokenKind::OpenParen)?;
        let mut list = ParenList {
            items: Vec::new(),
            has_comma: false,
            location: open.location,
        };

        if self.is(TokenKind::CloseParen) {
            if !self.peek_nth(1).is_some_and(|l| l.is_operator("=>")) {
                let close = self.advance_or("expression")?;
                return Err(self.unexpected(close, "expression"));
            }
        } else {
            list.items.push(self.parse_expr()?);
            while self.take(TokenKind::Comma) {
                list.has_comma = true;
                list.items.push(self.parse_expr()?);
            }
        }
        self.consume(TokenKind::CloseParen)?;

        if self.is_operator("=>") {
            let params = list.into_lambda_parameters()?;
            return self.parse_lambda(params, open.location);
        }
        Ok(list.into_expr())
    }

    /// `=> [captures]? ({ statements } | expression)`
    fn parse_lambda(
        &mut self,
        params: Vec<NamedParameter>,
        location: SourceLocation,
    ) -> Result<Expr> {
        self.consume_operator("=>")?;
        let captures = if self.is(TokenKind::OpenBracket) {
            self.parse_captures()?
        } else {
            Vec::new()
        };

        let body_location = self.location();
        let mut body = CodeBlock::new(body_location);
        body.captures = captures;
        if self.is(TokenKind::OpenBrace) {
            body.merge(self.parse_block()?);
        } else {
            let expr = self.parse_expr()?;
            body.statements.push(Stmt {
                kind: StmtKind::Return(expr),
                location: body_location,
            });
        }

        Ok(Expr::new(ExprKind::Lambda(Lambda { params, body }), location))
    }

    /// Comma separated items up to (not including) `end`.
    fn parse_list<T>(
        &mut self,
        end: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while !self.is(end) {
            items.push(parse_item(self)?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}

/// Items read between parentheses, before deciding what they are.
struct ParenList {
    items: Vec<Expr>,
    has_comma: bool,
    location: SourceLocation,
}

impl ParenList {
    fn single(expr: Expr) -> ParenList {
        ParenList {
            location: expr.location,
            items: vec![expr],
            has_comma: false,
        }
    }

    fn into_expr(mut self) -> Expr {
        if self.has_comma {
            Expr::new(ExprKind::Tuple(self.items), self.location)
        } else {
            // Exactly one item: the grouped expression itself.
            self.items.remove(0)
        }
    }

    fn into_lambda_parameters(self) -> Result<Vec<NamedParameter>> {
        self.items
            .into_iter()
            .map(|item| match item.kind {
                ExprKind::Name(name) => Ok(NamedParameter {
                    name: Ident::new(name, item.location),
                    ty: None,
                }),
                _ => Err(item.location.wrap(Error::InvalidLambdaParameters).into()),
            })
            .collect()
    }
}

impl<'lex> Parser<'lex> {
    fn new(lexemes: &'lex [Lexeme]) -> Parser<'lex> {
        Parser { lexemes, cursor: 0 }
    }

    fn peek(&self) -> Option<&'lex Lexeme> {
        self.lexemes.get(self.cursor)
    }

    fn peek_nth(&self, n: usize) -> Option<&'lex Lexeme> {
        self.lexemes.get(self.cursor + n)
    }

    fn advance(&mut self) -> Option<&'lex Lexeme> {
        let current = self.peek();
        if current.is_some() {
            self.cursor += 1;
        }
        current
    }

    fn advance_or(&mut self, expected: &str) -> Result<&'lex Lexeme> {
        match self.advance() {
            Some(lexeme) => Ok(lexeme),
            None => Err(self.unexpected_end(expected)),
        }
    }

    /// Location of the current lexeme, or of the last one at end of input.
    fn location(&self) -> SourceLocation {
        self.peek()
            .or_else(|| self.lexemes.last())
            .map_or(SourceLocation::START, |l| l.location)
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|l| l.kind == kind)
    }

    fn is_operator(&self, op: &str) -> bool {
        self.peek().is_some_and(|l| l.is_operator(op))
    }

    /// Advances if the current lexeme has the given kind.
    fn take(&mut self, kind: TokenKind) -> bool {
        let matches = self.is(kind);
        if matches {
            self.cursor += 1;
        }
        matches
    }

    fn take_operator(&mut self, op: &str) -> bool {
        let matches = self.is_operator(op);
        if matches {
            self.cursor += 1;
        }
        matches
    }

    fn take_any_operator(&mut self, operators: &[&str]) -> Option<BinaryOperator> {
        let lexeme = self.peek()?;
        if lexeme.kind != TokenKind::Operator || !operators.contains(&lexeme.text.as_str()) {
            return None;
        }
        self.cursor += 1;
        BinaryOperator::from_symbol(&lexeme.text)
    }

    /// Advances if the current lexeme has the given kind, failing otherwise.
    fn consume(&mut self, kind: TokenKind) -> Result<&'lex Lexeme> {
        match self.peek() {
            Some(lexeme) if lexeme.kind == kind => {
                self.cursor += 1;
                Ok(lexeme)
            }
            Some(lexeme) => Err(self.unexpected(lexeme, &kind.to_string())),
            None => Err(self.unexpected_end(&kind.to_string())),
        }
    }

    fn consume_operator(&mut self, op: &str) -> Result<&'lex Lexeme> {
        let expected = format!("operator '{op}'");
        match self.peek() {
            Some(lexeme) if lexeme.is_operator(op) => {
                self.cursor += 1;
                Ok(lexeme)
            }
            Some(lexeme) => Err(self.unexpected(lexeme, &expected)),
            None => Err(self.unexpected_end(&expected)),
        }
    }

    fn skip_semicolons(&mut self) {
        while self.take(TokenKind::Semicolon) {}
    }

    fn unexpected(&self, found: &Lexeme, expected: &str) -> crate::Error {
        let error = Error::Unexpected {
            found: found.to_string().into(),
            expected: expected.into(),
        };
        found.location.wrap(error).into()
    }

    fn unexpected_end(&self, expected: &str) -> crate::Error {
        let error = Error::UnexpectedEnd {
            expected: expected.into(),
        };
        self.location().wrap(error).into()
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_name_expr() {
            let expr = "foo";
            let tree_ok = "
                name foo
            ";
        }

        fn test_integer_sizes() {
            let expr = "(127, 128, 0x1337, 4294967296)";
            let tree_ok = "
                tuple
                  int 127: int8
                  int 128: uint8
                  int 4919: int16
                  int 4294967296: int64
            ";
        }

        fn test_float_and_string() {
            let expr = r#"(.5, "hi\n")"#;
            let tree_ok = r#"
                tuple
                  float 0.5
                  string "hi\n"
            "#;
        }

        fn test_precedence_mul_plus() {
            let expr = "1 + 2 * 3";
            let tree_ok = "
                binary Add
                  int 1: int8
                  binary Mul
                    int 2: int8
                    int 3: int8
            ";
        }

        fn test_left_associative() {
            let expr = "a - b - c";
            let tree_ok = "
                binary Sub
                  binary Sub
                    name a
                    name b
                  name c
            ";
        }

        fn test_precedence_ladder() {
            let expr = "a || b && c | d ^ e & f == g < h << i";
            let tree_ok = "
                binary LogicalOr
                  name a
                  binary LogicalAnd
                    name b
                    binary BitOr
                      name c
                      binary BitXor
                        name d
                        binary BitAnd
                          name e
                          binary Eq
                            name f
                            binary Less
                              name g
                              binary ShiftLeft
                                name h
                                name i
            ";
        }

        fn test_assignment_is_right_associative() {
            let expr = "a = b = c + 1";
            let tree_ok = "
                binary Assign
                  name a
                  binary Assign
                    name b
                    binary Add
                      name c
                      int 1: int8
            ";
        }

        fn test_unary_is_right_recursive() {
            let expr = "-~!x * 2";
            let tree_ok = "
                binary Mul
                  unary Negate
                    unary BitNot
                      unary Not
                        name x
                  int 2: int8
            ";
        }

        fn test_chained_calls() {
            let expr = "f(a, 1)()";
            let tree_ok = "
                call
                  call
                    name f
                    arguments
                      name a
                      int 1: int8
            ";
        }

        fn test_grouping_is_unwrapped() {
            let expr = "(a + b) * c";
            let tree_ok = "
                binary Mul
                  binary Add
                    name a
                    name b
                  name c
            ";
        }

        fn test_list_literal() {
            let expr = "[1, x]";
            let tree_ok = "
                list
                  int 1: int8
                  name x
            ";
        }

        fn test_lambda_from_tuple() {
            let expr = "(a, b) => a + b";
            let tree_ok = "
                lambda(a, b)
                  block
                    return
                      binary Add
                        name a
                        name b
            ";
        }

        fn test_lambda_from_name() {
            let expr = "x => [x] { x }";
            let tree_ok = "
                lambda(x)
                  block [x]
                    name x
            ";
        }

        fn test_lambda_without_parameters() {
            let expr = "() => 1";
            let tree_ok = "
                lambda()
                  block
                    return
                      int 1: int8
            ";
        }

        fn test_function_declaration() {
            let program = "fn hello (arg1: int) -> int { arg1 }";
            let tree_ok = "
                function hello(arg1: int) -> int
                  block
                    name arg1
            ";
        }

        fn test_function_tuple_return_and_captures() {
            let program = "fn pair(a, b: float) -> int, float [=, a] => (a, b)";
            let tree_ok = "
                function pair(a, b: float) -> (int, float)
                  block [=, a]
                    tuple
                      name a
                      name b
            ";
        }

        fn test_function_without_parameter_list() {
            let program = "
                fn main {
                    val x = 1;;
                    x
                }
            ";
            let tree_ok = "
                function main()
                  block
                    val x
                      int 1: int8
                    name x
            ";
        }

        fn test_multi_assignment() {
            let program = "var a: int8, b = 1, 2.5";
            let tree_ok = "
                global var a: int8, b
                  int 1: int8
                  float 2.5
            ";
        }

        fn test_blocks() {
            let program = "
                fn main {
                    { 1 }
                    [a, b] { a; b }
                }
            ";
            let tree_ok = "
                function main()
                  block
                    block
                      int 1: int8
                    block [a, b]
                      name a
                      name b
            ";
        }

        fn test_error_too_few_expressions() {
            let program = "val a, b, c = 1";
            let expected_errors = &["1:1: attempt to assign 1 expression to 3 identifiers"];
        }

        fn test_error_too_many_expressions() {
            let program = "fn main { var a = 1, 2 }";
            let expected_errors = &["1:11: attempt to assign 2 expressions to 1 identifier"];
        }

        fn test_error_duplicate_capture() {
            let program = "[a, b, a] { a }";
            let expected_errors = &["1:8: symbol 'a' was captured multiple times"];
        }

        fn test_error_invalid_capture() {
            let program = "[1] { }";
            let expected_errors = &["1:2: expected capture, but got integer literal '1'"];
        }

        fn test_error_invalid_lambda_parameters() {
            let expr = "(a, 1) => a";
            let expected_errors = &["1:5: invalid lambda parameter list"];
        }

        fn test_error_unexpected_token() {
            let expr = "1 + ;";
            let expected_errors = &["1:5: expected expression, but got ';'"];
        }

        fn test_error_unmatched_paren() {
            let expr = "(1 + 2";
            let expected_errors = &["1:6: expected ')', but reached the end of input"];
        }

        fn test_error_empty_parens() {
            let expr = "()";
            let expected_errors = &["1:2: expected expression, but got ')'"];
        }

        fn test_error_member_access_is_not_parsed() {
            let program = "a . b";
            let expected_errors = &["1:3: expected expression, but got operator '.'"];
        }

        fn test_error_missing_function_name() {
            let program = "fn (a) {}";
            let expected_errors = &["1:4: expected identifier, but got '('"];
        }

        fn test_error_unclosed_block() {
            let program = "fn main { 1";
            let expected_errors = &["1:11: expected '}', but reached the end of input"];
        }
    );
}
