use std::fmt;

use crate::token::SourceLocation;

/// A whole compilation unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Root {
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Function(FunctionDeclaration),
    Assign(AssignStatement),
    Block(CodeBlock),
    Return(Expr),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Ident,
    pub params: Vec<NamedParameter>,
    pub returns: ReturnType,
    pub body: CodeBlock,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReturnType {
    #[default]
    Void,
    Single(Ident),
    /// Two or more types, returned as one aggregate.
    Tuple(Vec<Ident>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NamedParameter {
    pub name: Ident,
    pub ty: Option<Ident>,
}

/// `val`/`var` with one or more targets.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignStatement {
    pub targets: Vec<NamedParameter>,
    pub values: Vec<Expr>,
    pub mutable: bool,
    /// Declared at the top level of the compilation unit.
    pub global: bool,
}

impl AssignStatement {
    /// One expression assigned to many identifiers.
    pub fn is_packed(&self) -> bool {
        self.values.len() == 1 && self.targets.len() > 1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub statements: Vec<Stmt>,
    pub captures: Vec<Capture>,
    pub location: SourceLocation,
}

impl CodeBlock {
    pub fn new(location: SourceLocation) -> CodeBlock {
        CodeBlock {
            statements: Vec::new(),
            captures: Vec::new(),
            location,
        }
    }

    /// Splices `other` into this block: its statements are appended and its
    /// captures are added unless already present.
    pub fn merge(&mut self, other: CodeBlock) {
        for capture in other.captures {
            if !self.captures.iter().any(|c| c.same_target(&capture)) {
                self.captures.push(capture);
            }
        }
        self.statements.extend(other.statements);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Capture {
    Name(Ident),
    /// `=`, captures everything in scope.
    All,
}

impl Capture {
    pub fn name(&self) -> Option<&str> {
        match self {
            Capture::Name(ident) => Some(&ident.name),
            Capture::All => None,
        }
    }

    fn same_target(&self, other: &Capture) -> bool {
        self.name() == other.name()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Box<str>,
    pub location: SourceLocation,
}

impl Ident {
    pub fn new(name: impl Into<Box<str>>, location: SourceLocation) -> Ident {
        Ident {
            name: name.into(),
            location,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation) -> Expr {
        Expr { kind, location }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Call {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Name(Box<str>),
    Integer {
        value: u64,
        size: IntegerSize,
    },
    Float(f64),
    String(Box<str>),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Lambda(Lambda),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub params: Vec<NamedParameter>,
    pub body: CodeBlock,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Assign,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    ShiftLeft,
    ShiftRight,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        Some(match symbol {
            "=" => Assign,
            "||" => LogicalOr,
            "&&" => LogicalAnd,
            "|" => BitOr,
            "^" => BitXor,
            "&" => BitAnd,
            "==" => Eq,
            "!=" => NotEq,
            ">" => Greater,
            ">=" => GreaterEq,
            "<" => Less,
            "<=" => LessEq,
            "<<" => ShiftLeft,
            ">>" => ShiftRight,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Assign => "=",
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            Eq => "==",
            NotEq => "!=",
            Greater => ">",
            GreaterEq => ">=",
            Less => "<",
            LessEq => "<=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-`
    Negate,
    /// `~`
    BitNot,
    /// `!`
    Not,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<UnaryOperator> {
        match symbol {
            "-" => Some(UnaryOperator::Negate),
            "~" => Some(UnaryOperator::BitNot),
            "!" => Some(UnaryOperator::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Smallest integer type able to hold a literal's magnitude. Advisory only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntegerSize {
    SByte,
    UByte,
    SShort,
    UShort,
    SWord,
    UWord,
    SLong,
    ULong,
}

impl IntegerSize {
    pub fn of(value: u64) -> IntegerSize {
        const THRESHOLDS: [(u64, IntegerSize); 7] = [
            (0x7f, IntegerSize::SByte),
            (0xff, IntegerSize::UByte),
            (0x7fff, IntegerSize::SShort),
            (0xffff, IntegerSize::UShort),
            (0x7fff_ffff, IntegerSize::SWord),
            (0xffff_ffff, IntegerSize::UWord),
            (0x7fff_ffff_ffff_ffff, IntegerSize::SLong),
        ];
        THRESHOLDS
            .into_iter()
            .find(|&(max, _)| value <= max)
            .map_or(IntegerSize::ULong, |(_, size)| size)
    }

    pub fn bits(self) -> u32 {
        match self {
            IntegerSize::SByte | IntegerSize::UByte => 8,
            IntegerSize::SShort | IntegerSize::UShort => 16,
            IntegerSize::SWord | IntegerSize::UWord => 32,
            IntegerSize::SLong | IntegerSize::ULong => 64,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            IntegerSize::UByte | IntegerSize::UShort | IntegerSize::UWord | IntegerSize::ULong
        )
    }
}

impl fmt::Display for IntegerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_unsigned() { "uint" } else { "int" };
        write!(f, "{prefix}{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_sizing_thresholds() {
        let cases = [
            (0, IntegerSize::SByte),
            (127, IntegerSize::SByte),
            (128, IntegerSize::UByte),
            (255, IntegerSize::UByte),
            (256, IntegerSize::SShort),
            (32_767, IntegerSize::SShort),
            (32_768, IntegerSize::UShort),
            (65_536, IntegerSize::SWord),
            (2_147_483_648, IntegerSize::UWord),
            (4_294_967_296, IntegerSize::SLong),
            (u64::MAX, IntegerSize::ULong),
        ];
        for (value, size) in cases {
            assert_eq!(IntegerSize::of(value), size, "sizing {value}");
        }
    }

    #[test]
    fn integer_sizing_is_monotonic() {
        let mut previous = IntegerSize::of(0);
        let mut value = 1u64;
        while let Some(next) = value.checked_mul(3) {
            let size = IntegerSize::of(value);
            assert!(size >= previous && size.bits() >= previous.bits());
            previous = size;
            value = next;
        }
    }

    #[test]
    fn merge_deduplicates_captures() {
        let at = SourceLocation::START;
        let mut block = CodeBlock::new(at);
        block.captures = vec![Capture::Name(Ident::new("a", at)), Capture::All];
        let mut other = CodeBlock::new(at);
        other.captures = vec![
            Capture::Name(Ident::new("a", at)),
            Capture::Name(Ident::new("b", at)),
            Capture::All,
        ];
        other.statements.push(Stmt {
            kind: StmtKind::Expr(Expr::new(ExprKind::Name("b".into()), at)),
            location: at,
        });
        block.merge(other);
        let names: Vec<_> = block.captures.iter().map(Capture::name).collect();
        assert_eq!(names, [Some("a"), None, Some("b")]);
        assert_eq!(block.statements.len(), 1);
    }
}
