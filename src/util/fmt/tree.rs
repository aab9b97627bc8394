use crate::ast::*;
use std::io::Write;

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

pub fn print_program_string(root: &Root) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, root).expect("writing to a Vec never fails");
    String::from_utf8(buf).expect("tree output is valid UTF-8")
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, 0, expr).expect("writing to a Vec never fails");
    String::from_utf8(buf).expect("tree output is valid UTF-8")
}

pub fn print_program(w: &mut impl Write, root: &Root) -> std::io::Result<()> {
    for stmt in &root.statements {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    match &stmt.kind {
        StmtKind::Function(function) => print_function(w, i, function),
        StmtKind::Assign(assign) => {
            sp(w, i)?;
            if assign.global {
                write!(w, "global ")?;
            }
            write!(w, "{} ", if assign.mutable { "var" } else { "val" })?;
            print_params(w, &assign.targets)?;
            writeln!(w)?;
            for value in &assign.values {
                print_expr(w, i + 1, value)?;
            }
            Ok(())
        }
        StmtKind::Block(block) => print_block(w, i, block),
        StmtKind::Return(expr) => {
            sp(w, i)?;
            writeln!(w, "return")?;
            print_expr(w, i + 1, expr)
        }
        StmtKind::Expr(expr) => print_expr(w, i, expr),
    }
}

fn print_function(
    w: &mut impl Write,
    i: usize,
    function: &FunctionDeclaration,
) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "function {}(", function.name)?;
    print_params(w, &function.params)?;
    write!(w, ")")?;
    match &function.returns {
        ReturnType::Void => {}
        ReturnType::Single(ty) => write!(w, " -> {ty}")?,
        ReturnType::Tuple(types) => {
            write!(w, " -> (")?;
            for (idx, ty) in types.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{ty}")?;
            }
            write!(w, ")")?;
        }
    }
    writeln!(w)?;
    print_block(w, i + 1, &function.body)
}

fn print_params(w: &mut impl Write, params: &[NamedParameter]) -> std::io::Result<()> {
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", param.name)?;
        if let Some(ty) = &param.ty {
            write!(w, ": {ty}")?;
        }
    }
    Ok(())
}

fn print_block(w: &mut impl Write, i: usize, block: &CodeBlock) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "block")?;
    if !block.captures.is_empty() {
        write!(w, " [")?;
        for (idx, capture) in block.captures.iter().enumerate() {
            if idx > 0 {
                write!(w, ", ")?;
            }
            match capture {
                Capture::Name(name) => write!(w, "{name}")?,
                Capture::All => write!(w, "=")?,
            }
        }
        write!(w, "]")?;
    }
    writeln!(w)?;
    for stmt in &block.statements {
        print_stmt(w, i + 1, stmt)?;
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?}")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Unary { op, operand } => {
            writeln!(w, "unary {op:?}")?;
            print_expr(w, i + 1, operand)?;
        }
        ExprKind::Call { target, args } => {
            writeln!(w, "call")?;
            print_expr(w, i + 1, target)?;
            if !args.is_empty() {
                sp(w, i + 1)?;
                writeln!(w, "arguments")?;
                for arg in args {
                    print_expr(w, i + 2, arg)?;
                }
            }
        }
        ExprKind::Name(name) => writeln!(w, "name {name}")?,
        ExprKind::Integer { value, size } => writeln!(w, "int {value}: {size}")?,
        ExprKind::Float(value) => writeln!(w, "float {value:?}")?,
        ExprKind::String(value) => writeln!(w, "string {value:?}")?,
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            let name = if matches!(expr.kind, ExprKind::Tuple(_)) {
                "tuple"
            } else {
                "list"
            };
            writeln!(w, "{name}")?;
            for item in items {
                print_expr(w, i + 1, item)?;
            }
        }
        ExprKind::Lambda(Lambda { params, body }) => {
            write!(w, "lambda(")?;
            print_params(w, params)?;
            writeln!(w, ")")?;
            print_block(w, i + 1, body)?;
        }
    }
    Ok(())
}
