use std::mem;

use tracing::{debug, trace};

use crate::{
    ast::{
        AssignStatement, BinaryOperator, Capture, CodeBlock, Expr, ExprKind,
        FunctionDeclaration, Ident, IntegerSize, ReturnType, Root, Stmt, StmtKind,
        UnaryOperator,
    },
    codegen::{
        interface::{Backend, BinaryOp, Signature, UnaryOp},
        Error, Options,
    },
    symbols::{SpecialValue, Symbol, SymbolTable},
    token::{SourceLocation, Spanned},
    types::{self, IrType},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

pub struct Generator<'b, B: Backend> {
    builder: &'b mut B,
    symbols: SymbolTable<B::Value, B::Function>,
    /// Results of the expressions compiled so far in the current function.
    stack: Vec<Symbol<B::Value>>,
}

impl<'b, B: Backend> Generator<'b, B> {
    pub fn new(builder: &'b mut B) -> Generator<'b, B> {
        Generator {
            builder,
            symbols: SymbolTable::new(),
            stack: Vec::new(),
        }
    }

    pub fn generate(mut self, root: &Root, options: &Options) -> Result<()> {
        self.declare_prototypes(root)?;

        for stmt in &root.statements {
            match &stmt.kind {
                StmtKind::Function(function) => {
                    let prototype = self.prototype_of(function)?;
                    self.compile_function(function, prototype)?;
                }
                StmtKind::Assign(assign) => self.compile_assignment(assign)?,
                StmtKind::Block(_) | StmtKind::Return(_) | StmtKind::Expr(_) => {
                    return Err(stmt.location.wrap(Error::ExpressionOutsideFunction));
                }
            }
        }

        if let Some(name) = &options.entry_stub {
            self.emit_entry_stub(name)?;
        }

        self.builder
            .verify_module()
            .map_err(|reason| SourceLocation::START.wrap(Error::ModuleVerificationFailed(reason)))
    }
}

/// Functions.
impl<B: Backend> Generator<'_, B> {
    /// Declares every top-level function up front, so bodies may refer to
    /// functions declared after them.
    fn declare_prototypes(&mut self, root: &Root) -> Result<()> {
        for stmt in &root.statements {
            let StmtKind::Function(function) = &stmt.kind else {
                continue;
            };
            self.declare_function(function, &function.name.name)?;
        }
        debug!(
            functions = root
                .statements
                .iter()
                .filter(|s| matches!(s.kind, StmtKind::Function(_)))
                .count(),
            "declared prototypes"
        );
        Ok(())
    }

    /// Declares `function` under `ir_name` and binds it as a prototype in the
    /// current scope.
    fn declare_function(
        &mut self,
        function: &FunctionDeclaration,
        ir_name: &str,
    ) -> Result<B::Function> {
        let name = &function.name;
        if let Some(previous) = self.symbols.find_in_current_scope(&name.name) {
            let error = Error::FunctionRedefinition {
                name: name.name.clone(),
                previous: previous.location,
            };
            return Err(name.location.wrap(error));
        }

        let signature = self.signature_of(function)?;
        let declared = self.builder.declare_function(ir_name, signature);
        let value = self.builder.function_value(declared);
        self.symbols
            .add_symbol(Symbol::named(name.name.clone(), value, name.location).prototype());
        trace!(function = ir_name, "declared function");
        Ok(declared)
    }

    fn prototype_of(&self, function: &FunctionDeclaration) -> Result<B::Function> {
        self.symbols
            .find_in_current_scope(&function.name.name)
            .filter(|symbol| symbol.flags.is_prototype)
            .and_then(|symbol| self.builder.as_function(symbol.value))
            .ok_or_else(|| {
                let error = Error::Internal(format!("no prototype for '{}'", function.name));
                function.name.location.wrap(error)
            })
    }

    fn signature_of(&self, function: &FunctionDeclaration) -> Result<Signature> {
        let params = function
            .params
            .iter()
            .map(|param| match &param.ty {
                Some(ty) => resolve_type(ty),
                None => {
                    let error = Error::MissingParameterType {
                        function: function.name.name.clone(),
                        param: param.name.name.clone(),
                    };
                    Err(param.name.location.wrap(error))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let ret = match &function.returns {
            ReturnType::Void => IrType::Void,
            ReturnType::Single(ty) => resolve_type(ty)?,
            ReturnType::Tuple(types) => {
                IrType::Struct(types.iter().map(resolve_type).collect::<Result<_>>()?)
            }
        };
        Ok(Signature { params, ret })
    }

    /// A function declared inside another one is named after its owner.
    fn compile_nested_function(&mut self, function: &FunctionDeclaration) -> Result<()> {
        let ir_name = match self.symbols.current_function() {
            Some(owner) => format!("{}.{}", self.builder.function_name(*owner), function.name),
            None => function.name.name.to_string(),
        };
        let declared = self.declare_function(function, &ir_name)?;
        self.compile_function(function, declared)
    }

    fn compile_function(
        &mut self,
        function: &FunctionDeclaration,
        declared: B::Function,
    ) -> Result<()> {
        let name = &function.name;
        debug!(function = self.builder.function_name(declared), "compiling function");

        let saved_block = self.builder.insertion_block();
        let saved_stack = mem::take(&mut self.stack);

        self.symbols.push_function_scope(declared);
        let entry = self.builder.add_block(declared, "entry");
        self.builder.position_at(entry);

        for (index, param) in function.params.iter().enumerate() {
            self.check_redefinition(&param.name)?;
            let value = self.builder.param(declared, index);
            self.builder.name_value(value, &param.name.name);
            self.symbols
                .add_symbol(Symbol::named(param.name.name.clone(), value, param.name.location));
        }

        self.record_function_captures(&function.body)?;
        self.compile_statements(&function.body.statements)?;
        self.build_return(function, declared)?;

        self.builder.verify_function(declared).map_err(|reason| {
            let error = Error::VerificationFailed {
                function: name.name.clone(),
                reason,
            };
            name.location.wrap(error)
        })?;

        self.pop_scope(name.location)?;
        self.stack = saved_stack;
        if let Some(block) = saved_block {
            self.builder.position_at(block);
        }

        let value = self.builder.function_value(declared);
        self.symbols
            .add_symbol(Symbol::named(name.name.clone(), value, name.location));
        Ok(())
    }

    /// Captures on a function body must name visible symbols.
    fn record_function_captures(&mut self, body: &CodeBlock) -> Result<()> {
        for capture in &body.captures {
            let Capture::Name(ident) = capture else {
                continue;
            };
            if self.symbols.find_symbol(&ident.name).is_none() {
                return Err(ident.location.wrap(Error::UndefinedVariable(ident.name.clone())));
            }
            self.symbols
                .current_scope()
                .capture(&ident.name)
                .map_err(|e| ident.location.wrap(Error::from(e)))?;
        }
        Ok(())
    }

    fn build_return(
        &mut self,
        function: &FunctionDeclaration,
        declared: B::Function,
    ) -> Result<()> {
        let name = &function.name;
        let ret = self.builder.signature(declared).ret.clone();

        match &function.returns {
            ReturnType::Void => {
                self.builder.build_ret_void();
                Ok(())
            }
            ReturnType::Single(_) if ret == IrType::Void => {
                self.builder.build_ret_void();
                Ok(())
            }
            ReturnType::Single(ty) => {
                let Some(symbol) = self.stack.pop() else {
                    let error = Error::MissingReturnValue {
                        function: name.name.clone(),
                        ty: ty.name.clone(),
                    };
                    return Err(name.location.wrap(error));
                };
                let value = self.value_of(&symbol)?;
                types::build_optimal_return(&mut *self.builder, value, &ret)
                    .map_err(|e| symbol.location.wrap(e.into()))
            }
            ReturnType::Tuple(_) => {
                let IrType::Struct(slots) = ret else {
                    let error =
                        Error::Internal(format!("'{name}' has a non-aggregate tuple return"));
                    return Err(name.location.wrap(error));
                };
                if self.stack.len() < slots.len() {
                    let error = Error::ReturnArity {
                        function: name.name.clone(),
                        expected: slots.len(),
                        found: self.stack.len(),
                    };
                    return Err(name.location.wrap(error));
                }

                let mut values = Vec::with_capacity(slots.len());
                for slot in slots.iter().rev() {
                    let symbol = self.pop(name.location)?;
                    let value = self.value_of(&symbol)?;
                    values.push(self.cast(value, slot, symbol.location)?);
                }
                values.reverse();
                self.builder.build_aggregate_ret(&values);
                Ok(())
            }
        }
    }

    /// `i32 ()` stub calling `main` when it takes no parameters.
    fn emit_entry_stub(&mut self, name: &str) -> Result<()> {
        let main = self
            .symbols
            .find_symbol("main")
            .and_then(|symbol| self.builder.as_function(symbol.value))
            .filter(|main| self.builder.signature(*main).params.is_empty());

        let stub = self.builder.declare_function(
            name,
            Signature {
                params: vec![],
                ret: IrType::I32,
            },
        );
        let entry = self.builder.add_block(stub, "entry");
        self.builder.position_at(entry);

        let result = match main {
            Some(main) => {
                let value = self.builder.build_call(main, &[]);
                if self.builder.type_of(value) == IrType::I32 {
                    value
                } else {
                    self.builder.const_int(&IrType::I32, 0)
                }
            }
            None => self.builder.const_int(&IrType::I32, 0),
        };
        self.builder.build_ret(result);
        debug!(stub = name, calls_main = main.is_some(), "emitted entry stub");

        self.builder.verify_function(stub).map_err(|reason| {
            let error = Error::VerificationFailed {
                function: name.into(),
                reason,
            };
            SourceLocation::START.wrap(error)
        })
    }
}

/// Statements.
impl<B: Backend> Generator<'_, B> {
    fn compile_statements(&mut self, statements: &[Stmt]) -> Result<()> {
        statements
            .iter()
            .try_for_each(|stmt| self.compile_statement(stmt))
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Function(function) => self.compile_nested_function(function),
            StmtKind::Assign(assign) => self.compile_assignment(assign),
            StmtKind::Block(block) => self.compile_block(block),
            StmtKind::Return(expr) | StmtKind::Expr(expr) => self.compile_expr(expr),
        }
    }

    /// Targets and values pair up one to one; the parser rejects other
    /// arities.
    fn compile_assignment(&mut self, assign: &AssignStatement) -> Result<()> {
        if assign.global {
            return self.compile_global_assignment(assign);
        }

        for (target, expr) in assign.targets.iter().zip(&assign.values) {
            let name = &target.name;
            self.check_redefinition(name)?;

            let mut value = self.compile_value(expr)?;
            if let Some(ty) = &target.ty {
                value = self.cast(value, &resolve_type(ty)?, expr.location)?;
            }
            let ty = self.builder.type_of(value);
            let slot = self.builder.build_alloca(&ty, &name.name);
            self.builder.build_store(slot, value);
            trace!(name = %name, ty = %ty, mutable = assign.mutable, "bound local");

            let symbol = Symbol::named(name.name.clone(), slot, name.location)
                .pointer()
                .mutable(assign.mutable);
            self.symbols.add_symbol(symbol);
        }
        Ok(())
    }

    /// Globals are initialized with a number literal, possibly negated.
    fn compile_global_assignment(&mut self, assign: &AssignStatement) -> Result<()> {
        for (target, expr) in assign.targets.iter().zip(&assign.values) {
            let name = &target.name;
            self.check_redefinition(name)?;

            let Some(mut init) = self.constant_initializer(expr) else {
                return Err(expr.location.wrap(Error::NonConstantGlobal(name.name.clone())));
            };
            if let Some(ty) = &target.ty {
                init = self.cast(init, &resolve_type(ty)?, expr.location)?;
            }
            let global = self.builder.add_global(&name.name, init, !assign.mutable);
            trace!(name = %name, "bound global");

            let symbol = Symbol::named(name.name.clone(), global, name.location)
                .pointer()
                .mutable(assign.mutable);
            self.symbols.add_symbol(symbol);
        }
        Ok(())
    }

    fn constant_initializer(&mut self, expr: &Expr) -> Option<B::Value> {
        match &expr.kind {
            ExprKind::Integer { value, size } => Some(self.integer_constant(*value, *size)),
            ExprKind::Float(value) => Some(self.builder.const_real(&IrType::Double, *value)),
            ExprKind::Unary {
                op: UnaryOperator::Negate,
                operand,
            } => match operand.kind {
                ExprKind::Integer { value, size } => {
                    Some(self.integer_constant(value.wrapping_neg(), size))
                }
                ExprKind::Float(value) => Some(self.builder.const_real(&IrType::Double, -value)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Compiles a block in its own scope. Named captures are rebound to the
    /// value they hold on entry.
    fn compile_block(&mut self, block: &CodeBlock) -> Result<()> {
        let mut rebound = Vec::with_capacity(block.captures.len());
        for capture in &block.captures {
            if let Capture::Name(ident) = capture {
                let symbol = self.lookup(&ident.name, ident.location)?;
                rebound.push((ident, self.value_of(&symbol)?));
            }
        }

        let height = self.stack.len();
        self.symbols.push_scope();
        for (ident, value) in rebound {
            self.symbols
                .current_scope()
                .capture(&ident.name)
                .map_err(|e| ident.location.wrap(Error::from(e)))?;
            self.symbols
                .add_symbol(Symbol::named(ident.name.clone(), value, ident.location));
        }

        self.compile_statements(&block.statements)?;
        self.materialize_from(height);
        self.pop_scope(block.location)
    }

    /// Loads the stack entries above `height` that still point into slots, so
    /// they keep the value they had when the block ended.
    fn materialize_from(&mut self, height: usize) {
        for index in height..self.stack.len() {
            let symbol = &self.stack[index];
            if symbol.flags.is_pointer && symbol.flags.special == SpecialValue::None {
                let location = symbol.location;
                let value = self.builder.build_load(symbol.value);
                self.stack[index] = Symbol::anonymous(value, location);
            }
        }
    }

    fn check_redefinition(&self, name: &Ident) -> Result<()> {
        match self.symbols.find_in_current_scope(&name.name) {
            Some(previous) => {
                let error = Error::Redefinition {
                    name: name.name.clone(),
                    previous: previous.location,
                };
                Err(name.location.wrap(error))
            }
            None => Ok(()),
        }
    }

    fn pop_scope(&mut self, location: SourceLocation) -> Result<()> {
        self.symbols
            .pop_scope()
            .map(drop)
            .map_err(|e| location.wrap(e.into()))
    }
}

/// Expressions.
impl<B: Backend> Generator<'_, B> {
    /// Compiles `expr`, pushing its results on the operand stack.
    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        let location = expr.location;
        match &expr.kind {
            ExprKind::Binary {
                op: BinaryOperator::Assign,
                lhs,
                rhs,
            } => self.compile_store(lhs, rhs, location),
            ExprKind::Binary { op, lhs, rhs } => self.compile_binary(*op, lhs, rhs, location),
            ExprKind::Unary { op, operand } => self.compile_unary(*op, operand, location),
            ExprKind::Call { target, args } => self.compile_call(target, args, location),
            ExprKind::Name(name) => {
                let symbol = self.lookup(name, location)?;
                self.stack.push(symbol);
                Ok(())
            }
            ExprKind::Integer { value, size } => {
                let value = self.integer_constant(*value, *size);
                self.push_anonymous(value, location);
                Ok(())
            }
            ExprKind::Float(value) => {
                let value = self.builder.const_real(&IrType::Double, *value);
                self.push_anonymous(value, location);
                Ok(())
            }
            ExprKind::String(text) => {
                let global = self.builder.add_string_constant(text);
                let symbol = Symbol::anonymous(global, location)
                    .pointer()
                    .special(SpecialValue::String);
                self.stack.push(symbol);
                Ok(())
            }
            ExprKind::Tuple(items) => items.iter().try_for_each(|item| self.compile_expr(item)),
            ExprKind::List(_) => Err(location.wrap(Error::Unsupported("list expressions"))),
            ExprKind::Lambda(_) => Err(location.wrap(Error::Unsupported("lambda expressions"))),
        }
    }

    /// `target = value`. The stored value is the result.
    fn compile_store(
        &mut self,
        target: &Expr,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<()> {
        let height = self.stack.len();
        self.compile_expr(target)?;
        if self.stack.len() != height + 1 {
            return Err(target.location.wrap(Error::NotAnLvalue));
        }
        let value = self.compile_value(value)?;
        let target = self.pop(location)?;

        let Some(name) = target.name.clone() else {
            return Err(location.wrap(Error::NotAnLvalue));
        };
        if !target.flags.is_mutable {
            return Err(location.wrap(Error::ImmutableTarget(name)));
        }
        let element = match self.builder.type_of(target.value) {
            IrType::Pointer(element) if target.flags.is_pointer => *element,
            _ => return Err(location.wrap(Error::NotAnLvalue)),
        };

        let value = self.cast(value, &element, location)?;
        self.builder.build_store(target.value, value);
        self.push_anonymous(value, location);
        Ok(())
    }

    fn compile_binary(
        &mut self,
        op: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        location: SourceLocation,
    ) -> Result<()> {
        self.compile_operand(lhs)?;
        self.compile_operand(rhs)?;
        let rhs = self.pop(location)?;
        let lhs = self.pop(location)?;
        let lhs = self.value_of(&lhs)?;
        let rhs = self.value_of(&rhs)?;

        let (lhs, rhs) = self.unify(lhs, rhs, location)?;
        let (lhs_ty, rhs_ty) = (self.builder.type_of(lhs), self.builder.type_of(rhs));
        let integer = lhs_ty.is_integer() && lhs_ty == rhs_ty;
        let floating = lhs_ty.is_floating() && lhs_ty == rhs_ty;

        let ir_op = match op {
            BinaryOperator::Add if integer => BinaryOp::Add,
            BinaryOperator::Sub if integer => BinaryOp::Sub,
            BinaryOperator::Mul if integer => BinaryOp::Mul,
            BinaryOperator::Div if integer => BinaryOp::UDiv,
            BinaryOperator::Add if floating => BinaryOp::FAdd,
            BinaryOperator::Sub if floating => BinaryOp::FSub,
            BinaryOperator::Mul if floating => BinaryOp::FMul,
            BinaryOperator::Div if floating => BinaryOp::FDiv,
            _ => {
                let error = Error::UnsupportedBinary {
                    op,
                    lhs: lhs_ty,
                    rhs: rhs_ty,
                };
                return Err(location.wrap(error));
            }
        };
        let value = self.builder.build_binary(ir_op, lhs, rhs);
        self.push_anonymous(value, location);
        Ok(())
    }

    /// Widens integers to the wider width and converts integer and float
    /// mixes to the floating type.
    fn unify(
        &mut self,
        lhs: B::Value,
        rhs: B::Value,
        location: SourceLocation,
    ) -> Result<(B::Value, B::Value)> {
        let (lhs_ty, rhs_ty) = (self.builder.type_of(lhs), self.builder.type_of(rhs));
        let widen_lhs = match (&lhs_ty, &rhs_ty) {
            (IrType::Int(l), IrType::Int(r)) if l != r => l < r,
            (IrType::Int(_), IrType::Float | IrType::Double) => true,
            (IrType::Float | IrType::Double, IrType::Int(_)) => false,
            (IrType::Float, IrType::Double) => true,
            (IrType::Double, IrType::Float) => false,
            _ => return Ok((lhs, rhs)),
        };
        if widen_lhs {
            Ok((self.cast(lhs, &rhs_ty, location)?, rhs))
        } else {
            Ok((lhs, self.cast(rhs, &lhs_ty, location)?))
        }
    }

    fn compile_unary(
        &mut self,
        op: UnaryOperator,
        operand: &Expr,
        location: SourceLocation,
    ) -> Result<()> {
        self.compile_operand(operand)?;
        let symbol = self.pop(location)?;
        let value = self.value_of(&symbol)?;
        let ty = self.builder.type_of(value);

        let ir_op = match (op, &ty) {
            (UnaryOperator::Not, IrType::Int(1)) => UnaryOp::Not,
            (UnaryOperator::Negate, IrType::Float | IrType::Double) => UnaryOp::FNeg,
            (UnaryOperator::Negate, IrType::Int(bits)) if *bits > 1 => UnaryOp::Neg,
            (UnaryOperator::BitNot, IrType::Int(bits)) if *bits > 1 => UnaryOp::Not,
            _ => {
                let error = Error::UnsupportedUnary { op, operand: ty };
                return Err(location.wrap(error));
            }
        };
        let value = self.builder.build_unary(ir_op, value);
        self.push_anonymous(value, location);
        Ok(())
    }

    fn compile_call(
        &mut self,
        target: &Expr,
        args: &[Expr],
        location: SourceLocation,
    ) -> Result<()> {
        let ExprKind::Name(name) = &target.kind else {
            return Err(target.location.wrap(Error::IndirectCall));
        };
        let Some(symbol) = self.symbols.find_symbol(name) else {
            return Err(target.location.wrap(Error::UndefinedFunction(name.clone())));
        };
        let Some(function) = self.builder.as_function(symbol.value) else {
            return Err(target.location.wrap(Error::NotCallable(name.clone())));
        };

        let params = self.builder.signature(function).params.clone();
        if params.len() != args.len() {
            let error = Error::CallArity {
                function: name.clone(),
                expected: params.len(),
                found: args.len(),
            };
            return Err(location.wrap(error));
        }

        for arg in args {
            self.compile_operand(arg)?;
        }
        let mut operands = Vec::with_capacity(args.len());
        for _ in args {
            operands.push(self.pop(location)?);
        }
        operands.reverse();

        let mut values = Vec::with_capacity(args.len());
        for (operand, param) in operands.iter().zip(&params) {
            let value = self.value_of(operand)?;
            values.push(self.cast(value, param, operand.location)?);
        }
        let result = self.builder.build_call(function, &values);
        self.push_anonymous(result, location);
        Ok(())
    }
}

/// Utilities.
impl<B: Backend> Generator<'_, B> {
    /// Compiles an expression that must produce exactly one stack entry.
    fn compile_operand(&mut self, expr: &Expr) -> Result<()> {
        let height = self.stack.len();
        self.compile_expr(expr)?;
        if self.stack.len() == height + 1 {
            Ok(())
        } else {
            Err(expr.location.wrap(Error::MultipleValues))
        }
    }

    /// Compiles an expression down to a single readable value.
    fn compile_value(&mut self, expr: &Expr) -> Result<B::Value> {
        self.compile_operand(expr)?;
        let symbol = self.pop(expr.location)?;
        self.value_of(&symbol)
    }

    /// Reads a symbol: slots are loaded and string constants decay to `i8*`.
    fn value_of(&mut self, symbol: &Symbol<B::Value>) -> Result<B::Value> {
        if symbol.flags.special == SpecialValue::String {
            return self.cast(symbol.value, &IrType::string(), symbol.location);
        }
        if symbol.flags.is_pointer {
            Ok(self.builder.build_load(symbol.value))
        } else {
            Ok(symbol.value)
        }
    }

    /// Resolves a name read as a value. Locals of an enclosing function are
    /// out of reach, functions are not.
    fn lookup(&self, name: &str, location: SourceLocation) -> Result<Symbol<B::Value>> {
        let Some((symbol, owner)) = self.symbols.find_symbol_with_owner(name) else {
            return Err(location.wrap(Error::UndefinedVariable(name.into())));
        };
        if let Some(owner) = owner {
            let foreign = self.symbols.current_function() != Some(owner);
            if foreign && self.builder.as_function(symbol.value).is_none() {
                return Err(location.wrap(Error::OuterLocal(name.into())));
            }
        }
        Ok(symbol.clone())
    }

    fn cast(&mut self, value: B::Value, ty: &IrType, location: SourceLocation) -> Result<B::Value> {
        types::build_cast(&mut *self.builder, value, ty).map_err(|e| location.wrap(e.into()))
    }

    /// Integer literals are at least 32 bits wide.
    fn integer_constant(&mut self, value: u64, size: IntegerSize) -> B::Value {
        let ty = if size.bits() <= 32 {
            IrType::I32
        } else {
            IrType::I64
        };
        self.builder.const_int(&ty, value)
    }

    fn push_anonymous(&mut self, value: B::Value, location: SourceLocation) {
        self.stack.push(Symbol::anonymous(value, location));
    }

    fn pop(&mut self, location: SourceLocation) -> Result<Symbol<B::Value>> {
        self.stack
            .pop()
            .ok_or_else(|| location.wrap(Error::Internal("operand stack underflow".into())))
    }
}

fn resolve_type(ty: &Ident) -> Result<IrType> {
    types::resolve(&ty.name).map_err(|e| ty.location.wrap(e.into()))
}
