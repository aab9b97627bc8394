//! In-memory IR module.
//!
//! A small register-machine IR with typed values, functions made of named
//! blocks, and globals. It implements [`Backend`] so the code generator can
//! target it directly, prints itself as LLVM-flavoured text and verifies its
//! own well-formedness.

use std::{collections::HashMap, io};

use crate::{
    codegen::interface::{Backend, BinaryOp, Signature, UnaryOp},
    types::{CastOp, IrType},
};

mod printer;
mod verify;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

macro_rules! impl_index {
    ($($id:ident),*) => {$(
        impl $id {
            fn new(index: usize) -> $id {
                $id(u32::try_from(index).expect("IR arena overflow"))
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}
impl_index!(ValueId, BlockId, FunctionId);

#[derive(Clone, Debug)]
struct ValueData {
    ty: IrType,
    kind: ValueKind,
    name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum ValueKind {
    ConstInt(u64),
    ConstReal(f64),
    Param { function: FunctionId, index: usize },
    Instruction { function: FunctionId },
    Global(usize),
    Function(FunctionId),
}

#[derive(Clone, Debug)]
struct Global {
    name: String,
    init: GlobalInit,
    constant: bool,
}

#[derive(Clone, Debug)]
enum GlobalInit {
    Bytes(Vec<u8>),
    Value(ValueId),
}

#[derive(Clone, Debug)]
struct Function {
    name: String,
    signature: Signature,
    params: Vec<ValueId>,
    blocks: Vec<BlockId>,
    value: ValueId,
    /// Local names in use, with the last numeric suffix handed out.
    names: HashMap<String, u32>,
}

impl Function {
    fn unique_name(&mut self, base: &str) -> String {
        unique(&mut self.names, base, "")
    }
}

#[derive(Clone, Debug)]
struct Block {
    name: String,
    function: FunctionId,
    instructions: Vec<Instruction>,
}

#[derive(Clone, Debug)]
struct Instruction {
    result: Option<ValueId>,
    kind: InstructionKind,
}

#[derive(Clone, Debug)]
enum InstructionKind {
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Unary {
        op: UnaryOp,
        operand: ValueId,
    },
    Cast {
        op: CastOp,
        value: ValueId,
        to: IrType,
    },
    Alloca(IrType),
    Load(ValueId),
    Store {
        pointer: ValueId,
        value: ValueId,
    },
    Call {
        function: FunctionId,
        args: Vec<ValueId>,
    },
    Ret(Option<ValueId>),
    AggregateRet(Vec<ValueId>),
}

impl InstructionKind {
    fn is_terminator(&self) -> bool {
        matches!(self, InstructionKind::Ret(_) | InstructionKind::AggregateRet(_))
    }

    fn operands(&self) -> Vec<ValueId> {
        match self {
            InstructionKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstructionKind::Unary { operand, .. } => vec![*operand],
            InstructionKind::Cast { value, .. } | InstructionKind::Load(value) => vec![*value],
            InstructionKind::Alloca(_) | InstructionKind::Ret(None) => vec![],
            InstructionKind::Store { pointer, value } => vec![*pointer, *value],
            InstructionKind::Call { args, .. } | InstructionKind::AggregateRet(args) => {
                args.clone()
            }
            InstructionKind::Ret(Some(value)) => vec![*value],
        }
    }

    fn default_name(&self) -> &'static str {
        match self {
            InstructionKind::Binary { op, .. } => op.mnemonic(),
            InstructionKind::Unary { op, .. } => match op {
                UnaryOp::Neg => "neg",
                UnaryOp::FNeg => "fneg",
                UnaryOp::Not => "not",
            },
            InstructionKind::Cast { op, .. } => op.mnemonic(),
            InstructionKind::Alloca(_) => "slot",
            InstructionKind::Load(_) => "load",
            InstructionKind::Call { .. } => "call",
            InstructionKind::Store { .. }
            | InstructionKind::Ret(_)
            | InstructionKind::AggregateRet(_) => "",
        }
    }
}

/// Hands out `base`, then `base{sep}1`, `base{sep}2` and so on.
fn unique(names: &mut HashMap<String, u32>, base: &str, sep: &str) -> String {
    let Some(&last) = names.get(base) else {
        names.insert(base.to_owned(), 0);
        return base.to_owned();
    };
    let mut counter = last;
    let name = loop {
        counter += 1;
        let candidate = format!("{base}{sep}{counter}");
        if !names.contains_key(&candidate) {
            break candidate;
        }
    };
    names.insert(base.to_owned(), counter);
    names.insert(name.clone(), 0);
    name
}

fn mask(bits: u64, width: u32) -> u64 {
    if width >= 64 {
        bits
    } else {
        bits & ((1u64 << width) - 1)
    }
}

#[allow(clippy::cast_possible_wrap)]
fn sign_extend(bits: u64, width: u32) -> i64 {
    if width >= 64 {
        bits as i64
    } else {
        let shift = 64 - width;
        ((bits << shift) as i64) >> shift
    }
}

#[derive(Debug)]
pub struct Module {
    name: String,
    values: Vec<ValueData>,
    globals: Vec<Global>,
    functions: Vec<Function>,
    blocks: Vec<Block>,
    /// Names in the global (`@`) namespace.
    symbols: HashMap<String, u32>,
    insertion: Option<BlockId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Module {
        Module {
            name: name.into(),
            values: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            blocks: Vec::new(),
            symbols: HashMap::new(),
            insertion: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, value: ValueId) -> &ValueData {
        &self.values[value.index()]
    }

    fn function(&self, function: FunctionId) -> &Function {
        &self.functions[function.index()]
    }

    fn block(&self, block: BlockId) -> &Block {
        &self.blocks[block.index()]
    }

    fn push_value(&mut self, ty: IrType, kind: ValueKind, name: Option<String>) -> ValueId {
        let id = ValueId::new(self.values.len());
        self.values.push(ValueData { ty, kind, name });
        id
    }

    fn int_constant(&self, value: ValueId) -> Option<(u64, u32)> {
        let data = self.value(value);
        match (&data.kind, &data.ty) {
            (ValueKind::ConstInt(bits), IrType::Int(width)) => Some((*bits, *width)),
            _ => None,
        }
    }

    fn real_constant(&self, value: ValueId) -> Option<f64> {
        match self.value(value).kind {
            ValueKind::ConstReal(real) => Some(real),
            _ => None,
        }
    }

    /// Appends an instruction at the insertion point. Void instructions
    /// record no result.
    fn emit(&mut self, kind: InstructionKind, ty: IrType, name: Option<&str>) -> ValueId {
        let block = self
            .insertion
            .expect("instruction emitted without an insertion block");
        let function = self.block(block).function;

        let has_result = ty != IrType::Void;
        let name = has_result.then(|| {
            let base = name.unwrap_or(kind.default_name());
            self.functions[function.index()].unique_name(base)
        });
        let result = self.push_value(ty, ValueKind::Instruction { function }, name);
        self.blocks[block.index()].instructions.push(Instruction {
            result: has_result.then_some(result),
            kind,
        });
        result
    }

    fn emit_void(&mut self, kind: InstructionKind) {
        self.emit(kind, IrType::Void, None);
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn fold_cast(&mut self, op: CastOp, value: ValueId, target: &IrType) -> Option<ValueId> {
        if let Some((bits, width)) = self.int_constant(value) {
            return match (op, target) {
                (CastOp::SExt, IrType::Int(_)) => {
                    Some(self.const_int(target, sign_extend(bits, width) as u64))
                }
                (CastOp::ZExt | CastOp::Trunc, IrType::Int(_)) => {
                    Some(self.const_int(target, bits))
                }
                (CastOp::SiToFp, _) => {
                    Some(self.const_real(target, sign_extend(bits, width) as f64))
                }
                _ => None,
            };
        }
        let real = self.real_constant(value)?;
        match op {
            CastOp::FpToSi => Some(self.const_int(target, real as i64 as u64)),
            CastOp::FpExt | CastOp::FpTrunc => Some(self.const_real(target, real)),
            _ => None,
        }
    }

    fn fold_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> Option<ValueId> {
        if let (Some((l, width)), Some((r, _))) = (self.int_constant(lhs), self.int_constant(rhs)) {
            let bits = match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::UDiv if r != 0 => l / r,
                _ => return None,
            };
            return Some(self.const_int(&IrType::Int(width), bits));
        }
        let (l, r) = (self.real_constant(lhs)?, self.real_constant(rhs)?);
        let real = match op {
            BinaryOp::FAdd => l + r,
            BinaryOp::FSub => l - r,
            BinaryOp::FMul => l * r,
            BinaryOp::FDiv => l / r,
            _ => return None,
        };
        let ty = self.type_of(lhs);
        Some(self.const_real(&ty, real))
    }

    fn fold_unary(&mut self, op: UnaryOp, operand: ValueId) -> Option<ValueId> {
        if let Some((bits, width)) = self.int_constant(operand) {
            let ty = IrType::Int(width);
            return match op {
                UnaryOp::Neg => Some(self.const_int(&ty, bits.wrapping_neg())),
                UnaryOp::Not => Some(self.const_int(&ty, !bits)),
                UnaryOp::FNeg => None,
            };
        }
        let real = self.real_constant(operand)?;
        let ty = self.type_of(operand);
        (op == UnaryOp::FNeg).then(|| self.const_real(&ty, -real))
    }
}

impl Backend for Module {
    type Value = ValueId;
    type Block = BlockId;
    type Function = FunctionId;

    fn declare_function(&mut self, name: &str, signature: Signature) -> FunctionId {
        let id = FunctionId::new(self.functions.len());
        let name = unique(&mut self.symbols, name, ".");
        let value = self.push_value(
            IrType::pointer_to(signature.function_type()),
            ValueKind::Function(id),
            Some(name.clone()),
        );
        let params = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.push_value(ty.clone(), ValueKind::Param { function: id, index }, None)
            })
            .collect();
        self.functions.push(Function {
            name,
            signature,
            params,
            blocks: Vec::new(),
            value,
            names: HashMap::new(),
        });
        id
    }

    fn function_named(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FunctionId::new)
    }

    fn function_name(&self, function: FunctionId) -> &str {
        &self.function(function).name
    }

    fn signature(&self, function: FunctionId) -> &Signature {
        &self.function(function).signature
    }

    fn function_value(&self, function: FunctionId) -> ValueId {
        self.function(function).value
    }

    fn as_function(&self, value: ValueId) -> Option<FunctionId> {
        match self.value(value).kind {
            ValueKind::Function(function) => Some(function),
            _ => None,
        }
    }

    fn param(&self, function: FunctionId, index: usize) -> ValueId {
        self.function(function).params[index]
    }

    fn name_value(&mut self, value: ValueId, name: &str) {
        let function = match self.value(value).kind {
            ValueKind::Param { function, .. } | ValueKind::Instruction { function } => function,
            _ => return,
        };
        let name = self.functions[function.index()].unique_name(name);
        self.values[value.index()].name = Some(name);
    }

    fn add_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        let name = self.functions[function.index()].unique_name(name);
        self.blocks.push(Block {
            name,
            function,
            instructions: Vec::new(),
        });
        self.functions[function.index()].blocks.push(id);
        id
    }

    fn position_at(&mut self, block: BlockId) {
        self.insertion = Some(block);
    }

    fn insertion_block(&self) -> Option<BlockId> {
        self.insertion
    }

    fn add_string_constant(&mut self, text: &str) -> ValueId {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let len = bytes.len() as u64;
        let ty = IrType::Array(Box::new(IrType::I8), len);
        let name = unique(&mut self.symbols, "string", ".");
        let index = self.globals.len();
        self.globals.push(Global {
            name: name.clone(),
            init: GlobalInit::Bytes(bytes),
            constant: true,
        });
        self.push_value(IrType::pointer_to(ty), ValueKind::Global(index), Some(name))
    }

    fn add_global(&mut self, name: &str, init: ValueId, constant: bool) -> ValueId {
        let ty = self.type_of(init);
        let name = unique(&mut self.symbols, name, ".");
        let index = self.globals.len();
        self.globals.push(Global {
            name: name.clone(),
            init: GlobalInit::Value(init),
            constant,
        });
        self.push_value(IrType::pointer_to(ty), ValueKind::Global(index), Some(name))
    }

    fn type_of(&self, value: ValueId) -> IrType {
        self.value(value).ty.clone()
    }

    fn const_int_value(&self, value: ValueId) -> Option<i64> {
        self.int_constant(value)
            .map(|(bits, width)| sign_extend(bits, width))
    }

    fn const_int(&mut self, ty: &IrType, bits: u64) -> ValueId {
        let width = ty.int_bits().unwrap_or(64);
        self.push_value(ty.clone(), ValueKind::ConstInt(mask(bits, width)), None)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn const_real(&mut self, ty: &IrType, value: f64) -> ValueId {
        let value = if *ty == IrType::Float {
            f64::from(value as f32)
        } else {
            value
        };
        self.push_value(ty.clone(), ValueKind::ConstReal(value), None)
    }

    fn build_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        if let Some(folded) = self.fold_binary(op, lhs, rhs) {
            return folded;
        }
        let ty = self.type_of(lhs);
        self.emit(InstructionKind::Binary { op, lhs, rhs }, ty, None)
    }

    fn build_unary(&mut self, op: UnaryOp, operand: ValueId) -> ValueId {
        if let Some(folded) = self.fold_unary(op, operand) {
            return folded;
        }
        let ty = self.type_of(operand);
        self.emit(InstructionKind::Unary { op, operand }, ty, None)
    }

    fn build_cast(&mut self, op: CastOp, value: ValueId, target: &IrType) -> ValueId {
        if let Some(folded) = self.fold_cast(op, value, target) {
            return folded;
        }
        let kind = InstructionKind::Cast {
            op,
            value,
            to: target.clone(),
        };
        self.emit(kind, target.clone(), None)
    }

    fn build_alloca(&mut self, ty: &IrType, name: &str) -> ValueId {
        let kind = InstructionKind::Alloca(ty.clone());
        self.emit(kind, IrType::pointer_to(ty.clone()), Some(name))
    }

    fn build_load(&mut self, pointer: ValueId) -> ValueId {
        let ty = self.type_of(pointer).pointee().cloned().unwrap_or(IrType::Void);
        self.emit(InstructionKind::Load(pointer), ty, None)
    }

    fn build_store(&mut self, pointer: ValueId, value: ValueId) {
        self.emit_void(InstructionKind::Store { pointer, value });
    }

    fn build_call(&mut self, function: FunctionId, args: &[ValueId]) -> ValueId {
        let ty = self.signature(function).ret.clone();
        let kind = InstructionKind::Call {
            function,
            args: args.to_vec(),
        };
        self.emit(kind, ty, None)
    }

    fn build_ret(&mut self, value: ValueId) {
        self.emit_void(InstructionKind::Ret(Some(value)));
    }

    fn build_ret_void(&mut self) {
        self.emit_void(InstructionKind::Ret(None));
    }

    fn build_aggregate_ret(&mut self, values: &[ValueId]) {
        self.emit_void(InstructionKind::AggregateRet(values.to_vec()));
    }

    fn verify_function(&self, function: FunctionId) -> Result<(), String> {
        verify::function(self, function)
    }

    fn verify_module(&self) -> Result<(), String> {
        verify::module(self)
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write!(w, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn function_with_entry(module: &mut Module, params: Vec<IrType>, ret: IrType) -> FunctionId {
        let function = module.declare_function("f", Signature { params, ret });
        let entry = module.add_block(function, "entry");
        module.position_at(entry);
        function
    }

    #[test]
    fn names_are_unique_per_function() {
        let mut module = Module::new("m");
        function_with_entry(&mut module, vec![], IrType::Void);
        let a = module.build_alloca(&IrType::I32, "x");
        let b = module.build_alloca(&IrType::I32, "x");
        let c = module.build_alloca(&IrType::I32, "x");
        let names: Vec<_> = [a, b, c]
            .iter()
            .map(|v| module.value(*v).name.clone().unwrap())
            .collect();
        assert_eq!(names, ["x", "x1", "x2"]);
    }

    #[test]
    fn global_names_are_unique() {
        let mut module = Module::new("m");
        let a = module.add_string_constant("a");
        let b = module.add_string_constant("b");
        assert_eq!(module.value(a).name.as_deref(), Some("string"));
        assert_eq!(module.value(b).name.as_deref(), Some("string.1"));
        assert_eq!(module.type_of(b).to_string(), "[2 x i8]*");
    }

    #[test]
    fn constants_fold_through_casts() {
        let mut module = Module::new("m");
        let small = module.const_int(&IrType::I8, 0xfe);
        assert_eq!(module.const_int_value(small), Some(-2));
        let wide = module.build_cast(CastOp::SExt, small, &IrType::I32);
        assert_eq!(module.const_int_value(wide), Some(-2));
        let back = module.build_cast(CastOp::Trunc, wide, &IrType::I8);
        assert_eq!(module.const_int_value(back), Some(-2));
        let real = module.build_cast(CastOp::SiToFp, wide, &IrType::Double);
        assert_eq!(module.real_constant(real), Some(-2.0));
        assert!(module.blocks.is_empty());
    }

    #[test]
    fn constants_fold_through_arithmetic() {
        let mut module = Module::new("m");
        let a = module.const_int(&IrType::I32, 40);
        let b = module.const_int(&IrType::I32, 2);
        let sum = module.build_binary(BinaryOp::Add, a, b);
        assert_eq!(module.const_int_value(sum), Some(42));
        let negated = module.build_unary(UnaryOp::Neg, sum);
        assert_eq!(module.const_int_value(negated), Some(-42));
    }

    #[test]
    fn void_instructions_have_no_result() {
        let mut module = Module::new("m");
        let function = function_with_entry(&mut module, vec![], IrType::Void);
        module.build_ret_void();
        let block = module.function(function).blocks[0];
        assert!(module.block(block).instructions[0].result.is_none());
    }

    #[test]
    #[should_panic(expected = "insertion block")]
    fn emitting_without_a_block_panics() {
        let mut module = Module::new("m");
        module.build_ret_void();
    }
}
