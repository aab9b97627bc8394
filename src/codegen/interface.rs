use std::{fmt, io};

pub use crate::types::CastOp;
use crate::types::IrType;

/// Parameter and return types of an IR function.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub params: Vec<IrType>,
    pub ret: IrType,
}

impl Signature {
    pub fn function_type(&self) -> IrType {
        IrType::Function {
            params: self.params.clone(),
            ret: Box::new(self.ret.clone()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    FNeg,
    /// Bitwise complement; logical not on `i1`.
    Not,
}

/// What the code generator needs from an IR backend.
///
/// Handles are small copyable ids owned by the backend. Building an
/// instruction requires an insertion block set through [`Backend::position_at`].
pub trait Backend {
    type Value: Copy + Eq + fmt::Debug;
    type Block: Copy + Eq + fmt::Debug;
    type Function: Copy + Eq + fmt::Debug;

    fn declare_function(&mut self, name: &str, signature: Signature) -> Self::Function;
    fn function_named(&self, name: &str) -> Option<Self::Function>;
    fn function_name(&self, function: Self::Function) -> &str;
    fn signature(&self, function: Self::Function) -> &Signature;
    /// A value referring to the function itself.
    fn function_value(&self, function: Self::Function) -> Self::Value;
    fn as_function(&self, value: Self::Value) -> Option<Self::Function>;
    fn param(&self, function: Self::Function, index: usize) -> Self::Value;
    fn name_value(&mut self, value: Self::Value, name: &str);

    fn add_block(&mut self, function: Self::Function, name: &str) -> Self::Block;
    fn position_at(&mut self, block: Self::Block);
    fn insertion_block(&self) -> Option<Self::Block>;

    /// Adds an internal constant, null terminated byte array holding `text`,
    /// returning a pointer to it.
    fn add_string_constant(&mut self, text: &str) -> Self::Value;
    /// Adds a global initialized with the constant `init`, returning a
    /// pointer to it.
    fn add_global(&mut self, name: &str, init: Self::Value, constant: bool) -> Self::Value;

    fn type_of(&self, value: Self::Value) -> IrType;
    /// The sign-extended value of an integer constant.
    fn const_int_value(&self, value: Self::Value) -> Option<i64>;
    fn const_int(&mut self, ty: &IrType, bits: u64) -> Self::Value;
    fn const_real(&mut self, ty: &IrType, value: f64) -> Self::Value;

    fn build_binary(&mut self, op: BinaryOp, lhs: Self::Value, rhs: Self::Value) -> Self::Value;
    fn build_unary(&mut self, op: UnaryOp, operand: Self::Value) -> Self::Value;
    fn build_cast(&mut self, op: CastOp, value: Self::Value, target: &IrType) -> Self::Value;
    fn build_alloca(&mut self, ty: &IrType, name: &str) -> Self::Value;
    fn build_load(&mut self, pointer: Self::Value) -> Self::Value;
    fn build_store(&mut self, pointer: Self::Value, value: Self::Value);
    fn build_call(&mut self, function: Self::Function, args: &[Self::Value]) -> Self::Value;
    fn build_ret(&mut self, value: Self::Value);
    fn build_ret_void(&mut self);
    /// Returns several values at once as one aggregate of their types.
    fn build_aggregate_ret(&mut self, values: &[Self::Value]);

    fn verify_function(&self, function: Self::Function) -> Result<(), String>;
    fn verify_module(&self) -> Result<(), String>;
    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()>;
}
