use std::fmt::{self, Write};

use super::{
    sign_extend, Function, Global, GlobalInit, Instruction, InstructionKind, Module, ValueId,
    ValueKind,
};
use crate::{codegen::interface::UnaryOp, types::IrType};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                self.write_global(f, global)?;
            }
        }
        for function in &self.functions {
            writeln!(f)?;
            self.write_function(f, function)?;
        }
        Ok(())
    }
}

impl Module {
    /// How an operand is spelled, without its type.
    pub(super) fn reference(&self, value: ValueId) -> String {
        let data = self.value(value);
        let name = data.name.as_deref().unwrap_or("?");
        match (&data.kind, &data.ty) {
            (ValueKind::ConstInt(bits), IrType::Int(1)) => (*bits != 0).to_string(),
            (ValueKind::ConstInt(bits), IrType::Int(width)) => {
                sign_extend(*bits, *width).to_string()
            }
            (ValueKind::ConstInt(bits), _) => bits.to_string(),
            (ValueKind::ConstReal(real), _) => format!("{real:?}"),
            (ValueKind::Param { index, .. }, _) => match &data.name {
                Some(name) => format!("%{name}"),
                None => format!("%{index}"),
            },
            (ValueKind::Instruction { .. }, _) => format!("%{name}"),
            (ValueKind::Global(_) | ValueKind::Function(_), _) => format!("@{name}"),
        }
    }

    fn typed(&self, value: ValueId) -> String {
        format!("{} {}", self.value(value).ty, self.reference(value))
    }

    fn typed_list(&self, values: &[ValueId]) -> String {
        let items: Vec<_> = values.iter().map(|v| self.typed(*v)).collect();
        items.join(", ")
    }

    fn write_global(&self, f: &mut fmt::Formatter<'_>, global: &Global) -> fmt::Result {
        match &global.init {
            GlobalInit::Bytes(bytes) => {
                let mut escaped = String::with_capacity(bytes.len());
                for byte in bytes {
                    match byte {
                        b' '..=b'~' if *byte != b'"' && *byte != b'\\' => {
                            escaped.push(char::from(*byte));
                        }
                        _ => write!(escaped, "\\{byte:02X}")?,
                    }
                }
                writeln!(
                    f,
                    "@{} = internal constant [{} x i8] c\"{escaped}\"",
                    global.name,
                    bytes.len()
                )
            }
            GlobalInit::Value(init) => {
                let kind = if global.constant { "constant" } else { "global" };
                writeln!(f, "@{} = internal {kind} {}", global.name, self.typed(*init))
            }
        }
    }

    fn write_function(&self, f: &mut fmt::Formatter<'_>, function: &Function) -> fmt::Result {
        let signature = &function.signature;
        if function.blocks.is_empty() {
            let params: Vec<_> = signature.params.iter().map(ToString::to_string).collect();
            return writeln!(
                f,
                "declare {} @{}({})",
                signature.ret,
                function.name,
                params.join(", ")
            );
        }

        writeln!(
            f,
            "define {} @{}({}) {{",
            signature.ret,
            function.name,
            self.typed_list(&function.params)
        )?;
        for (i, block) in function.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let block = self.block(*block);
            writeln!(f, "{}:", block.name)?;
            for instruction in &block.instructions {
                writeln!(f, "  {}", self.instruction(instruction))?;
            }
        }
        writeln!(f, "}}")
    }

    fn instruction(&self, instruction: &Instruction) -> String {
        let body = match &instruction.kind {
            InstructionKind::Binary { op, lhs, rhs } => format!(
                "{} {}, {}",
                op.mnemonic(),
                self.typed(*lhs),
                self.reference(*rhs)
            ),
            InstructionKind::Unary { op, operand } => {
                let ty = &self.value(*operand).ty;
                let operand = self.reference(*operand);
                match op {
                    UnaryOp::Neg => format!("sub {ty} 0, {operand}"),
                    UnaryOp::FNeg => format!("fneg {ty} {operand}"),
                    UnaryOp::Not if *ty == IrType::BOOL => format!("xor {ty} {operand}, true"),
                    UnaryOp::Not => format!("xor {ty} {operand}, -1"),
                }
            }
            InstructionKind::Cast { op, value, to } => {
                format!("{} {} to {to}", op.mnemonic(), self.typed(*value))
            }
            InstructionKind::Alloca(ty) => format!("alloca {ty}"),
            InstructionKind::Load(pointer) => {
                let ty = self.value(*pointer).ty.pointee().cloned().unwrap_or(IrType::Void);
                format!("load {ty}, {}", self.typed(*pointer))
            }
            InstructionKind::Store { pointer, value } => {
                format!("store {}, {}", self.typed(*value), self.typed(*pointer))
            }
            InstructionKind::Call { function, args } => {
                let function = self.function(*function);
                format!(
                    "call {} @{}({})",
                    function.signature.ret,
                    function.name,
                    self.typed_list(args)
                )
            }
            InstructionKind::Ret(None) => "ret void".to_owned(),
            InstructionKind::Ret(Some(value)) => format!("ret {}", self.typed(*value)),
            InstructionKind::AggregateRet(values) => {
                let ty = IrType::Struct(values.iter().map(|v| self.value(*v).ty.clone()).collect());
                format!("ret {ty} {{ {} }}", self.typed_list(values))
            }
        };
        match instruction.result {
            Some(result) => format!("{} = {body}", self.reference(result)),
            None => body,
        }
    }
}
