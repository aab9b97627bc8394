use super::{FunctionId, InstructionKind, Module, ValueId, ValueKind};
use crate::{codegen::interface::UnaryOp, types::IrType};

pub(super) fn module(module: &Module) -> Result<(), String> {
    for index in 0..module.functions.len() {
        let function = FunctionId::new(index);
        self::function(module, function).map_err(|reason| {
            format!("in function '{}': {reason}", module.function(function).name)
        })?;
    }
    Ok(())
}

/// Checks a function body. Declarations without blocks are always valid.
pub(super) fn function(module: &Module, id: FunctionId) -> Result<(), String> {
    let function = module.function(id);
    let expected_ret = &function.signature.ret;

    for block_id in &function.blocks {
        let block = module.block(*block_id);
        let Some(last) = block.instructions.last() else {
            return Err(format!("block '{}' is empty", block.name));
        };
        if !last.kind.is_terminator() {
            return Err(format!("block '{}' does not end in a terminator", block.name));
        }

        for (i, instruction) in block.instructions.iter().enumerate() {
            let kind = &instruction.kind;
            if kind.is_terminator() && i + 1 != block.instructions.len() {
                return Err(format!("block '{}' has a terminator in the middle", block.name));
            }
            for operand in kind.operands() {
                check_ownership(module, id, operand)?;
            }
            check_instruction(module, kind, expected_ret)?;
        }
    }
    Ok(())
}

fn check_ownership(module: &Module, id: FunctionId, operand: ValueId) -> Result<(), String> {
    let owner = match module.value(operand).kind {
        ValueKind::Param { function, .. } | ValueKind::Instruction { function } => function,
        _ => return Ok(()),
    };
    if owner == id {
        Ok(())
    } else {
        Err(format!(
            "operand {} belongs to function '{}'",
            module.reference(operand),
            module.function(owner).name
        ))
    }
}

fn check_instruction(module: &Module, kind: &InstructionKind, ret: &IrType) -> Result<(), String> {
    let ty = |value: &ValueId| &module.value(*value).ty;

    match kind {
        InstructionKind::Binary { op, lhs, rhs } => {
            let (l, r) = (ty(lhs), ty(rhs));
            if l != r {
                return Err(format!("operands of '{}' differ: {l} and {r}", op.mnemonic()));
            }
            let fits = if op.is_floating() {
                l.is_floating()
            } else {
                l.is_integer()
            };
            if !fits {
                return Err(format!("'{}' cannot operate on {l}", op.mnemonic()));
            }
        }
        InstructionKind::Unary { op, operand } => {
            let operand = ty(operand);
            let fits = match op {
                UnaryOp::Neg | UnaryOp::Not => operand.is_integer(),
                UnaryOp::FNeg => operand.is_floating(),
            };
            if !fits {
                return Err(format!("unary operation on {operand}"));
            }
        }
        InstructionKind::Cast { .. } | InstructionKind::Alloca(_) => {}
        InstructionKind::Load(pointer) => {
            if ty(pointer).pointee().is_none() {
                return Err(format!("load from non-pointer {}", ty(pointer)));
            }
        }
        InstructionKind::Store { pointer, value } => {
            if ty(pointer).pointee() != Some(ty(value)) {
                return Err(format!("cannot store {} into {}", ty(value), ty(pointer)));
            }
        }
        InstructionKind::Call { function, args } => {
            let callee = module.function(*function);
            let params = &callee.signature.params;
            if params.len() != args.len() {
                return Err(format!(
                    "'{}' takes {} arguments, but got {}",
                    callee.name,
                    params.len(),
                    args.len()
                ));
            }
            for (param, arg) in params.iter().zip(args) {
                if param != ty(arg) {
                    return Err(format!(
                        "argument of type {} passed to '{}' where {param} is expected",
                        ty(arg),
                        callee.name
                    ));
                }
            }
        }
        InstructionKind::Ret(value) => {
            let void = IrType::Void;
            let actual = value.as_ref().map_or(&void, ty);
            if actual != ret {
                return Err(format!("returns {actual} from a function returning {ret}"));
            }
        }
        InstructionKind::AggregateRet(values) => {
            let actual = IrType::Struct(values.iter().map(|v| ty(v).clone()).collect());
            if actual != *ret {
                return Err(format!("returns {actual} from a function returning {ret}"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        codegen::interface::{Backend, BinaryOp, Signature},
        ir::Module,
        types::IrType,
    };

    fn define(
        module: &mut Module,
        name: &str,
        params: Vec<IrType>,
        ret: IrType,
    ) -> super::FunctionId {
        let function = module.declare_function(name, Signature { params, ret });
        let entry = module.add_block(function, "entry");
        module.position_at(entry);
        function
    }

    #[test]
    fn accepts_well_formed_functions() {
        let mut module = Module::new("m");
        let f = define(&mut module, "f", vec![IrType::I32], IrType::I32);
        let x = module.param(f, 0);
        let doubled = module.build_binary(BinaryOp::Add, x, x);
        module.build_ret(doubled);
        assert_eq!(module.verify_function(f), Ok(()));
        assert_eq!(module.verify_module(), Ok(()));
    }

    #[test]
    fn rejects_missing_terminator() {
        let mut module = Module::new("m");
        let f = define(&mut module, "f", vec![], IrType::Void);
        module.build_alloca(&IrType::I32, "x");
        let error = module.verify_function(f).unwrap_err();
        assert_eq!(error, "block 'entry' does not end in a terminator");
    }

    #[test]
    fn rejects_mismatched_return() {
        let mut module = Module::new("m");
        define(&mut module, "f", vec![], IrType::I32);
        let value = module.const_real(&IrType::Double, 1.0);
        module.build_ret(value);
        assert_eq!(
            module.verify_module().unwrap_err(),
            "in function 'f': returns double from a function returning i32"
        );
    }

    #[test]
    fn rejects_mismatched_operands_and_stores() {
        let mut module = Module::new("m");
        let f = define(&mut module, "f", vec![IrType::I32, IrType::I64], IrType::Void);
        let (a, b) = (module.param(f, 0), module.param(f, 1));
        module.build_binary(BinaryOp::Add, a, b);
        module.build_ret_void();
        assert!(module.verify_function(f).unwrap_err().contains("differ"));

        let g = define(&mut module, "g", vec![IrType::I64], IrType::Void);
        let slot = module.build_alloca(&IrType::I32, "slot");
        let value = module.param(g, 0);
        module.build_store(slot, value);
        module.build_ret_void();
        assert_eq!(
            module.verify_function(g).unwrap_err(),
            "cannot store i64 into i32*"
        );
    }

    #[test]
    fn rejects_foreign_operands() {
        let mut module = Module::new("m");
        let f = define(&mut module, "f", vec![IrType::I32], IrType::I32);
        let foreign = module.param(f, 0);
        module.build_ret(foreign);
        let g = define(&mut module, "g", vec![], IrType::I32);
        module.build_ret(foreign);
        assert!(module
            .verify_function(g)
            .unwrap_err()
            .contains("belongs to function 'f'"));
    }
}
