use std::fmt;

use crate::codegen::interface::Backend;

/// Types of IR values, spelled the way LLVM spells them.
#[derive(Clone, Debug, PartialEq)]
pub enum IrType {
    Void,
    Int(u32),
    Float,
    Double,
    Pointer(Box<IrType>),
    Array(Box<IrType>, u64),
    Struct(Vec<IrType>),
    Function { params: Vec<IrType>, ret: Box<IrType> },
}

impl IrType {
    pub const BOOL: IrType = IrType::Int(1);
    pub const I8: IrType = IrType::Int(8);
    pub const I32: IrType = IrType::Int(32);
    pub const I64: IrType = IrType::Int(64);

    pub fn pointer_to(inner: IrType) -> IrType {
        IrType::Pointer(Box::new(inner))
    }

    /// The decayed string type, `i8*`.
    pub fn string() -> IrType {
        IrType::pointer_to(IrType::I8)
    }

    pub fn int_bits(&self) -> Option<u32> {
        match self {
            IrType::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::Int(_))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, IrType::Float | IrType::Double)
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Int(bits) => write!(f, "i{bits}"),
            IrType::Float => f.write_str("float"),
            IrType::Double => f.write_str("double"),
            IrType::Pointer(inner) => write!(f, "{inner}*"),
            IrType::Array(element, len) => write!(f, "[{len} x {element}]"),
            IrType::Struct(fields) => {
                f.write_str("{ ")?;
                write_list(f, fields)?;
                f.write_str(" }")
            }
            IrType::Function { params, ret } => {
                write!(f, "{ret} (")?;
                write_list(f, params)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[IrType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

/// The language's built-in type names.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
}

static PRIMITIVES: phf::Map<&'static str, Primitive> = phf::phf_map! {
    "void" => Primitive::Void,
    "bool" => Primitive::Bool,
    "int8" => Primitive::Int8,
    "uint8" => Primitive::UInt8,
    "int16" => Primitive::Int16,
    "uint16" => Primitive::UInt16,
    "int32" => Primitive::Int32,
    "int" => Primitive::Int32,
    "uint32" => Primitive::UInt32,
    "uint" => Primitive::UInt32,
    "int64" => Primitive::Int64,
    "uint64" => Primitive::UInt64,
    "float" => Primitive::Float,
    "double" => Primitive::Double,
    "string" => Primitive::String,
};

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        PRIMITIVES.get(name).copied()
    }

    pub fn ir_type(self) -> IrType {
        match self {
            Primitive::Void => IrType::Void,
            Primitive::Bool => IrType::BOOL,
            Primitive::Int8 | Primitive::UInt8 => IrType::Int(8),
            Primitive::Int16 | Primitive::UInt16 => IrType::Int(16),
            Primitive::Int32 | Primitive::UInt32 => IrType::Int(32),
            Primitive::Int64 | Primitive::UInt64 => IrType::Int(64),
            Primitive::Float => IrType::Float,
            Primitive::Double => IrType::Double,
            Primitive::String => IrType::string(),
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Primitive::UInt8 | Primitive::UInt16 | Primitive::UInt32 | Primitive::UInt64
        )
    }
}

/// Maps a source type name to its IR type.
pub fn resolve(name: &str) -> Result<IrType, Error> {
    Primitive::from_name(name)
        .map(Primitive::ir_type)
        .ok_or_else(|| Error::UnknownType(name.into()))
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unknown type '{0}'")]
    UnknownType(Box<str>),
    #[error("value of type '{from}' is too big for target type '{to}'")]
    TooBig { from: IrType, to: IrType },
    #[error("unable to cast element of type '{from}' to '{to}'")]
    Unsupported { from: IrType, to: IrType },
}

/// Conversion instructions the coercion rules may ask for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastOp {
    SExt,
    ZExt,
    Trunc,
    FpToSi,
    SiToFp,
    FpExt,
    FpTrunc,
    /// `[N x i8]*` to `i8*`.
    PointerDecay,
}

impl CastOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CastOp::SExt => "sext",
            CastOp::ZExt => "zext",
            CastOp::Trunc => "trunc",
            CastOp::FpToSi => "fptosi",
            CastOp::SiToFp => "sitofp",
            CastOp::FpExt => "fpext",
            CastOp::FpTrunc => "fptrunc",
            CastOp::PointerDecay => "bitcast",
        }
    }
}

/// Decides which conversion, if any, turns a `source` value into a `target`
/// one.
///
/// Integers only widen. A wider integer may still be narrowed when it is a
/// known constant (`constant` holds its sign-extended value) that fits the
/// target width, signed or unsigned.
pub fn plan_cast(
    source: &IrType,
    target: &IrType,
    constant: Option<i64>,
) -> Result<Option<CastOp>, Error> {
    if source == target {
        return Ok(None);
    }
    let unsupported = || Error::Unsupported {
        from: source.clone(),
        to: target.clone(),
    };

    let op = match (source, target) {
        (IrType::Int(from), IrType::Int(to)) if from < to => {
            if *from == 1 {
                CastOp::ZExt
            } else {
                CastOp::SExt
            }
        }
        (IrType::Int(_), IrType::Int(to)) => match constant {
            Some(value) if fits(value, *to) => CastOp::Trunc,
            _ => {
                return Err(Error::TooBig {
                    from: source.clone(),
                    to: target.clone(),
                })
            }
        },
        (IrType::Float | IrType::Double, IrType::Int(_)) => CastOp::FpToSi,
        (IrType::Int(_), IrType::Float | IrType::Double) => CastOp::SiToFp,
        (IrType::Float, IrType::Double) => CastOp::FpExt,
        (IrType::Double, IrType::Float) => CastOp::FpTrunc,
        (IrType::Pointer(inner), IrType::Pointer(element)) if **element == IrType::I8 => {
            match &**inner {
                IrType::Array(item, _) if **item == IrType::I8 => CastOp::PointerDecay,
                _ => return Err(unsupported()),
            }
        }
        _ => return Err(unsupported()),
    };
    Ok(Some(op))
}

fn fits(value: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let signed_min = -(1i64 << (bits - 1));
    let unsigned_max = (1i64 << bits) - 1;
    (signed_min..=unsigned_max).contains(&value)
}

/// Casts `value` to `target` through the builder, returning the same handle
/// when no conversion is needed.
pub fn build_cast<B: Backend>(
    builder: &mut B,
    value: B::Value,
    target: &IrType,
) -> Result<B::Value, Error> {
    let source = builder.type_of(value);
    let constant = builder.const_int_value(value);
    match plan_cast(&source, target, constant)? {
        None => Ok(value),
        Some(op) => Ok(builder.build_cast(op, value, target)),
    }
}

/// Emits the return for a function declared to return `ret`, coercing `value`
/// to it. Void functions return nothing whatever the value.
pub fn build_optimal_return<B: Backend>(
    builder: &mut B,
    value: B::Value,
    ret: &IrType,
) -> Result<(), Error> {
    if *ret == IrType::Void {
        builder.build_ret_void();
        return Ok(());
    }
    let value = build_cast(builder, value, ret)?;
    builder.build_ret(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_the_primitive_catalogue() {
        let cases = [
            ("void", "void"),
            ("bool", "i1"),
            ("int8", "i8"),
            ("uint16", "i16"),
            ("int", "i32"),
            ("uint", "i32"),
            ("int64", "i64"),
            ("float", "float"),
            ("double", "double"),
            ("string", "i8*"),
        ];
        for (name, spelling) in cases {
            assert_eq!(resolve(name).unwrap().to_string(), spelling, "resolving {name}");
        }
        assert_eq!(
            resolve("int128"),
            Err(Error::UnknownType("int128".into()))
        );
        assert!(Primitive::from_name("uint64").is_some_and(Primitive::is_unsigned));
    }

    #[test]
    fn aggregate_spellings() {
        let ty = IrType::Struct(vec![IrType::I32, IrType::Double]);
        assert_eq!(ty.to_string(), "{ i32, double }");
        let array = IrType::pointer_to(IrType::Array(Box::new(IrType::I8), 6));
        assert_eq!(array.to_string(), "[6 x i8]*");
    }

    #[test]
    fn identical_types_need_no_cast() {
        for ty in [IrType::I32, IrType::Double, IrType::string()] {
            assert_eq!(plan_cast(&ty, &ty, None), Ok(None));
        }
    }

    #[test]
    fn integers_widen() {
        assert_eq!(plan_cast(&IrType::I8, &IrType::I32, None), Ok(Some(CastOp::SExt)));
        assert_eq!(plan_cast(&IrType::BOOL, &IrType::I32, None), Ok(Some(CastOp::ZExt)));
    }

    #[test]
    fn integers_do_not_narrow_at_runtime() {
        assert_eq!(
            plan_cast(&IrType::I64, &IrType::I32, None),
            Err(Error::TooBig {
                from: IrType::I64,
                to: IrType::I32
            })
        );
    }

    #[test]
    fn fitting_constants_narrow() {
        assert_eq!(
            plan_cast(&IrType::I32, &IrType::I8, Some(-128)),
            Ok(Some(CastOp::Trunc))
        );
        assert_eq!(
            plan_cast(&IrType::I32, &IrType::I8, Some(255)),
            Ok(Some(CastOp::Trunc))
        );
        assert!(plan_cast(&IrType::I32, &IrType::I8, Some(256)).is_err());
        assert!(plan_cast(&IrType::I32, &IrType::I8, Some(-129)).is_err());
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(plan_cast(&IrType::Double, &IrType::I32, None), Ok(Some(CastOp::FpToSi)));
        assert_eq!(plan_cast(&IrType::I64, &IrType::Float, None), Ok(Some(CastOp::SiToFp)));
        assert_eq!(plan_cast(&IrType::Float, &IrType::Double, None), Ok(Some(CastOp::FpExt)));
        assert_eq!(plan_cast(&IrType::Double, &IrType::Float, None), Ok(Some(CastOp::FpTrunc)));
    }

    #[test]
    fn string_literals_decay() {
        let literal = IrType::pointer_to(IrType::Array(Box::new(IrType::I8), 3));
        assert_eq!(
            plan_cast(&literal, &IrType::string(), None),
            Ok(Some(CastOp::PointerDecay))
        );
        assert!(plan_cast(&IrType::I32, &IrType::string(), None).is_err());
    }

    #[test]
    fn unsupported_pairs_name_both_types() {
        let error = plan_cast(&IrType::string(), &IrType::Double, None).unwrap_err();
        assert_eq!(error.to_string(), "unable to cast element of type 'i8*' to 'double'");
    }
}
