//! Built-in primitive types.

use std::fmt;

use crate::parser::token::NumberValue;

/// A primitive type known without any declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Decimal,
}

/// Every primitive, in catalogue order.
pub const PRIMITIVES: &[Primitive] = &[
    Primitive::Bool,
    Primitive::I8,
    Primitive::I16,
    Primitive::I32,
    Primitive::I64,
    Primitive::U8,
    Primitive::U16,
    Primitive::U32,
    Primitive::U64,
    Primitive::Decimal,
];

impl Primitive {
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::Decimal => "decimal",
        }
    }

    /// Storage size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Primitive::Bool | Primitive::I8 | Primitive::U8 => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::Decimal => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 | Primitive::Decimal
        )
    }

    /// The type a numeric literal takes.
    pub const fn of_literal(value: &NumberValue) -> Primitive {
        match value {
            NumberValue::Integer(_) => Primitive::I64,
            NumberValue::Decimal(_) => Primitive::Decimal,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a primitive by name.
pub fn is_primitive_type(name: &str) -> Option<Primitive> {
    PRIMITIVES.iter().copied().find(|p| p.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bool", Some(Primitive::Bool))]
    #[case("u16", Some(Primitive::U16))]
    #[case("decimal", Some(Primitive::Decimal))]
    #[case("i128", None)]
    #[case("Point", None)]
    fn test_primitive_lookup(#[case] name: &str, #[case] expected: Option<Primitive>) {
        assert_eq!(is_primitive_type(name), expected);
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(Primitive::of_literal(&NumberValue::Integer(3)), Primitive::I64);
        assert_eq!(Primitive::of_literal(&NumberValue::Decimal(0.5)), Primitive::Decimal);
    }

    #[test]
    fn test_sizes_and_sign() {
        assert_eq!(Primitive::U32.size(), 4);
        assert!(Primitive::I8.is_signed());
        assert!(!Primitive::U64.is_signed());
    }
}
