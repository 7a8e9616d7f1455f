//! Fixed-name builtin functions (`print`, `output`, `to_number`, `to_string`,
//! `to_bool`, `length`, `exp`).
//!
//! Unlike the teacher's Lisp, where builtins are ordinary environment
//! bindings a user could in principle shadow, Minipar's closed grammar
//! resolves these names at parse time (spec §4.2, §4.6): there is no way to
//! write a `Call` whose callee is one of these names and have it mean
//! anything other than the builtin. Each category lives in its own small
//! submodule, in the spirit of the teacher's `builtins/{arithmetic,
//! console, ...}.rs` layout, and this module aggregates their signatures
//! for the parser and their implementations for the evaluator.

pub mod console;
pub mod conversion;
pub mod math;
pub mod strings;

use crate::types::Type;

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// `print`/`output`: any number of NUMBER/STRING/BOOL arguments.
    Variadic,
}

pub struct Signature {
    pub arity: Arity,
    /// Required type per fixed argument position. Empty for variadic.
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Looks up the signature of a fixed-name builtin by its call name.
/// Returns `None` for channel operations and user-defined functions.
pub fn signature(name: &str) -> Option<Signature> {
    Some(match name {
        "print" | "output" => Signature {
            arity: Arity::Variadic,
            params: vec![],
            ret: Type::Void,
        },
        "to_number" => Signature {
            arity: Arity::Fixed(1),
            params: vec![Type::String],
            ret: Type::Number,
        },
        "to_string" => Signature {
            arity: Arity::Fixed(1),
            params: vec![Type::Number],
            ret: Type::String,
        },
        "to_bool" => Signature {
            arity: Arity::Fixed(1),
            params: vec![Type::String],
            ret: Type::Bool,
        },
        "length" => Signature {
            arity: Arity::Fixed(1),
            params: vec![Type::String],
            ret: Type::Number,
        },
        "exp" => Signature {
            arity: Arity::Fixed(1),
            params: vec![Type::Number],
            ret: Type::Number,
        },
        _ => return None,
    })
}

/// Whether a builtin argument type is acceptable for variadic `print`/`output`.
pub fn is_printable(ty: &Type) -> bool {
    matches!(ty, Type::Number | Type::String | Type::Bool)
}

/// The four channel-operation names, resolved specially by the parser based
/// on the type of their first argument rather than by a fixed signature.
pub fn is_channel_op(name: &str) -> bool {
    matches!(name, "accept" | "send" | "recv" | "close")
}
