//! The directive mini-language of `data-bind` and `data-on*` attributes.
//!
//! ```text
//! directive   := assignment | call
//! assignment  := lhs "=" rhs
//! lhs         := identifier ("." identifier)?
//! rhs         := call | identifier
//! call        := identifier "(" args? ")"
//! args        := literal ("," literal)*
//! literal     := quotedString | number | "true" | "false" | bareword
//! ```
//!
//! There are no operators, nested calls or escapes; a directive only names a
//! source and passes it literal arguments.

pub mod directive;
pub mod error;

pub use directive::{
    BindDescriptor, EventDirective, Literal, TargetKind, parse, parse_all, parse_args, parse_event,
    split_directives,
};
pub use error::BindError;
