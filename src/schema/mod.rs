//! Schema declaration and compilation
//!
//! A schema is declared once (in code or as JSON) and compiled into an
//! immutable `CompiledSchema`:
//!
//! - fields in declaration order with O(1) name lookup
//! - constraint checks ordered by cost, patterns compiled once per process
//! - defaults and enum members coerced ahead of time
//!
//! Every problem with a declaration is a `CompileError`; validation never
//! discovers schema faults.

mod compiled;
mod compiler;
mod constraints;
mod errors;
mod patterns;
mod registry;
mod types;

pub use compiled::{CompiledField, CompiledSchema, CompiledType};
pub use compiler::compile;
pub use constraints::{Check, ConstraintBag};
pub use errors::{CompileError, CompileResult};
pub use patterns::{is_email, is_url};
pub use registry::SchemaRegistry;
pub use types::{Constraints, FieldDecl, FieldType, SchemaDecl};
