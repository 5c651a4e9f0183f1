//! Native value model
//!
//! `FieldValue` is what validated records hold; `HostValue` is what host
//! bindings hand over. `from_host` / `to_host` are the only crossings
//! between the two.

mod coerce;
mod field_value;
mod host;

pub use coerce::{from_host, to_host};
pub use field_value::FieldValue;
pub use host::HostValue;
