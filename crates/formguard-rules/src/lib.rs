//! formguard rules
//!
//! Pure predicates behind the built-in validation rules. Every function here
//! answers "does this non-empty value satisfy the rule?"; deciding that an
//! empty optional value passes is the engine's job, not these functions'.

pub mod email;
pub mod format;
pub mod numeric;
pub mod string;

// Re-export all validators
pub use email::*;
pub use format::*;
pub use numeric::*;
pub use string::*;
