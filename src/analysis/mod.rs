pub mod type_check;
pub mod type_error;

pub use type_check::{TypeChecker, check};
pub use type_error::{TypeError, TypeErrorKind};
