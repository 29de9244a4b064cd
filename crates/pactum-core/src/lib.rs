pub mod error;
pub mod format;
pub mod id;
pub mod mode;
pub mod value;

// Re-export commonly used types
pub use error::{ContractError, FailureKind, Violation, ViolationKind};
pub use format::{render, render_args};
pub use id::{Symbol, SymbolId};
pub use mode::{failure_mode, set_failure_mode, FailureMode};
pub use value::{Object, ObjectData, Value};
