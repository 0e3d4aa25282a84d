pub mod logger;

pub use logger::{AuditEntry, AuditLogger, Outcome};
