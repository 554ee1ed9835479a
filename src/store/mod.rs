pub mod pending;

pub use pending::{PendingStore, ResolveError, WaitError};
