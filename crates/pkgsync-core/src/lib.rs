pub mod error;
pub mod specs;

pub use error::{ErrorContext, PkgsyncError, PkgsyncResult};
pub use specs::SpecificationSet;
