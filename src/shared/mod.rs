pub mod errors;
pub mod ordering;
pub mod pagination;
pub mod shutdown;

pub use errors::*;
pub use ordering::*;
pub use pagination::*;
