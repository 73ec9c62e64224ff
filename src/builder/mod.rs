mod gcc;
mod traits;

pub use gcc::GccBuilder;
pub use traits::{BuildError, Builder, MockBuilder};
