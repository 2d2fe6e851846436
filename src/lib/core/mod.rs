pub mod error;
pub mod outcome;
pub mod todo;

pub use error::*;
pub use outcome::*;
pub use todo::*;
