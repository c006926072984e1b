pub mod sensitivity;
pub mod strategies;
pub mod types;

pub use strategies::*;
pub use types::*;
