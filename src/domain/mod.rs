pub mod form;
pub mod model;
pub mod solution;

pub use form::*;
pub use model::*;
pub use solution::*;
