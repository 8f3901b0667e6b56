pub mod check;
pub mod resolvers;

pub use check::*;
pub use resolvers::*;
