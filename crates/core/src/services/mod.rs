pub mod analysis;
pub mod backends;
pub mod symbols;
