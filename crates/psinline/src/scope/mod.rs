//
// scope/mod.rs
//
// Scope resolution for inline values: which lines of a document may hold
// variables visible at the stopped location
//

pub mod cache;
pub mod resolver;
pub mod symbols;

pub use cache::*;
pub use resolver::*;
pub use symbols::*;
