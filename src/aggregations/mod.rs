pub mod assembler;
pub mod classify;

pub use assembler::*;
pub use classify::*;
