pub mod builders;
pub mod node;
pub mod ops;

pub use builders::*;
pub use node::*;
pub use ops::*;
