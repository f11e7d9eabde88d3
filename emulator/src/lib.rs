pub mod assembler;
pub mod codec;
pub mod constants;
pub mod runtime;

pub use self::assembler::assemble;
pub use self::runtime::{Machine, RunOptions};
