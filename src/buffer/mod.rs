mod frame;
mod pool;
mod replacer;

pub use pool::*;
pub use replacer::ReplacementPolicy;
