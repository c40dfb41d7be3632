mod command;
mod replacement;

pub use command::*;
pub use replacement::*;
