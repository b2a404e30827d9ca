mod parts;
mod sonyflake;

pub use parts::*;
pub use sonyflake::*;
