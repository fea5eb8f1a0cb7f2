mod buffer;
mod charset;
mod chunks;
mod rope;
mod seq;
#[cfg(test)]
mod tests;

pub use buffer::*;
pub use charset::*;
pub use chunks::*;
pub use rope::*;
pub use seq::*;
