mod keyword;
mod table;

pub use keyword::*;
pub use table::*;
