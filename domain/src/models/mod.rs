mod postal_code;

pub use postal_code::*;
