mod postal_record;

pub use postal_record::*;
