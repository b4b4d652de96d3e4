mod collection;
mod counter;
mod errors;

pub use collection::{ensure_indexes_exist, id_filter, Coll, MongoCollection};
pub use counter::{ensure_counters_exist, Counter};
pub use errors::is_duplicate_key_error;
