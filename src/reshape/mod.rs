pub mod schema;
pub mod scrub;
pub mod slot;
pub mod unpivot;
