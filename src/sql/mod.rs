pub mod builder;
pub mod gateway;
pub mod params;

pub use builder::*;
pub use gateway::{execute, insert, query, DbError, JsonRow};
pub use params::*;
