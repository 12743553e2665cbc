pub mod store;

pub use store::{MongoConfig, MongoStore};
