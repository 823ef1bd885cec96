pub mod db;
#[cfg(test)]
pub(crate) mod failing;
pub mod store;

pub use db::SqliteStore;
pub use store::PracticeStore;
