pub mod associations;
pub mod core;
pub mod operations;
pub mod statements;
pub mod transaction;


pub use self::core::BaseDao;
pub use transaction::Transaction;
