pub mod db;
pub mod modpacks;
pub mod platforms;

pub use db::Db;
