pub mod accounts;
pub mod resource;
pub mod system;
pub mod utils;
