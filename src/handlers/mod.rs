pub mod execute;
pub mod health;
pub mod search;
pub mod tools;

pub use execute::execute_handler;
pub use health::{health_handler, ready_handler};
pub use search::search_handler;
pub use tools::list_tools_handler;
