pub mod executor;
pub mod normalize;
pub mod parser;

pub use executor::{web_url, Executor, Reply};
pub use normalize::normalize;
pub use parser::{parse, Command};
