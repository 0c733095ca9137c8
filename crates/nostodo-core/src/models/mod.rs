pub mod todo;

pub use todo::{preview, TodoItem};
