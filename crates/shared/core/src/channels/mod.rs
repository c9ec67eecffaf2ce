//! Channel names, topic kinds and the parameters of channel families

mod bar;
mod book_depth;
mod channel;

pub use bar::Bar;
pub use book_depth::BookDepth;
pub use channel::{Channel, Namespace, TopicKind};
