pub mod router;

pub use router::{ChatRegistry, ChatRouter, ChatSender};
