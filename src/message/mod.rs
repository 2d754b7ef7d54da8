//! Parsing of reply lines read from the child's stdout

mod parser;

pub use parser::{parse_reply, reply_id};
