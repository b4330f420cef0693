pub mod accumulator;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod credentials;
pub mod message;
pub mod persona;
pub mod session;
