mod coordinator;
mod error;
mod helpers;
mod server;
mod trigger;
