//! Command bridge between the initiating contexts and the page agent.

mod client;
mod local;
mod message;

pub use client::{Bridge, Tab, TabId, Transport};
pub use local::LocalTransport;
pub use message::{
    Ack, ActiveState, Command, Deleted, Failure, LoadedBook, Pong, Response, Status,
};
