//! Parrot core library: LINE webhook gateway that answers each text message with a
//! stored reply, or echoes it back when the store has none.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod store;
