//! Gateway protocol definitions
//!
//! Op codes, close codes, the message envelope and payloads.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::*;
