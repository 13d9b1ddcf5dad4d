//! The objects passed around by the agent: messages exchanged with the
//! model, the content blocks they carry, and the tool declarations the model
//! is offered. The wire formats of individual providers are translated to and
//! from these structs at the provider boundary, never used directly.
pub mod message;
pub mod tool;
