//! Core interfaces: components, terminals, input and text.

pub mod component;
pub mod input;
pub mod terminal;
pub mod text;
