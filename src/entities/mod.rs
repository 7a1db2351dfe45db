//! Declarative macros for resource types

pub mod macros;
