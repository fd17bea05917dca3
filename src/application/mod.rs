// SPDX-License-Identifier: MPL-2.0
//! Application layer - Boundaries between the engine and its collaborators.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The timeline engine is generic over the ports and never names an adapter

pub mod port;
