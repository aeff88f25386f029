//! Wire contracts of the storefront API.
//!
//! Request/response DTOs plus the normalization layer that turns the
//! API's heterogeneous payload shapes into one canonical record per entity.

pub mod domain;
pub mod enums;
pub mod shared;
pub mod system;
