//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits defined in
//! [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development. Hardware
//!   backends are deployment-specific and live outside this crate; the
//!   whole control plane is written against the traits, so porting means
//!   implementing [`LineBank`](crate::traits::LineBank) and
//!   [`WifiInterface`](crate::traits::WifiInterface) for the target board.

pub mod mock;

pub use mock::*;
