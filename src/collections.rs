//! Collection type aliases that switch between gxhash and std collections
//! based on feature flags. Path-keyed maps dominate this crate's hot paths;
//! enabling the `gxhash` feature swaps in the faster hasher on CPUs with the
//! required intrinsics (AES-NI/SSE2 on x86, AES/NEON on ARM).
//!
//! Both hashers implement `Default`, so construction sites use
//! `HashMap::default()` and work identically under either alias.

#[cfg(feature = "gxhash")]
pub use gxhash::{HashMap, HashSet};

#[cfg(not(feature = "gxhash"))]
pub type HashMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(not(feature = "gxhash"))]
pub type HashSet<T> = std::collections::HashSet<T>;
