// External I/O
pub mod signals; // Unix signal handling
