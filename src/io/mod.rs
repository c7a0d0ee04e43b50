// Process-level I/O
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
