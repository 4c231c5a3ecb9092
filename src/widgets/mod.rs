//! View-model layer: panels decide *what* exists (rows, menu entries,
//! drop outcomes); the host decides how it looks.

pub mod outline;
