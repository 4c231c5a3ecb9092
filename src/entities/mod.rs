//! Entities module - the data model, free of any view or host concern.
//!
//! [`Template`] owns the canonical hierarchy; [`Node`] entries link into it
//! by id; [`Resolver`] turns opaque ids back into live nodes. Everything the
//! view layer shows (rows, menus) is projected from here and rebuilt after
//! every structural mutation.

pub mod node;
pub mod resolver;
pub mod template;

pub use node::{Node, NodeId};
pub use resolver::Resolver;
pub use template::Template;
