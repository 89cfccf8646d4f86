// Public library interface for locmap
// This allows the debug CLI tool to use the core modules

pub mod color;
pub mod geom;
pub mod layout;
pub mod tree;
pub mod view;
