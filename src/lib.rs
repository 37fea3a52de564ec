//! Terminal file-tree browser: an arena-backed directory tree flattened
//! into a sticky-scrolling outline pane with a capped file preview pane
//! beside it. Rendering is immediate-mode and total: every call returns
//! a displayable text block.

pub mod flatten;
pub mod render;
pub mod style;
pub mod tree;
pub mod viewport;
