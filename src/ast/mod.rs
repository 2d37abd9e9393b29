//! Parsed representation of configuration files
//!
//! - [`location`]: per-line source positions shared by every later stage
//! - [`elements`]: grammar elements and generic contexts
//! - [`dialplan`]: the dialplan model built from those contexts

pub mod dialplan;
pub mod elements;
pub mod location;

pub use dialplan::{
    Dialplan, DialplanContext, DialplanError, Extension, ExtensionKey, Include, PendingExtension,
    Priority, PriorityRef,
};
pub use elements::{Context, Element, EmptyLine, Separator, Varset};
pub use location::{Loc, SourceLocation};
