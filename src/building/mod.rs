//! Aggregation of element streams into contexts and dialplans
//!
//! - [`ConfigAggregator`]: elements to generic [`Context`](crate::ast::Context)s
//! - [`DialplanAggregator`]: contexts to a [`Dialplan`](crate::ast::Dialplan)

pub mod config;
pub mod dialplan;

pub use config::ConfigAggregator;
pub use dialplan::{DialplanAggregator, DialplanBuild};
