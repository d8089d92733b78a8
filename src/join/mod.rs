//! Join Module - queries answered from node ids alone
//!
//! Consumers of the numbering scheme: sorted node sets, XPath axis
//! selection and parallel structural joins. None of them touch the stored
//! document.

pub mod axes;
pub mod parallel;
pub mod set;

pub use axes::{select, Axis};
pub use parallel::{par_decode, par_sort_encoded, structural_join};
pub use set::NodeSet;
