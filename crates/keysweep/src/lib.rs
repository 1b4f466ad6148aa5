#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod alphabet;
mod enumerator;
mod error;
mod keyspace;
mod partition;
#[cfg(unix)]
mod supervisor;
mod sweep;
mod transform;

pub use crate::alphabet::*;
pub use crate::enumerator::*;
pub use crate::error::*;
pub use crate::keyspace::*;
pub use crate::partition::*;
#[cfg_attr(docsrs, doc(cfg(unix)))]
#[cfg(unix)]
pub use crate::supervisor::*;
pub use crate::sweep::*;
pub use crate::transform::*;
