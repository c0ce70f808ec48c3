//! Arena-backed tree engines behind the public map types.
//!
//! Nodes live in an [`Arena`] and reference each other through stable
//! [`Handle`]s, so rebalancing never fights the borrow checker over parent
//! and child links.

mod arena;
mod bplus;
mod btree;
mod handle;

pub(crate) use bplus::{Node as BPlusNode, RawBPlusTree};
pub(crate) use btree::RawBTree;
pub(crate) use handle::Handle;
