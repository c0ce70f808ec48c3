//! Ordered maps backed by interchangeable tree engines.
//!
//! Two implementations of the [`OrderedMap`] contract:
//!
//! - [`BTreeMap`] — a classic B-tree holding keys only, paired with a hash
//!   index that owns the values.
//! - [`BPlusTreeMap`] — a B+-tree keeping all pairs in its leaves, linked
//!   into a chain for in-order iteration.
//!
//! Both maps can snapshot their node structure as a [`TreeView`] via
//! [`OrderedMap::export_tree`], which is how the examples below render trees.
//!
//! ```
//! use treant_maps::{BPlusTreeMap, BTreeMap, OrderedMap};
//!
//! let mut btree = BTreeMap::new();
//! let mut bplus = BPlusTreeMap::new();
//! for key in 0..10 {
//!     btree.insert(key, key * key);
//!     bplus.insert(key, key * key);
//! }
//!
//! assert_eq!(btree.get(&3), bplus.get(&3));
//! assert_eq!(btree.remove(&3), bplus.remove(&3));
//! assert_eq!(btree.len(), bplus.len());
//! ```

#![forbid(keyword_idents, non_ascii_idents, unreachable_pub)]
#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod bplus_tree_map;
mod btree_map;
mod error;
mod ordered_map;
mod raw;
mod view;

pub use bplus_tree_map::{BPlusTreeMap, DEFAULT_BPLUS_DEGREE, Iter, MIN_BPLUS_DEGREE};
pub use btree_map::{BTreeMap, MIN_BTREE_DEGREE};
pub use error::TreeError;
pub use ordered_map::OrderedMap;
pub use view::TreeView;
