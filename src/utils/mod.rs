//! Internal helpers shared by the walker and the copier.

pub(crate) mod path;
