// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by layout reads.

/// Misconfiguration or misuse detected while reading a layout.
///
/// None of these are retried internally. They mean the integration has not
/// supplied an input the requested geometry depends on, or asked for an index
/// that does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A child index past the end of the collection.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    /// A layer index past the end of a multilayer layout.
    #[error("layer index {index} out of range for {len} layers")]
    LayerOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of layers.
        len: usize,
    },
    /// Horizontal sync needs a time projector.
    #[error("no time projector set")]
    MissingProjector,
    /// Start or end time reader not configured.
    #[error("no start or end time reader set")]
    MissingTimeReader,
    /// Horizontal sync needs a time window.
    #[error("no time window set")]
    MissingTimeWindow,
}
