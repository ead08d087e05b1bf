/// Saved-image archive decoding
///
/// Consumes only the subset of the layered-archive format needed for
/// package discovery: the top-level manifest for layer identity and
/// ordering, and a streaming walk of each layer's tar content through
/// the path filter.
mod filter;
mod manifest;
mod reader;

pub use filter::{FilteredLayer, LayerFilter, RulePurpose};
pub use manifest::{parse_manifest, LayerRef, Manifest};
pub use reader::ArchiveReader;
