/// Image analysis layer - domain models and pure services
///
/// This layer contains the value objects that flow through the scan
/// pipeline and the logic that turns filtered layer contents into an
/// [`domain::Inventory`]. Nothing here touches the filesystem or the
/// network; archive decoding lives in `archive` and feed access behind
/// the `ports` layer.
pub mod domain;
pub mod services;
