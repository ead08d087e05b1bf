/// Ports module defining interfaces for hexagonal architecture
///
/// Only outbound ports (driven ports - infrastructure interfaces) are
/// defined: the CLI drives the use cases directly.
pub mod outbound;
