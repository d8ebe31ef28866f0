//! # trellis-test
//!
//! Characterization utilities for migrating routes off a legacy router:
//!
//! - [`fingerprint`] - byte-level digests of legacy source artifacts
//! - [`extract_routes`] / [`extract_middlewares`] - structural view of a router
//! - [`record`] - behavioral view (replayed requests and their responses)
//! - [`SnapshotStore`] - baselines to compare all three against
//!
//! ```rust,ignore
//! let config = HarnessConfig::load(env!("CARGO_MANIFEST_DIR"))?;
//! let store = config.snapshot_store();
//! assert_snapshot(&store, "legacy_routes", &extract_routes(&legacy_app())?);
//! assert_snapshot(&store, "legacy_sources", &fingerprint(config.sources.as_slice())?);
//! ```

pub mod behavior;
pub mod config;
pub mod fingerprint;
pub mod introspect;
pub mod snapshot;

pub use behavior::{BehaviorError, Exchange, Probe, record};
pub use config::{ConfigError, HarnessConfig};
pub use fingerprint::{digest_bytes, fingerprint, fingerprint_file};
pub use introspect::{extract_middlewares, extract_routes};
pub use snapshot::{SnapshotError, SnapshotOutcome, SnapshotStore, SnapshotUpdate, assert_snapshot};

pub use trellis_core::{CharacterizeError, Fingerprint, RouteEntry};
