pub mod error;
pub mod fingerprint;
pub mod layer;

pub use error::{CharacterizeError, CharacterizeResult};
pub use fingerprint::Fingerprint;
pub use layer::{ANONYMOUS, Introspect, LayerInfo, LayerKind, RouteEntry};

pub mod prelude {
    pub use crate::error::{CharacterizeError, CharacterizeResult};
    pub use crate::fingerprint::Fingerprint;
    pub use crate::layer::{Introspect, LayerInfo, LayerKind, RouteEntry};
}
