//! URL handling: normalization, storage keys, and origins

mod normalize;
mod origin;

pub use normalize::{document_key, normalize_url};
pub use origin::Origin;
