pub mod dictionaries;
pub use dictionaries::{Dictionary, DictionarySet};

pub mod url;
pub use url::{HostKind, Scheme, TargetUrl, TargetUrlError};
