mod client;
mod error;
mod local;
mod normalize;
mod remote;
mod types;

pub use client::ProxyClient;
pub use error::ApiError;
pub use local::{CommandExtractor, LocalAdapter};
pub use remote::RemoteAdapter;
pub use types::{Comment, Page, Source};

#[cfg(test)]
pub use local::LocalExtractor;
#[cfg(test)]
pub use remote::{ProxyApi, ProxyRequest};
#[cfg(test)]
pub use types::{RawLocalComment, RawLocalPage};
