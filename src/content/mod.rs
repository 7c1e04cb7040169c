//! Content domain: blog posts, concerts, discography, biography.
//!
//! Each content type carries its own store trait; the blog additionally
//! owns the publish-visibility predicate and the gated wire projections.

pub mod autosave;
pub mod biography;
pub mod blog;
pub mod concerts;
pub mod discography;

pub use autosave::Autosaver;
pub use biography::{Biography, BiographyInput, BiographyStore};
pub use blog::{BlogPost, BlogPostDraft, BlogPostSummary, BlogPostView, BlogStore};
pub use concerts::{Concert, ConcertInput, ConcertStore};
pub use discography::{Release, ReleaseInput, ReleaseStore, StreamingLink};
