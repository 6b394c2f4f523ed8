//! Core domain logic for the devotion publishing site.
//! This crate is the single source of truth for content invariants.

pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod routes;
pub mod service;
pub mod session;
pub mod time;

pub use config::{ConfigError, SiteConfig};
pub use feed::{ChangeFeed, Subscription};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::devotion::{
    derive_excerpt, Devotion, DevotionDraft, DevotionId, DevotionPatch, EXCERPT_MAX_CHARS,
};
pub use model::profile::{Role, UserProfile};
pub use repo::devotion_repo::{
    DevotionFeed, DevotionRepository, SqliteDevotionRepository, PUBLISHED_DEFAULT_LIMIT,
};
pub use repo::error::{RepoError, RepoErrorKind, RepoResult};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use routes::{guard, Route, RouteDecision};
pub use service::dashboard::{Dashboard, DashboardStats, DevotionFilter};
pub use service::devotion_form::{DevotionForm, FormErrors, FormField};
pub use service::devotion_service::{DevotionService, SaveError, ARCHIVE_PAGE_SIZE};
pub use service::gallery::{GalleryPager, GALLERY_PAGE_SIZE};
pub use service::share::ShareCard;
pub use session::{AuthError, AuthUser, IdentityProvider, LoginForm, Session, SessionState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
