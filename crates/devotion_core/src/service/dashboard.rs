//! Admin dashboard backed by the live devotion feed.

use crate::feed::Subscription;
use crate::model::devotion::Devotion;
use crate::repo::devotion_repo::DevotionRepository;
use log::error;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Publish-state tab of the devotion table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DevotionFilter {
    #[default]
    All,
    Published,
    Unpublished,
}

impl DevotionFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "published" => Some(Self::Published),
            "unpublished" | "draft" | "drafts" => Some(Self::Unpublished),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Published => "published",
            Self::Unpublished => "unpublished",
        }
    }

    pub fn matches(self, devotion: &Devotion) -> bool {
        match self {
            Self::All => true,
            Self::Published => devotion.is_published,
            Self::Unpublished => !devotion.is_published,
        }
    }

    /// Keeps `devotions` that match, preserving order.
    pub fn apply(self, devotions: &[Devotion]) -> Vec<Devotion> {
        devotions
            .iter()
            .filter(|devotion| self.matches(devotion))
            .cloned()
            .collect()
    }
}

/// Header counters shown above the devotion table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub published: usize,
    pub unpublished: usize,
}

impl DashboardStats {
    pub fn from_devotions(devotions: &[Devotion]) -> Self {
        let published = devotions.iter().filter(|d| d.is_published).count();
        Self {
            total: devotions.len(),
            published,
            unpublished: devotions.len() - published,
        }
    }

    /// Count shown on the tab for `filter`.
    pub fn count_for(&self, filter: DevotionFilter) -> usize {
        match filter {
            DevotionFilter::All => self.total,
            DevotionFilter::Published => self.published,
            DevotionFilter::Unpublished => self.unpublished,
        }
    }
}

/// Devotion table kept in sync with the store.
///
/// When the feed cannot be opened the table stays empty; the failure is
/// logged and the dashboard still renders.
pub struct Dashboard {
    rows: Arc<Mutex<Vec<Devotion>>>,
    subscription: Subscription,
}

impl Dashboard {
    pub fn open<R: DevotionRepository>(repo: &R) -> Self {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&rows);
        let subscription = match repo.subscribe_all(move |devotions: &[Devotion]| {
            *lock(&sink) = devotions.to_vec();
        }) {
            Ok(subscription) => subscription,
            Err(err) => {
                error!(
                    "event=dashboard_subscribe module=service status=error kind={} error={}",
                    err.kind().as_str(),
                    err
                );
                Subscription::inert()
            }
        };
        Self { rows, subscription }
    }

    pub fn devotions(&self) -> Vec<Devotion> {
        lock(&self.rows).clone()
    }

    /// Latest snapshot narrowed to one publish-state tab.
    pub fn devotions_filtered(&self, filter: DevotionFilter) -> Vec<Devotion> {
        filter.apply(&lock(&self.rows))
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_devotions(&lock(&self.rows))
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stops live updates; the last snapshot stays readable.
    pub fn close(&self) {
        self.subscription.unsubscribe();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
