//! Devotion use-case service.
//!
//! # Responsibility
//! - Page-level reads for home, archive and single-devotion views.
//! - Admin save flow: validate the form, then create or update.
//!
//! # Invariants
//! - Public reads never surface unpublished devotions.
//! - Browsing by date never reveals a day after today.
//! - Invalid forms never reach the repository.

use crate::feed::Subscription;
use crate::model::devotion::{Devotion, DevotionId, DevotionPatch};
use crate::repo::devotion_repo::DevotionRepository;
use crate::repo::error::{RepoError, RepoResult};
use crate::service::devotion_form::{DevotionForm, FormErrors};
use crate::time::local_today;
use chrono::NaiveDate;
use log::{debug, info};
use thiserror::Error;

/// Page size of the archive gallery.
pub const ARCHIVE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("{0}")]
    Validation(#[from] FormErrors),
    #[error("{0}")]
    Repo(#[from] RepoError),
}

/// Service facade over a devotion repository.
pub struct DevotionService<R: DevotionRepository> {
    repo: R,
}

impl<R: DevotionRepository> DevotionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Home page devotion: `date` when browsing, otherwise today.
    ///
    /// Days after today read as empty so scheduled posts stay hidden.
    pub fn home(&self, date: Option<NaiveDate>) -> RepoResult<Option<Devotion>> {
        match date {
            Some(date) if date > local_today() => {
                debug!("event=devotion_home module=service status=skipped reason=future_date");
                Ok(None)
            }
            Some(date) => self.repo.devotion_by_date(date),
            None => self.repo.todays_devotion(),
        }
    }

    /// Gallery of recent published devotions.
    pub fn gallery(&self, limit: Option<u32>) -> RepoResult<Vec<Devotion>> {
        self.repo.published_devotions(limit)
    }

    pub fn archive(&self) -> RepoResult<Vec<Devotion>> {
        self.repo.published_devotions(Some(ARCHIVE_PAGE_SIZE))
    }

    /// Public single-devotion view; drafts read as absent.
    pub fn public_devotion(&self, id: DevotionId) -> RepoResult<Option<Devotion>> {
        Ok(self
            .repo
            .devotion_by_id(id)?
            .filter(|devotion| devotion.is_published))
    }

    /// Admin lookup, drafts included.
    pub fn admin_devotion(&self, id: DevotionId) -> RepoResult<Option<Devotion>> {
        self.repo.devotion_by_id(id)
    }

    /// Form pre-filled from the stored record, or `None` when it is gone.
    pub fn edit_form(&self, id: DevotionId) -> RepoResult<Option<DevotionForm>> {
        Ok(self
            .repo
            .devotion_by_id(id)?
            .map(|devotion| DevotionForm::from_devotion(&devotion)))
    }

    /// Validates `form`, then creates (`id = None`) or overwrites `id`.
    pub fn save(
        &self,
        id: Option<DevotionId>,
        form: &DevotionForm,
    ) -> Result<DevotionId, SaveError> {
        let draft = form.validate()?;
        let saved = match id {
            Some(id) => {
                self.repo.update_devotion(id, &DevotionPatch::from_draft(&draft))?;
                id
            }
            None => self.repo.create_devotion(&draft)?,
        };
        info!(
            "event=devotion_save module=service status=ok mode={} id={}",
            if id.is_some() { "update" } else { "create" },
            saved
        );
        Ok(saved)
    }

    pub fn set_published(&self, id: DevotionId, is_published: bool) -> RepoResult<()> {
        self.repo.set_published(id, is_published)
    }

    pub fn delete(&self, id: DevotionId) -> RepoResult<()> {
        self.repo.delete_devotion(id)?;
        info!("event=devotion_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn subscribe_all<F>(&self, listener: F) -> RepoResult<Subscription>
    where
        F: Fn(&[Devotion]) + Send + Sync + 'static,
    {
        self.repo.subscribe_all(listener)
    }
}
