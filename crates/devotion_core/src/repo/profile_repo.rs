//! User profile repository.
//!
//! Profiles are keyed by the identity provider's user id and carry the
//! role used for admin gating. Credentials never touch this table.

use crate::model::profile::{Role, UserProfile};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::table_exists;
use rusqlite::{params, Connection, OptionalExtension};

pub trait ProfileRepository {
    fn profile(&self, uid: &str) -> RepoResult<Option<UserProfile>>;

    /// Inserts or replaces email and role for `uid`.
    fn upsert_profile(&self, profile: &UserProfile) -> RepoResult<()>;

    /// Role for `uid`, or `None` when no profile exists.
    fn role_for(&self, uid: &str) -> RepoResult<Option<Role>> {
        Ok(self.profile(uid)?.map(|profile| profile.role))
    }
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "users")? {
            return Err(RepoError::MissingRequiredTable("users"));
        }
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn profile(&self, uid: &str) -> RepoResult<Option<UserProfile>> {
        let found = self
            .conn
            .query_row(
                "SELECT uid, email, role FROM users WHERE uid = ?1;",
                [uid],
                |row| {
                    let role: String = row.get("role")?;
                    Ok(UserProfile {
                        uid: row.get("uid")?,
                        email: row.get("email")?,
                        role: Role::parse(&role),
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn upsert_profile(&self, profile: &UserProfile) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (uid, email, role)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET
                email = excluded.email,
                role = excluded.role;",
            params![
                profile.uid.as_str(),
                profile.email.as_str(),
                profile.role.as_str()
            ],
        )?;
        Ok(())
    }
}
