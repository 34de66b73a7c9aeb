//! CRUD operations for the profile and settings records.
//!
//! Both are singletons per owner, keyed by the owner uid, and both are
//! last-writer-wins: a missing record reads as the stock defaults and writes
//! replace the whole record.

use surrealdb::{Connection, Surreal};
use tracing::instrument;

use crate::{
    db::schemas::{profile, profile::Profile, settings, settings::Settings},
    errors::Error,
};

impl Profile {
    /// Read the owner's profile, falling back to the defaults when the owner
    /// has never saved one.
    #[instrument()]
    pub async fn read<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<Self, Error> {
        let found: Option<Self> = db.select((profile::TABLE_NAME, owner)).await?;
        Ok(found.unwrap_or_else(|| Self {
            owner: owner.to_string(),
            ..Self::default()
        }))
    }

    /// Replace the owner's profile.
    #[instrument()]
    pub async fn write<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        mut profile: Self,
    ) -> Result<Self, Error> {
        profile.owner = owner.to_string();
        db.upsert((profile::TABLE_NAME, owner))
            .content(profile)
            .await?
            .ok_or(Error::NotFound)
    }
}

impl Settings {
    /// Read the owner's settings, falling back to the defaults when the
    /// owner has never saved them.
    #[instrument()]
    pub async fn read<C: Connection>(db: &Surreal<C>, owner: &str) -> Result<Self, Error> {
        let found: Option<Self> = db.select((settings::TABLE_NAME, owner)).await?;
        Ok(found.unwrap_or_else(|| Self {
            owner: owner.to_string(),
            ..Self::default()
        }))
    }

    /// Replace the owner's settings.
    #[instrument()]
    pub async fn write<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        mut settings: Self,
    ) -> Result<Self, Error> {
        settings.owner = owner.to_string();
        db.upsert((settings::TABLE_NAME, owner))
            .content(settings)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Add a requester uid to the owner's block list.
    #[instrument()]
    pub async fn block_user<C: Connection>(
        db: &Surreal<C>,
        owner: &str,
        uid: &str,
        label: &str,
    ) -> Result<Self, Error> {
        let mut settings = Self::read(db, owner).await?;
        settings.ng_users.insert(uid.to_string(), label.to_string());
        Self::write(db, owner, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_database;

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_missing_profile_reads_as_defaults() -> Result<()> {
        let db = init_test_database().await?;
        let profile = Profile::read(&db, "owner-1").await?;
        assert!(profile.is_request_enabled);
        assert_eq!(profile.owner, "owner-1");
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_profile_write_read_round_trip() -> Result<()> {
        let db = init_test_database().await?;
        let mut profile = Profile::default();
        profile.display_name = "DJ Nightingale".to_string();
        profile.is_request_enabled = false;

        Profile::write(&db, "owner-1", profile.clone()).await?;
        let read = Profile::read(&db, "owner-1").await?;
        assert_eq!(read.display_name, "DJ Nightingale");
        assert!(!read.is_request_enabled);

        // last writer wins
        profile.display_name = "DJ Lark".to_string();
        Profile::write(&db, "owner-1", profile).await?;
        let read = Profile::read(&db, "owner-1").await?;
        assert_eq!(read.display_name, "DJ Lark");
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_settings_are_scoped_per_owner() -> Result<()> {
        let db = init_test_database().await?;
        let mut settings = Settings::default();
        settings.categories = vec!["Jazz".to_string()];
        Settings::write(&db, "owner-1", settings).await?;

        let other = Settings::read(&db, "owner-2").await?;
        assert_eq!(other.categories.len(), 6);

        let mine = Settings::read(&db, "owner-1").await?;
        assert_eq!(mine.categories, vec!["Jazz".to_string()]);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_block_user_accumulates() -> Result<()> {
        let db = init_test_database().await?;
        Settings::block_user(&db, "owner-1", "uid-1", "spammer").await?;
        Settings::block_user(&db, "owner-1", "uid-2", "troll").await?;

        let settings = Settings::read(&db, "owner-1").await?;
        assert!(settings.is_blocked("uid-1"));
        assert!(settings.is_blocked("uid-2"));
        assert!(!settings.is_blocked("uid-3"));
        Ok(())
    }
}
