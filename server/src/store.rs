use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ApiConfiguration, Consultation, NewAccount, Profile, ProfileUpdate, Role, UsageReportRow,
};
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait MentorStore: Send + Sync {
    async fn resolve_token(&self, token: &str) -> Result<Option<Uuid>>;
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Uuid>>;
    async fn issue_token(&self, user_id: Uuid) -> Result<String>;

    async fn create_account(&self, account: &NewAccount) -> Result<Uuid>;
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>>;
    async fn list_profiles(&self) -> Result<Vec<Profile>>;
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<()>;

    async fn usage_count(&self, user_id: Uuid, date: NaiveDate) -> Result<i32>;
    async fn reserve_usage(&self, user_id: Uuid, date: NaiveDate, limit: i32)
        -> Result<Option<i32>>;
    async fn release_usage(&self, user_id: Uuid, date: NaiveDate) -> Result<()>;
    async fn usage_report(&self, date: NaiveDate) -> Result<Vec<UsageReportRow>>;

    async fn record_consultation(&self, user_id: Uuid, question: &str, answer: &str)
        -> Result<Uuid>;
    async fn recent_consultations(&self, user_id: Uuid, limit: i64) -> Result<Vec<Consultation>>;

    async fn api_configuration(&self) -> Result<Option<ApiConfiguration>>;
    async fn save_api_configuration(&self, config: &ApiConfiguration) -> Result<()>;
}

pub struct PgMentorStore {
    pub pool: PgPool,
}

#[async_trait]
impl MentorStore for PgMentorStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<Uuid>> {
        db::resolve_token(&self.pool, token).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Uuid>> {
        db::authenticate(&self.pool, email, password).await
    }

    async fn issue_token(&self, user_id: Uuid) -> Result<String> {
        db::issue_token(&self.pool, user_id).await
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Uuid> {
        db::create_account(&self.pool, account).await
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        db::get_profile(&self.pool, user_id).await
    }

    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        db::get_role(&self.pool, user_id).await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        db::list_profiles(&self.pool).await
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<()> {
        db::update_profile(&self.pool, user_id, update).await
    }

    async fn usage_count(&self, user_id: Uuid, date: NaiveDate) -> Result<i32> {
        db::get_usage_count(&self.pool, user_id, date).await
    }

    async fn reserve_usage(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        limit: i32,
    ) -> Result<Option<i32>> {
        db::reserve_usage(&self.pool, user_id, date, limit).await
    }

    async fn release_usage(&self, user_id: Uuid, date: NaiveDate) -> Result<()> {
        db::release_usage(&self.pool, user_id, date).await
    }

    async fn usage_report(&self, date: NaiveDate) -> Result<Vec<UsageReportRow>> {
        db::usage_report(&self.pool, date).await
    }

    async fn record_consultation(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<Uuid> {
        db::insert_consultation(&self.pool, user_id, question, answer).await
    }

    async fn recent_consultations(&self, user_id: Uuid, limit: i64) -> Result<Vec<Consultation>> {
        db::list_consultations(&self.pool, user_id, limit).await
    }

    async fn api_configuration(&self) -> Result<Option<ApiConfiguration>> {
        db::get_api_configuration(&self.pool).await
    }

    async fn save_api_configuration(&self, config: &ApiConfiguration) -> Result<()> {
        db::save_api_configuration(&self.pool, config).await
    }
}
