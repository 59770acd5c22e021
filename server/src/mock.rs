use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::{
    ApiConfiguration, Consultation, NewAccount, Profile, ProfileUpdate, Role, UsageReportRow,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::store::MentorStore;

#[derive(Default)]
struct Data {
    credentials: HashMap<String, (String, Uuid)>,
    tokens: HashMap<String, Uuid>,
    profiles: Vec<Profile>,
    roles: HashMap<Uuid, Role>,
    usage: HashMap<(Uuid, NaiveDate), i32>,
    consultations: Vec<Consultation>,
    config: Option<ApiConfiguration>,
    fail_history: bool,
}

/// In-memory store that counts every call it receives.
#[derive(Default)]
pub struct MockStore {
    data: Mutex<Data>,
    calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, password: &str, limit: Option<i32>, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        let mut data = self.data.lock().unwrap();
        data.credentials
            .insert(email.to_string(), (password.to_string(), id));
        data.profiles.push(Profile {
            id,
            name: email.split('@').next().unwrap_or(email).to_string(),
            username: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            phone: Some("5511999990000".to_string()),
            daily_limit: limit,
        });
        data.roles.insert(id, role);
        id
    }

    pub fn add_token(&self, token: &str, user_id: Uuid) {
        self.data
            .lock()
            .unwrap()
            .tokens
            .insert(token.to_string(), user_id);
    }

    pub fn set_usage(&self, user_id: Uuid, date: NaiveDate, count: i32) {
        self.data
            .lock()
            .unwrap()
            .usage
            .insert((user_id, date), count);
    }

    pub fn usage(&self, user_id: Uuid, date: NaiveDate) -> i32 {
        let data = self.data.lock().unwrap();
        data.usage.get(&(user_id, date)).copied().unwrap_or(0)
    }

    pub fn set_config(&self, config: ApiConfiguration) {
        self.data.lock().unwrap().config = Some(config);
    }

    pub fn config(&self) -> Option<ApiConfiguration> {
        self.data.lock().unwrap().config.clone()
    }

    pub fn consultations(&self) -> Vec<Consultation> {
        self.data.lock().unwrap().consultations.clone()
    }

    pub fn profile(&self, user_id: Uuid) -> Option<Profile> {
        let data = self.data.lock().unwrap();
        data.profiles.iter().find(|p| p.id == user_id).cloned()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.data.lock().unwrap().profiles.clone()
    }

    pub fn role(&self, user_id: Uuid) -> Option<Role> {
        self.data.lock().unwrap().roles.get(&user_id).copied()
    }

    pub fn fail_history_writes(&self) {
        self.data.lock().unwrap().fail_history = true;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MentorStore for MockStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<Uuid>> {
        self.touch();
        Ok(self.data.lock().unwrap().tokens.get(token).copied())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Uuid>> {
        self.touch();
        let data = self.data.lock().unwrap();
        Ok(data
            .credentials
            .get(email)
            .filter(|(p, _)| p == password)
            .map(|(_, id)| *id))
    }

    async fn issue_token(&self, user_id: Uuid) -> Result<String> {
        self.touch();
        let token = Uuid::new_v4().simple().to_string();
        self.add_token(&token, user_id);
        Ok(token)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Uuid> {
        self.touch();
        if self
            .data
            .lock()
            .unwrap()
            .credentials
            .contains_key(&account.email)
        {
            return Err(anyhow!(db::DUPLICATE_EMAIL));
        }
        let id = self.add_user(
            &account.email,
            &account.password,
            Some(account.daily_limit),
            account.role,
        );
        let mut data = self.data.lock().unwrap();
        if let Some(profile) = data.profiles.iter_mut().find(|p| p.id == id) {
            profile.name = account.name.clone();
            profile.username = account.username.clone();
            profile.phone = account.phone.clone();
        }
        Ok(id)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.touch();
        Ok(self.profile(user_id))
    }

    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        self.touch();
        Ok(self.role(user_id))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.touch();
        let mut profiles = self.data.lock().unwrap().profiles.clone();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<()> {
        self.touch();
        let mut data = self.data.lock().unwrap();
        let profile = data
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| anyhow!("Profile {user_id} not found"))?;
        profile.name = update.name.clone();
        profile.phone = update.phone.clone();
        profile.daily_limit = Some(update.daily_limit);
        Ok(())
    }

    async fn usage_count(&self, user_id: Uuid, date: NaiveDate) -> Result<i32> {
        self.touch();
        Ok(self.usage(user_id, date))
    }

    async fn reserve_usage(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        limit: i32,
    ) -> Result<Option<i32>> {
        self.touch();
        let mut data = self.data.lock().unwrap();
        let count = data.usage.entry((user_id, date)).or_insert(0);
        if !common::within_quota(limit, *count) {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }

    async fn release_usage(&self, user_id: Uuid, date: NaiveDate) -> Result<()> {
        self.touch();
        let mut data = self.data.lock().unwrap();
        if let Some(count) = data.usage.get_mut(&(user_id, date)) {
            *count = (*count - 1).max(0);
        }
        Ok(())
    }

    async fn usage_report(&self, date: NaiveDate) -> Result<Vec<UsageReportRow>> {
        self.touch();
        let profiles = self.list_profiles().await?;
        Ok(profiles
            .into_iter()
            .map(|p| UsageReportRow {
                user_id: p.id,
                used_today: self.usage(p.id, date),
                name: p.name,
                username: p.username,
                phone: p.phone,
                daily_limit: p.daily_limit,
            })
            .collect())
    }

    async fn record_consultation(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<Uuid> {
        self.touch();
        let mut data = self.data.lock().unwrap();
        if data.fail_history {
            return Err(anyhow!("consultations table unavailable"));
        }
        let id = Uuid::new_v4();
        data.consultations.push(Consultation {
            id,
            user_id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn recent_consultations(&self, user_id: Uuid, limit: i64) -> Result<Vec<Consultation>> {
        self.touch();
        let data = self.data.lock().unwrap();
        Ok(data
            .consultations
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn api_configuration(&self) -> Result<Option<ApiConfiguration>> {
        self.touch();
        Ok(self.config())
    }

    async fn save_api_configuration(&self, config: &ApiConfiguration) -> Result<()> {
        self.touch();
        self.set_config(config.clone());
        Ok(())
    }
}
