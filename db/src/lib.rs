use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    ApiConfiguration, Consultation, NewAccount, Profile, ProfileUpdate, Role, UsageReportRow,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub const DUPLICATE_EMAIL: &str = "A user with this email address has already been registered";

pub async fn init_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn create_tables(pool: &PgPool) -> Result<()> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS identities (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS access_tokens (
            token TEXT PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            username TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            daily_limit INTEGER CHECK (daily_limit >= 0)
        )"#,
        r#"CREATE TABLE IF NOT EXISTS user_roles (
            user_id UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('client', 'admin'))
        )"#,
        r#"CREATE TABLE IF NOT EXISTS daily_usage (
            user_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            usage_date DATE NOT NULL,
            request_count INTEGER NOT NULL DEFAULT 0 CHECK (request_count >= 0),
            PRIMARY KEY (user_id, usage_date)
        )"#,
        r#"CREATE TABLE IF NOT EXISTS consultations (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS api_configurations (
            id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
            base_url TEXT NOT NULL,
            auth_token TEXT,
            timeout_seconds INTEGER NOT NULL DEFAULT 30
                CHECK (timeout_seconds BETWEEN 5 AND 120)
        )"#,
    ];
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// --- Identity functions ---

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is unreadable: {e}");
            false
        }
    }
}

/// Creates the identity, its profile and its role in one transaction.
pub async fn create_account(pool: &PgPool, account: &NewAccount) -> Result<Uuid> {
    let email = account.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(anyhow!("Email is required"));
    }
    if account.password.len() < 6 {
        return Err(anyhow!("Password should be at least 6 characters"));
    }
    if account.daily_limit < 0 {
        return Err(anyhow!("Daily limit must not be negative"));
    }

    let mut tx = pool.begin().await?;

    let existing =
        sqlx::query_scalar::<_, Uuid>("select id from identities where email = $1")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_some() {
        return Err(anyhow!(DUPLICATE_EMAIL));
    }

    let user_id = Uuid::new_v4();
    let password_hash = hash_password(&account.password)?;

    sqlx::query("insert into identities (id, email, password_hash) values ($1, $2, $3)")
        .bind(user_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"insert into profiles (id, name, username, email, phone, daily_limit)
           values ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(user_id)
    .bind(&account.name)
    .bind(&account.username)
    .bind(&email)
    .bind(account.phone.as_deref())
    .bind(account.daily_limit)
    .execute(&mut *tx)
    .await?;

    sqlx::query("insert into user_roles (user_id, role) values ($1, $2)")
        .bind(user_id)
        .bind(account.role.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user_id)
}

pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query_as::<_, (Uuid, String)>(
        "select id, password_hash from identities where email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|(id, hash)| verify_password(password, &hash).then_some(id)))
}

pub async fn issue_token(pool: &PgPool, user_id: Uuid) -> Result<String> {
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    sqlx::query("insert into access_tokens (token, user_id) values ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

pub async fn resolve_token(pool: &PgPool, token: &str) -> Result<Option<Uuid>> {
    let user_id =
        sqlx::query_scalar::<_, Uuid>("select user_id from access_tokens where token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await?;
    Ok(user_id)
}

// --- Profile functions ---

type ProfileRow = (Uuid, String, String, String, Option<String>, Option<i32>);

fn profile_from_row(row: ProfileRow) -> Profile {
    let (id, name, username, email, phone, daily_limit) = row;
    Profile {
        id,
        name,
        username,
        email,
        phone,
        daily_limit,
    }
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "select id, name, username, email, phone, daily_limit from profiles where id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(profile_from_row))
}

pub async fn list_profiles(pool: &PgPool) -> Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "select id, name, username, email, phone, daily_limit from profiles order by name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(profile_from_row).collect())
}

pub async fn update_profile(pool: &PgPool, user_id: Uuid, update: &ProfileUpdate) -> Result<()> {
    if update.daily_limit < 0 {
        return Err(anyhow!("Daily limit must not be negative"));
    }
    let result =
        sqlx::query("update profiles set name = $2, phone = $3, daily_limit = $4 where id = $1")
            .bind(user_id)
            .bind(&update.name)
            .bind(update.phone.as_deref())
            .bind(update.daily_limit)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(anyhow!("Profile {user_id} not found"));
    }
    Ok(())
}

pub async fn get_role(pool: &PgPool, user_id: Uuid) -> Result<Option<Role>> {
    let role = sqlx::query_scalar::<_, String>("select role from user_roles where user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    role.map(|r| r.parse::<Role>().map_err(|e| anyhow!(e)))
        .transpose()
}

// --- Usage functions ---

pub async fn get_usage_count(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<i32> {
    let count = sqlx::query_scalar::<_, i32>(
        "select request_count from daily_usage where user_id = $1 and usage_date = $2",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(count.unwrap_or(0))
}

/// Takes one unit of the user's quota for `date` if the limit allows it.
/// The check and the increment happen in a single statement, so concurrent
/// requests cannot push the count past the limit. Returns the new count, or
/// `None` when the limit has been reached. A limit of 0 is unlimited.
pub async fn reserve_usage(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    limit: i32,
) -> Result<Option<i32>> {
    let count = sqlx::query_scalar::<_, i32>(
        r#"INSERT INTO daily_usage (user_id, usage_date, request_count)
           VALUES ($1, $2, 1)
           ON CONFLICT (user_id, usage_date)
           DO UPDATE SET request_count = daily_usage.request_count + 1
           WHERE $3 = 0 OR daily_usage.request_count < $3
           RETURNING request_count"#,
    )
    .bind(user_id)
    .bind(date)
    .bind(limit)
    .fetch_optional(pool)
    .await?;
    Ok(count)
}

/// Gives back a unit taken by [`reserve_usage`] for a request that failed.
pub async fn release_usage(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<()> {
    sqlx::query(
        r#"UPDATE daily_usage SET request_count = request_count - 1
           WHERE user_id = $1 AND usage_date = $2 AND request_count > 0"#,
    )
    .bind(user_id)
    .bind(date)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn usage_report(pool: &PgPool, date: NaiveDate) -> Result<Vec<UsageReportRow>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, Option<String>, i32, Option<i32>)>(
        r#"select
            p.id,
            p.name,
            p.username,
            p.phone,
            coalesce(du.request_count, 0),
            p.daily_limit
        from profiles p
        left join daily_usage du on du.user_id = p.id and du.usage_date = $1
        order by p.name"#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(
            |(user_id, name, username, phone, used_today, daily_limit)| UsageReportRow {
                user_id,
                name,
                username,
                phone,
                used_today,
                daily_limit,
            },
        )
        .collect())
}

// --- Consultation history ---

pub async fn insert_consultation(
    pool: &PgPool,
    user_id: Uuid,
    question: &str,
    answer: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "insert into consultations (id, user_id, question, answer) values ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(user_id)
    .bind(question)
    .bind(answer)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn list_consultations(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Consultation>> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, DateTime<Utc>)>(
        r#"select id, user_id, question, answer, created_at
        from consultations
        where user_id = $1
        order by created_at desc
        limit $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(
            |(id, user_id, question, answer, created_at)| Consultation {
                id,
                user_id,
                question,
                answer,
                created_at,
            },
        )
        .collect())
}

// --- API configuration ---

pub async fn get_api_configuration(pool: &PgPool) -> Result<Option<ApiConfiguration>> {
    let row = sqlx::query_as::<_, (String, Option<String>, i32)>(
        "select base_url, auth_token, timeout_seconds from api_configurations where id = 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(base_url, auth_token, timeout_seconds)| ApiConfiguration {
        base_url,
        auth_token,
        timeout_seconds,
    }))
}

pub async fn save_api_configuration(pool: &PgPool, config: &ApiConfiguration) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO api_configurations (id, base_url, auth_token, timeout_seconds)
           VALUES (1, $1, $2, $3)
           ON CONFLICT (id)
           DO UPDATE SET base_url=EXCLUDED.base_url,
                         auth_token=EXCLUDED.auth_token,
                         timeout_seconds=EXCLUDED.timeout_seconds"#,
    )
    .bind(&config.base_url)
    .bind(config.auth_token.as_deref())
    .bind(config.timeout_seconds)
    .execute(pool)
    .await?;
    Ok(())
}
