//! Login and registration
//!
//! One form, one validator and one submission path serve both modes. The
//! mode only decides which fields are required and what happens on success.
//! Issued tokens are opaque and not checked anywhere else.
//!
//! Passwords are stored as bcrypt hashes. Email uniqueness is enforced by
//! the table's UNIQUE constraint, so concurrent registrations for the same
//! address resolve to exactly one account.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

use crate::core::{Profile, ProfileError, ProfileRepository};

const MIN_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;

/// Role written into the profile of a freshly registered user
pub const DEFAULT_ROLE: &str = "Usuário Aegis";
pub const DEFAULT_SKILL: &str = "Segurança Digital";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Login,
    Register,
}

/// The submitted form. Registration-only fields may be absent on login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub agree_to_terms: bool,
}

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid form: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Email já cadastrado.")]
    EmailTaken,

    #[error("Credenciais inválidas.")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// Successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub account: Account,
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Validate `form` for `mode`, collecting every failed rule
pub fn validate(mode: AuthMode, form: &AuthForm) -> Result<(), AccountError> {
    let mut errors = Vec::new();

    if !looks_like_email(form.email.trim()) {
        errors.push(FieldError {
            field: "email",
            message: "Email inválido",
        });
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError {
            field: "password",
            message: "Senha deve ter no mínimo 6 caracteres",
        });
    }

    if mode == AuthMode::Register {
        if form.first_name.trim().chars().count() < MIN_NAME_LEN {
            errors.push(FieldError {
                field: "firstName",
                message: "Nome deve ter no mínimo 2 caracteres",
            });
        }
        if form.last_name.trim().chars().count() < MIN_NAME_LEN {
            errors.push(FieldError {
                field: "lastName",
                message: "Sobrenome deve ter no mínimo 2 caracteres",
            });
        }
        if form.country.trim().is_empty() {
            errors.push(FieldError {
                field: "country",
                message: "País é obrigatório",
            });
        }
        if !form.agree_to_terms {
            errors.push(FieldError {
                field: "agreeToTerms",
                message: "Você deve concordar com os termos",
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation(errors))
    }
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

/// bcrypt is CPU-bound, so both directions run on the blocking pool
async fn hash_password(password: String, cost: u32) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

/// Account storage plus the submission handler
pub struct AccountStore {
    pool: SqlitePool,
    profiles: Arc<dyn ProfileRepository>,
    cost: u32,
}

impl AccountStore {
    pub async fn new(
        pool: SqlitePool,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Result<Self, sqlx::Error> {
        Self::with_cost(pool, profiles, bcrypt::DEFAULT_COST).await
    }

    /// Store with an explicit bcrypt work factor
    pub async fn with_cost(
        pool: SqlitePool,
        profiles: Arc<dyn ProfileRepository>,
        cost: u32,
    ) -> Result<Self, sqlx::Error> {
        let store = Self {
            pool,
            profiles,
            cost,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                country TEXT NOT NULL,
                agree_to_terms INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Validate and submit the form in the given mode
    pub async fn submit(&self, mode: AuthMode, form: AuthForm) -> Result<AuthSession, AccountError> {
        validate(mode, &form)?;

        let email = form.email.trim().to_lowercase();
        let account = match mode {
            AuthMode::Register => self.register(&email, &form).await?,
            AuthMode::Login => self.login(&email, &form.password).await?,
        };

        tracing::info!(account_id = account.id, mode = ?mode, "authentication succeeded");
        Ok(AuthSession {
            access_token: random_hex(16),
            token_type: "bearer".to_string(),
            account,
        })
    }

    async fn register(&self, email: &str, form: &AuthForm) -> Result<Account, AccountError> {
        let password_hash = hash_password(form.password.clone(), self.cost).await?;
        let created_at = Utc::now();
        let first_name = form.first_name.trim();
        let last_name = form.last_name.trim();
        let country = form.country.trim();

        let result = sqlx::query(
            r#"
            INSERT INTO accounts
                (first_name, last_name, email, password_hash, country, agree_to_terms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(country)
        .bind(form.agree_to_terms)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AccountError::EmailTaken);
        }

        self.profiles
            .set(&Profile {
                name: format!("{} {}", first_name, last_name),
                email: email.to_string(),
                role: DEFAULT_ROLE.to_string(),
                location: country.to_string(),
                skills: vec![DEFAULT_SKILL.to_string()],
                ..Default::default()
            })
            .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            country: country.to_string(),
            created_at,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let Some((account, hash)) = self.find(email).await? else {
            tracing::debug!("login for unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), hash).await? {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(account)
    }

    async fn find(&self, email: &str) -> Result<Option<(Account, String)>, sqlx::Error> {
        let row: Option<(i64, String, String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, country, password_hash, created_at
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, first_name, last_name, email, country, hash, created_at)| {
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|e| {
                        tracing::warn!(account_id = id, error = %e, "unparseable created_at");
                        DateTime::<Utc>::UNIX_EPOCH
                    });
                let account = Account {
                    id,
                    first_name,
                    last_name,
                    email,
                    country,
                    created_at,
                };
                (account, hash)
            },
        ))
    }
}
