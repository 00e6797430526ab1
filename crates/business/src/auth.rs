//! Authentication - register, login, logout, staff accounts
//!
//! Accounts live in three role tables. Login searches them in the order
//! resident, secretary, treasurer; a resident is checked against the
//! eligibility gate before the password is verified.

use crate::eligibility::EligibilityGate;
use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::finance::parse_date;
use barangay_core::{text, time, Actor, Role};
use barangay_persistence::{AccountRepo, NewResident, ResidentRepo, ResidentRow, StaffRepo, StaffRow};
use serde::{Deserialize, Serialize};

/// Registration form (field names follow the HTML form)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(rename = "first-name", default)]
    pub first_name: String,
    #[serde(rename = "last-name", default)]
    pub last_name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(rename = "civil-status", default)]
    pub civil_status: String,
    #[serde(rename = "birth-date", default)]
    pub birth_date: String,
    #[serde(rename = "contact-number", default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "confirm-password", default)]
    pub confirm_password: String,
    #[serde(default)]
    pub address: String,
}

impl RegisterForm {
    fn check_required(&self) -> Result<(), BusinessError> {
        let fields = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("age", &self.age),
            ("gender", &self.gender),
            ("civil status", &self.civil_status),
            ("birth date", &self.birth_date),
            ("contact number", &self.contact_number),
            ("email", &self.email),
            ("password", &self.password),
            ("confirm password", &self.confirm_password),
            ("address", &self.address),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(BusinessError::validation(format!("The {name} field is required"))),
            None => Ok(()),
        }
    }
}

/// Profile của actor hiện tại
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Resident(ResidentRow),
    Staff(StaffRow),
}

/// Auth Service - account lifecycle for all three roles
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Email đã được dùng ở bất kỳ role table nào chưa
    pub async fn email_taken(&self, email: &str) -> BusinessResult<bool> {
        for role in Role::ALL {
            if AccountRepo::email_exists(self.ctx.pool(), role, email)
                .await
                .context("Failed to check email")?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn hash_password(&self, password: &str) -> BusinessResult<String> {
        let password = password.to_string();
        let cost = self.ctx.bcrypt_cost();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("Password hashing task failed")??;
        Ok(hash)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> BusinessResult<bool> {
        let (password, hash) = (password.to_string(), hash.to_string());
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("Password verification task failed")??;
        Ok(matches)
    }

    /// Register a resident. The account starts offline (`is_active = false`).
    pub async fn register(&self, form: &RegisterForm) -> BusinessResult<i64> {
        form.check_required()?;

        let age: i64 = form
            .age
            .trim()
            .parse()
            .ok()
            .filter(|age| (0..=150).contains(age))
            .ok_or_else(|| BusinessError::validation("Age must be a number between 0 and 150"))?;
        let birth_date = parse_date(&form.birth_date)
            .map_err(|_| BusinessError::validation("Birth date must be in YYYY-MM-DD format"))?;

        if form.password != form.confirm_password {
            return Err(BusinessError::PasswordMismatch.into());
        }

        let email = form.email.trim().to_lowercase();
        if self.email_taken(&email).await? {
            return Err(BusinessError::EmailExists.into());
        }

        let resident = NewResident {
            first_name: text::title_case(&form.first_name),
            last_name: text::title_case(&form.last_name),
            age,
            gender: form.gender.trim().to_string(),
            birth_date: birth_date.to_string(),
            contact_number: form.contact_number.trim().to_string(),
            civil_status: form.civil_status.trim().to_string(),
            email,
            password_hash: self.hash_password(&form.password).await?,
            address: text::title_case(&form.address),
        };

        let id = match ResidentRepo::insert(self.ctx.pool(), &resident, time::now()).await {
            Ok(id) => id,
            Err(err) if err.is_unique_violation() => return Err(BusinessError::EmailExists.into()),
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to insert resident")),
        };

        tracing::info!(resident_id = id, "Resident registered");
        Ok(id)
    }

    /// Log in with email + password and mark the account online.
    pub async fn login(&self, email: &str, password: &str) -> BusinessResult<Actor> {
        let email = email.trim().to_lowercase();

        for role in Role::ALL {
            let Some(creds) = AccountRepo::find_credentials(self.ctx.pool(), role, &email)
                .await
                .context("Failed to look up account")?
            else {
                continue;
            };

            if role == Role::Resident {
                EligibilityGate::new(self.ctx).ensure_eligible(creds.id).await?;
            }

            if !self.verify_password(password, &creds.password).await? {
                tracing::info!(role = role.as_str(), id = creds.id, "Login rejected: incorrect password");
                return Err(BusinessError::IncorrectPassword.into());
            }

            AccountRepo::set_active(self.ctx.pool(), role, creds.id, true)
                .await
                .context("Failed to mark account active")?;

            let actor = Actor::new(creds.id, role);
            tracing::info!(actor = %actor, "Logged in");
            return Ok(actor);
        }

        Err(BusinessError::UnknownEmail.into())
    }

    /// Mark the actor offline
    pub async fn logout(&self, actor: Actor) -> BusinessResult<()> {
        AccountRepo::set_active(self.ctx.pool(), actor.role, actor.id, false)
            .await
            .context("Failed to mark account inactive")?;
        tracing::info!(actor = %actor, "Logged out");
        Ok(())
    }

    /// Create a secretary or treasurer account
    pub async fn create_staff(
        &self,
        role: Role,
        username: &str,
        email: &str,
        password: &str,
    ) -> BusinessResult<i64> {
        if !role.is_staff() {
            return Err(BusinessError::not_permitted(role.as_str(), "create_staff").into());
        }
        let username = username.trim();
        let email = email.trim().to_lowercase();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(BusinessError::validation("Username, email and password are required").into());
        }
        if self.email_taken(&email).await? {
            return Err(BusinessError::EmailExists.into());
        }

        let hash = self.hash_password(password).await?;
        let id = StaffRepo::insert(self.ctx.pool(), role, username, &email, &hash, time::now())
            .await
            .context("Failed to insert staff account")?;

        tracing::info!(role = role.as_str(), id, "Staff account created");
        Ok(id)
    }

    pub async fn current_profile(&self, actor: Actor) -> BusinessResult<Profile> {
        let profile = match actor.role {
            Role::Resident => Profile::Resident(
                ResidentRepo::get_by_id(self.ctx.pool(), actor.id)
                    .await
                    .map_err(|_| BusinessError::ResidentNotFound(actor.id))?,
            ),
            role => Profile::Staff(
                StaffRepo::get_by_id(self.ctx.pool(), role, actor.id)
                    .await
                    .context("Failed to load staff profile")?,
            ),
        };
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use barangay_persistence::{NewSanction, SanctionRepo};
    use chrono::Duration;

    fn form(email: &str) -> RegisterForm {
        RegisterForm {
            first_name: "maria".to_string(),
            last_name: "santos".to_string(),
            age: "28".to_string(),
            gender: "Female".to_string(),
            civil_status: "Single".to_string(),
            birth_date: "1996-02-10".to_string(),
            contact_number: "09181234567".to_string(),
            email: email.to_string(),
            password: "pa55word".to_string(),
            confirm_password: "pa55word".to_string(),
            address: "purok 3, san isidro".to_string(),
        }
    }

    fn business_error(err: &anyhow::Error) -> &BusinessError {
        err.downcast_ref::<BusinessError>().expect("business error")
    }

    #[tokio::test]
    async fn test_register_normalizes_fields() {
        let ctx = testing::context().await;
        let auth = AuthService::new(&ctx);

        let id = auth.register(&form("  Maria@Example.COM ")).await.unwrap();
        let row = ResidentRepo::get_by_id(ctx.pool(), id).await.unwrap();
        assert_eq!(row.full_name(), "Maria Santos");
        assert_eq!(row.email, "maria@example.com");
        assert_eq!(row.address, "Purok 3, San Isidro");
        assert!(!row.is_active);
        assert_ne!(row.password, "pa55word");
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let ctx = testing::context().await;
        let auth = AuthService::new(&ctx);
        testing::staff(&ctx, Role::Treasurer, "tres").await;

        let mut mismatch = form("a@example.com");
        mismatch.confirm_password = "other".to_string();
        let err = auth.register(&mismatch).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");

        // Taken by a staff account
        let err = auth.register(&form("tres@brgy.ph")).await.unwrap_err();
        assert!(matches!(business_error(&err), BusinessError::EmailExists));

        let mut missing = form("b@example.com");
        missing.address = " ".to_string();
        let err = auth.register(&missing).await.unwrap_err();
        assert_eq!(err.to_string(), "The address field is required");

        let mut bad_date = form("c@example.com");
        bad_date.birth_date = "10/02/1996".to_string();
        assert!(auth.register(&bad_date).await.is_err());
    }

    #[tokio::test]
    async fn test_login_flow() {
        let ctx = testing::context().await;
        let auth = AuthService::new(&ctx);
        let id = auth.register(&form("maria@example.com")).await.unwrap();

        let err = auth.login("nobody@example.com", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Email does not exist");

        let err = auth.login("maria@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect password");

        let actor = auth.login("maria@example.com", "pa55word").await.unwrap();
        assert_eq!(actor, Actor::resident(id));
        assert!(ResidentRepo::get_by_id(ctx.pool(), id).await.unwrap().is_active);

        auth.logout(actor).await.unwrap();
        assert!(!ResidentRepo::get_by_id(ctx.pool(), id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_sanction_checked_before_password() {
        let ctx = testing::context().await;
        let auth = AuthService::new(&ctx);
        let id = auth.register(&form("maria@example.com")).await.unwrap();
        let secretary_id = testing::staff(&ctx, Role::Secretary, "sec").await;

        let now = time::now();
        SanctionRepo::insert(
            ctx.pool(),
            &NewSanction {
                resident_id: id,
                issued_by: secretary_id,
                issued_at: now,
                expires_at: now + Duration::hours(1),
                reason: "Vandalism".to_string(),
            },
        )
        .await
        .unwrap();

        let err = auth.login("maria@example.com", "wrong").await.unwrap_err();
        assert!(matches!(business_error(&err), BusinessError::Sanctioned { .. }));
        assert!(err.to_string().contains("Reason:\"Vandalism\""));
    }

    #[tokio::test]
    async fn test_staff_accounts() {
        let ctx = testing::context().await;
        let auth = AuthService::new(&ctx);

        let err = auth
            .create_staff(Role::Resident, "x", "x@brgy.ph", "pw")
            .await
            .unwrap_err();
        assert!(matches!(business_error(&err), BusinessError::OperationNotPermitted { .. }));

        let id = auth
            .create_staff(Role::Secretary, "Ana", "Ana@Brgy.ph", "pw")
            .await
            .unwrap();
        let actor = auth.login("ana@brgy.ph", "pw").await.unwrap();
        assert_eq!(actor, Actor::secretary(id));

        match auth.current_profile(actor).await.unwrap() {
            Profile::Staff(row) => assert_eq!(row.username, "Ana"),
            other => panic!("unexpected profile: {other:?}"),
        }
    }
}
