use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("valid phone regex"));

/// Access role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(DomainError::Validation(format!("Unknown role: {other}"))),
        }
    }
}

/// Vehicle details a driver advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
}

/// User entity - a rider, a driver, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub is_driver: bool,
    pub vehicle: Option<VehicleInfo>,
    pub role: UserRole,
    pub rating: f64,
    pub total_rides: u32,
    pub active: bool,
    #[serde(skip_serializing)]
    pub push_subscription: Option<serde_json::Value>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when registering.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_driver: bool,
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub vehicle: Option<VehicleInfo>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    ///
    /// The profile is normalized (trimmed name, lowercased email) and validated;
    /// `password_hash` must already be hashed.
    pub fn new(profile: NewUser, password_hash: String) -> Result<Self, DomainError> {
        let now = Utc::now();
        let user = Self {
            id: Uuid::new_v4(),
            name: profile.name.trim().to_string(),
            email: normalize_email(&profile.email),
            password_hash,
            phone: profile.phone.trim().to_string(),
            is_driver: profile.is_driver,
            vehicle: None,
            role: UserRole::User,
            rating: 0.0,
            total_rides: 0,
            active: true,
            push_subscription: None,
            password_reset_token: None,
            password_reset_expires: None,
            password_changed_at: None,
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::Validation("Please tell us your name".into()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::Validation(
                "Name cannot be more than 50 characters".into(),
            ));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(DomainError::Validation("Please provide a valid email".into()));
        }
        if !PHONE_RE.is_match(&self.phone) {
            return Err(DomainError::Validation(
                "Please provide a valid phone number".into(),
            ));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(DomainError::Validation(
                "Rating must be between 0 and 5".into(),
            ));
        }
        Ok(())
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Apply self-service profile edits and re-validate.
    pub fn apply_profile(&mut self, changes: ProfileChanges) -> Result<(), DomainError> {
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if let Some(phone) = changes.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(vehicle) = changes.vehicle {
            self.vehicle = Some(vehicle);
        }
        self.validate()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replace the stored hash and invalidate outstanding reset tokens.
    pub fn set_password_hash(&mut self, hash: String) {
        let now = Utc::now();
        self.password_hash = hash;
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.password_changed_at = Some(now);
        self.updated_at = now;
    }

    /// True when the password changed after a token issued at
    /// `issued_at_ms` (unix milliseconds).
    pub fn changed_password_after(&self, issued_at_ms: i64) -> bool {
        self.password_changed_at
            .map(|changed| changed.timestamp_millis() > issued_at_ms)
            .unwrap_or(false)
    }

    /// Running mean over all ratings received so far.
    pub fn apply_rating(&mut self, score: u8) {
        let total = f64::from(self.total_rides);
        self.rating = (self.rating * total + f64::from(score)) / (total + 1.0);
        self.total_rides += 1;
        self.updated_at = Utc::now();
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    Ok(())
}

/// Mask the local part of an email address for logging.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> NewUser {
        NewUser {
            name: "  Abebe Kebede ".into(),
            email: "Abebe@Example.COM".into(),
            phone: "+251911000000".into(),
            is_driver: false,
        }
    }

    #[test]
    fn test_new_user_normalizes_profile() {
        let user = User::new(profile(), "hash".into()).unwrap();
        assert_eq!(user.name, "Abebe Kebede");
        assert_eq!(user.email, "abebe@example.com");
        assert!(user.active);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.total_rides, 0);
    }

    #[test]
    fn test_rejects_invalid_phone_and_email() {
        let mut p = profile();
        p.phone = "0123".into();
        assert!(matches!(
            User::new(p, "hash".into()),
            Err(DomainError::Validation(_))
        ));

        let mut p = profile();
        p.email = "not-an-email".into();
        assert!(User::new(p, "hash".into()).is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_running_mean_rating() {
        let mut user = User::new(profile(), "hash".into()).unwrap();
        user.apply_rating(4);
        assert_eq!(user.rating, 4.0);
        assert_eq!(user.total_rides, 1);

        user.apply_rating(5);
        assert!((user.rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(user.total_rides, 2);

        user.apply_rating(3);
        assert!((user.rating - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new(profile(), "secret-hash".into()).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_changed_password_after() {
        let mut user = User::new(profile(), "hash".into()).unwrap();
        assert!(!user.changed_password_after(0));
        user.set_password_hash("new".into());
        let changed = user.password_changed_at.unwrap().timestamp_millis();
        assert!(user.changed_password_after(changed - 10_000));
        assert!(!user.changed_password_after(changed + 10_000));
    }

    #[test]
    fn test_token_from_same_second_before_change_is_stale() {
        let mut user = User::new(profile(), "hash".into()).unwrap();
        user.set_password_hash("new".into());
        let changed = user.password_changed_at.unwrap().timestamp_millis();

        // Minted a moment before the change, possibly within the same second.
        assert!(user.changed_password_after(changed - 1));
        // A token issued alongside the change stays valid.
        assert!(!user.changed_password_after(changed));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("abebe@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("nope"), "***");
    }
}
