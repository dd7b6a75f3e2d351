use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignupMethod {
    #[default]
    Direct,
    Google,
    Github,
    Other,
}

impl SignupMethod {
    /// Missing values mean a direct sign-up; unrecognized ones become `Other`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("direct") => SignupMethod::Direct,
            Some("google") => SignupMethod::Google,
            Some("github") => SignupMethod::Github,
            _ => SignupMethod::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignupMethod::Direct => "direct",
            SignupMethod::Google => "google",
            SignupMethod::Github => "github",
            SignupMethod::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Enterprise,
    Consumer,
}

impl UserType {
    /// Enterprise when the email's domain is one of `enterprise_domains`.
    pub fn classify(email: &str, enterprise_domains: &[String]) -> Self {
        let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
        if enterprise_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
        {
            UserType::Enterprise
        } else {
            UserType::Consumer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Enterprise => "enterprise",
            UserType::Consumer => "consumer",
        }
    }
}

/// A validated sign-up request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub signup_method: SignupMethod,
    pub user_type: UserType,
}

/// A registered user. The email is stored but never used as a metric label.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub signup_method: SignupMethod,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn create(new: NewUser) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            email: new.email,
            signup_method: new.signup_method,
            user_type: new.user_type,
            created_at: Utc::now(),
        }
    }
}

/// Lower-cases and trims an email, returning `None` unless it has the shape
/// `local@domain` with a dot in the domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_ascii_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    valid.then_some(email)
}
