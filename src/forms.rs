// Support chat and callback forms: validation and the outbound post

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header::ACCEPT, Client};
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

// +7 / 8 followed by ten digits. The operator code may sit in brackets with
// spaces around them, as in "+7 (912) 345-67-89".
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[78][\s(]*\d{3}[)\s]*\d{3}[\s-]?\d{2}[\s-]?\d{2}$").expect("phone pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

/// Preferred call-back windows offered by the callback form.
pub const CALLBACK_SLOTS: [(&str, &str); 3] = [
    ("10:00-13:00", "Утро (10:00-13:00)"),
    ("13:00-17:00", "День (13:00-17:00)"),
    ("17:00-20:00", "Вечер (17:00-20:00)"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub name: String,
    /// Email or phone number; the chat widget accepts either.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("form endpoint is not configured")]
    NotConfigured,
    #[error("form endpoint answered with status {0}")]
    Rejected(u16),
    #[error("could not reach the form endpoint: {0}")]
    Network(#[from] reqwest::Error),
}

impl SubmissionError {
    /// Alert text for the visitor.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionError::Invalid(message) => message,
            SubmissionError::NotConfigured | SubmissionError::Rejected(_) => "Ошибка отправки. Попробуйте позже.",
            SubmissionError::Network(_) => "Не удалось отправить сообщение. Проверьте подключение.",
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), SubmissionError>;
}

impl Validate for ChatForm {
    fn validate(&self) -> Result<(), SubmissionError> {
        if self.name.trim().is_empty() {
            return Err(SubmissionError::Invalid("Укажите ваше имя"));
        }
        if !is_valid_email(&self.email) && !is_valid_phone(&self.email) {
            return Err(SubmissionError::Invalid("Укажите корректный email или телефон"));
        }
        if self.message.trim().is_empty() {
            return Err(SubmissionError::Invalid("Напишите сообщение"));
        }
        Ok(())
    }
}

impl Validate for CallbackForm {
    fn validate(&self) -> Result<(), SubmissionError> {
        if self.name.trim().is_empty() {
            return Err(SubmissionError::Invalid("Укажите ваше имя"));
        }
        if !is_valid_phone(&self.phone) {
            return Err(SubmissionError::Invalid("Укажите корректный номер телефона"));
        }
        if let Some(slot) = self.time.as_deref().filter(|t| !t.is_empty()) {
            if !CALLBACK_SLOTS.iter().any(|(value, _)| *value == slot) {
                return Err(SubmissionError::Invalid("Выберите время из списка"));
            }
        }
        Ok(())
    }
}

/// Posts validated forms to the third-party form endpoint. One attempt,
/// no retry; success is any 2xx answer.
#[derive(Debug, Clone)]
pub struct FormSubmitter {
    client: Client,
    endpoint: Option<String>,
}

impl FormSubmitter {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        }
    }

    pub async fn submit<F: Validate + Serialize>(&self, form: &F) -> Result<(), SubmissionError> {
        form.validate()?;
        let endpoint = self.endpoint.as_deref().ok_or(SubmissionError::NotConfigured)?;

        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Form endpoint rejected a submission");
            return Err(SubmissionError::Rejected(status.as_u16()));
        }
        tracing::info!("Form submitted to the support endpoint");
        Ok(())
    }
}
