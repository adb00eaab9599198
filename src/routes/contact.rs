// Chat widget and callback form submissions

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Form,
};

use super::render;
use crate::{
    booking::generate_booking_id,
    error::AppResult,
    forms::{CallbackForm, ChatForm, SubmissionError},
    views::{callback_slots, SelectOption},
    AppState,
};

const CHAT_THANKS: &str = "Спасибо! Мы скоро свяжемся с вами.";
const CALLBACK_THANKS: &str = "Спасибо! Мы свяжемся с вами в ближайшее время.";

/// Outcome page. On failure the submitted form is shown again, filled in,
/// next to the alert.
#[derive(Template)]
#[template(path = "contact_result.html")]
struct ContactResultTemplate {
    success: bool,
    message: String,
    reference: Option<String>,
    chat: Option<ChatForm>,
    callback: Option<CallbackForm>,
    callback_slots: Vec<SelectOption>,
}

fn failure_status(error: &SubmissionError) -> StatusCode {
    match error {
        SubmissionError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::NotConfigured | SubmissionError::Rejected(_) | SubmissionError::Network(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

pub async fn submit_chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> AppResult<impl IntoResponse> {
    let (status, template) = match state.forms.submit(&form).await {
        Ok(()) => (
            StatusCode::OK,
            ContactResultTemplate {
                success: true,
                message: CHAT_THANKS.to_string(),
                reference: None,
                chat: None,
                callback: None,
                callback_slots: callback_slots(None),
            },
        ),
        Err(e) => {
            tracing::warn!("Chat message not delivered: {}", e);
            (
                failure_status(&e),
                ContactResultTemplate {
                    success: false,
                    message: e.user_message().to_string(),
                    reference: None,
                    chat: Some(form),
                    callback: None,
                    callback_slots: callback_slots(None),
                },
            )
        }
    };
    Ok((status, render(&template)?))
}

pub async fn submit_callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> AppResult<impl IntoResponse> {
    let (status, template) = match state.forms.submit(&form).await {
        Ok(()) => {
            let reference = generate_booking_id();
            tracing::info!(%reference, "Callback requested");
            (
                StatusCode::OK,
                ContactResultTemplate {
                    success: true,
                    message: CALLBACK_THANKS.to_string(),
                    reference: Some(reference),
                    chat: None,
                    callback: None,
                    callback_slots: callback_slots(None),
                },
            )
        }
        Err(e) => {
            tracing::warn!("Callback request not delivered: {}", e);
            let slots = callback_slots(form.time.as_deref());
            (
                failure_status(&e),
                ContactResultTemplate {
                    success: false,
                    message: e.user_message().to_string(),
                    reference: None,
                    chat: None,
                    callback: Some(form),
                    callback_slots: slots,
                },
            )
        }
    };
    Ok((status, render(&template)?))
}
