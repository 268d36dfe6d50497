use crate::application::error::HttpError;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Fragment shown when a notification could not be delivered.
#[derive(Template)]
#[template(path = "partials/notification_error.html")]
pub struct NotificationErrorTemplate<'a> {
    pub recipient_email: &'a str,
    pub subject: &'a str,
    pub details: &'a str,
}

pub struct NotifyView {
    pub user_name: String,
    pub role: String,
    pub document: String,
    pub logs: Vec<String>,
}

#[derive(Template)]
#[template(path = "notify.html")]
pub struct NotifyTemplate {
    pub view: NotifyView,
}

pub struct NotificationRowView {
    pub recipient_email: String,
    pub document_title: String,
    pub subject: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub created_at: String,
    pub sent_at: String,
}

pub struct NotificationListView {
    pub rows: Vec<NotificationRowView>,
    pub total_sent: u64,
    pub total_failed: u64,
}

#[derive(Template)]
#[template(path = "notifications/list.html")]
pub struct NotificationListTemplate {
    pub view: NotificationListView,
}

#[derive(Default)]
pub struct RecipientUploadView {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "recipients/upload.html")]
pub struct RecipientUploadTemplate {
    pub view: RecipientUploadView,
}

pub struct FlashView {
    pub level: &'static str,
    pub text: String,
}

pub struct RecipientRowView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct RecipientPreviewView {
    pub flash: Option<FlashView>,
    pub recipients: Vec<RecipientRowView>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub previous_page: Option<usize>,
    pub next_page: Option<usize>,
}

#[derive(Template)]
#[template(path = "recipients/preview.html")]
pub struct RecipientPreviewTemplate {
    pub view: RecipientPreviewView,
}
