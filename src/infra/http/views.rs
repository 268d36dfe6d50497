//! HTML routes.

use axum::{
    Router,
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{error, warn};

use crate::{
    application::{
        actions::upload_document,
        activity::read_activity_log,
        error::HttpError,
        metadata::fetch_all_metadata,
        notifications::NotificationError,
        recipients::{FlashLevel, RecipientUploadError},
    },
    domain::{
        documents::format_utc_timestamp,
        entities::NotificationRecord,
        users::{Actor, create_user},
    },
    presentation::views::{
        FlashView, NotificationListTemplate, NotificationListView, NotificationRowView,
        NotifyTemplate, NotifyView, RecipientPreviewTemplate, RecipientPreviewView,
        RecipientRowView, RecipientUploadTemplate, RecipientUploadView, render_template_response,
    },
};

use super::{HttpState, repo_error_to_http, session::CurrentSession};

const SOURCE: &str = "infra::http::views";
const CSV_FIELD: &str = "csv_file";

/// Pages that do not touch the visitor's session.
pub fn build_view_router() -> Router<HttpState> {
    Router::new()
        .route("/", get(notify))
        .route("/notify/", get(notify))
        .route("/notifications/", get(notification_list))
}

/// Recipient upload and preview, both backed by the session.
pub fn build_recipient_router() -> Router<HttpState> {
    Router::new()
        .route(
            "/recipients/upload/",
            get(recipient_upload_form).post(recipient_upload),
        )
        .route("/recipients/preview/", get(recipient_preview))
}

async fn notify(State(state): State<HttpState>) -> Response {
    let demo = &state.notify;
    let user = create_user(&demo.actor_kind, demo.actor_name.clone());
    upload_document(state.notifier.clone()).call(&user, demo.document_name.as_str());

    let logs = match read_activity_log(&demo.activity_log).await {
        Ok(lines) => lines,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Activity log could not be read",
                &err,
            )
            .into_response();
        }
    };

    if let Some(fetcher) = &state.metadata {
        if let Err(err) = fetch_all_metadata(fetcher.as_ref(), &demo.metadata_ids).await {
            warn!(
                target = "notifier::http::views",
                error = %err,
                "document metadata fetch failed"
            );
        }
    }

    render_template_response(
        NotifyTemplate {
            view: NotifyView {
                user_name: user.name().to_string(),
                role: user.role().to_string(),
                document: demo.document_name.clone(),
                logs,
            },
        },
        StatusCode::OK,
    )
}

async fn notification_list(State(state): State<HttpState>) -> Response {
    let listing = match state.notifications.list_with_totals().await {
        Ok(listing) => listing,
        Err(NotificationError::Repo(err)) => {
            return repo_error_to_http(SOURCE, err).into_response();
        }
        Err(err) => return HttpError::internal(SOURCE, &err).into_response(),
    };

    let view = NotificationListView {
        rows: listing.notifications.iter().map(notification_row).collect(),
        total_sent: listing.total_sent,
        total_failed: listing.total_failed,
    };
    render_template_response(NotificationListTemplate { view }, StatusCode::OK)
}

fn notification_row(record: &NotificationRecord) -> NotificationRowView {
    let timestamp = |value: OffsetDateTime| {
        format_utc_timestamp(value).unwrap_or_else(|err| {
            error!(target = "notifier::http::views", error = %err, "timestamp formatting failed");
            String::new()
        })
    };

    NotificationRowView {
        recipient_email: record.recipient_email.clone(),
        document_title: record.document_title.clone().unwrap_or_default(),
        subject: record.subject.clone(),
        status: record.status.as_str(),
        status_label: record.status.label(),
        created_at: timestamp(record.created_at),
        sent_at: record.sent_at.map(&timestamp).unwrap_or_default(),
    }
}

async fn recipient_upload_form() -> Response {
    render_template_response(
        RecipientUploadTemplate {
            view: RecipientUploadView::default(),
        },
        StatusCode::OK,
    )
}

async fn recipient_upload(
    State(state): State<HttpState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_csv_field(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match state.recipients.import(session, upload.as_deref()) {
        Ok(_) => Redirect::to("/recipients/preview/").into_response(),
        Err(RecipientUploadError::Session(err)) => {
            HttpError::internal(SOURCE, &err).into_response()
        }
        Err(err) => render_template_response(
            RecipientUploadTemplate {
                view: RecipientUploadView {
                    error: Some(err.to_string()),
                },
            },
            StatusCode::BAD_REQUEST,
        ),
    }
}

/// Bytes of the `csv_file` field, or `None` when the form did not include a file.
async fn read_csv_field(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, Response> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(CSV_FIELD) {
                    continue;
                }
                let has_file = field
                    .file_name()
                    .is_some_and(|name| !name.trim().is_empty());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                return Ok((has_file || !bytes.is_empty()).then(|| bytes.to_vec()));
            }
            Ok(None) => return Ok(None),
            Err(err) => return Err(multipart_error(err)),
        }
    }
}

fn multipart_error(err: axum_extra::extract::multipart::MultipartError) -> Response {
    let status = err.status();
    error!(
        target = "notifier::http::views",
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Uploaded file is too large"
    } else {
        "Upload could not be read"
    };
    HttpError::new(SOURCE, status, message, err.body_text()).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreviewQuery {
    page: Option<String>,
}

async fn recipient_preview(
    State(state): State<HttpState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let page = state.recipients.preview(session, query.page.as_deref());
    let flash = state
        .recipients
        .take_flash(session)
        .map(|flash| FlashView {
            level: match flash.level {
                FlashLevel::Success => "success",
                FlashLevel::Error => "error",
            },
            text: flash.text,
        });

    let view = RecipientPreviewView {
        flash,
        number: page.number,
        num_pages: page.num_pages,
        total: page.total,
        previous_page: page.previous_page_number(),
        next_page: page.next_page_number(),
        recipients: page
            .items
            .into_iter()
            .map(|recipient| RecipientRowView {
                email: recipient.email,
                first_name: recipient.first_name,
                last_name: recipient.last_name,
            })
            .collect(),
    };
    render_template_response(RecipientPreviewTemplate { view }, StatusCode::OK)
}
