use crate::auth::AdminSession;
use crate::impl_from_service_err;
use crate::routes::proxy::{proxy_err, proxy_val, Proxied, ResponseProxy};
use crate::serve::AppState;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use billboard_rs::api::upload::{
    Response as UResponse, FIELD_EXPIRES_AT, FIELD_FILE, FIELD_PATH, FIELD_SCHEDULED_AT,
};
use billboard_rs::util::chrono::parse_optional_schedule_time;
use http::StatusCode;

fn multipart_response(err: MultipartError) -> ResponseProxy<UResponse> {
    let response = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UResponse::TooLarge
    } else {
        UResponse::Invalid {
            reason: err.body_text(),
        }
    };
    proxy_err::<_, UResponse>(response)
}

impl_from_service_err!(UResponse, Invalid => Invalid);
#[tracing::instrument(skip(state, _session, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> Proxied<UResponse> {
    let mut file: Option<Bytes> = None;
    let mut path: Option<String> = None;
    let mut scheduled_at: Option<String> = None;
    let mut expires_at: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_response)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FIELD_FILE) => file = Some(field.bytes().await.map_err(multipart_response)?),
            Some(FIELD_PATH) => path = Some(field.text().await.map_err(multipart_response)?),
            Some(FIELD_SCHEDULED_AT) => {
                scheduled_at = Some(field.text().await.map_err(multipart_response)?)
            }
            Some(FIELD_EXPIRES_AT) => {
                expires_at = Some(field.text().await.map_err(multipart_response)?)
            }
            other => tracing::debug!("ignoring multipart field {other:?}"),
        }
    }

    let (Some(file), Some(path)) = (file, path) else {
        return Err(proxy_err(UResponse::Invalid {
            reason: "missing file or path in form data".to_string(),
        }));
    };
    let parse = |raw: Option<String>| {
        parse_optional_schedule_time(raw.as_deref()).map_err(|e| {
            proxy_err::<_, UResponse>(UResponse::Invalid {
                reason: e.to_string(),
            })
        })
    };
    let scheduled_at = parse(scheduled_at)?;
    let expires_at = parse(expires_at)?;

    let image = state
        .service()
        .upload(&path, &file, scheduled_at, expires_at)
        .await
        .map_err(proxy_err)?;
    proxy_val(UResponse::Ok {
        url: image.url.clone(),
        image,
    })
}
