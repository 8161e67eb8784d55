use mist_shell_core::{
    append_protocol_log,
    protocol_gate::{GateOutcome, ProtocolRequest},
    shell_locale, DEFAULT_SHELL_LOCALE, SWARM_SCHEME,
};
use tauri::{
    http::{header, Request, Response, StatusCode},
    AppHandle, Manager, UriSchemeResponder,
};

use crate::{error_dialog, ShellServices, WINDOWS_SCHEME_HOST_SUFFIX};

/// Windows webviews deliver custom-scheme requests as
/// `http://<scheme>.localhost/<rest>`; map those back to `<scheme>://<rest>`.
pub(crate) fn scheme_url_from_request_uri(scheme: &str, uri: &str) -> String {
    let host = format!("{scheme}{WINDOWS_SCHEME_HOST_SUFFIX}/");
    for prefix in ["http://", "https://"] {
        if let Some(rest) = uri
            .strip_prefix(prefix)
            .and_then(|without_prefix| without_prefix.strip_prefix(host.as_str()))
        {
            return format!("{scheme}://{rest}");
        }
    }
    uri.to_string()
}

fn error_response(message: &str) -> Response<Vec<u8>> {
    let mut response = Response::new(message.as_bytes().to_vec());
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    if let Ok(value) = header::HeaderValue::from_str("text/plain; charset=utf-8") {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

pub(crate) fn outcome_response(outcome: &GateOutcome) -> Response<Vec<u8>> {
    match outcome {
        GateOutcome::Forward(forwarded) => Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, forwarded.url.as_str())
            .body(Vec::new())
            .unwrap_or_else(|error| {
                error_response(&format!(
                    "Failed to build redirect to {}: {error}",
                    forwarded.url
                ))
            }),
        GateOutcome::Error(message) => error_response(message),
    }
}

pub(crate) fn handle_swarm_request(
    app_handle: &AppHandle,
    request: Request<Vec<u8>>,
    responder: UriSchemeResponder,
) {
    let url = scheme_url_from_request_uri(SWARM_SCHEME, &request.uri().to_string());
    let Some(services) = app_handle.try_state::<ShellServices>() else {
        append_protocol_log(&format!("{url} requested before services were ready"));
        let texts = shell_locale::shell_texts_for_locale(DEFAULT_SHELL_LOCALE);
        responder.respond(error_response(texts.swarm_not_enabled));
        return;
    };

    let referrer = request
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let protocol_request = ProtocolRequest {
        method: request.method().to_string(),
        referrer,
        url,
    };

    let dialog_handle = app_handle.clone();
    let root_dir = services.root_dir.clone();
    services.gate.handle(
        protocol_request,
        Box::new(move |outcome: GateOutcome| {
            if let GateOutcome::Error(message) = &outcome {
                let locale = shell_locale::resolve_shell_locale(DEFAULT_SHELL_LOCALE, root_dir);
                let texts = shell_locale::shell_texts_for_locale(locale);
                error_dialog::show_error_dialog(&dialog_handle, texts.swarm_error_title, message);
            }
            responder.respond(outcome_response(&outcome));
        }),
    );
}
