use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{HttpResponse, TfeError};

/// Maps a settled response onto success or one of the classified errors.
///
/// Any 2xx is success. 401 and 404 are terminal classifications; every other
/// status is [`TfeError::BadStatus`].
pub(crate) fn classify_status(response: &HttpResponse) -> Result<(), TfeError> {
    let status = response.status;
    match status.as_u16() {
        200..=299 => Ok(()),
        401 => Err(TfeError::Unauthorized),
        404 => Err(TfeError::NotFound),
        code => Err(TfeError::BadStatus {
            status: code,
            body: response.body_text(),
        }),
    }
}

/// Decodes a JSON body into `T`.
///
/// An empty body (e.g. `204 No Content`) is decoded as JSON `null`, which
/// satisfies `()` and `Option<_>` targets.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TfeError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };

    serde_json::from_slice::<T>(body).map_err(|err| {
        TfeError::Decode(format!(
            "invalid JSON:API response: {err}; body: {}",
            body_excerpt(body)
        ))
    })
}

/// Longest body prefix quoted in a [`TfeError::Decode`] message.
const BODY_EXCERPT_LIMIT: usize = 512;

fn body_excerpt(body: &[u8]) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return String::from_utf8_lossy(body).into_owned();
    }
    let excerpt = String::from_utf8_lossy(&body[..BODY_EXCERPT_LIMIT]);
    format!(
        "{}... ({} bytes total)",
        excerpt.trim_end_matches('\u{FFFD}'),
        body.len()
    )
}

pub(crate) fn encode_body<T: Serialize>(payload: &T) -> Result<Vec<u8>, TfeError> {
    serde_json::to_vec(payload)
        .map_err(|err| TfeError::Encode(format!("could not serialize request body: {err}")))
}
