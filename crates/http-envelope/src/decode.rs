//! Content negotiation for response bodies

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::{HttpError, Response};
use crate::mime::MimeType;

/// Body decoders known to this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Json,
}

impl Decoder {
    /// `application/json` and any `+json` structured syntax suffix
    fn for_mime(mime: &MimeType) -> Option<Self> {
        let plain_json = mime.type_name() == Some("application") && mime.subtype() == Some("json");
        if plain_json || mime.suffix() == Some("json") {
            return Some(Decoder::Json);
        }
        None
    }
}

/// Decode the envelope body according to its content type
///
/// The envelope's own type is used when a decoder exists for it, otherwise
/// `default_type`. Without either the call fails with
/// [`HttpError::NoContentType`], or [`HttpError::UnsupportedContentType`]
/// when the envelope named a type nothing can decode.
pub fn decode(envelope: &Envelope, default_type: Option<&str>) -> Response<Value> {
    let parsed = envelope.mime();
    let fallback = default_type
        .map(MimeType::parse)
        .filter(|mime| !mime.is_empty());

    let effective = if Decoder::for_mime(parsed).is_some() {
        parsed
    } else if let Some(fallback) = fallback.as_ref() {
        fallback
    } else if let Some(essence) = parsed.essence() {
        return Err(HttpError::UnsupportedContentType(essence));
    } else {
        return Err(HttpError::NoContentType);
    };

    match Decoder::for_mime(effective) {
        Some(Decoder::Json) => decode_json(envelope, false),
        None => Err(HttpError::UnsupportedContentType(
            effective.essence().unwrap_or_default(),
        )),
    }
}

/// Parse the body as JSON
///
/// With `associative` set, every object in the result iterates its keys in
/// sorted order; otherwise objects keep the order of the document.
pub fn decode_json(envelope: &Envelope, associative: bool) -> Response<Value> {
    let value: Value = parse(envelope)?;
    Ok(if associative { sort_keys(value) } else { value })
}

/// Parse a JSON body into `T`
pub fn decode_as<T: DeserializeOwned>(envelope: &Envelope) -> Response<T> {
    parse(envelope)
}

fn parse<T: DeserializeOwned>(envelope: &Envelope) -> Response<T> {
    let payload = envelope.payload().unwrap_or_default();
    serde_json::from_slice(payload).map_err(|err| {
        tracing::warn!(
            id = envelope.id(),
            status = envelope.status_code(),
            payload = %String::from_utf8_lossy(payload),
            "Could not decode JSON response body: {err}"
        );
        HttpError::decode(&err)
    })
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
