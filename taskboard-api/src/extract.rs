/// Request extractors and serde helpers
///
/// [`ValidatedJson`] replaces `axum::Json` for request bodies: malformed JSON,
/// missing fields and `validator` rule failures all become 400 validation
/// errors in the API error format. [`IdPath`] replaces `axum::extract::Path`
/// so an id that does not parse is a JSON 404 like any other unknown id.

use crate::error::{ApiError, ValidationErrorDetail, NON_FIELD_ERRORS};
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

/// JSON body that has been deserialized and validated
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate().map_err(validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => data_error(&err.body_text()),
        other => ApiError::validation(NON_FIELD_ERRORS, other.body_text()),
    }
}

/// Attributes a deserialization failure to the field serde names
///
/// Axum reports `<summary>: [<path>: ]<serde message> at line L column C`.
fn data_error(text: &str) -> ApiError {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail
        .rfind(" at line ")
        .map_or(detail, |end| &detail[..end]);

    if let Some(field) = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return ApiError::validation(field, "This field is required.");
    }

    match detail.split_once(": ") {
        Some((path, message)) if is_field_path(path) => ApiError::validation(path, message),
        _ => ApiError::validation(NON_FIELD_ERRORS, detail),
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// Path parameters; a value that fails to parse is reported as not found
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(IdPath(value))
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => {
            ApiError::NotFound("Not found.".to_string())
        }
        other => ApiError::InternalError(other.body_text()),
    }
}

/// Flattens `validator` errors into field/message pairs, sorted by field
pub fn validation_errors(errors: ValidationErrors) -> ApiError {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    ApiError::ValidationError(details)
}

/// Deserializes a present field into `Some`, keeping `null` distinguishable
/// from an absent key
///
/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>` field: absent is `None`, `null` is `Some(None)`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Rejects strings that are empty or only whitespace
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut error = validator::ValidationError::new("blank");
        error.message = Some("This field may not be blank.".into());
        return Err(error);
    }
    Ok(())
}

/// Rejects optional partial-update fields that are present but blank
///
/// `length(min = 1)` alone lets whitespace through on `Option<String>`.
pub fn reject_blank(fields: &[(&str, Option<&str>)]) -> Result<(), ApiError> {
    let details: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))
        .map(|(field, _)| ValidationErrorDetail {
            field: field.to_string(),
            message: "This field may not be blank.".to_string(),
        })
        .collect();

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}
