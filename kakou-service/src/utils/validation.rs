use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use service_core::error::{AppError, FieldError};
use validator::{Validate, ValidationErrors};

/// Deserialize a JSON object body into `T`.
///
/// A field in `order` whose value alone fails to deserialize is reported as
/// invalid; a body that is not an object is a plain bad request.
pub fn decode_fields<T: DeserializeOwned>(body: Value, resource: &str, order: &[&str]) -> Result<T, AppError> {
    let Value::Object(fields) = body else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Problems parsing JSON: expected an object"
        )));
    };

    for &field in order {
        let Some(value) = fields.get(field) else {
            continue;
        };
        let lone = Map::from_iter([(field.to_string(), value.clone())]);
        if serde_json::from_value::<T>(Value::Object(lone)).is_err() {
            return Err(AppError::Validation(FieldError::invalid(resource, field)));
        }
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Problems parsing JSON: {}", e)))
}

/// Validate `value`, reporting the first failing field in `order`.
///
/// `required`/`length` failures read as a missing field, anything else as invalid.
/// Failures on fields outside `order` are reported against `body`.
pub fn validate_fields<T: Validate>(value: &T, resource: &str, order: &[&str]) -> Result<(), AppError> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(AppError::Validation(first_field_error(&errors, resource, order))),
    }
}

fn first_field_error(errors: &ValidationErrors, resource: &str, order: &[&str]) -> FieldError {
    let fields = errors.field_errors();

    let failing = order.iter().copied().find(|field| fields.contains_key(*field));

    let Some(field) = failing else {
        return FieldError::invalid(resource, "body");
    };

    let missing = fields
        .get(field)
        .map(|errs| errs.iter().any(|e| e.code == "required" || e.code == "length"))
        .unwrap_or(false);

    if missing {
        FieldError::missing(resource, field)
    } else {
        FieldError::invalid(resource, field)
    }
}
