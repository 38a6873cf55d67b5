use std::collections::HashMap;

use serde_json::Value;

use super::error::ApiError;
use super::schema::Uuid;

pub type FormData = HashMap<String, Value>;

/// Loosely-typed request payload, as handed over by the serving layer.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: TryFrom<Value, Error = ApiError>,
    {
        match self.inner.get(key) {
            Some(value) => value.to_owned().try_into(),
            None => Err(ApiError::Validation(format!("Missing field `{key}`"))),
        }
    }

    /// Integer fields arrive either as JSON numbers or as numeric strings.
    pub fn get_number(&self, key: &str) -> Result<i32, ApiError> {
        let invalid = || ApiError::Validation(format!("Field `{key}` must be an integer"));

        match self.inner.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(invalid),
            Some(Value::String(s)) => s.parse().map_err(|_| invalid()),
            Some(_) => Err(invalid()),
            None => Err(ApiError::Validation(format!("Missing field `{key}`"))),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ApiError> {
        match self.inner.get(key).and_then(Value::as_str) {
            Some(v) => Ok(v.to_string()),
            None => Err(ApiError::Validation(format!(
                "Missing string field `{key}`"
            ))),
        }
    }

    pub fn get_opt_str(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, ApiError>
    where
        T: TryFrom<Value, Error = ApiError>,
    {
        match self.inner.get(key) {
            Some(Value::Array(items)) => items.iter().cloned().map(T::try_from).collect(),
            Some(_) => Err(ApiError::Validation(format!("Field `{key}` must be a list"))),
            None => Err(ApiError::Validation(format!("Missing field `{key}`"))),
        }
    }

    /// List of raw foreign-key ids, e.g. the `tags` field of a recipe payload.
    pub fn get_id_list(&self, key: &str) -> Result<Vec<Uuid>, ApiError> {
        let invalid = || ApiError::Validation(format!("Field `{key}` must be a list of ids"));

        match self.inner.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_i64()
                        .and_then(|id| Uuid::try_from(id).ok())
                        .ok_or_else(invalid)
                })
                .collect(),
            Some(_) => Err(invalid()),
            None => Err(ApiError::Validation(format!("Missing field `{key}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        let data = value.as_object().unwrap().clone().into_iter().collect();
        Form::from_data(data)
    }

    #[test]
    fn numbers_parse_from_numbers_and_strings() {
        let form = form(json!({ "cooking_time": 25, "as_text": "40" }));
        assert_eq!(form.get_number("cooking_time").unwrap(), 25);
        assert_eq!(form.get_number("as_text").unwrap(), 40);
        assert!(form.get_number("missing").is_err());
    }

    #[test]
    fn id_lists_reject_non_numeric_entries() {
        let form = form(json!({ "tags": [1, 2, 3], "bad": [1, "x"] }));
        assert_eq!(form.get_id_list("tags").unwrap(), vec![1, 2, 3]);
        assert!(form.get_id_list("bad").is_err());
    }

    #[test]
    fn optional_strings() {
        let form = form(json!({ "image": "aGVsbG8=" }));
        assert_eq!(form.get_opt_str("image").as_deref(), Some("aGVsbG8="));
        assert_eq!(form.get_opt_str("missing"), None);
    }
}
