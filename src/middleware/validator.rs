use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Json};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;
use crate::models::audios::is_valid_category;
use crate::models::playlists::Visibility;

/// Extracteur JSON + validation : le body est désérialisé puis validé
/// avant d'arriver au handler. La première violation est renvoyée en 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Ordre de déclaration des champs d'un schéma: la première violation
/// renvoyée au client est celle du premier champ invalide dans cet ordre.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str];
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder + 'static,
{
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let Json(value) = json
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            validate(&value)?;
            Ok(ValidatedJson(value))
        })
    }
}

/// Valide une valeur déjà construite (ex: champs d'un formulaire multipart)
pub fn validate<T: Validate + FieldOrder>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|errors| ApiError::Validation(first_message(&errors, T::FIELDS)))
}

/// Message de la première erreur, dans l'ordre `order`. Un champ absent
/// de `order` passe après les autres (tri par nom).
pub fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let mut fields: Vec<_> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs))
        .collect();
    fields.sort_by_key(|(field, _)| {
        let rank = order.iter().position(|name| *name == field.as_str()).unwrap_or(usize::MAX);
        (rank, field.clone())
    });

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}!", field),
            })
        })
        .unwrap_or_else(|| "Invalid request!".to_string())
}

pub fn is_valid_id(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

/// Parse un identifiant venant d'un path/query, 422 avec `message` sinon
pub fn parse_id(value: &str, message: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::validation(message))
}

// ---------------------------------------------------------------------------
// Désérialiseurs
// ---------------------------------------------------------------------------

/// Identifiant obligatoire : toute valeur qui n'est pas un UUID devient ""
/// et sera rejetée par la règle length(min = 1) du champ.
pub fn object_id_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if is_valid_id(&s) => s,
        _ => String::new(),
    })
}

pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).unwrap_or_default())
}

/// Champ optionnel : "" est traité comme absent
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

// ---------------------------------------------------------------------------
// Validateurs custom
// ---------------------------------------------------------------------------

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let password = password.trim();
    if password.is_empty() {
        return Err(invalid("password", "Password is missing!"));
    }
    if password.chars().count() < 8 {
        return Err(invalid("password", "Password is too short!"));
    }

    // Au moins une lettre, un chiffre et un caractère spécial, rien d'autre
    const SPECIALS: &str = "!@#$%^&*";
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c));
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIALS.contains(c));

    if allowed && has_letter && has_digit && has_special {
        Ok(())
    } else {
        Err(invalid("password", "Password is too simple!"))
    }
}

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.is_empty() {
        return Err(invalid("category", "Category is missing!"));
    }
    if !is_valid_category(category) {
        return Err(invalid("category", "Invalid category!"));
    }
    Ok(())
}

/// Seules "public" et "private" sont acceptées depuis l'API ("auto" est réservé)
pub fn validate_visibility(visibility: &str) -> Result<(), ValidationError> {
    match visibility.parse::<Visibility>() {
        Ok(Visibility::Public) | Ok(Visibility::Private) => Ok(()),
        _ => Err(invalid(
            "visibility",
            "Visibility must be public or private!",
        )),
    }
}

pub fn validate_audio_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(invalid("audio_id", "Invalid audio id!"))
    }
}

pub fn validate_history_date(date: &str) -> Result<(), ValidationError> {
    match parse_client_date(date) {
        Some(_) => Ok(()),
        None => Err(invalid("date", "Invalid date!")),
    }
}

/// Accepte RFC 3339 ("2024-05-01T10:00:00Z") ou une date seule ("2024-05-01")
pub fn parse_client_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
