// SPDX-License-Identifier: MIT

//! The recipe write validator.
//!
//! Payloads are validated as raw JSON documents rather than through typed
//! deserialization, so that every broken field is reported at once in a
//! field-keyed error map instead of failing on the first type mismatch.
//!
//! Validation is split in two: [`validate_recipe_payload`] is a pure
//! structural pass, then [`validate_and_apply`] checks referenced ids
//! against the store and persists. No side effect happens before both
//! passes succeed.

use serde_json::Value;

use crate::db::Db;
use crate::error::{ApiError, FieldErrors, Result};
use crate::models::RecipeRow;
use crate::services::images::{decode_data_uri, DecodedImage, MediaStore};

pub const REQUIRED: &str = "Обязательное поле.";
const NOT_INTEGER: &str = "Требуется целочисленное значение.";
const MIN_ONE: &str = "Убедитесь, что это значение больше либо равно 1.";
const NOT_A_STRING: &str = "Не валидная строка.";
const BLANK: &str = "Это поле не может быть пустым.";
const LIST_EXPECTED: &str = "Ожидался список значений.";
const NEED_INGREDIENT: &str = "Должен быть хотя бы один ингредиент.";
const NEED_TAG: &str = "Должен быть хотя бы один тег.";
const UNIQUE_INGREDIENTS: &str = "Ингредиенты должны быть уникальны.";
const UNIQUE_TAGS: &str = "Теги должны быть уникальны.";
const INVALID_PAYLOAD: &str = "Недопустимые данные.";

const RECIPE_NAME_MAX_CHARS: usize = 256;

/// Create requires every field; partial update still requires everything
/// except `image`, which is retained when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Structurally valid write payload. Referenced ids are not yet known to
/// exist.
#[derive(Debug, PartialEq)]
pub struct RecipeWrite {
    /// (ingredient id, amount) pairs, duplicates rejected
    pub ingredients: Vec<(i64, i64)>,
    pub tags: Vec<i64>,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    /// None only in update mode
    pub image: Option<DecodedImage>,
}

/// Integers and integer-valued strings are both accepted.
fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn invalid_pk(value: &Value) -> String {
    let rendered = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    format!("Недопустимый первичный ключ \"{rendered}\" - объект не существует.")
}

fn validate_ingredients(value: &Value, errors: &mut FieldErrors) -> Vec<(i64, i64)> {
    let Some(list) = value.as_array() else {
        errors.insert("ingredients".to_string(), vec![LIST_EXPECTED.to_string()]);
        return Vec::new();
    };
    if list.is_empty() {
        errors.insert("ingredients".to_string(), vec![NEED_INGREDIENT.to_string()]);
        return Vec::new();
    }

    let mut messages = Vec::new();
    let mut ingredients = Vec::new();
    for entry in list {
        let Some(map) = entry.as_object() else {
            messages.push(INVALID_PAYLOAD.to_string());
            continue;
        };
        let (id, amount) = (map.get("id"), map.get("amount"));
        if id.is_none() || amount.is_none() {
            messages.push(REQUIRED.to_string());
            continue;
        }
        let id = match parse_int(id.unwrap()) {
            Some(id) => id,
            None => {
                messages.push(invalid_pk(id.unwrap()));
                continue;
            }
        };
        match parse_int(amount.unwrap()) {
            None => messages.push(NOT_INTEGER.to_string()),
            Some(amount) if amount < 1 => messages.push(MIN_ONE.to_string()),
            Some(amount) => ingredients.push((id, amount)),
        }
    }

    if messages.is_empty() {
        let mut seen = std::collections::HashSet::new();
        if !ingredients.iter().all(|(id, _)| seen.insert(*id)) {
            messages.push(UNIQUE_INGREDIENTS.to_string());
        }
    }
    if !messages.is_empty() {
        errors.insert("ingredients".to_string(), messages);
        return Vec::new();
    }
    ingredients
}

fn validate_tags(value: &Value, errors: &mut FieldErrors) -> Vec<i64> {
    let Some(list) = value.as_array() else {
        errors.insert("tags".to_string(), vec![LIST_EXPECTED.to_string()]);
        return Vec::new();
    };
    if list.is_empty() {
        errors.insert("tags".to_string(), vec![NEED_TAG.to_string()]);
        return Vec::new();
    }

    let mut messages = Vec::new();
    let mut tags = Vec::new();
    for entry in list {
        match parse_int(entry) {
            Some(id) => tags.push(id),
            None => messages.push(invalid_pk(entry)),
        }
    }

    if messages.is_empty() {
        let mut seen = std::collections::HashSet::new();
        if !tags.iter().all(|id| seen.insert(*id)) {
            messages.push(UNIQUE_TAGS.to_string());
        }
    }
    if !messages.is_empty() {
        errors.insert("tags".to_string(), messages);
        return Vec::new();
    }
    tags
}

fn validate_text_field(
    field: &str,
    value: &Value,
    max_chars: Option<usize>,
    errors: &mut FieldErrors,
) -> Option<String> {
    let Some(raw) = value.as_str() else {
        errors.insert(field.to_string(), vec![NOT_A_STRING.to_string()]);
        return None;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.insert(field.to_string(), vec![BLANK.to_string()]);
        return None;
    }
    if let Some(max) = max_chars {
        if trimmed.chars().count() > max {
            errors.insert(
                field.to_string(),
                vec![format!(
                    "Убедитесь, что это значение содержит не более {max} символов."
                )],
            );
            return None;
        }
    }
    Some(trimmed.to_string())
}

/// Pure structural validation of a recipe write payload.
///
/// Returns the parsed payload, or a map carrying an entry for every broken
/// field, missing required fields included.
pub fn validate_recipe_payload(
    payload: &Value,
    mode: WriteMode,
) -> std::result::Result<RecipeWrite, FieldErrors> {
    let mut errors = FieldErrors::new();

    let Some(object) = payload.as_object() else {
        errors.insert(
            "non_field_errors".to_string(),
            vec![INVALID_PAYLOAD.to_string()],
        );
        return Err(errors);
    };

    let required: &[&str] = match mode {
        WriteMode::Create => &["ingredients", "tags", "image", "name", "text", "cooking_time"],
        WriteMode::Update => &["ingredients", "tags", "name", "text", "cooking_time"],
    };
    for field in required {
        if !object.contains_key(*field) {
            errors.insert(field.to_string(), vec![REQUIRED.to_string()]);
        }
    }

    let ingredients = object
        .get("ingredients")
        .map(|value| validate_ingredients(value, &mut errors))
        .unwrap_or_default();
    let tags = object
        .get("tags")
        .map(|value| validate_tags(value, &mut errors))
        .unwrap_or_default();
    let name = object
        .get("name")
        .and_then(|value| validate_text_field("name", value, Some(RECIPE_NAME_MAX_CHARS), &mut errors));
    let text = object
        .get("text")
        .and_then(|value| validate_text_field("text", value, None, &mut errors));

    let cooking_time = object.get("cooking_time").and_then(|value| {
        match parse_int(value) {
            None => {
                errors.insert("cooking_time".to_string(), vec![NOT_INTEGER.to_string()]);
                None
            }
            Some(minutes) if minutes < 1 => {
                errors.insert("cooking_time".to_string(), vec![MIN_ONE.to_string()]);
                None
            }
            Some(minutes) => Some(minutes),
        }
    });

    let mut image = None;
    if let Some(value) = object.get("image") {
        match value.as_str() {
            None => {
                errors.insert(
                    "image".to_string(),
                    vec!["Неверный формат изображения.".to_string()],
                );
            }
            Some(data) => match decode_data_uri(data) {
                Ok(decoded) => image = Some(decoded),
                Err(err) => {
                    errors.insert("image".to_string(), vec![err.to_string()]);
                }
            },
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RecipeWrite {
        ingredients,
        tags,
        name: name.expect("validated"),
        text: text.expect("validated"),
        cooking_time: cooking_time.expect("validated"),
        image,
    })
}

/// Validate `payload` against the store and persist it for `author_id`.
///
/// `existing` switches to partial-update semantics; the returned id is the
/// stored recipe's. The caller renders the read representation — a write
/// response is never an echo of the write payload.
pub async fn validate_and_apply(
    db: &Db,
    media: &MediaStore,
    payload: &Value,
    author_id: i64,
    existing: Option<&RecipeRow>,
) -> Result<i64> {
    let mode = match existing {
        Some(_) => WriteMode::Update,
        None => WriteMode::Create,
    };
    let write = validate_recipe_payload(payload, mode).map_err(ApiError::Validation)?;

    let mut errors = FieldErrors::new();

    let ingredient_ids: Vec<i64> = write.ingredients.iter().map(|(id, _)| *id).collect();
    let known_ingredients = db.existing_ingredient_ids(&ingredient_ids).await?;
    let missing: Vec<String> = ingredient_ids
        .iter()
        .copied()
        .filter(|id| !known_ingredients.contains(id))
        .map(|id| invalid_pk(&Value::from(id)))
        .collect();
    if !missing.is_empty() {
        errors.insert("ingredients".to_string(), missing);
    }

    let known_tags = db.existing_tag_ids(&write.tags).await?;
    let missing: Vec<String> = write
        .tags
        .iter()
        .copied()
        .filter(|id| !known_tags.contains(id))
        .map(|id| invalid_pk(&Value::from(id)))
        .collect();
    if !missing.is_empty() {
        errors.insert("tags".to_string(), missing);
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // The image file write is the only side effect outside the transaction.
    let image_path = match (&write.image, existing) {
        (Some(decoded), _) => media
            .save("recipes/images", decoded)
            .map_err(|err| ApiError::Internal(err.into()))?,
        (None, Some(recipe)) => recipe.image.clone(),
        (None, None) => {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "create payload passed validation without an image"
            )))
        }
    };

    match existing {
        None => {
            db.create_recipe(
                author_id,
                &write.name,
                &image_path,
                &write.text,
                write.cooking_time,
                &write.tags,
                &write.ingredients,
            )
            .await
        }
        Some(recipe) => {
            db.update_recipe(
                recipe.id,
                &write.name,
                &image_path,
                &write.text,
                write.cooking_time,
                &write.tags,
                &write.ingredients,
            )
            .await?;
            Ok(recipe.id)
        }
    }
}
