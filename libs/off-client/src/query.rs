use crate::models::NutrientUpdate;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use validator::ValidationError;

pub const PAGE_SIZE: usize = 20;

/// Fields a caller may ask for on top of the mandatory set.
pub const SELECTABLE_FIELDS: [&str; 6] = [
    "product_name",
    "nutrition_grades",
    "ingredients_text",
    "allergens_tags",
    "labels_tags",
    "misc_tags",
];

/// Selection used when the caller does not pick any field.
pub const DEFAULT_FIELDS: [&str; 2] = ["product_name", "nutrition_grades"];

/// Always requested, since the card cannot be drawn without them.
pub const MANDATORY_FIELDS: [&str; 9] = [
    "brands",
    "quantity",
    "categories_tags",
    "ecoscore_grade",
    "image_small_url",
    "countries_tags",
    "code",
    "nutriments",
    "nutriscore_data",
];

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub(crate) fn known_fields(fields: &BTreeSet<String>) -> Result<(), ValidationError> {
    match fields
        .iter()
        .find(|f| !SELECTABLE_FIELDS.contains(&f.as_str()))
    {
        Some(unknown) => Err(ValidationError::new("unknown_field")
            .with_message(Cow::Owned(format!("unknown field {}", unknown)))),
        None => Ok(()),
    }
}

pub(crate) fn valid_nutrients(
    updates: &BTreeMap<String, NutrientUpdate>,
) -> Result<(), ValidationError> {
    if updates.is_empty() {
        return Err(ValidationError::new("empty")
            .with_message(Cow::Borrowed("missing nutrient updates")));
    }
    if updates.keys().any(|name| name.trim().is_empty()) {
        return Err(ValidationError::new("blank_name")
            .with_message(Cow::Borrowed("missing nutrient name")));
    }
    let names: BTreeSet<&str> = updates.keys().map(|name| name.trim()).collect();
    if names.len() < updates.len() {
        return Err(ValidationError::new("duplicate_name")
            .with_message(Cow::Borrowed("duplicate nutrient name")));
    }
    if updates.values().any(|u| !u.value.is_finite()) {
        return Err(ValidationError::new("not_finite")
            .with_message(Cow::Borrowed("nutrient value must be a finite number")));
    }
    Ok(())
}

/// Parses a comma-separated field selection, falling back to [`DEFAULT_FIELDS`]
/// when nothing was selected.
pub fn parse_field_selection(raw: Option<&str>) -> BTreeSet<String> {
    let picked: BTreeSet<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if picked.is_empty() {
        DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
    } else {
        picked
    }
}

/// Requested fields plus the mandatory set, deduplicated.
pub fn field_union(requested: &BTreeSet<String>) -> BTreeSet<String> {
    requested
        .iter()
        .cloned()
        .chain(MANDATORY_FIELDS.iter().map(|f| f.to_string()))
        .collect()
}

/// Value of the `fields` query parameter.
pub fn fields_param(requested: &BTreeSet<String>) -> String {
    field_union(requested)
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}

/// Derives the taxonomy tag for a free-text category: `"Orange Juice"` becomes `"orange-juice"`.
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    /// 1-based, already clamped.
    pub number: usize,
    pub total_pages: usize,
    pub items: &'a [T],
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// Slices out page `requested` (1-based), clamping out-of-range requests to the
/// first or last page.
pub fn paginate<T>(items: &[T], requested: usize) -> Page<'_, T> {
    let total_pages = total_pages(items.len());
    let number = requested.clamp(1, total_pages);
    let start = (number - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(items.len());
    Page {
        number,
        total_pages,
        items: &items[start.min(end)..end],
    }
}
