//! Projection of a raw [`ProductRecord`] onto the fixed product card.
//!
//! The projection is total: any field may be missing or malformed and the card
//! still renders, with placeholders standing in for what is absent.

use crate::models::{Grade, ProductRecord, number_value};
use serde::Serialize;
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";
pub const NO_INGREDIENTS: &str = "Not available";
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/6/65/No-Image-Placeholder.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeKind {
    Nutrition,
    Eco,
}

impl GradeKind {
    pub fn label(&self, grade: Grade) -> &'static str {
        match (self, grade) {
            (GradeKind::Nutrition, Grade::A) => "🟢 A 🥦",
            (GradeKind::Nutrition, Grade::B) => "🟡 B 🍊",
            (GradeKind::Nutrition, Grade::C) => "🟠 C 🍞",
            (GradeKind::Nutrition, Grade::D) => "🟠 D 🍟",
            (GradeKind::Nutrition, Grade::E) => "🔴 E 🍩",
            (GradeKind::Eco, Grade::A) => "🟢 A 🌿",
            (GradeKind::Eco, Grade::B) => "🟡 B 🍂",
            (GradeKind::Eco, Grade::C) => "🟠 C 🍁",
            (GradeKind::Eco, Grade::D) => "🟠 D 🪵",
            (GradeKind::Eco, Grade::E) => "🔴 E 🔥",
        }
    }

    /// Label for a raw grade value: the table entry for `a`..`e`, the upper-cased
    /// raw value for anything else, `"Unknown"` when absent or empty.
    pub fn display(&self, raw: Option<&str>) -> String {
        match raw {
            None | Some("") | Some(UNKNOWN) => UNKNOWN.to_string(),
            Some(raw) => match Grade::from_letter(raw) {
                Some(grade) => self.label(grade).to_string(),
                None => raw.to_uppercase(),
            },
        }
    }
}

struct TagSection {
    field: &'static str,
    heading: &'static str,
}

/// Tag lists shown on the card, in display order.
const TAG_SECTIONS: [TagSection; 5] = [
    TagSection {
        field: "allergens_tags",
        heading: "⚠️ Allergens",
    },
    TagSection {
        field: "labels_tags",
        heading: "🔖 Labels",
    },
    TagSection {
        field: "misc_tags",
        heading: "🎯 Suitable for",
    },
    TagSection {
        field: "countries_tags",
        heading: "🌍 Countries Available",
    },
    TagSection {
        field: "categories_tags",
        heading: "🏷️ Categories",
    },
];

struct NutrientLine {
    key: &'static str,
    label: &'static str,
    decimals: usize,
    unit: &'static str,
}

/// Per-100g values shown in the nutrition facts block, in display order.
const NUTRIENT_LINES: [NutrientLine; 8] = [
    NutrientLine {
        key: "energy-kcal_100g",
        label: "Calories",
        decimals: 0,
        unit: "kcal",
    },
    NutrientLine {
        key: "fat_100g",
        label: "Fats",
        decimals: 1,
        unit: "g",
    },
    NutrientLine {
        key: "sugars_100g",
        label: "Sugars",
        decimals: 1,
        unit: "g",
    },
    NutrientLine {
        key: "salt_100g",
        label: "Salt",
        decimals: 1,
        unit: "g",
    },
    NutrientLine {
        key: "proteins_100g",
        label: "Proteins",
        decimals: 1,
        unit: "g",
    },
    NutrientLine {
        key: "sodium_100g",
        label: "Sodium",
        decimals: 3,
        unit: "g",
    },
    NutrientLine {
        key: "potassium_100g",
        label: "Potassium",
        decimals: 0,
        unit: "mg",
    },
    NutrientLine {
        key: "calcium_100g",
        label: "Calcium",
        decimals: 0,
        unit: "mg",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionFact {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagGroup {
    pub field: &'static str,
    pub heading: &'static str,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCard {
    pub product_name: String,
    pub code: String,
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_url: Option<String>,
    pub quantity: String,
    pub nutrition_grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_score: Option<String>,
    pub ecoscore: String,
    pub ingredients: String,
    /// `None` when the record has no nutriments at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_facts: Option<Vec<NutritionFact>>,
    pub tags: Vec<TagGroup>,
    pub image_url: String,
}

impl DisplayCard {
    /// `site_url` is the root brand pages hang off, e.g. `https://world.openfoodfacts.org`.
    pub fn project(record: &ProductRecord, site_url: &str) -> DisplayCard {
        let brand = record.text_or("brands", UNKNOWN);
        let brand_url = (!brand.is_empty() && brand != UNKNOWN)
            .then(|| format!("{}/brand/{}", site_url, brand.replace(' ', "-")));

        let raw_grade = record.text("nutrition_grades");
        let nutrition_grade = GradeKind::Nutrition.display(raw_grade.as_deref());
        let nutrition_score = if nutrition_grade == UNKNOWN {
            None
        } else {
            record
                .object("nutriscore_data")
                .and_then(|data| data.get("score"))
                .and_then(signed_score)
        };

        let ingredients = record
            .text("ingredients_text")
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_INGREDIENTS.to_string());

        let nutrition_facts = record
            .object("nutriments")
            .filter(|nutriments| !nutriments.is_empty())
            .map(|nutriments| {
                NUTRIENT_LINES
                    .iter()
                    .filter_map(|line| {
                        let value = nutriments.get(line.key).and_then(number_value)?;
                        Some(NutritionFact {
                            label: line.label,
                            value: format!("{:.*} {}", line.decimals, value, line.unit),
                        })
                    })
                    .collect::<Vec<_>>()
            });

        let tags: Vec<TagGroup> = TAG_SECTIONS
            .iter()
            .map(|section| TagGroup {
                field: section.field,
                heading: section.heading,
                tags: record
                    .tags(section.field)
                    .iter()
                    .map(|tag| format_tag(tag))
                    .collect(),
            })
            .collect();

        let image_url = record
            .text("image_small_url")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());

        DisplayCard {
            product_name: record.text_or("product_name", UNKNOWN),
            code: record.text_or("code", UNKNOWN),
            brand,
            brand_url,
            quantity: record.text_or("quantity", UNKNOWN),
            nutrition_grade,
            nutrition_score,
            ecoscore: GradeKind::Eco.display(record.text("ecoscore_grade").as_deref()),
            ingredients,
            nutrition_facts,
            tags,
            image_url,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut blocks = vec![
            format!("![{}]({})", self.product_name, self.image_url),
            format!("### 🥫 {}", self.product_name),
        ];

        match &self.brand_url {
            Some(url) => blocks.push(format!("**Brand:** [{}]({})", self.brand, url)),
            None => blocks.push(format!("**Brand:** {}", self.brand)),
        }
        blocks.push(format!("**Quantity:** {}", self.quantity));
        blocks.push(format!("**Barcode:** {}", self.code));

        if self.nutrition_grade != UNKNOWN {
            blocks.push(format!("**Nutrition Grade:** {}", self.nutrition_grade));
            if let Some(score) = &self.nutrition_score {
                blocks.push(format!("**Nutrition Score:** {}", score));
            }
        }
        if self.ecoscore != UNKNOWN {
            blocks.push(format!("**Eco-Score:** {}", self.ecoscore));
        }

        blocks.push("**🌿 Ingredients:**".to_string());
        blocks.push(self.ingredients.clone());

        if let Some(facts) = &self.nutrition_facts {
            blocks.push("**🔬 Nutrition Facts (per 100g):**".to_string());
            for fact in facts {
                blocks.push(format!("**{}:** {}", fact.label, fact.value));
            }
        }

        for group in self.tags.iter().filter(|g| !g.tags.is_empty()) {
            blocks.push(format!("**{}:**", group.heading));
            let line: Vec<String> = group.tags.iter().map(|t| format!("`{}`", t)).collect();
            blocks.push(line.join(" "));
        }

        blocks.push("---".to_string());
        blocks.join("\n\n")
    }
}

fn signed_score(value: &Value) -> Option<String> {
    if let Some(n) = value.as_i64() {
        return Some(format!("{:+}", n));
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f.is_finite()).then(|| format!("{:+}", f as i64))
}

/// `"en:gluten-free"` becomes `"Gluten Free"`.
pub fn format_tag(tag: &str) -> String {
    let bare = tag.strip_prefix("en:").unwrap_or(tag);
    title_case(&bare.replace('-', " "))
}

/// Upper-cases the first letter of every run of letters and lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SITE: &str = "https://world.openfoodfacts.org";

    fn record(value: Value) -> ProductRecord {
        serde_json::from_value(value).unwrap()
    }

    fn fact<'a>(card: &'a DisplayCard, label: &str) -> Option<&'a str> {
        card.nutrition_facts
            .as_ref()?
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }

    #[test]
    fn grade_mapping_is_total() {
        assert_eq!(GradeKind::Nutrition.display(Some("a")), "🟢 A 🥦");
        assert_eq!(GradeKind::Nutrition.display(Some("E")), "🔴 E 🍩");
        assert_eq!(GradeKind::Eco.display(Some("d")), "🟠 D 🪵");
        assert_eq!(GradeKind::Nutrition.display(Some("z")), "Z");
        assert_eq!(GradeKind::Eco.display(Some("not-applicable")), "NOT-APPLICABLE");
        assert_eq!(GradeKind::Nutrition.display(None), "Unknown");
        assert_eq!(GradeKind::Eco.display(Some("")), "Unknown");
    }

    #[test]
    fn every_grade_has_a_distinct_label_per_kind() {
        for kind in [GradeKind::Nutrition, GradeKind::Eco] {
            let labels: std::collections::HashSet<&str> =
                Grade::ALL.iter().map(|g| kind.label(*g)).collect();
            assert_eq!(labels.len(), 5);
        }
    }

    #[test]
    fn tags_are_stripped_and_title_cased() {
        assert_eq!(format_tag("en:gluten-free"), "Gluten Free");
        assert_eq!(format_tag("en:united-kingdom"), "United Kingdom");
        assert_eq!(format_tag("fr:sans-gluten"), "Fr:Sans Gluten");
        assert_eq!(format_tag("en:e330"), "E330");
    }

    #[test]
    fn empty_record_projects_to_placeholders() {
        let card = DisplayCard::project(&ProductRecord::default(), SITE);
        assert_eq!(card.product_name, "Unknown");
        assert_eq!(card.code, "Unknown");
        assert_eq!(card.brand, "Unknown");
        assert!(card.brand_url.is_none());
        assert_eq!(card.quantity, "Unknown");
        assert_eq!(card.nutrition_grade, "Unknown");
        assert!(card.nutrition_score.is_none());
        assert_eq!(card.ecoscore, "Unknown");
        assert_eq!(card.ingredients, "Not available");
        assert!(card.nutrition_facts.is_none());
        assert!(card.tags.iter().all(|g| g.tags.is_empty()));
        assert_eq!(card.image_url, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn nutrition_facts_use_fixed_precision() {
        let card = DisplayCard::project(
            &record(json!({
                "nutriments": {
                    "energy-kcal_100g": 539.4,
                    "fat_100g": 3.14159,
                    "sugars_100g": "56.3",
                    "sodium_100g": 0.015,
                    "calcium_100g": 120,
                    "proteins_100g": "n/a",
                }
            })),
            SITE,
        );

        assert_eq!(fact(&card, "Calories"), Some("539 kcal"));
        assert_eq!(fact(&card, "Fats"), Some("3.1 g"));
        assert_eq!(fact(&card, "Sugars"), Some("56.3 g"));
        assert_eq!(fact(&card, "Sodium"), Some("0.015 g"));
        assert_eq!(fact(&card, "Calcium"), Some("120 mg"));
        assert_eq!(fact(&card, "Potassium"), None);
        assert_eq!(fact(&card, "Proteins"), None);
        assert_eq!(fact(&card, "Salt"), None);
    }

    #[test]
    fn nutrition_score_is_signed_and_needs_a_grade() {
        let graded = DisplayCard::project(
            &record(json!({"nutrition_grades": "c", "nutriscore_data": {"score": 3}})),
            SITE,
        );
        assert_eq!(graded.nutrition_score.as_deref(), Some("+3"));

        let negative = DisplayCard::project(
            &record(json!({"nutrition_grades": "a", "nutriscore_data": {"score": -2}})),
            SITE,
        );
        assert_eq!(negative.nutrition_score.as_deref(), Some("-2"));

        let ungraded =
            DisplayCard::project(&record(json!({"nutriscore_data": {"score": 3}})), SITE);
        assert!(ungraded.nutrition_score.is_none());
    }

    #[test]
    fn brand_links_to_brand_page() {
        let card = DisplayCard::project(&record(json!({"brands": "Ferrero Rocher"})), SITE);
        assert_eq!(
            card.brand_url.as_deref(),
            Some("https://world.openfoodfacts.org/brand/Ferrero-Rocher")
        );

        let blank = DisplayCard::project(&record(json!({"brands": ""})), SITE);
        assert!(blank.brand_url.is_none());
    }

    #[test]
    fn markdown_omits_missing_sections() {
        let card = DisplayCard::project(
            &record(json!({
                "product_name": "Nutella",
                "code": "3017620422003",
                "brands": "Ferrero",
                "nutrition_grades": "e",
                "nutriscore_data": {"score": 26},
                "allergens_tags": ["en:milk", "en:nuts"],
                "nutriments": {"fat_100g": 30.9},
            })),
            SITE,
        );
        let md = card.to_markdown();

        assert!(md.contains("### 🥫 Nutella"));
        assert!(md.contains("**Brand:** [Ferrero](https://world.openfoodfacts.org/brand/Ferrero)"));
        assert!(md.contains("**Nutrition Grade:** 🔴 E 🍩"));
        assert!(md.contains("**Nutrition Score:** +26"));
        assert!(md.contains("**Fats:** 30.9 g"));
        assert!(md.contains("`Milk` `Nuts`"));
        assert!(!md.contains("Eco-Score"));
        assert!(!md.contains("Labels"));
        assert!(md.ends_with("---"));
    }
}
