//! Keyword-based request classification.

use async_trait::async_trait;

use crate::domain::{Category, Classifier, CollaboratorError, MessageBody};

/// Ordered by priority: the first matching category wins.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Emergency,
        &["emergency", "help", "can't breathe", "fell", "bleeding"],
    ),
    (Category::Emergency, &["緊急", "助けて", "苦しい"]),
    (Category::Pain, &["pain", "hurts", "ache", "痛い", "痛み"]),
    (
        Category::Medication,
        &["medicine", "medication", "pill", "drug", "薬"],
    ),
    (Category::Meal, &["meal", "food", "hungry", "water", "thirsty"]),
    (Category::Meal, &["食事", "水", "お腹"]),
    (Category::Toilet, &["toilet", "bathroom", "restroom", "トイレ"]),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn categorize(text: &str) -> Category {
        let lowered = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::General)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, body: &MessageBody) -> Result<Category, CollaboratorError> {
        Ok(Self::categorize(body.as_str()))
    }
}
