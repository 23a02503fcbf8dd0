use serde::{Deserialize, Serialize};

/// Language assigned to imported rows that do not carry one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// A row of owned stock as held by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCard {
    /// Store-assigned identity, `0` until the row has been inserted
    pub id: i64,
    pub name: String,
    pub expansion_name: Option<String>,
    pub language: String,
    pub card_number: String,
    /// Total copies owned
    pub quantity: i64,
    /// Copies reserved elsewhere, e.g. committed to a deck
    pub in_use: i64,
    pub foil: bool,
    pub color_identity: Option<String>,
    pub type_line: Option<String>,
    pub cmc: Option<f64>,
    pub image_uri: Option<String>,
    pub is_commander: Option<bool>,
}

impl InventoryCard {
    /// Copies not reserved. Negative when `in_use > quantity`; never clamped.
    pub fn available(&self) -> i64 {
        self.quantity - self.in_use
    }
}

/// A parsed entry of a want-list or import file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLine {
    pub name: String,
    #[serde(default)]
    pub expansion_name: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub foil: Option<bool>,
}

impl ImportLine {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            ..Self::default()
        }
    }

    pub fn with_expansion(mut self, expansion: impl Into<String>) -> Self {
        self.expansion_name = Some(expansion.into());
        self
    }

    /// Builds the inventory row to insert for this entry. Nothing is reserved yet.
    pub fn to_inventory_card(&self) -> InventoryCard {
        InventoryCard {
            id: 0,
            name: self.name.trim().to_string(),
            expansion_name: self
                .expansion_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            card_number: self.card_number.clone().unwrap_or_default(),
            quantity: self.quantity,
            in_use: 0,
            foil: self.foil.unwrap_or(false),
            ..InventoryCard::default()
        }
    }
}

/// A want-list reconciliation row. `quantity` is either the satisfied
/// amount (found) or the deficit (missing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredCard {
    pub name: String,
    pub quantity: i64,
}

/// Optional listing predicates. Absent or blank fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilter {
    /// Case-insensitive substring of the card name
    pub name: Option<String>,
    pub color_identity: Option<String>,
    pub type_line: Option<String>,
    pub is_commander: Option<bool>,
    pub cmc: Option<f64>,
}

impl CardFilter {
    pub fn name_term(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    pub fn color_identity_term(&self) -> Option<&str> {
        non_blank(self.color_identity.as_deref())
    }

    pub fn type_line_term(&self) -> Option<&str> {
        non_blank(self.type_line.as_deref())
    }

    /// Returns true if every active predicate accepts `card`.
    pub fn matches(&self, card: &InventoryCard) -> bool {
        if let Some(term) = self.name_term() {
            if !card.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        if let Some(term) = self.color_identity_term() {
            if !eq_ignore_case(card.color_identity.as_deref(), term) {
                return false;
            }
        }
        if let Some(term) = self.type_line_term() {
            if !eq_ignore_case(card.type_line.as_deref(), term) {
                return false;
            }
        }
        if let Some(flag) = self.is_commander {
            if card.is_commander != Some(flag) {
                return false;
            }
        }
        if let Some(cmc) = self.cmc {
            if card.cmc != Some(cmc) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn eq_ignore_case(value: Option<&str>, term: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase() == term.to_lowercase())
}

/// Trim + case-fold used wherever names are compared loosely.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Normalizes an optional field, treating absent as empty.
pub fn normalize_opt(value: Option<&str>) -> String {
    value.map(normalize).unwrap_or_default()
}
