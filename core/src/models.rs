use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest food name the log and calorie tables accept.
pub const MAX_FOOD_NAME_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Brunch,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Brunch => "brunch",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Snacks are discrete events; every other meal happens at most once a day.
    #[must_use]
    pub fn is_snack(self) -> bool {
        matches!(self, Self::Snack)
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!(
                    "Invalid meal type '{s}'. Must be one of: {}",
                    valid.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Grain,
    Fruit,
    Vegetable,
    Dairy,
    Protein,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 6] = [
        FoodCategory::Grain,
        FoodCategory::Fruit,
        FoodCategory::Vegetable,
        FoodCategory::Dairy,
        FoodCategory::Protein,
        FoodCategory::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grain => "grain",
            Self::Fruit => "fruit",
            Self::Vegetable => "vegetable",
            Self::Dairy => "dairy",
            Self::Protein => "protein",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "Invalid food category '{s}'. Must be one of: {}",
                    valid.join(", ")
                )
            })
    }
}

/// One row of the food log table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub entry_id: i64,
    pub entry_date: NaiveDate,
    pub food_name: String,
    pub meal_type: MealType,
    pub serving_quantity: f64,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewLogRow {
    pub entry_date: NaiveDate,
    pub food_name: String,
    pub meal_type: MealType,
    pub serving_quantity: f64,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLogRow {
    pub entry_date: Option<NaiveDate>,
    pub food_name: Option<String>,
    pub meal_type: Option<MealType>,
    pub serving_quantity: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateLogRow {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_date.is_none()
            && self.food_name.is_none()
            && self.meal_type.is_none()
            && self.serving_quantity.is_none()
            && self.notes.is_none()
    }
}

/// One row of the calorie reference table. `food_name` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieRecord {
    pub food_name: String,
    pub calories_per_serving: u32,
    pub category: FoodCategory,
}

pub fn validate_meal_type(meal: &str) -> Result<MealType> {
    meal.parse().map_err(anyhow::Error::msg)
}

pub fn validate_category(category: &str) -> Result<FoodCategory> {
    category.parse().map_err(anyhow::Error::msg)
}

/// Trim and lowercase a food name, rejecting empty or over-long names.
pub fn normalize_food_name(name: &str) -> Result<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        bail!("Food name must not be empty");
    }
    let len = normalized.chars().count();
    if len > MAX_FOOD_NAME_LEN {
        bail!("Food name '{normalized}' is {len} characters; the limit is {MAX_FOOD_NAME_LEN}");
    }
    Ok(normalized)
}

pub fn validate_serving_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        bail!("Serving quantity must be greater than 0");
    }
    Ok(quantity)
}
