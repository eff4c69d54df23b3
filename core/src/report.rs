//! Calorie lookup and the report fold over food log rows.
//!
//! A [`Report`] is built by joining [`LogRow`]s against a [`CalorieLookup`]
//! snapshot. Calories and category servings accumulate for every row; meal
//! counts are de-duplicated per `(date, meal type)` except for snacks, which
//! count every time they are logged.
//!
//! Servings are summed as whole thousandths so the totals are exact and do
//! not depend on row order.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{BoxError, ReportError};
use crate::models::{CalorieRecord, FoodCategory, LogRow, MealType};

/// Food name to calorie record, built fresh for each report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalorieLookup {
    entries: HashMap<String, CalorieRecord>,
}

impl CalorieLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier record with the same name.
    pub fn insert(&mut self, record: CalorieRecord) {
        self.entries.insert(record.food_name.clone(), record);
    }

    #[must_use]
    pub fn get(&self, food_name: &str) -> Option<&CalorieRecord> {
        self.entries.get(food_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a fallible row source. The first read error aborts the
    /// build; a partial lookup would report known foods as zero-calorie.
    pub fn try_from_rows<I, E>(rows: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = Result<CalorieRecord, E>>,
        E: Into<BoxError>,
    {
        let mut lookup = Self::new();
        for row in rows {
            lookup.insert(row.map_err(ReportError::lookup_build)?);
        }
        tracing::debug!(foods = lookup.len(), "calorie lookup built");
        Ok(lookup)
    }
}

impl FromIterator<CalorieRecord> for CalorieLookup {
    fn from_iter<I: IntoIterator<Item = CalorieRecord>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}

/// Meal events per meal type. Every meal type is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MealTypeCounts {
    pub breakfast: u32,
    pub brunch: u32,
    pub lunch: u32,
    pub dinner: u32,
    pub snack: u32,
}

impl MealTypeCounts {
    #[must_use]
    pub fn get(&self, meal_type: MealType) -> u32 {
        match meal_type {
            MealType::Breakfast => self.breakfast,
            MealType::Brunch => self.brunch,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
            MealType::Snack => self.snack,
        }
    }

    fn slot(&mut self, meal_type: MealType) -> &mut u32 {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Brunch => &mut self.brunch,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, n)| n).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MealType, u32)> + '_ {
        MealType::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// Servings eaten per food category. Every category is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub grain: f64,
    pub fruit: f64,
    pub vegetable: f64,
    pub dairy: f64,
    pub protein: f64,
    pub other: f64,
}

impl CategoryTotals {
    #[must_use]
    pub fn get(&self, category: FoodCategory) -> f64 {
        match category {
            FoodCategory::Grain => self.grain,
            FoodCategory::Fruit => self.fruit,
            FoodCategory::Vegetable => self.vegetable,
            FoodCategory::Dairy => self.dairy,
            FoodCategory::Protein => self.protein,
            FoodCategory::Other => self.other,
        }
    }

    fn slot(&mut self, category: FoodCategory) -> &mut f64 {
        match category {
            FoodCategory::Grain => &mut self.grain,
            FoodCategory::Fruit => &mut self.fruit,
            FoodCategory::Vegetable => &mut self.vegetable,
            FoodCategory::Dairy => &mut self.dairy,
            FoodCategory::Protein => &mut self.protein,
            FoodCategory::Other => &mut self.other,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FoodCategory, f64)> + '_ {
        FoodCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Aggregate summary of a set of food log rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    total_calories: f64,
    meal_count: u32,
    meal_type_count: MealTypeCounts,
    meal_category_count: CategoryTotals,
}

impl Report {
    #[must_use]
    pub fn total_calories(&self) -> f64 {
        self.total_calories
    }

    #[must_use]
    pub fn meal_count(&self) -> u32 {
        self.meal_count
    }

    #[must_use]
    pub fn meal_type_count(&self) -> &MealTypeCounts {
        &self.meal_type_count
    }

    #[must_use]
    pub fn meal_category_count(&self) -> &CategoryTotals {
        &self.meal_category_count
    }

    /// Average calories per counted meal, or 0 when no meals were counted.
    #[must_use]
    pub fn calories_per_meal(&self) -> f64 {
        if self.meal_count == 0 {
            0.0
        } else {
            self.total_calories / f64::from(self.meal_count)
        }
    }
}

const MILLIS_PER_SERVING: f64 = 1000.0;

/// Serving quantity in thousandths of a serving.
#[allow(clippy::cast_sign_loss)]
fn to_milli_servings(quantity: f64) -> u64 {
    // Negative and NaN quantities saturate to 0.
    (quantity * MILLIS_PER_SERVING).round() as u64
}

#[allow(clippy::cast_precision_loss)]
fn from_millis(millis: u128) -> f64 {
    millis as f64 / MILLIS_PER_SERVING
}

/// Incremental fold of log rows into a [`Report`].
#[derive(Debug)]
pub struct ReportAggregator<'a> {
    lookup: &'a CalorieLookup,
    report: Report,
    milli_calories: u128,
    category_millis: [u128; FoodCategory::ALL.len()],
    meals_by_date: HashMap<NaiveDate, HashSet<MealType>>,
}

impl<'a> ReportAggregator<'a> {
    #[must_use]
    pub fn new(lookup: &'a CalorieLookup) -> Self {
        Self {
            lookup,
            report: Report::default(),
            milli_calories: 0,
            category_millis: [0; FoodCategory::ALL.len()],
            meals_by_date: HashMap::new(),
        }
    }

    pub fn push(&mut self, row: &LogRow) {
        match self.lookup.get(&row.food_name) {
            Some(record) => {
                let millis = u128::from(to_milli_servings(row.serving_quantity));
                self.milli_calories += u128::from(record.calories_per_serving) * millis;
                self.category_millis[record.category as usize] += millis;
            }
            None => {
                tracing::trace!(food = %row.food_name, "no calorie record; counting 0 kcal");
            }
        }

        let first_today = self
            .meals_by_date
            .entry(row.entry_date)
            .or_default()
            .insert(row.meal_type);
        if first_today || row.meal_type.is_snack() {
            *self.report.meal_type_count.slot(row.meal_type) += 1;
            self.report.meal_count += 1;
        }
    }

    #[must_use]
    pub fn finish(mut self) -> Report {
        self.report.total_calories = from_millis(self.milli_calories);
        for (category, millis) in FoodCategory::ALL.into_iter().zip(self.category_millis) {
            *self.report.meal_category_count.slot(category) = from_millis(millis);
        }
        tracing::debug!(
            days = self.meals_by_date.len(),
            meals = self.report.meal_count,
            calories = self.report.total_calories,
            "report aggregated"
        );
        self.report
    }

    #[must_use]
    pub fn aggregate<'r, I>(rows: I, lookup: &CalorieLookup) -> Report
    where
        I: IntoIterator<Item = &'r LogRow>,
    {
        let mut aggregator = ReportAggregator::new(lookup);
        for row in rows {
            aggregator.push(row);
        }
        aggregator.finish()
    }

    /// Fold a fallible row source. A read error discards everything
    /// accumulated so far.
    pub fn try_aggregate<I, E>(rows: I, lookup: &CalorieLookup) -> Result<Report, ReportError>
    where
        I: IntoIterator<Item = Result<LogRow, E>>,
        E: Into<BoxError>,
    {
        let mut aggregator = ReportAggregator::new(lookup);
        for row in rows {
            aggregator.push(&row.map_err(ReportError::aggregation)?);
        }
        Ok(aggregator.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(entry_date: NaiveDate, food: &str, meal_type: MealType, qty: f64) -> LogRow {
        LogRow {
            entry_id: 0,
            entry_date,
            food_name: food.to_string(),
            meal_type,
            serving_quantity: qty,
            notes: String::new(),
        }
    }

    fn record(food: &str, calories: u32, category: FoodCategory) -> CalorieRecord {
        CalorieRecord {
            food_name: food.to_string(),
            calories_per_serving: calories,
            category,
        }
    }

    fn sample_lookup() -> CalorieLookup {
        [
            record("apple", 95, FoodCategory::Fruit),
            record("bread", 80, FoodCategory::Grain),
            record("cheese", 110, FoodCategory::Dairy),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lookup_last_record_wins() {
        let lookup: CalorieLookup = [
            record("apple", 95, FoodCategory::Fruit),
            record("apple", 100, FoodCategory::Other),
        ]
        .into_iter()
        .collect();
        assert_eq!(lookup.len(), 1);
        let apple = lookup.get("apple").unwrap();
        assert_eq!(apple.calories_per_serving, 100);
        assert_eq!(apple.category, FoodCategory::Other);
    }

    #[test]
    fn test_lookup_try_from_rows_fails_on_read_error() {
        let rows: Vec<Result<CalorieRecord, std::io::Error>> = vec![
            Ok(record("apple", 95, FoodCategory::Fruit)),
            Err(std::io::Error::other("connection lost")),
        ];
        let err = CalorieLookup::try_from_rows(rows).unwrap_err();
        assert!(matches!(err, ReportError::LookupBuild(_)));
    }

    #[test]
    fn test_single_snack_with_known_food() {
        let rows = [row(date(2021, 6, 1), "apple", MealType::Snack, 2.0)];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());

        assert!((report.total_calories() - 190.0).abs() < f64::EPSILON);
        assert_eq!(report.meal_count(), 1);
        assert_eq!(report.meal_type_count().get(MealType::Snack), 1);
        assert!((report.meal_category_count().get(FoodCategory::Fruit) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_two_dishes_at_dinner_count_as_one_meal() {
        let d = date(2021, 6, 1);
        let rows = [
            row(d, "lasagna", MealType::Dinner, 1.0),
            row(d, "salad", MealType::Dinner, 1.0),
        ];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());

        assert_eq!(report.meal_type_count().get(MealType::Dinner), 1);
        assert_eq!(report.meal_count(), 1);
        assert!(report.total_calories().abs() < f64::EPSILON);
    }

    #[test]
    fn test_snacks_are_never_deduplicated() {
        let d = date(2021, 6, 1);
        let rows = [
            row(d, "apple", MealType::Snack, 1.0),
            row(d, "apple", MealType::Snack, 1.0),
        ];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());

        assert_eq!(report.meal_type_count().get(MealType::Snack), 2);
        assert_eq!(report.meal_count(), 2);
    }

    #[test]
    fn test_same_meal_on_different_days_counts_twice() {
        let rows = [
            row(date(2021, 6, 1), "bread", MealType::Breakfast, 1.0),
            row(date(2021, 6, 2), "bread", MealType::Breakfast, 1.0),
        ];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());
        assert_eq!(report.meal_type_count().get(MealType::Breakfast), 2);
        assert!((report.total_calories() - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_rows_give_zero_report() {
        let report = ReportAggregator::aggregate(&[] as &[LogRow], &sample_lookup());

        assert_eq!(report, Report::default());
        assert_eq!(report.meal_count(), 0);
        assert!(report.calories_per_meal().abs() < f64::EPSILON);
        assert!(report.meal_type_count().iter().all(|(_, n)| n == 0));
        assert!(report.meal_category_count().iter().all(|(_, s)| s == 0.0));
    }

    #[test]
    fn test_unknown_food_counts_meal_but_no_calories() {
        let rows = [row(date(2021, 6, 1), "mystery stew", MealType::Lunch, 3.0)];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());

        assert_eq!(report.meal_type_count().get(MealType::Lunch), 1);
        assert_eq!(report.meal_count(), 1);
        assert!(report.total_calories().abs() < f64::EPSILON);
        assert_eq!(*report.meal_category_count(), CategoryTotals::default());
    }

    #[test]
    fn test_calories_per_meal() {
        let d = date(2021, 6, 1);
        let rows = [
            row(d, "bread", MealType::Breakfast, 2.0),
            row(d, "cheese", MealType::Lunch, 1.0),
            row(d, "bread", MealType::Lunch, 1.0),
        ];
        let report = ReportAggregator::aggregate(&rows, &sample_lookup());
        // 160 + 110 + 80 = 350 over two meals
        assert_eq!(report.meal_count(), 2);
        assert!((report.calories_per_meal() - 175.0).abs() < f64::EPSILON);
        assert!((report.meal_category_count().get(FoodCategory::Grain) - 3.0).abs() < f64::EPSILON);
        assert!((report.meal_category_count().get(FoodCategory::Dairy) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_counts_expose_every_key() {
        let report = Report::default();
        let meal_types: Vec<MealType> = report.meal_type_count().iter().map(|(m, _)| m).collect();
        assert_eq!(meal_types, MealType::ALL.to_vec());
        let categories: Vec<FoodCategory> =
            report.meal_category_count().iter().map(|(c, _)| c).collect();
        assert_eq!(categories, FoodCategory::ALL.to_vec());
    }

    #[test]
    fn test_report_json_has_every_key() {
        let json = serde_json::to_value(Report::default()).unwrap();
        assert_eq!(json["meal_type_count"].as_object().unwrap().len(), 5);
        assert_eq!(json["meal_category_count"].as_object().unwrap().len(), 6);
        assert_eq!(json["meal_type_count"]["brunch"], 0);
    }

    #[test]
    fn test_decimal_servings_sum_exactly_in_any_order() {
        let lookup: CalorieLookup = [record("apple", 1, FoodCategory::Fruit)]
            .into_iter()
            .collect();
        let d = date(2021, 6, 1);
        let forward = [
            row(d, "apple", MealType::Snack, 0.1),
            row(d, "apple", MealType::Snack, 0.2),
            row(d, "apple", MealType::Snack, 0.3),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let a = ReportAggregator::aggregate(&forward, &lookup);
        let b = ReportAggregator::aggregate(&backward, &lookup);
        assert_eq!(a, b);
        assert_eq!(a.total_calories().to_bits(), 0.6_f64.to_bits());
        assert_eq!(
            a.meal_category_count().get(FoodCategory::Fruit).to_bits(),
            0.6_f64.to_bits()
        );
    }

    #[test]
    fn test_try_aggregate_fails_without_partial_report() {
        let rows: Vec<Result<LogRow, std::io::Error>> = vec![
            Ok(row(date(2021, 6, 1), "apple", MealType::Snack, 1.0)),
            Err(std::io::Error::other("disk error")),
            Ok(row(date(2021, 6, 1), "bread", MealType::Lunch, 1.0)),
        ];
        let err = ReportAggregator::try_aggregate(rows, &sample_lookup()).unwrap_err();
        assert!(matches!(err, ReportError::Aggregation(_)));
    }

    #[test]
    fn test_try_aggregate_ok_matches_infallible() {
        let rows = vec![
            row(date(2021, 6, 1), "apple", MealType::Snack, 1.0),
            row(date(2021, 6, 1), "bread", MealType::Lunch, 1.5),
        ];
        let lookup = sample_lookup();
        let fallible = ReportAggregator::try_aggregate(
            rows.iter().cloned().map(Ok::<_, std::io::Error>),
            &lookup,
        )
        .unwrap();
        assert_eq!(fallible, ReportAggregator::aggregate(&rows, &lookup));
    }

    fn arb_meal_type() -> impl Strategy<Value = MealType> {
        prop_oneof![
            Just(MealType::Breakfast),
            Just(MealType::Brunch),
            Just(MealType::Lunch),
            Just(MealType::Dinner),
            Just(MealType::Snack),
        ]
    }

    fn arb_row() -> impl Strategy<Value = LogRow> {
        (
            0u32..4,
            prop::sample::select(vec!["apple", "bread", "cheese", "mystery"]),
            arb_meal_type(),
            1u32..=5000,
        )
            .prop_map(|(day, food, meal_type, millis)| {
                row(
                    date(2021, 6, 1 + day),
                    food,
                    meal_type,
                    f64::from(millis) / 1000.0,
                )
            })
    }

    fn arb_rows_and_permutation() -> impl Strategy<Value = (Vec<LogRow>, Vec<LogRow>)> {
        prop::collection::vec(arb_row(), 0..40)
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
    }

    proptest! {
        #[test]
        fn prop_meal_count_matches_type_counts(rows in prop::collection::vec(arb_row(), 1..40)) {
            let report = ReportAggregator::aggregate(&rows, &sample_lookup());
            prop_assert_eq!(report.meal_count(), report.meal_type_count().total());
        }

        #[test]
        fn prop_order_does_not_matter((rows, shuffled) in arb_rows_and_permutation()) {
            let lookup = sample_lookup();
            prop_assert_eq!(
                ReportAggregator::aggregate(&rows, &lookup),
                ReportAggregator::aggregate(&shuffled, &lookup)
            );
        }

        #[test]
        fn prop_rebuilt_lookup_gives_same_report(rows in prop::collection::vec(arb_row(), 0..40)) {
            let snapshot = vec![
                record("apple", 95, FoodCategory::Fruit),
                record("bread", 80, FoodCategory::Grain),
                record("cheese", 110, FoodCategory::Dairy),
            ];
            let first: CalorieLookup = snapshot.iter().cloned().collect();
            let second: CalorieLookup = snapshot.into_iter().collect();
            prop_assert_eq!(
                ReportAggregator::aggregate(&rows, &first),
                ReportAggregator::aggregate(&rows, &second)
            );
        }
    }
}
