use std::collections::HashSet;
use std::fmt::{self, Display};

use sqlx::{Pool, Postgres};
use thiserror::Error;

use crate::constants::{
    Limits, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PERSON_NAME_LENGTH, MAX_SLUG_LENGTH,
    MAX_USERNAME_LENGTH,
};

use super::{
    error::Error,
    schema::{RecipePayload, RegisterPayload, TagPayload, Uuid},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Recipe must have at least one tag")]
    MissingTags,
    #[error("Recipe must have at least one ingredient")]
    MissingIngredients,
    #[error("Tag {0} is listed more than once")]
    DuplicateTag(Uuid),
    #[error("Ingredient {0} is listed more than once")]
    DuplicateIngredient(Uuid),
    #[error("Ingredient {id}: amount {amount} is out of range ({min}..={max})")]
    AmountOutOfRange {
        id: Uuid,
        amount: i32,
        min: i32,
        max: i32,
    },
    #[error("Cooking time {value} is out of range ({min}..={max} minutes)")]
    CookingTimeOutOfRange { value: i32, min: i32, max: i32 },
    #[error("Name must not be empty or exceed {0} characters")]
    InvalidName(usize),
    #[error("No ingredient exists with id {0}")]
    UnknownIngredient(Uuid),
    #[error("No tag exists with id {0}")]
    UnknownTag(Uuid),
    #[error("Slug may only contain letters, digits, hyphens and underscores")]
    InvalidSlug,
    #[error("Color must be a HEX value such as #AABBCC")]
    InvalidColor,
    #[error("Username contains forbidden characters or is reserved")]
    InvalidUsername,
    #[error("Email is malformed or too long")]
    InvalidEmail,
    #[error("First and last name must be non-empty and at most {0} characters")]
    InvalidPersonName(usize),
    #[error("Shopping cart is empty")]
    EmptyCart,
    #[error("Catalog import rejected: {0}")]
    CatalogImport(String),
    #[error("Subscribing to yourself is not allowed")]
    SelfSubscription,
}

/// Aggregated validation outcome. Checks never fail fast; consumers get every
/// violation in one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl From<Violation> for Error {
    fn from(value: Violation) -> Self {
        let mut report = ValidationReport::default();
        report.push(value);
        Error::Validation(report)
    }
}

/// Pure stage of the composition validator: shape, duplicates and bounds.
/// Collects into `report` without touching the store.
pub fn check_payload(payload: &RecipePayload, limits: &Limits, report: &mut ValidationReport) {
    if payload.name.is_empty() || payload.name.chars().count() > MAX_NAME_LENGTH {
        report.push(Violation::InvalidName(MAX_NAME_LENGTH));
    }

    if payload.cooking_time < limits.min_cooking_time
        || payload.cooking_time > limits.max_cooking_time
    {
        report.push(Violation::CookingTimeOutOfRange {
            value: payload.cooking_time,
            min: limits.min_cooking_time,
            max: limits.max_cooking_time,
        });
    }

    if payload.tags.is_empty() {
        report.push(Violation::MissingTags);
    }
    let mut seen = HashSet::new();
    for tag_id in &payload.tags {
        if !seen.insert(*tag_id) {
            report.push(Violation::DuplicateTag(*tag_id));
        }
    }

    if payload.ingredients.is_empty() {
        report.push(Violation::MissingIngredients);
    }
    let mut seen = HashSet::new();
    for entry in &payload.ingredients {
        if !seen.insert(entry.id) {
            report.push(Violation::DuplicateIngredient(entry.id));
        }
        if entry.amount < limits.min_ingredient_amount
            || entry.amount > limits.max_ingredient_amount
        {
            report.push(Violation::AmountOutOfRange {
                id: entry.id,
                amount: entry.amount,
                min: limits.min_ingredient_amount,
                max: limits.max_ingredient_amount,
            });
        }
    }
}

/// Store stage of the composition validator: every referenced tag and
/// ingredient id must resolve. One lookup per entity, not per id.
pub async fn resolve_references(
    payload: &RecipePayload,
    pool: &Pool<Postgres>,
    report: &mut ValidationReport,
) -> Result<(), Error> {
    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|i| i.id).collect();
    let known: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ingredient_ids)
        .fetch_all(pool)
        .await?;
    let known: HashSet<Uuid> = known.into_iter().map(|r| r.0).collect();
    for id in &ingredient_ids {
        if !known.contains(id) {
            report.push(Violation::UnknownIngredient(*id));
        }
    }

    let known: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(&payload.tags)
        .fetch_all(pool)
        .await?;
    let known: HashSet<Uuid> = known.into_iter().map(|r| r.0).collect();
    for id in &payload.tags {
        if !known.contains(id) {
            report.push(Violation::UnknownTag(*id));
        }
    }

    Ok(())
}

/// Full composition validator. Runs before any write so that a failed
/// replacement never leaves a recipe half-updated.
pub async fn validate_recipe_payload(
    payload: &RecipePayload,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let mut report = ValidationReport::default();
    check_payload(payload, limits, &mut report);
    resolve_references(payload, pool, &mut report).await?;
    report.into_result()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.chars().count() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 6 || digits.len() == 3) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn validate_tag_payload(payload: &TagPayload) -> Result<(), Error> {
    let mut report = ValidationReport::default();
    if payload.name.is_empty() || payload.name.chars().count() > MAX_NAME_LENGTH {
        report.push(Violation::InvalidName(MAX_NAME_LENGTH));
    }
    if !is_valid_slug(&payload.slug) {
        report.push(Violation::InvalidSlug);
    }
    if !is_valid_hex_color(&payload.color) {
        report.push(Violation::InvalidColor);
    }
    report.into_result()
}

/// Login names: leading letter, then letters, digits, `-`, `_` or `.`;
/// "me" is reserved for the profile endpoint.
pub fn is_valid_username(username: &str) -> bool {
    if username == "me" || username.len() < 2 || username.len() > MAX_USERNAME_LENGTH {
        return false;
    }
    let mut chars = username.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Shape check only: one `@` with something on both sides, within the column
/// length. Deliverability is the mail server's problem.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    }
}

fn is_valid_person_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_PERSON_NAME_LENGTH
}

/// Registration gate. Runs before the insert so malformed input comes back
/// as a 400 report instead of a value-too-long storage error.
pub fn validate_register_payload(payload: &RegisterPayload) -> Result<(), Error> {
    let mut report = ValidationReport::default();
    if !is_valid_username(&payload.username) {
        report.push(Violation::InvalidUsername);
    }
    if !is_valid_email(&payload.email) {
        report.push(Violation::InvalidEmail);
    }
    if !is_valid_person_name(&payload.first_name) || !is_valid_person_name(&payload.last_name) {
        report.push(Violation::InvalidPersonName(MAX_PERSON_NAME_LENGTH));
    }
    report.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::IngredientAmount;

    fn payload(tags: Vec<Uuid>, ingredients: Vec<(Uuid, i32)>) -> RecipePayload {
        RecipePayload {
            name: String::from("Pea soup"),
            text: String::from("Boil the peas."),
            image: None,
            cooking_time: 45,
            tags,
            ingredients: ingredients
                .into_iter()
                .map(|(id, amount)| IngredientAmount { id, amount })
                .collect(),
        }
    }

    fn check(payload: &RecipePayload) -> Vec<Violation> {
        let mut report = ValidationReport::default();
        check_payload(payload, &Limits::default(), &mut report);
        report.violations().to_vec()
    }

    #[test]
    fn accepts_well_formed_payload() {
        assert!(check(&payload(vec![1, 2], vec![(10, 1), (11, 100)])).is_empty());
    }

    #[test]
    fn rejects_empty_tag_and_ingredient_lists() {
        let violations = check(&payload(vec![], vec![]));
        assert!(violations.contains(&Violation::MissingTags));
        assert!(violations.contains(&Violation::MissingIngredients));
    }

    #[test]
    fn rejects_duplicate_tags_and_ingredients() {
        let violations = check(&payload(vec![1, 1], vec![(10, 5), (10, 5)]));
        assert!(violations.contains(&Violation::DuplicateTag(1)));
        assert!(violations.contains(&Violation::DuplicateIngredient(10)));
    }

    #[test]
    fn enforces_amount_bounds_inclusively() {
        assert!(check(&payload(vec![1], vec![(10, 1)])).is_empty());
        assert!(check(&payload(vec![1], vec![(10, 100)])).is_empty());

        for bad in [0, 101, -3] {
            let violations = check(&payload(vec![1], vec![(10, bad)]));
            assert!(violations
                .iter()
                .any(|v| matches!(v, Violation::AmountOutOfRange { amount, .. } if *amount == bad)));
        }
    }

    #[test]
    fn enforces_cooking_time_bounds() {
        for (time, ok) in [(0, false), (1, true), (600, true), (601, false)] {
            let mut p = payload(vec![1], vec![(10, 5)]);
            p.cooking_time = time;
            assert_eq!(check(&p).is_empty(), ok, "cooking_time = {time}");
        }
    }

    #[test]
    fn collects_every_violation_in_one_report() {
        let mut p = payload(vec![2, 2], vec![(10, 0)]);
        p.cooking_time = 999;
        let violations = check(&p);
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn slug_pattern() {
        assert!(is_valid_slug("dinner-ideas_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("päivällinen"));
        assert!(!is_valid_slug("two words"));
    }

    #[test]
    fn hex_color_pattern() {
        assert!(is_valid_hex_color("#FF0000"));
        assert!(is_valid_hex_color("#abc"));
        assert!(!is_valid_hex_color("FF0000"));
        assert!(!is_valid_hex_color("#GG0000"));
        assert!(!is_valid_hex_color("#FF00"));
    }

    #[test]
    fn username_rules() {
        assert!(is_valid_username("cook.master_42"));
        assert!(!is_valid_username("me"));
        assert!(!is_valid_username("9lives"));
        assert!(!is_valid_username("a"));
        assert!(!is_valid_username("nö"));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("chef@example.org"));
        assert!(!is_valid_email("chef"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("chef@"));
        assert!(!is_valid_email("chef@localhost"));
        assert!(!is_valid_email(&format!("{}@example.org", "a".repeat(300))));
    }

    #[test]
    fn registration_rejects_oversized_fields_before_the_store() {
        let mut p = RegisterPayload {
            username: String::from("chef"),
            email: format!("{}@example.org", "a".repeat(300)),
            first_name: String::from("Ada"),
            last_name: "b".repeat(300),
            password: String::from("secret"),
        };

        let Err(Error::Validation(report)) = validate_register_payload(&p) else {
            panic!("expected a validation report");
        };
        assert!(report.violations().contains(&Violation::InvalidEmail));
        assert!(report
            .violations()
            .iter()
            .any(|v| matches!(v, Violation::InvalidPersonName(_))));

        p.email = String::from("chef@example.org");
        p.last_name = String::from("Cook");
        assert!(validate_register_payload(&p).is_ok());
    }
}
