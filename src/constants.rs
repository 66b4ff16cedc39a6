pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 50;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;

pub const MAX_NAME_LENGTH: usize = 256;
pub const MAX_MEASUREMENT_UNIT_LENGTH: usize = 50;
pub const MAX_SLUG_LENGTH: usize = 150;
pub const MAX_USERNAME_LENGTH: usize = 254;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_PERSON_NAME_LENGTH: usize = 254;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 600;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 100;

/// Product bounds on recipe payloads. The defaults mirror the catalog the
/// service launched with; deployments can override them through [`crate::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_cooking_time: i32,
    pub max_cooking_time: i32,
    pub min_ingredient_amount: i32,
    pub max_ingredient_amount: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_cooking_time: MIN_COOKING_TIME,
            max_cooking_time: MAX_COOKING_TIME,
            min_ingredient_amount: MIN_INGREDIENT_AMOUNT,
            max_ingredient_amount: MAX_INGREDIENT_AMOUNT,
        }
    }
}
