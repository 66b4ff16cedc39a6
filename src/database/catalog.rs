use log::info;
use sqlx::{Pool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::constants::{MAX_MEASUREMENT_UNIT_LENGTH, MAX_NAME_LENGTH};

use super::error::Error;

/*
Ingredient catalog line format, one ingredient per line:

    name,measurement_unit
    baking soda,g
    milk 3.5%,ml

The unit is everything after the LAST comma, so names are free to contain
commas themselves.
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLine {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("line {0}: expected `name,measurement_unit`")]
    MalformedLine(usize),
    #[error("line {0}: name or unit is empty or too long")]
    InvalidField(usize),
}

impl From<CatalogError> for Error {
    fn from(value: CatalogError) -> Self {
        super::validate::Violation::CatalogImport(value.to_string()).into()
    }
}

impl CatalogLine {
    fn parse(line: &str, number: usize) -> Result<Self, CatalogError> {
        let (name, unit) = line
            .rsplit_once(',')
            .ok_or(CatalogError::MalformedLine(number))?;
        let name = name.trim();
        let unit = unit.trim();

        if name.is_empty()
            || unit.is_empty()
            || name.chars().count() > MAX_NAME_LENGTH
            || unit.chars().count() > MAX_MEASUREMENT_UNIT_LENGTH
        {
            return Err(CatalogError::InvalidField(number));
        }

        Ok(Self {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
    }
}

/// Parses a whole catalog document. Blank lines are skipped; any malformed
/// line aborts the import before a single row is written.
pub fn parse_catalog(input: &str) -> Result<Vec<CatalogLine>, CatalogError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| CatalogLine::parse(line, i + 1))
        .collect()
}

/// Bulk-loads the ingredient catalog, upserting by (name, measurement_unit).
/// Returns the number of newly inserted rows.
pub async fn import_ingredients(input: &str, pool: &Pool<Postgres>) -> Result<u64, Error> {
    let lines = parse_catalog(input)?;
    if lines.is_empty() {
        return Ok(0);
    }

    let mut inserted = 0;
    for chunk in lines.chunks(65535 / 2) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

        query_builder.push_values(chunk, |mut b, line| {
            b.push_bind(&line.name).push_bind(&line.measurement_unit);
        });
        query_builder.push(" ON CONFLICT (name, measurement_unit) DO NOTHING");

        let result = query_builder.build().execute(pool).await?;
        inserted += result.rows_affected();
    }

    info!(
        "Ingredient catalog import: {} lines read, {} new rows",
        lines.len(),
        inserted
    );

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_lines() {
        let lines = parse_catalog("flour,g\nmilk,ml\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "flour");
        assert_eq!(lines[0].measurement_unit, "g");
    }

    #[test]
    fn unit_is_after_the_last_comma() {
        let lines = parse_catalog("apricot puree, canned,g").unwrap();
        assert_eq!(lines[0].name, "apricot puree, canned");
        assert_eq!(lines[0].measurement_unit, "g");
    }

    #[test]
    fn skips_blank_lines() {
        let lines = parse_catalog("flour,g\n\n\nsugar,g\n").unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn rejects_lines_without_a_unit() {
        assert_eq!(parse_catalog("flour"), Err(CatalogError::MalformedLine(1)));
    }

    #[test]
    fn rejects_empty_fields_with_line_number() {
        assert_eq!(
            parse_catalog("flour,g\n,g"),
            Err(CatalogError::InvalidField(2))
        );
    }
}
