//! `population.csv`: ABS estimated resident population by state.

use serde::Serialize;

use crate::error::StepResult;
use crate::models::{State, POPULATION_JUNE_2024};
use crate::output::{write_csv, OutputRecord};
use crate::steps::{Step, StepContext};
use crate::validation::validate_rows;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRow {
    #[serde(rename = "State or territory")]
    pub name: String,
    #[serde(rename = "Population")]
    pub population: u64,
    #[serde(rename = "State")]
    pub state: String,
}

impl OutputRecord for PopulationRow {
    const COLUMNS: &'static [&'static str] = &["State or territory", "Population", "State"];
    const SCHEMA: &'static str = include_str!("../../schemas/population.json");
}

/// One row per state, in publication order.
pub fn population_rows() -> Vec<PopulationRow> {
    POPULATION_JUNE_2024
        .iter()
        .map(|(state, population)| PopulationRow {
            name: state.name().to_string(),
            population: *population,
            state: state.abbreviation().to_string(),
        })
        .collect()
}

/// Population of a state by full name.
pub fn population_of(name: &str) -> Option<(State, u64)> {
    POPULATION_JUNE_2024
        .iter()
        .find(|(state, _)| state.name() == name)
        .copied()
}

pub fn run(ctx: &mut StepContext<'_>) -> StepResult<usize> {
    let rows = population_rows();
    validate_rows(Step::Population.name(), &rows)?;
    write_csv(&ctx.output_path(Step::Population), &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_rows() {
        let rows = population_rows();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].name, "New South Wales");
        assert_eq!(rows[0].population, 8_484_400);
        assert_eq!(rows[7].state, "ACT");

        let order: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(order, vec!["NSW", "VIC", "QLD", "SA", "WA", "TAS", "NT", "ACT"]);
        assert!(validate_rows("population", &rows).is_ok());
    }

    #[test]
    fn test_population_of() {
        assert_eq!(population_of("Tasmania"), Some((State::Tasmania, 575_400)));
        assert_eq!(population_of("Australia"), None);
    }
}
