use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::ApplicationRecord;

/// Dashboard search box plus the two dropdown filters. Empty values mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationFilter {
    pub search: Option<String>,
    pub municipality: Option<String>,
    pub school_level: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

impl ApplicationFilter {
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        let form = &record.form;

        let matches_search = match non_empty(&self.search) {
            Some(term) => {
                let term = term.to_lowercase();
                [&form.full_name, &form.email, &form.municipality]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            None => true,
        };
        let matches_municipality =
            non_empty(&self.municipality).map_or(true, |value| form.municipality == value);
        let matches_level =
            non_empty(&self.school_level).map_or(true, |value| form.school_level == value);

        matches_search && matches_municipality && matches_level
    }

    pub fn apply(&self, records: Vec<ApplicationRecord>) -> Vec<ApplicationRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

/// Distinct dropdown values drawn from the stored applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub municipalities: Vec<String>,
    pub school_levels: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[ApplicationRecord]) -> Self {
        let distinct = |pick: fn(&ApplicationRecord) -> &str| -> Vec<String> {
            records
                .iter()
                .map(pick)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        Self {
            municipalities: distinct(|record| record.form.municipality.as_str()),
            school_levels: distinct(|record| record.form.school_level.as_str()),
        }
    }
}
