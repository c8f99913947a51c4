//! Set registry rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One active set in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetInfo {
    /// Lowercase abbreviation, also the set's directory name.
    pub set_abbr: String,
    pub set_name: String,
    pub release_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl SetInfo {
    pub fn new(set_abbr: &str, set_name: &str, release_date: NaiveDate) -> Self {
        Self {
            set_abbr: set_abbr.to_lowercase(),
            set_name: set_name.to_string(),
            release_date,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_abbreviation() {
        let set = SetInfo::new("DSK", "Duskmourn", NaiveDate::from_ymd_opt(2024, 9, 27).unwrap());
        assert_eq!(set.set_abbr, "dsk");
        assert_eq!(set.set_name, "Duskmourn");
    }
}
