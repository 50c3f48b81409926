//! Country and category labels shared by all getters.
//!
//! Categories are universal: getters of different countries use the same
//! names. Subcategories are free text and stay with the getter.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    NL,
    EU,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::NL => "NL",
            Country::EU => "EU",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Government,
    Healthcare,
    Education,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Government => "Government",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_by_name() {
        assert_eq!(Country::NL.to_string(), "NL");
        assert_eq!(Category::Healthcare.to_string(), "Healthcare");
        assert_eq!(
            serde_json::to_string(&Category::Government).unwrap(),
            "\"Government\""
        );
    }
}
