//! Curated newsletter catalog and source resolution.
//!
//! The catalog is compiled in and never mutated. It supplies the default
//! source list for an aggregated search when the caller names no sources.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Politics,
    Science,
    Culture,
    Economics,
}

impl Category {
    /// Catalog order. Flattening follows this order.
    pub const ALL: [Category; 5] = [
        Category::Technology,
        Category::Politics,
        Category::Science,
        Category::Culture,
        Category::Economics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Politics => "politics",
            Category::Science => "science",
            Category::Culture => "culture",
            Category::Economics => "economics",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }

    pub fn newsletters(self) -> &'static [&'static str] {
        match self {
            Category::Technology => TECHNOLOGY,
            Category::Politics => POLITICS,
            Category::Science => SCIENCE,
            Category::Culture => CULTURE,
            Category::Economics => ECONOMICS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| SearchError::UnknownCategory {
                given: s.to_string(),
                valid: Self::names(),
            })
    }
}

const TECHNOLOGY: &[&str] = &[
    "https://newsletter.pragmaticengineer.com",
    "https://www.oneusefulthing.org",
    "https://www.platformer.news",
    "https://www.lennysnewsletter.com",
];

const POLITICS: &[&str] = &[
    "https://www.slowboring.com",
    "https://heathercoxrichardson.substack.com",
    "https://www.natesilver.net",
    "https://www.persuasion.community",
];

const SCIENCE: &[&str] = &[
    "https://www.astralcodexten.com",
    "https://yourlocalepidemiologist.substack.com",
    "https://www.construction-physics.com",
    "https://www.experimental-history.com",
];

const CULTURE: &[&str] = &[
    "https://www.honest-broker.com",
    "https://annehelen.substack.com",
    "https://www.garbageday.email",
    "https://www.thefp.com",
];

const ECONOMICS: &[&str] = &[
    "https://www.noahpinion.blog",
    "https://www.apricitas.io",
    "https://www.exponentialview.co",
    "https://kyla.substack.com",
];

/// Every catalog entry, category order then within-category order.
pub fn all_newsletters() -> Vec<String> {
    Category::ALL
        .iter()
        .flat_map(|c| c.newsletters().iter().map(|s| s.to_string()))
        .collect()
}

/// Resolve the source list for a search.
///
/// Explicit sources win verbatim, duplicates and order included; blank
/// entries are dropped. Otherwise the catalog is used, narrowed to `category`
/// when one is given.
pub fn resolve_sources(
    explicit: Option<&[String]>,
    category: Option<&str>,
) -> Result<Vec<String>, SearchError> {
    let resolved = match (explicit, category) {
        (Some(sources), _) if !sources.is_empty() => sources
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect(),
        (_, Some(name)) => {
            let category: Category = name.parse()?;
            category.newsletters().iter().map(|s| s.to_string()).collect()
        }
        _ => all_newsletters(),
    };

    if resolved.is_empty() {
        return Err(SearchError::EmptySourceSet);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(" Technology ".parse::<Category>().unwrap(), Category::Technology);
        assert_eq!("ECONOMICS".parse::<Category>().unwrap(), Category::Economics);
    }

    #[test]
    fn explicit_sources_are_returned_verbatim() {
        let explicit = vec![
            "https://b.example".to_string(),
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ];
        let out = resolve_sources(Some(&explicit), Some("science")).unwrap();
        assert_eq!(out, explicit);
    }

    #[test]
    fn blank_explicit_sources_are_dropped() {
        let explicit = vec![
            "https://a.example".to_string(),
            "  ".to_string(),
            "https://a.example".to_string(),
            String::new(),
        ];
        let out = resolve_sources(Some(&explicit), None).unwrap();
        assert_eq!(out, vec!["https://a.example".to_string(), "https://a.example".to_string()]);

        let blanks = vec![String::new(), " \t".to_string()];
        assert_eq!(resolve_sources(Some(&blanks), Some("science")).unwrap_err(), SearchError::EmptySourceSet);
    }

    #[test]
    fn category_resolves_to_catalog_entries_in_order() {
        let out = resolve_sources(None, Some("technology")).unwrap();
        let expected: Vec<String> = TECHNOLOGY.iter().map(|s| s.to_string()).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_explicit_list_falls_back_to_category() {
        let out = resolve_sources(Some(&[]), Some("politics")).unwrap();
        assert_eq!(out.len(), POLITICS.len());
        assert_eq!(out[0], POLITICS[0]);
    }

    #[test]
    fn unknown_category_names_valid_set() {
        let err = resolve_sources(None, Some("sports")).unwrap_err();
        match &err {
            SearchError::UnknownCategory { given, valid } => {
                assert_eq!(given, "sports");
                assert_eq!(valid, &vec!["technology", "politics", "science", "culture", "economics"]);
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
        assert!(err.to_string().contains("technology, politics, science, culture, economics"));
    }

    #[test]
    fn no_input_flattens_full_catalog_deterministically() {
        let out = resolve_sources(None, None).unwrap();
        let total: usize = Category::ALL.iter().map(|c| c.newsletters().len()).sum();
        assert_eq!(out.len(), total);
        assert_eq!(out.first().map(String::as_str), Some(TECHNOLOGY[0]));
        assert_eq!(out.last().map(String::as_str), ECONOMICS.last().copied());
        assert_eq!(out, resolve_sources(None, None).unwrap());
    }
}
