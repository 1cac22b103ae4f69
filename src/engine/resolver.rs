//! Turns loosely typed project names ("ctgo", "Bugs") into canonical project names.
//!
//! Resolution goes through aliases, exact names and finally fuzzy matching, where substring hits
//! always outrank edit distance hits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{alias::synthesize, error::TrackError};

/// Maximum edit distance for a project to be considered a typo of the input.
const MAX_EDIT_DISTANCE: usize = 3;

/// Known projects and the short aliases pointing at them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    /// Canonical project names. The order is used for export columns.
    #[serde(default)]
    projects: Vec<String>,
    /// Case folded alias -> canonical name.
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Alias,
    Exact,
    Fuzzy,
    /// Nothing matched, the input is used as a new project name.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub suggestions: Vec<String>,
    pub kind: MatchKind,
}

impl Resolution {
    fn direct(name: String, kind: MatchKind) -> Self {
        Self {
            name,
            suggestions: vec![],
            kind,
        }
    }
}

struct Candidate<'a> {
    name: &'a str,
    distance: usize,
}

impl ProjectRegistry {
    pub fn new(projects: Vec<String>, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut registry = Self {
            projects,
            aliases: BTreeMap::new(),
        };
        for (alias, project) in aliases {
            registry.set_alias(&alias, project);
        }
        registry
    }

    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    /// Aliases sorted by alias.
    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    pub fn set_projects(&mut self, projects: Vec<String>) {
        self.projects = projects;
    }

    /// Replaces the known projects and generates a unique alias for each of them.
    /// Returns the generated `(alias, project)` pairs in project order.
    pub fn adopt_projects(&mut self, projects: Vec<String>) -> Vec<(String, String)> {
        let mut created = Vec::with_capacity(projects.len());
        for project in &projects {
            let alias = synthesize(project, &self.aliases);
            self.aliases.insert(alias.clone(), project.clone());
            created.push((alias, project.clone()));
        }
        self.projects = projects;
        created
    }

    /// Stores an alias. An existing alias with the same key is overwritten.
    pub fn set_alias(&mut self, alias: &str, project: String) -> Option<String> {
        self.aliases.insert(alias.to_lowercase(), project)
    }

    pub fn remove_alias(&mut self, alias: &str) -> Result<String, TrackError> {
        let key = alias.to_lowercase();
        self.aliases
            .remove(&key)
            .ok_or(TrackError::AliasNotFound(key))
    }

    #[cfg(test)]
    pub fn alias_for(&self, project: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, v)| v.as_str() == project)
            .map(|(k, _)| k.as_str())
    }

    /// Alias or case insensitive exact name lookup, without any fuzzy matching.
    pub fn canonical(&self, input: &str) -> Option<(&str, MatchKind)> {
        let needle = input.to_lowercase();
        if let Some(name) = self.aliases.get(&needle) {
            return Some((name, MatchKind::Alias));
        }
        self.projects
            .iter()
            .find(|v| v.to_lowercase() == needle)
            .map(|v| (v.as_str(), MatchKind::Exact))
    }

    /// Resolves `input` into a canonical project name. When the fuzzy step finds more than one
    /// plausible project, the best one is returned and the others are listed as suggestions.
    pub fn resolve(&self, input: &str) -> Resolution {
        if let Some((name, kind)) = self.canonical(input) {
            debug!("Resolved {input:?} to {name:?} by {kind:?}");
            return Resolution::direct(name.to_string(), kind);
        }

        let needle = input.to_lowercase();
        if needle.trim().is_empty() {
            return Resolution::direct(input.to_string(), MatchKind::Literal);
        }

        let mut candidates = Vec::<Candidate>::new();
        for project in &self.projects {
            if project.to_lowercase().contains(&needle) {
                candidates.push(Candidate {
                    name: project,
                    distance: 0,
                });
                continue;
            }
            let distance = levenshtein(&needle, project);
            if distance <= MAX_EDIT_DISTANCE && distance <= project.chars().count() / 2 {
                candidates.push(Candidate {
                    name: project,
                    distance,
                });
            }
        }
        for (alias, project) in &self.aliases {
            if alias.contains(&needle) && !candidates.iter().any(|v| v.name == project.as_str()) {
                candidates.push(Candidate {
                    name: project,
                    distance: 0,
                });
            }
        }

        let resolution = select(candidates)
            .unwrap_or_else(|| Resolution::direct(input.to_string(), MatchKind::Literal));
        debug!(
            "Resolved {input:?} to {:?} with suggestions {:?}",
            resolution.name, resolution.suggestions
        );
        resolution
    }
}

fn select(candidates: Vec<Candidate>) -> Option<Resolution> {
    let (strong, weak): (Vec<_>, Vec<_>) = candidates.iter().partition(|v| v.distance == 0);

    let (primary, others) = if let Some((first, rest)) = strong.split_first() {
        (first.name, rest.to_vec())
    } else {
        let best = weak
            .iter()
            .enumerate()
            .min_by_key(|(index, v)| (v.distance, *index))
            .map(|(index, _)| index)?;
        let others = weak
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != best)
            .map(|(_, v)| *v)
            .collect();
        (weak[best].name, others)
    };

    Some(Resolution {
        name: primary.to_string(),
        suggestions: others.iter().map(|v| v.name.to_string()).collect(),
        kind: MatchKind::Fuzzy,
    })
}

/// Case insensitive edit distance where insertion, deletion and substitution all cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a = a.to_lowercase().chars().collect::<Vec<_>>();
    let b = b.to_lowercase().chars().collect::<Vec<_>>();

    let mut previous = (0..=b.len()).collect::<Vec<_>>();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::{levenshtein, MatchKind, ProjectRegistry, Resolution};

    fn registry_of(projects: &[&str], aliases: &[(&str, &str)]) -> ProjectRegistry {
        ProjectRegistry::new(
            projects.iter().map(|v| v.to_string()).collect(),
            aliases.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("Bugs", "bugs"), 0);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
    }

    #[test]
    fn test_alias_is_case_insensitive() {
        let registry = registry_of(&[], &[("ctgov", "CT.Gov Automation")]);
        assert_eq!(
            registry.resolve("CTGOV"),
            Resolution {
                name: "CT.Gov Automation".into(),
                suggestions: vec![],
                kind: MatchKind::Alias,
            }
        );
    }

    #[test]
    fn test_exact_match_returns_canonical_spelling() {
        let registry = registry_of(&["Tech Debt"], &[]);
        let resolution = registry.resolve("tech debt");
        assert_eq!(resolution.name, "Tech Debt");
        assert_eq!(resolution.kind, MatchKind::Exact);
    }

    #[test]
    fn test_single_substring_match() {
        let registry = registry_of(&["Bugs", "Tech Debt"], &[]);
        let resolution = registry.resolve("bug");
        assert_eq!(resolution.name, "Bugs");
        assert!(resolution.suggestions.is_empty());
        assert_eq!(resolution.kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_multiple_substring_matches_suggest_the_rest() {
        let registry = registry_of(&["Bugs", "Budget"], &[]);
        let resolution = registry.resolve("bu");
        assert_eq!(resolution.name, "Bugs");
        assert_eq!(resolution.suggestions, vec!["Budget".to_string()]);
    }

    #[test]
    fn test_substring_outranks_edit_distance() {
        // "Docs" is 1 edit away from "dock", "Dockerization" contains it.
        let registry = registry_of(&["Docs", "Dockerization"], &[]);
        let resolution = registry.resolve("dock");
        assert_eq!(resolution.name, "Dockerization");
        assert!(resolution.suggestions.is_empty());
    }

    #[test]
    fn test_lowest_edit_distance_wins() {
        let registry = registry_of(&["Reporting", "Research"], &[]);
        let resolution = registry.resolve("Reserch");
        assert_eq!(resolution.name, "Research");
        assert!(resolution.suggestions.is_empty());

        let registry = registry_of(&["Plan", "Plans", "Planes"], &[]);
        let resolution = registry.resolve("plaxs");
        assert_eq!(resolution.name, "Plans");
        assert_eq!(
            resolution.suggestions,
            vec!["Plan".to_string(), "Planes".to_string()]
        );
    }

    #[test]
    fn test_edit_distance_limited_by_candidate_length() {
        // 2 edits on a 3 character name is more than half of it.
        let registry = registry_of(&["Ops"], &[]);
        assert_eq!(registry.resolve("oxx").kind, MatchKind::Literal);
    }

    #[test]
    fn test_alias_substring_adds_candidate() {
        let registry = registry_of(&["Bugs"], &[("ctgov", "CT.Gov Automation"), ("bugs", "Bugs")]);
        let resolution = registry.resolve("ctg");
        assert_eq!(resolution.name, "CT.Gov Automation");
        assert!(resolution.suggestions.is_empty());

        // Already found through the project list, so not repeated.
        let resolution = registry.resolve("ug");
        assert_eq!(resolution.name, "Bugs");
        assert!(resolution.suggestions.is_empty());
    }

    #[test]
    fn test_unknown_input_is_literal() {
        let registry = registry_of(&["Bugs"], &[]);
        assert_eq!(
            registry.resolve("Quantum Research"),
            Resolution {
                name: "Quantum Research".into(),
                suggestions: vec![],
                kind: MatchKind::Literal,
            }
        );
        assert_eq!(registry.resolve("").kind, MatchKind::Literal);
    }

    #[test]
    fn test_alias_keys_are_case_folded() {
        let mut registry = registry_of(&[], &[]);
        registry.set_alias("TD", "Tech Debt".into());
        assert_eq!(registry.aliases().get("td").map(String::as_str), Some("Tech Debt"));
        assert_eq!(registry.alias_for("Tech Debt"), Some("td"));
        assert!(registry.remove_alias("Td").is_ok());
        assert!(registry.remove_alias("td").is_err());
    }

    #[test]
    fn test_adopt_projects_generates_unique_aliases() {
        let mut registry = registry_of(&[], &[]);
        let created = registry.adopt_projects(vec!["Tech Debt".into(), "Tech Design".into()]);
        assert_eq!(
            created,
            vec![
                ("tede".to_string(), "Tech Debt".to_string()),
                ("tede2".to_string(), "Tech Design".to_string()),
            ]
        );
        assert_eq!(registry.projects().len(), 2);
        assert_eq!(registry.resolve("tede2").name, "Tech Design");
    }
}
