use serde::{Deserialize, Serialize};

use crate::engine::{calendar::ObligationRule, resolver::ProjectRegistry};

/// User configuration: recurring obligations plus the project registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub obligations: Vec<ObligationRule>,
    #[serde(flatten)]
    pub registry: ProjectRegistry,
}
