//! Category selection shared by all sources.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use accident_map_accident_models::{AccidentType, SeverityType};

#[derive(Debug, Clone)]
struct Sets {
    accident_types: BTreeSet<AccidentType>,
    severity_types: BTreeSet<SeverityType>,
}

/// Enabled accident types and severity types.
///
/// Both sets start with every category enabled. Severity keys of the two
/// source taxonomies live side by side without colliding.
#[derive(Debug)]
pub struct Selection {
    sets: RwLock<Sets>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    /// A selection with every category enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(Sets {
                accident_types: AccidentType::all().iter().copied().collect(),
                severity_types: SeverityType::all().into_iter().collect(),
            }),
        }
    }

    /// Whether a marker with these categories should be visible.
    #[must_use]
    pub fn is_selected(&self, accident_type: AccidentType, severity_type: SeverityType) -> bool {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        sets.accident_types.contains(&accident_type) && sets.severity_types.contains(&severity_type)
    }

    /// Enables or disables an accident type. Returns whether the set
    /// changed.
    pub fn set_accident_type(&self, accident_type: AccidentType, selected: bool) -> bool {
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        if selected {
            sets.accident_types.insert(accident_type)
        } else {
            sets.accident_types.remove(&accident_type)
        }
    }

    /// Enables or disables a severity type. Returns whether the set
    /// changed.
    pub fn set_severity_type(&self, severity_type: SeverityType, selected: bool) -> bool {
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        if selected {
            sets.severity_types.insert(severity_type)
        } else {
            sets.severity_types.remove(&severity_type)
        }
    }

    #[must_use]
    pub fn accident_types(&self) -> Vec<AccidentType> {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        sets.accident_types.iter().copied().collect()
    }

    #[must_use]
    pub fn severity_types(&self) -> Vec<SeverityType> {
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        sets.severity_types.iter().copied().collect()
    }
}
