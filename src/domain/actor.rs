use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
};

use crate::error::DomainError;

/// An actor, identified by full name.
///
/// Colleagues are tracked by name; two actors "worked with" each other once
/// either side has recorded the other.
#[derive(Clone, Debug)]
pub struct Actor {
    full_name: String,
    colleagues: BTreeSet<String>,
}

impl Actor {
    pub fn new(full_name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            full_name: super::non_empty(full_name, "actor name")?,
            colleagues: BTreeSet::new(),
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn add_colleague(&mut self, colleague: &Actor) {
        if colleague.full_name != self.full_name {
            self.colleagues.insert(colleague.full_name.clone());
        }
    }

    pub fn worked_with(&self, colleague: &Actor) -> bool {
        self.colleagues.contains(&colleague.full_name)
            || colleague.colleagues.contains(&self.full_name)
    }

    pub fn colleagues(&self) -> impl Iterator<Item = &str> {
        self.colleagues.iter().map(String::as_str)
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for Actor {}

impl PartialOrd for Actor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Actor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_name.cmp(&other.full_name)
    }
}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn colleague_relation_is_symmetric() {
        let mut pratt = Actor::new("Chris Pratt").unwrap();
        let diesel = Actor::new("Vin Diesel").unwrap();
        let stone = Actor::new("Emma Stone").unwrap();

        pratt.add_colleague(&diesel);

        assert!(pratt.worked_with(&diesel));
        assert!(diesel.worked_with(&pratt));
        assert!(!pratt.worked_with(&stone));
    }

    #[test]
    fn identity_ignores_colleagues() {
        let mut a = Actor::new("Emma Stone").unwrap();
        a.add_colleague(&Actor::new("Ryan Gosling").unwrap());
        let b = Actor::new(" Emma Stone").unwrap();

        assert_eq!(a, b);
        let set: HashSet<Actor> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn rejects_empty_name() {
        assert!(Actor::new("").is_err());
    }
}
