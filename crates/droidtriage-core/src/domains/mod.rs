//! Built-in rule tables, one module per error family.

pub mod compose;
pub mod generic;
pub mod gradle;
pub mod layout;
pub mod manifest;

use crate::diagnosis::Domain;
use crate::error::Result;
use crate::rules::DomainRuleSet;

/// Build the rule set for `domain`.
pub fn rule_set(domain: Domain) -> Result<DomainRuleSet> {
    match domain {
        Domain::Manifest => manifest::rule_set(),
        Domain::Layout => layout::rule_set(),
        Domain::Compose => compose::rule_set(),
        Domain::Gradle => gradle::rule_set(),
        Domain::Generic => generic::rule_set(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_domain_builds() {
        for domain in Domain::ALL {
            let set = rule_set(domain).expect("rule set");
            assert_eq!(set.domain(), domain);
            assert!(!set.rules().is_empty());
        }
    }
}
