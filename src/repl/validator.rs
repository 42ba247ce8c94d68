//! Command line validator
//!
//! Catches grammar-level mistakes only: a line that does not start with one
//! of the tools, an unknown verb, or a verb that needs a resource type and has
//! none. Whether the named objects exist is not checked here.

use crate::grammar::{self, ToolNames};

/// Outcome of validating a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Nothing wrong
    Ok,
    /// A prefix of a valid command
    Incomplete,
    /// A definite mistake, with a reason suitable for an inline hint
    Error(String),
}

impl Validation {
    pub fn is_error(&self) -> bool {
        matches!(self, Validation::Error(_))
    }

    /// Reason for an error
    pub fn message(&self) -> Option<&str> {
        match self {
            Validation::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Stateless validator for cluster and release tool commands
#[derive(Debug, Clone, Default)]
pub struct CommandValidator {
    tools: ToolNames,
}

impl CommandValidator {
    pub fn new(tools: ToolNames) -> Self {
        Self { tools }
    }

    /// Validate a command line
    ///
    /// # Arguments
    /// * `line` - The full or partial command line
    ///
    /// # Returns
    /// * `Validation` - Ok, incomplete, or an error with its reason
    pub fn validate(&self, line: &str) -> Validation {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = words.first() else {
            return Validation::Ok;
        };

        let Some(family) = self.tools.family_of(first) else {
            if words.len() == 1 && self.tools.all().iter().any(|tool| tool.starts_with(first)) {
                return Validation::Incomplete;
            }
            return Validation::Error(format!(
                "Commands must start with '{}' or '{}'",
                self.tools.cluster, self.tools.release
            ));
        };

        let Some(verb) = words.get(1) else {
            return Validation::Incomplete;
        };

        if !grammar::is_known_verb(family, verb) {
            return Validation::Error(format!("Unknown {} subcommand: {}", first, verb));
        }

        let needs_resource = grammar::verb(family, verb).is_some_and(|spec| spec.requires_resource);
        if needs_resource && words.len() < 3 {
            return Validation::Error(format!("'{}' requires a resource type", verb));
        }

        Validation::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(line: &str) -> Validation {
        CommandValidator::default().validate(line)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(validate(""), Validation::Ok);
        assert_eq!(validate("   "), Validation::Ok);
    }

    #[test]
    fn test_tool_alone_is_incomplete() {
        assert_eq!(validate("kubectl"), Validation::Incomplete);
        assert_eq!(validate("helm "), Validation::Incomplete);
        assert_eq!(validate("kub"), Validation::Incomplete);
        assert_eq!(validate("h"), Validation::Incomplete);
    }

    #[test]
    fn test_unknown_tool() {
        let expected = Validation::Error("Commands must start with 'kubectl' or 'helm'".to_string());
        assert_eq!(validate("ls"), expected);
        assert_eq!(validate("randomtool foo"), expected);
        assert_eq!(validate("kub get"), expected);
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(
            validate("kubectl bogus-verb"),
            Validation::Error("Unknown kubectl subcommand: bogus-verb".to_string())
        );
        assert_eq!(
            validate("helm deploy web"),
            Validation::Error("Unknown helm subcommand: deploy".to_string())
        );
    }

    #[test]
    fn test_verb_requires_resource() {
        assert_eq!(
            validate("kubectl get"),
            Validation::Error("'get' requires a resource type".to_string())
        );
        assert!(validate("kubectl delete ").is_error());
        assert_eq!(validate("kubectl get pods"), Validation::Ok);
        // release tool verbs never need one
        assert_eq!(validate("helm get"), Validation::Ok);
    }

    #[test]
    fn test_validation_only_verbs() {
        assert_eq!(validate("kubectl explain pods"), Validation::Ok);
        assert_eq!(validate("kubectl version"), Validation::Ok);
        assert_eq!(validate("helm search repo nginx"), Validation::Ok);
    }

    #[test]
    fn test_custom_tool_names() {
        let validator = CommandValidator::new(ToolNames::new("oc", "helm3"));
        assert_eq!(validator.validate("oc get pods"), Validation::Ok);
        assert_eq!(
            validator.validate("kubectl get pods").message(),
            Some("Commands must start with 'oc' or 'helm3'")
        );
    }
}
