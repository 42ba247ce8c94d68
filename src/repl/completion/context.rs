//! Completion context detection
//!
//! Turns the text before the cursor into a [`CompletionContext`] describing
//! what kind of word is being completed. Dispatch is driven by the number of
//! whitespace-separated words, the same way the tools' own grammars nest:
//! `tool verb resource name --flag value`.

use crate::cache::Category;
use crate::grammar::{self, Family, ToolNames};

/// What the word under the cursor should be completed as
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContext {
    /// Nothing typed yet
    CommonCommands,

    /// Verbs of a tool
    Verbs { family: Family, prefix: String },

    /// Word after a verb: resources, subcommands or release names
    Arguments {
        family: Family,
        verb: String,
        prefix: String,
    },

    /// Resource types after a verb's subcommand (`rollout restart ...`)
    Resources {
        family: Family,
        verb: String,
        prefix: String,
    },

    /// Names of live objects of one category
    LiveNames { category: Category, prefix: String },

    /// Flags of a verb
    Flags {
        family: Family,
        verb: String,
        prefix: String,
    },

    /// Value of a value-taking flag
    FlagValues { category: Category, prefix: String },

    /// Positional word drawn from a cache category (`exec ... --`,
    /// `port-forward <pod>`, `explain`)
    ArgumentValues { category: Category, prefix: String },

    /// A lone word that is not a tool name yet
    ToolsAndVerbs { prefix: String },

    /// Substring search over remembered commands
    History { query: String },
}

/// Whitespace-split view of the text before the cursor
#[derive(Debug)]
struct Words<'a> {
    words: Vec<&'a str>,
    /// Text ends in whitespace, so the word under the cursor is empty
    trailing_space: bool,
}

impl<'a> Words<'a> {
    fn split(text: &'a str) -> Self {
        Self {
            words: text.split_whitespace().collect(),
            trailing_space: text.ends_with(char::is_whitespace),
        }
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn get(&self, index: usize) -> &'a str {
        self.words.get(index).copied().unwrap_or_default()
    }

    /// Index of the word under the cursor
    fn cursor_index(&self) -> usize {
        if self.trailing_space {
            self.words.len()
        } else {
            self.words.len().saturating_sub(1)
        }
    }

    /// Partial word under the cursor
    fn current(&self) -> &'a str {
        if self.trailing_space {
            ""
        } else {
            self.words.last().copied().unwrap_or_default()
        }
    }

    /// Last complete word before the one under the cursor
    fn previous(&self) -> &'a str {
        let complete = if self.trailing_space {
            self.words.len()
        } else {
            self.words.len().saturating_sub(1)
        };
        match complete {
            0 => "",
            n => self.words[n - 1],
        }
    }
}

impl CompletionContext {
    /// Work out what to complete for `text`
    pub fn analyze(text: &str, tools: &ToolNames) -> Self {
        let words = Words::split(text);

        if words.is_empty() {
            return Self::CommonCommands;
        }

        if let Some(family) = tools.family_of(words.get(0)) {
            return Self::for_family(family, &words).unwrap_or_else(|| Self::history(text));
        }

        if words.len() == 1 && !words.trailing_space {
            return Self::ToolsAndVerbs {
                prefix: words.get(0).to_string(),
            };
        }

        Self::history(text)
    }

    fn history(text: &str) -> Self {
        Self::History {
            query: text.to_string(),
        }
    }

    /// Word-count state machine for commands starting with a tool name
    fn for_family(family: Family, words: &Words<'_>) -> Option<Self> {
        let verb = words.get(1);
        let current = words.current();

        match words.len() {
            1 => Some(Self::Verbs {
                family,
                prefix: String::new(),
            }),
            2 => {
                if let Some(context) = Self::for_argument(family, verb, words) {
                    Some(context)
                } else if grammar::verb(family, verb).is_some() {
                    Some(Self::Arguments {
                        family,
                        verb: verb.to_string(),
                        prefix: String::new(),
                    })
                } else if !words.trailing_space {
                    Some(Self::Verbs {
                        family,
                        prefix: verb.to_string(),
                    })
                } else {
                    None
                }
            }
            n => {
                if let Some(context) = Self::for_flag(family, verb, words) {
                    return Some(context);
                }
                if let Some(context) = Self::for_argument(family, verb, words) {
                    return Some(context);
                }

                let object = words.get(2);
                if n == 3 {
                    if let Some(category) = Category::from_resource(object) {
                        return Some(Self::LiveNames {
                            category,
                            prefix: String::new(),
                        });
                    }
                    let spec = grammar::verb(family, verb)?;
                    if spec.subcommands.contains(&object) {
                        return Some(Self::Resources {
                            family,
                            verb: verb.to_string(),
                            prefix: String::new(),
                        });
                    }
                    if !words.trailing_space {
                        return Some(Self::Arguments {
                            family,
                            verb: verb.to_string(),
                            prefix: current.to_string(),
                        });
                    }
                    return None;
                }

                if n == 4 && !words.trailing_space {
                    if let Some(category) = Category::from_resource(object) {
                        return Some(Self::LiveNames {
                            category,
                            prefix: current.to_string(),
                        });
                    }
                }
                None
            }
        }
    }

    /// Flag names, or the value of the flag before the cursor
    fn for_flag(family: Family, verb: &str, words: &Words<'_>) -> Option<Self> {
        let current = words.current();
        if current.starts_with('-') {
            return Some(Self::Flags {
                family,
                verb: verb.to_string(),
                prefix: current.to_string(),
            });
        }
        grammar::value_source(family, words.previous()).map(|category| Self::FlagValues {
            category,
            prefix: current.to_string(),
        })
    }

    /// Positional words whose values come from a cache category
    fn for_argument(family: Family, verb: &str, words: &Words<'_>) -> Option<Self> {
        let position = words.cursor_index().checked_sub(2)?;
        grammar::argument_source(family, verb, position, words.previous()).map(|category| {
            Self::ArgumentValues {
                category,
                prefix: words.current().to_string(),
            }
        })
    }

    /// Text already typed that a candidate replaces
    pub fn prefix(&self) -> &str {
        match self {
            Self::CommonCommands => "",
            Self::Verbs { prefix, .. }
            | Self::Arguments { prefix, .. }
            | Self::Resources { prefix, .. }
            | Self::LiveNames { prefix, .. }
            | Self::Flags { prefix, .. }
            | Self::FlagValues { prefix, .. }
            | Self::ArgumentValues { prefix, .. }
            | Self::ToolsAndVerbs { prefix } => prefix,
            Self::History { query } => query,
        }
    }

    /// Check if this is the history fallback
    pub fn is_history(&self) -> bool {
        matches!(self, Self::History { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> CompletionContext {
        CompletionContext::analyze(text, &ToolNames::default())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(analyze(""), CompletionContext::CommonCommands);
        assert_eq!(analyze("   "), CompletionContext::CommonCommands);
    }

    #[test]
    fn test_tool_only() {
        let expected = CompletionContext::Verbs {
            family: Family::ClusterCli,
            prefix: String::new(),
        };
        assert_eq!(analyze("kubectl"), expected);
        assert_eq!(analyze("kubectl "), expected);
    }

    #[test]
    fn test_partial_verb() {
        assert_eq!(
            analyze("helm up"),
            CompletionContext::Verbs {
                family: Family::ReleaseCli,
                prefix: "up".to_string(),
            }
        );
        assert!(analyze("helm bogus ").is_history());
    }

    #[test]
    fn test_known_verb() {
        assert_eq!(
            analyze("kubectl get "),
            CompletionContext::Arguments {
                family: Family::ClusterCli,
                verb: "get".to_string(),
                prefix: String::new(),
            }
        );
    }

    #[test]
    fn test_live_category() {
        let expected = CompletionContext::LiveNames {
            category: Category::Pods,
            prefix: String::new(),
        };
        assert_eq!(analyze("kubectl logs pods "), expected);
        assert_eq!(analyze("kubectl get po"), expected);
        assert_eq!(
            analyze("kubectl describe svc we"),
            CompletionContext::LiveNames {
                category: Category::Services,
                prefix: "we".to_string(),
            }
        );
    }

    #[test]
    fn test_subcommand_then_resources() {
        assert_eq!(
            analyze("kubectl rollout restart "),
            CompletionContext::Resources {
                family: Family::ClusterCli,
                verb: "rollout".to_string(),
                prefix: String::new(),
            }
        );
    }

    #[test]
    fn test_partial_resource() {
        assert_eq!(
            analyze("kubectl get deplo"),
            CompletionContext::Arguments {
                family: Family::ClusterCli,
                verb: "get".to_string(),
                prefix: "deplo".to_string(),
            }
        );
    }

    #[test]
    fn test_flags_and_values() {
        assert_eq!(
            analyze("kubectl get pods --sh"),
            CompletionContext::Flags {
                family: Family::ClusterCli,
                verb: "get".to_string(),
                prefix: "--sh".to_string(),
            }
        );
        assert_eq!(
            analyze("kubectl get pods -o ya"),
            CompletionContext::FlagValues {
                category: Category::OutputFormats,
                prefix: "ya".to_string(),
            }
        );
        assert_eq!(
            analyze("kubectl get pods -n "),
            CompletionContext::FlagValues {
                category: Category::Namespaces,
                prefix: String::new(),
            }
        );
        assert_eq!(
            analyze("helm list -o "),
            CompletionContext::FlagValues {
                category: Category::ReleaseOutputFormats,
                prefix: String::new(),
            }
        );
    }

    #[test]
    fn test_positional_values() {
        assert_eq!(
            analyze("kubectl exec -it web-1 -- "),
            CompletionContext::ArgumentValues {
                category: Category::ContainerCommands,
                prefix: String::new(),
            }
        );
        assert_eq!(
            analyze("kubectl exec web-1 -- /bin/b"),
            CompletionContext::ArgumentValues {
                category: Category::ContainerCommands,
                prefix: "/bin/b".to_string(),
            }
        );
        assert_eq!(
            analyze("kubectl port-forward web-1 80"),
            CompletionContext::ArgumentValues {
                category: Category::PortMappings,
                prefix: "80".to_string(),
            }
        );
        assert_eq!(
            analyze("kubectl explain "),
            CompletionContext::ArgumentValues {
                category: Category::ResourceTypes,
                prefix: String::new(),
            }
        );
        assert_eq!(
            analyze("kubectl expose deployment web --protocol "),
            CompletionContext::FlagValues {
                category: Category::Protocols,
                prefix: String::new(),
            }
        );
        // still a partial verb
        assert_eq!(
            analyze("kubectl expl"),
            CompletionContext::Verbs {
                family: Family::ClusterCli,
                prefix: "expl".to_string(),
            }
        );
    }

    #[test]
    fn test_lone_word() {
        assert_eq!(
            analyze("kub"),
            CompletionContext::ToolsAndVerbs {
                prefix: "kub".to_string(),
            }
        );
        assert!(analyze("kub ").is_history());
    }

    #[test]
    fn test_other_input_searches_history() {
        assert_eq!(
            analyze("echo get pods"),
            CompletionContext::History {
                query: "echo get pods".to_string(),
            }
        );
        assert!(analyze("kubectl get pods web-1 ").is_history());
    }

    #[test]
    fn test_prefix() {
        assert_eq!(analyze("helm up").prefix(), "up");
        assert_eq!(analyze("kubectl get ").prefix(), "");
        assert_eq!(analyze("x y").prefix(), "x y");
    }
}
