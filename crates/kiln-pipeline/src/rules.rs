//! Rule matching: which transforms a file goes through.
//!
//! Rules are compiled once per build. Every rule whose `test` matches and
//! whose `exclude` patterns do not applies; the chains of all applying rules
//! are concatenated in declaration order. Execution then walks the combined
//! chain from the last link to the first.

use std::path::Path;
use std::sync::Arc;

use kiln_config::{RuleConfig, TransformRef};
use regex::Regex;

use crate::transform::TransformRegistry;
use crate::{Error, Result, slash_path};

#[derive(Debug)]
struct CompiledRule {
    index: usize,
    test: Regex,
    exclude: Vec<Regex>,
    chain: Vec<Arc<TransformRef>>,
}

impl CompiledRule {
    fn applies_to(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.iter().any(|re| re.is_match(path))
    }
}

/// One transform in a resolved chain, tagged with where it was declared.
#[derive(Debug, Clone)]
pub struct ChainLink {
    /// Index of the declaring rule in the `rules` list.
    pub rule_index: usize,
    /// Position inside that rule's `use` list.
    pub position: usize,
    pub transform: Arc<TransformRef>,
}

impl ChainLink {
    pub fn loader(&self) -> &str {
        &self.transform.loader
    }
}

/// Transform chain resolved for one file, stored in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    links: Vec<ChainLink>,
}

impl TransformChain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    /// Links in declaration order.
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Links in the order they run: last declared first.
    pub fn execution_order(&self) -> impl Iterator<Item = &ChainLink> {
        self.links.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn loaders(&self) -> Vec<&str> {
        self.links.iter().map(ChainLink::loader).collect()
    }
}

/// Compiled, ordered rule set.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Compile rule regexes.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] for the first regex that fails to compile.
    pub fn compile(rules: &[RuleConfig]) -> Result<Self> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                Ok(CompiledRule {
                    index,
                    test: compile_regex(&rule.test)?,
                    exclude: rule
                        .exclude
                        .iter()
                        .map(|pattern| compile_regex(pattern))
                        .collect::<Result<_>>()?,
                    chain: rule.chain.iter().cloned().map(Arc::new).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Fail with [`Error::UnknownLoader`] if any rule names a loader the
    /// registry does not know.
    pub fn check_loaders(&self, registry: &TransformRegistry) -> Result<()> {
        for rule in &self.rules {
            for transform in &rule.chain {
                if !registry.contains(&transform.loader) {
                    return Err(Error::UnknownLoader(transform.loader.clone()));
                }
            }
        }
        Ok(())
    }

    /// Chain for `path`, relative to the project root. Pure.
    pub fn rules_for(&self, path: &Path) -> TransformChain {
        let path = slash_path(path);
        let links = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(&path))
            .flat_map(|rule| {
                rule.chain
                    .iter()
                    .enumerate()
                    .map(move |(position, transform)| ChainLink {
                        rule_index: rule.index,
                        position,
                        transform: Arc::clone(transform),
                    })
            })
            .collect();

        TransformChain::new(links)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
