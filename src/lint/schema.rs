use super::{main_source, RuleOutcome, SourceFile, SourceRule};
use regex::Regex;
use serde_json::{Map, Value};

/// Checks that the main node file has the parts every node type needs
pub struct SchemaRule {
    checks: Vec<(&'static str, Regex)>,
}

impl SchemaRule {
    pub fn new() -> Self {
        let checks = [
            ("has_description", r"description\s*[:=]"),
            ("has_properties", r"properties\s*[:=]"),
            ("has_execute_method", r"async\s+execute|execute\s*\("),
            ("extends_node_type", r"implements\s+INodeType\b"),
        ];
        Self {
            checks: checks
                .into_iter()
                .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid schema pattern")))
                .collect(),
        }
    }
}

impl Default for SchemaRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRule for SchemaRule {
    fn name(&self) -> &'static str {
        "schema_validation"
    }

    fn check(&self, files: &[SourceFile]) -> RuleOutcome {
        let Some(main) = main_source(files) else {
            return RuleOutcome::no_sources();
        };

        let mut details = Map::new();
        for (name, re) in &self.checks {
            details.insert(name.to_string(), Value::Bool(re.is_match(&main.content)));
        }
        let success = details.values().all(|v| v == &Value::Bool(true));
        details.insert("file".to_string(), Value::String(main.file_name()));

        RuleOutcome {
            success,
            message: format!(
                "Schema validation {}",
                if success { "passed" } else { "failed" }
            ),
            details,
        }
    }
}
