use super::{RuleOutcome, SourceFile, SourceRule};
use regex::Regex;
use serde_json::{Map, Value};

/// A node that declares credentials must load them through
/// `await this.getCredentials`, never read them some other way
pub struct CredentialRule {
    declares: Regex,
    loads_securely: Regex,
}

impl CredentialRule {
    pub fn new() -> Self {
        Self {
            declares: Regex::new(r"credentials\s*[:=]").expect("valid credentials pattern"),
            loads_securely: Regex::new(r"await\s+this\.getCredentials")
                .expect("valid getCredentials pattern"),
        }
    }
}

impl Default for CredentialRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRule for CredentialRule {
    fn name(&self) -> &'static str {
        "credential_validation"
    }

    fn check(&self, files: &[SourceFile]) -> RuleOutcome {
        if files.is_empty() {
            return RuleOutcome::no_sources();
        }

        let required = files.iter().any(|f| self.declares.is_match(&f.content));
        let secure = files.iter().any(|f| self.loads_securely.is_match(&f.content));

        let mut details = Map::new();
        details.insert("credentials_required".to_string(), Value::Bool(required));

        if !required {
            return RuleOutcome {
                success: true,
                message: "No credentials required for this node".to_string(),
                details,
            };
        }

        details.insert("secure_handling".to_string(), Value::Bool(secure));
        RuleOutcome {
            success: secure,
            message: format!(
                "Credential validation {}",
                if secure { "passed" } else { "failed" }
            ),
            details,
        }
    }
}
