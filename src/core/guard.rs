//! CI branch guard

use crate::core::environment::Environment;

/// Variable holding the branch the CI build runs on
pub const CI_BRANCH_VAR: &str = "TRAVIS_BRANCH";
/// Variable holding the pull request number, or `false` for branch builds
pub const CI_PULL_REQUEST_VAR: &str = "TRAVIS_PULL_REQUEST";

/// What the CI service reports about the current build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub branch: Option<String>,
    pub pull_request: Option<String>,
}

impl CiEnvironment {
    pub fn from_env(env: &Environment) -> Self {
        Self {
            branch: env.get(CI_BRANCH_VAR).map(str::to_string),
            pull_request: env.get(CI_PULL_REQUEST_VAR).map(str::to_string),
        }
    }

    /// Whether the build was triggered by a pull request
    ///
    /// Only the literal `false` marks a branch build; an unset indicator
    /// counts as a pull request.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.as_deref() != Some("false")
    }
}

/// Restricts a task to one CI branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchGuard {
    /// Branch the task is allowed to run on
    pub branch: String,

    /// Run even when the build comes from a pull request
    pub allow_pull_requests: bool,
}

/// Result of checking a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Skip(String),
}

impl BranchGuard {
    /// Guard that also rejects pull request builds
    pub fn branch_only(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            allow_pull_requests: false,
        }
    }

    /// Decide whether `task` may run in the given CI environment
    pub fn evaluate(&self, ci: &CiEnvironment, task: &str) -> GuardDecision {
        if ci.branch.as_deref() != Some(self.branch.as_str()) {
            let current = ci.branch.as_deref().unwrap_or("(unset)");
            return GuardDecision::Skip(format!(
                "Branch {} is not {}. Job {} skipped.",
                current, self.branch, task
            ));
        }

        if !self.allow_pull_requests && ci.is_pull_request() {
            return GuardDecision::Skip(format!(
                "Build triggered by a pull request. Job {} skipped.",
                task
            ));
        }

        GuardDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ci(branch: Option<&str>, pr: Option<&str>) -> CiEnvironment {
        CiEnvironment {
            branch: branch.map(str::to_string),
            pull_request: pr.map(str::to_string),
        }
    }

    #[test]
    fn test_matching_branch_proceeds() {
        let guard = BranchGuard::branch_only("master");
        let decision = guard.evaluate(&ci(Some("master"), Some("false")), "push");
        assert_eq!(decision, GuardDecision::Proceed);
    }

    #[test]
    fn test_other_branch_skips() {
        let guard = BranchGuard::branch_only("master");
        match guard.evaluate(&ci(Some("feature"), Some("false")), "push") {
            GuardDecision::Skip(reason) => {
                assert_eq!(reason, "Branch feature is not master. Job push skipped.");
            }
            other => panic!("Expected skip, got {:?}", other),
        }
    }

    #[test]
    fn test_unset_branch_skips() {
        let guard = BranchGuard::branch_only("master");
        assert!(matches!(
            guard.evaluate(&ci(None, Some("false")), "push"),
            GuardDecision::Skip(_)
        ));
    }

    #[test]
    fn test_pull_request_skips() {
        let guard = BranchGuard::branch_only("master");
        match guard.evaluate(&ci(Some("master"), Some("42")), "push") {
            GuardDecision::Skip(reason) => assert!(reason.contains("pull request")),
            other => panic!("Expected skip, got {:?}", other),
        }

        // No indicator at all is treated like a pull request
        assert!(matches!(
            guard.evaluate(&ci(Some("master"), None), "push"),
            GuardDecision::Skip(_)
        ));
    }

    #[test]
    fn test_pull_request_allowed() {
        let guard = BranchGuard {
            branch: "master".to_string(),
            allow_pull_requests: true,
        };
        assert_eq!(
            guard.evaluate(&ci(Some("master"), Some("7")), "push"),
            GuardDecision::Proceed
        );
    }

    #[test]
    fn test_from_env() {
        let env = Environment::from_pairs([(CI_BRANCH_VAR, "main"), (CI_PULL_REQUEST_VAR, "false")]);
        let ci = CiEnvironment::from_env(&env);
        assert_eq!(ci.branch.as_deref(), Some("main"));
        assert!(!ci.is_pull_request());
    }
}
