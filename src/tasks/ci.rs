//! Translation sync as run from CI
//!
//! Both tasks only run on their own branch and never for pull request
//! builds. The pull task commits refreshed catalogs back to the branch.

use crate::core::{
    config::DeployConfig, context::CI_BRANCH_VARIABLE, credentials::CredentialFile,
    guard::BranchGuard, OnFailure, ShellCommand, Step, Task,
};
use crate::shell::quote::quote_arg;
use crate::tasks::translations;

/// Variable holding the first configured git remote
pub const GIT_REMOTE_VARIABLE: &str = "remote";

fn transifexrc(config: &DeployConfig) -> Step {
    Step::credential("transifexrc", CredentialFile::transifexrc(&config.ci))
}

/// Git identity for the commit, then `~/.netrc` for the push
fn git_setup(config: &DeployConfig) -> Vec<Step> {
    vec![
        Step::shell(
            "git_user_name",
            ShellCommand::local(format!(
                "git config user.name {}",
                quote_arg(&config.ci.git_user_name)
            )),
        ),
        Step::shell(
            "git_user_email",
            ShellCommand::local(format!(
                "git config user.email {}",
                quote_arg(&config.ci.git_user_email)
            )),
        ),
        Step::credential("netrc", CredentialFile::netrc()),
    ]
}

/// Push source strings from the main branch
pub fn ci_push_translations(config: &DeployConfig) -> Task {
    Task::new(
        "ci-push-translations",
        "CI: push source strings to Transifex from the main branch",
    )
    .with_guard(BranchGuard::branch_only(&config.ci.main_branch))
    .with_step(transifexrc(config))
    .with_steps(translations::push_steps(config, true, false))
}

/// Pull translations and commit them back to the translation branch
pub fn ci_pull_translations(config: &DeployConfig) -> Task {
    Task::new(
        "ci-pull-translations",
        "CI: pull translations and commit them to the translation branch",
    )
    .with_guard(BranchGuard::branch_only(&config.ci.translation_branch))
    .with_step(transifexrc(config))
    .with_steps(git_setup(config))
    .with_steps(translations::pull_steps(config))
    .with_step(Step::shell(
        "git_add",
        ShellCommand::local(format!("git add {}", quote_arg(&config.locale_dir))),
    ))
    // An empty commit fails; there is nothing to push then
    .with_step(Step::shell(
        "git_commit",
        ShellCommand::local(format!(
            "git commit -m {}",
            quote_arg(&config.ci.commit_message)
        ))
        .on_failure(OnFailure::Finish),
    ))
    .with_step(Step::shell(
        "git_remote",
        ShellCommand::local("git remote 2>/dev/null | head -n1").capture_as(GIT_REMOTE_VARIABLE),
    ))
    // A failed push is picked up by the next build
    .with_step(Step::shell(
        "git_push",
        ShellCommand::local(format!(
            "git push {{{{ {} }}}} {{{{ {} }}}}",
            GIT_REMOTE_VARIABLE, CI_BRANCH_VARIABLE
        ))
        .on_failure(OnFailure::Continue),
    ))
}
