//! Local translation sync against Transifex

use crate::core::{config::DeployConfig, ShellCommand, Step, Task};

/// `tx pull` then compile the catalogs
pub fn pull_steps(config: &DeployConfig) -> Vec<Step> {
    vec![
        Step::shell(
            "tx_pull",
            ShellCommand::local("tx pull").in_dir(&config.translations_dir),
        ),
        Step::shell(
            "compilemessages",
            ShellCommand::local("python manage.py compilemessages")
                .in_dir(&config.translations_dir),
        ),
    ]
}

/// Regenerate source catalogs then push them
///
/// `source` adds `-s` (source strings), `translation` adds `-t`.
pub fn push_steps(config: &DeployConfig, source: bool, translation: bool) -> Vec<Step> {
    let mut push = vec!["tx", "push"];
    if source {
        push.push("-s");
    }
    if translation {
        push.push("-t");
    }

    vec![
        Step::shell(
            "makemessages",
            ShellCommand::local("python manage.py makemessages -a")
                .in_dir(&config.translations_dir),
        ),
        Step::shell(
            "tx_push",
            ShellCommand::local(push.join(" ")).in_dir(&config.translations_dir),
        ),
    ]
}

pub fn pull_translations(config: &DeployConfig) -> Task {
    Task::new("pull-translations", "Pull translations from Transifex and compile them")
        .with_steps(pull_steps(config))
}

pub fn push_translations(config: &DeployConfig, source: bool, translation: bool) -> Task {
    Task::new("push-translations", "Extract messages and push them to Transifex")
        .with_steps(push_steps(config, source, translation))
}
