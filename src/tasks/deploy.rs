//! Remote deploy chain

use crate::core::{config::DeployConfig, ShellCommand, Step, Task};

/// `git pull` in the project checkout
pub fn pull_repo(config: &DeployConfig) -> Step {
    Step::shell(
        "pull_repo",
        ShellCommand::remote(format!(
            "git pull {} {}",
            config.git_remote, config.deploy_branch
        ))
        .in_dir(&config.project_dir),
    )
}

/// Install production requirements into the virtualenv
pub fn install_requirements(config: &DeployConfig) -> Step {
    Step::shell(
        "install_requirements",
        ShellCommand::remote(format!(
            "{} install -r {}",
            config.venv_bin("pip"),
            config.requirements_file
        ))
        .in_dir(&config.project_dir),
    )
}

/// A `manage.py` command run with the project's `env.sh` sourced
fn manage_with_env(config: &DeployConfig, args: &str) -> ShellCommand {
    ShellCommand::remote(format!(
        "source {}/env.sh && {} manage.py {}",
        config.project_dir,
        config.venv_bin("python"),
        args
    ))
    .in_dir(config.django_dir())
}

pub fn collectstatic(config: &DeployConfig) -> Step {
    Step::shell("collectstatic", manage_with_env(config, "collectstatic --noinput -c"))
}

pub fn migrate_db(config: &DeployConfig) -> Step {
    Step::shell("migrate_db", manage_with_env(config, "migrate"))
}

pub fn compile_translations(config: &DeployConfig) -> Step {
    Step::shell(
        "compile_translations",
        ShellCommand::remote(format!(
            "{} manage.py compilemessages",
            config.venv_bin("python")
        ))
        .in_dir(config.django_dir()),
    )
}

/// Restart the supervisor program, then the web server
pub fn restart_services(config: &DeployConfig) -> Vec<Step> {
    vec![
        Step::shell(
            "restart_supervisor",
            ShellCommand::remote(format!("supervisorctl restart {}", config.supervisor_name))
                .with_sudo(),
        ),
        Step::shell(
            "restart_web_server",
            ShellCommand::remote(format!("service {} restart", config.web_server)).with_sudo(),
        ),
    ]
}

/// The full deploy chain
pub fn deploy(config: &DeployConfig) -> Task {
    Task::new("deploy", "Pull, install, collect static, migrate, compile and restart")
        .with_step(pull_repo(config))
        .with_step(install_requirements(config))
        .with_step(collectstatic(config))
        .with_step(migrate_db(config))
        .with_step(compile_translations(config))
        .with_steps(restart_services(config))
}

/// Refresh the remote package index
pub fn upgrade_system(_config: &DeployConfig) -> Task {
    Task::new("upgrade-system", "Refresh the remote apt package index").with_step(Step::shell(
        "apt_update",
        ShellCommand::remote("apt-get update -y").with_sudo(),
    ))
}
