use anyhow::{Context, Result};
use shipline::cli::commands::{ListCommand, PlanCommand, RunCommand, ValidateCommand};
use shipline::cli::output::*;
use shipline::cli::{Cli, Command};
use shipline::core::host::HostSpec;
use shipline::execution::{ExecutionEvent, TaskEngine};
use shipline::shell::{CommandRunner, DryRunShell, LocalShell, SshShell, SystemShell};
use shipline::tasks::{TaskName, TaskOptions};
use shipline::{DeployConfig, Environment, ExecutionStatus, RunContext, Task};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let env = Environment::capture();
    let mut config = DeployConfig::load(cli.config.as_deref(), &env)
        .context("Failed to load configuration")?;
    if let Some(host) = &cli.host {
        let host: HostSpec = host.parse().context("Invalid --host value")?;
        config.host = Some(host);
    }

    match &cli.command {
        Command::Run(cmd) => run_task(cmd, &cli, &config, env).await?,
        Command::Plan(cmd) => plan_task(cmd, &config, env)?,
        Command::List(cmd) => list_tasks(cmd, &config)?,
        Command::Validate(cmd) => validate_config(cmd, &config)?,
    }

    Ok(())
}

async fn run_task(cmd: &RunCommand, cli: &Cli, config: &DeployConfig, env: Environment) -> Result<()> {
    let name: TaskName = cmd.task.into();
    if !cmd.dry_run {
        name.validate(config)
            .with_context(|| format!("Configuration is incomplete for {}", name))?;
    }

    let mut task = name.build(config, cmd.options());
    let mut context = RunContext::new(env);

    if let Some(host) = &config.host {
        if task.uses_remote() {
            println!("{} Target host: {}", INFO, style(host).bold());
        }
    }

    let status = if cmd.dry_run {
        println!("{} Dry run: commands are printed, not executed", WARN);
        execute(DryRunShell::new(), &mut task, &mut context, cli.stream).await
    } else {
        let timeout = config.command_timeout_secs;
        let remote = config
            .host
            .clone()
            .map(|host| SshShell::new(host, config.forward_agent, timeout));
        let shell = SystemShell::new(LocalShell::new(timeout), remote);
        execute(shell, &mut task, &mut context, cli.stream).await
    };

    if cli.verbose {
        println!("{}", separator());
        for step in &task.steps {
            println!("  {:<24} {}", step.id, format_step_state(&step.state));
        }
    }

    println!("\n{}", format_task_result(&task.name, status));
    if !status.is_success() {
        std::process::exit(status.exit_code());
    }

    Ok(())
}

async fn execute<R: CommandRunner>(
    runner: R,
    task: &mut Task,
    context: &mut RunContext,
    stream: bool,
) -> ExecutionStatus {
    let progress = create_progress_bar(task.steps.len());
    let bar = progress.clone();

    let engine = TaskEngine::new(runner).with_event_handler(move |event| {
        match &event {
            ExecutionEvent::StepOutput { output, .. } => {
                if stream {
                    bar.println(format_output(output, 20));
                }
                return;
            }
            ExecutionEvent::StepStarted { step_id, .. } => bar.set_message(step_id.clone()),
            ExecutionEvent::StepCompleted { .. } | ExecutionEvent::StepTolerated { .. } => {
                bar.inc(1)
            }
            _ => {}
        }
        bar.println(format_execution_event(&event));
    });

    if let Err(e) = engine.execute(task, context).await {
        error!("{}", e);
    }
    progress.finish_and_clear();

    task.state.status
}

fn plan_task(cmd: &PlanCommand, config: &DeployConfig, env: Environment) -> Result<()> {
    let name: TaskName = cmd.task.into();
    let task = name.build(config, TaskOptions::default());
    let context = RunContext::new(env);
    let plan = task.plan(&context.get_rendering_variables());

    if cmd.json {
        let data = serde_json::json!({
            "task": name,
            "description": task.description,
            "branch": task.guard.as_ref().map(|g| g.branch.clone()),
            "host": config.host.as_ref().map(|h| h.to_string()),
            "steps": plan,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} {} - {}", INFO, style(name).bold(), task.description);
    if let Some(guard) = &task.guard {
        println!("  Runs only on CI branch {}", style(&guard.branch).cyan());
    }
    if task.uses_remote() {
        let host = config
            .host
            .as_ref()
            .map(|h| h.to_string())
            .unwrap_or_else(|| "(no host configured)".to_string());
        println!("  Host: {}", style(host).bold());
    }
    for (index, step) in plan.iter().enumerate() {
        println!("{}", format_planned_step(index, step));
    }

    Ok(())
}

fn list_tasks(cmd: &ListCommand, config: &DeployConfig) -> Result<()> {
    let tasks: Vec<Task> = TaskName::all()
        .iter()
        .map(|name| name.build(config, TaskOptions::default()))
        .collect();

    if cmd.json {
        let data: Vec<_> = tasks
            .iter()
            .map(|task| {
                serde_json::json!({
                    "name": task.name,
                    "description": task.description,
                    "steps": task.steps.len(),
                    "remote": task.uses_remote(),
                    "branch": task.guard.as_ref().map(|g| g.branch.clone()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "tasks": data }))?);
        return Ok(());
    }

    println!("{} Available tasks:", INFO);
    for task in &tasks {
        println!(
            "  {:<22} {} {}",
            style(&task.name).bold(),
            task.description,
            style(format!("({} steps)", task.steps.len())).dim()
        );
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand, config: &DeployConfig) -> Result<()> {
    let names: Vec<TaskName> = match cmd.task {
        Some(task) => vec![task.into()],
        None => TaskName::all().to_vec(),
    };

    let results: Vec<(TaskName, Result<()>)> = names
        .into_iter()
        .map(|name| (name, name.validate(config)))
        .collect();
    let all_valid = results.iter().all(|(_, r)| r.is_ok());

    if cmd.json {
        let data: Vec<_> = results
            .iter()
            .map(|(name, result)| {
                serde_json::json!({
                    "task": name,
                    "valid": result.is_ok(),
                    "error": result.as_ref().err().map(|e| e.to_string()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": data }))?);
    } else {
        println!("{} Validating configuration...", INFO);
        for (name, result) in &results {
            match result {
                Ok(()) => println!("  {}{}", CHECK, name),
                Err(e) => println!("  {}{}: {}", CROSS, name, style(e).red()),
            }
        }
    }

    if !all_valid {
        std::process::exit(1);
    }

    Ok(())
}
