use clap::Parser;
use color_eyre::Result;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use goaldo::cli::{self, Cli, Commands, ReminderCommands, SettingsCommands};
use goaldo::reminder::{
    stop_on_interrupt, AlarmRunner, ReminderDispatcher, SqliteAlarmRegistry, SystemClock, TerminalNotifier,
};
use goaldo::utils::{expand_path, get_data_dir};
use goaldo::{logging, AppContainer, Config, Profile};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config, database and alarms apart from the real ones
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config_path = match &cli.config {
        Some(path) => expand_path(path),
        None => Config::get_config_path(profile)?,
    };
    let mut config = Config::load_from_path(&config_path, profile)?;

    let command = cli.command.unwrap_or(Commands::Tui);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Tui => {
            let log_dir = get_data_dir(profile)
                .map(|dir| dir.join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"));
            let _log_guard = logging::init_file(&log_dir, config.log_filter.as_deref())?;
            let container = AppContainer::from_config(&config)?;
            let app = goaldo::tui::App::new(config, container)?;
            goaldo::tui::run_event_loop(app)?;
        }
        // Reminder delivery only needs the alarm store, never the task database
        Commands::Reminders { command } => {
            logging::init_cli(config.log_filter.as_deref());
            let alarms = Rc::new(SqliteAlarmRegistry::open(
                &config.get_alarms_path(),
                config.reminders.exact_alarms,
            )?);
            match command {
                ReminderCommands::List => cli::handle_reminders_list(&alarms, &mut out)?,
                ReminderCommands::Fire | ReminderCommands::Watch => {
                    let dispatcher = ReminderDispatcher::new(
                        TerminalNotifier::new(std::io::stdout()),
                        config.notifications_enabled,
                    )
                    .with_open_command(if cli.dev { "goaldo --dev" } else { "goaldo" });
                    let runner = AlarmRunner::new(
                        alarms,
                        dispatcher,
                        Rc::new(SystemClock),
                        Duration::from_secs(config.reminders.poll_interval_secs.max(1)),
                    );
                    if matches!(command, ReminderCommands::Fire) {
                        cli::handle_reminders_fire(&runner, &mut out)?;
                    } else {
                        let stop = stop_on_interrupt()?;
                        runner.run(&stop);
                    }
                }
            }
        }
        Commands::Settings { command } => {
            logging::init_cli(config.log_filter.as_deref());
            match command {
                SettingsCommands::Show => cli::handle_settings_show(&config, &mut out)?,
                SettingsCommands::Set { key, value } => {
                    cli::handle_settings_set(&key, &value, &mut config, &config_path, &mut out)?
                }
            }
        }
        command => {
            logging::init_cli(config.log_filter.as_deref());
            let container = AppContainer::from_config(&config)?;
            match command {
                Commands::AddTask(args) => cli::handle_add_task(args, &container, &mut out)?,
                Commands::Edit(args) => cli::handle_edit_task(args, &container, &mut out)?,
                Commands::AddGoal { title, description, start, target } => {
                    cli::handle_add_goal(title, description, start, target, &container, &mut out)?
                }
                Commands::List { task_type, goal, completed, pending } => {
                    cli::handle_list(task_type, goal, completed, pending, &container, &mut out)?
                }
                Commands::Done { id } => cli::handle_done(id, &container, &mut out)?,
                Commands::Delete { id, completed } => cli::handle_delete(id, completed, &container, &mut out)?,
                Commands::Goals => cli::handle_goals(&container, &mut out)?,
                Commands::DeleteGoal { id } => cli::handle_delete_goal(id, &container, &mut out)?,
                Commands::Calendar { date, week } => cli::handle_calendar(date, week, &container, &mut out)?,
                Commands::Tui | Commands::Reminders { .. } | Commands::Settings { .. } => {}
            }
        }
    }

    out.flush()?;
    Ok(())
}
