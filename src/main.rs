use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use daylist::config::Config;
use daylist::constants::AUTO_BACKUP_JOB_KEY;
use daylist::export;
use daylist::jobs::{ExistingJobPolicy, JobScheduler};
use daylist::logger;
use daylist::remote::auth::{FirebaseAuth, MemoryAuth};
use daylist::remote::firestore::FirestoreRemote;
use daylist::remote::memory::MemoryRemote;
use daylist::remote::{AuthProvider, RemoteStore};
use daylist::repositories::{ListRepository, TaskRepository};
use daylist::settings::SettingsStore;
use daylist::storage::LocalStorage;
use daylist::sync::{BackupService, BackupStatus};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logger::try_init(config.logging.enabled)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };

    match command {
        "init-config" => Config::generate_default_config(Config::get_default_config_path()?),
        "backup" => {
            let (storage, settings) = open_stores(&config).await?;
            let service = build_service(&config, storage, settings)?;
            print_status("backup", &service.backup().await);
            Ok(())
        }
        "restore" => {
            let (storage, settings) = open_stores(&config).await?;
            let service = build_service(&config, storage, settings)?;
            print_status("restore", &service.restore().await);
            Ok(())
        }
        "export-csv" | "export-json" => {
            let (storage, _) = open_stores(&config).await?;
            let rows = {
                let storage = storage.lock().await;
                let lists = ListRepository::get_all(&storage.conn).await?;
                let tasks = TaskRepository::get_all(&storage.conn).await?;
                export::rows(&lists, &tasks, &config.export.date_format, &config.export.datetime_format)
            };
            let destination = args.get(1).map(String::as_str).unwrap_or("-");
            write_export(command, destination, &rows)
        }
        "watch" => {
            let (storage, settings) = open_stores(&config).await?;
            let service = Arc::new(build_service(&config, storage, Arc::clone(&settings))?);
            run_watch(&config, service, settings).await
        }
        other => {
            eprintln!("Unknown command: {other}\n");
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!("Usage: daylist <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  backup              Push all lists, tasks and steps to the remote store");
    eprintln!("  restore             Replace local data with the latest remote mirror");
    eprintln!("  export-csv [path]   Export all tasks as CSV (default: stdout)");
    eprintln!("  export-json [path]  Export all tasks as JSON (default: stdout)");
    eprintln!("  watch               Run the periodic auto-backup until interrupted");
    eprintln!("  init-config         Generate a default configuration file");
}

async fn open_stores(config: &Config) -> Result<(Arc<Mutex<LocalStorage>>, Arc<SettingsStore>)> {
    let storage = LocalStorage::new(&config.storage.database_url()?).await?;
    let settings = SettingsStore::load(SettingsStore::default_path()?)?;
    Ok((Arc::new(Mutex::new(storage)), Arc::new(settings)))
}

fn build_service(
    config: &Config,
    storage: Arc<Mutex<LocalStorage>>,
    settings: Arc<SettingsStore>,
) -> Result<BackupService> {
    let (auth, remote) = build_remote(config)?;
    Ok(BackupService::new(storage, auth, remote).with_settings(settings))
}

fn build_remote(config: &Config) -> Result<(Arc<dyn AuthProvider>, Arc<dyn RemoteStore>)> {
    match config.backup.backend.as_str() {
        "firestore" => {
            let Ok(api_key) = std::env::var(&config.backup.api_key_env) else {
                eprintln!("Error: {} environment variable not set", config.backup.api_key_env);
                eprintln!();
                eprintln!("To back up to Firestore:");
                eprintln!("1. Create a Firebase project with anonymous auth enabled");
                eprintln!("2. Export its web API key: export {}=your_key_here", config.backup.api_key_env);
                eprintln!("3. Run the command again");
                anyhow::bail!("missing API key");
            };
            let client = reqwest::Client::new();
            let auth = Arc::new(FirebaseAuth::new(client.clone(), api_key));
            let remote = Arc::new(FirestoreRemote::new(
                client,
                Arc::clone(&auth),
                &config.backup.project_id,
            ));
            Ok((auth, remote))
        }
        _ => Ok((
            Arc::new(MemoryAuth::new("local-user")),
            Arc::new(MemoryRemote::new()),
        )),
    }
}

fn print_status(operation: &str, status: &BackupStatus) {
    match status {
        BackupStatus::Success { succeeded, failed } => {
            println!("{operation} finished: {succeeded} items succeeded, {failed} failed");
        }
        BackupStatus::Error { message } => println!("{operation} failed: {message}"),
        BackupStatus::InProgress => println!("{operation} already in progress"),
        BackupStatus::Idle => {}
    }
}

fn write_export(command: &str, destination: &str, rows: &[export::ExportedTask]) -> Result<()> {
    let write = |out: &mut dyn std::io::Write| -> Result<()> {
        if command == "export-csv" {
            export::write_csv(out, rows)
        } else {
            export::write_json(out, rows)
        }
    };

    if destination == "-" {
        write(&mut std::io::stdout().lock())
    } else {
        let mut file = std::fs::File::create(destination)?;
        write(&mut file)?;
        println!("Exported {} tasks to {destination}", rows.len());
        Ok(())
    }
}

async fn run_watch(
    config: &Config,
    service: Arc<BackupService>,
    settings: Arc<SettingsStore>,
) -> Result<()> {
    let interval_hours = config.backup.auto_backup_interval_hours;
    if interval_hours == 0 {
        println!("Auto-backup interval is 0 (disabled); nothing to do");
        return Ok(());
    }
    if !settings.current().auto_backup_enabled {
        println!("Auto-backup is disabled in settings; nothing to do");
        return Ok(());
    }

    let scheduler = JobScheduler::new();
    scheduler.schedule_periodic(
        AUTO_BACKUP_JOB_KEY,
        Duration::from_secs(interval_hours * 3600),
        ExistingJobPolicy::Keep,
        move || {
            let service = Arc::clone(&service);
            async move { service.backup().await.is_success() }
        },
    );

    println!("Auto-backup scheduled every {interval_hours}h; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    scheduler.shutdown();
    Ok(())
}
