mod audio_state;
mod commands;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use multitrack_core::{Studio, StudioConfiguration, WavEncoderFactory};
use multitrack_cpal::{CpalContextDriver, CpalDeviceProvider};

use audio_state::{ConsoleDelegate, ConsoleStudio};

fn main() -> ExitCode {
    env_logger::init();

    let config = match load_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Read a JSON configuration file, or fall back to defaults with recordings
/// going to the user's documents folder.
fn load_config(path: Option<String>) -> Result<StudioConfiguration, String> {
    let Some(path) = path else {
        return Ok(StudioConfiguration {
            recordings_dir: default_recordings_dir(),
            ..Default::default()
        });
    };
    let json = fs::read_to_string(&path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    let config: StudioConfiguration =
        serde_json::from_str(&json).map_err(|e| format!("invalid config {}: {}", path, e))?;
    config.validate().map_err(|e| format!("invalid config {}: {}", path, e))?;
    Ok(config)
}

fn default_recordings_dir() -> PathBuf {
    dirs_next::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Multitrack Recordings")
}

async fn run(config: StudioConfiguration) -> Result<(), String> {
    let delegate = Arc::new(ConsoleDelegate::new(config.recordings_dir.clone()));
    let encoders = WavEncoderFactory::from_config(&config);
    let mut studio: ConsoleStudio = Studio::new(
        config,
        CpalDeviceProvider::new(),
        CpalContextDriver::new(),
        encoders,
    )
    .map_err(|e| e.to_string())?;
    studio.set_delegate(delegate);

    println!("multitrack console, type help for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match commands::execute(&studio, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", e),
        }
    }

    if studio.recorder_state().is_recording() {
        println!("finishing the running recording");
        if let Err(e) = studio.toggle_recording().await {
            println!("{}", e);
        }
    }
    studio.shutdown();
    Ok(())
}
