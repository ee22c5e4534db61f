use std::time::Duration;

use multitrack_core::{AttachOutcome, ToggleOutcome, TrackPatch};

use crate::audio_state::{describe_attach, track_label, ConsoleStudio};

/// How long `levels` samples before printing.
const LEVEL_WINDOW: Duration = Duration::from_millis(300);

pub const HELP: &str = "\
commands:
  add                     add a track on the default input
  name <n> <text>         rename track n
  device <n> <device-id>  select the input of track n (also retries a failed one)
  remove <n>              remove track n
  rec                     start or stop recording
  list                    show tracks and recording time
  devices                 list input devices
  levels                  show current input levels
  help                    show this help
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Name { position: usize, text: String },
    Device { position: usize, device_id: String },
    Remove { position: usize },
    Record,
    List,
    Devices,
    Levels,
    Help,
    Quit,
}

/// Parse one input line. Track positions are 1-based.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "add" => Command::Add,
        "name" => {
            let (position, text) = position_and_rest(rest)?;
            Command::Name {
                position,
                text: text.to_string(),
            }
        }
        "device" => {
            let (position, device_id) = position_and_rest(rest)?;
            if device_id.is_empty() {
                return Err("usage: device <n> <device-id>".into());
            }
            Command::Device {
                position,
                device_id: device_id.to_string(),
            }
        }
        "remove" => Command::Remove {
            position: parse_position(rest)?,
        },
        "rec" => Command::Record,
        "list" => Command::List,
        "devices" => Command::Devices,
        "levels" => Command::Levels,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try help", other)),
    };
    Ok(Some(command))
}

fn parse_position(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a track number, got '{}'", text)),
    }
}

fn position_and_rest(text: &str) -> Result<(usize, &str), String> {
    let (position, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    Ok((parse_position(position)?, rest.trim()))
}

/// Run one command. Returns false when the console should exit.
pub async fn execute(studio: &ConsoleStudio, command: Command) -> Result<bool, String> {
    match command {
        Command::Add => {
            let (track, outcome) = studio.add_track().await.map_err(|e| e.to_string())?;
            println!("added track {} ({})", studio.tracks().len(), outcome_text(&outcome));
            log::debug!("New track {}", track.id);
        }
        Command::Name { position, text } => {
            let id = track_at(studio, position)?;
            studio
                .update_track(id, TrackPatch::name(text))
                .await
                .map_err(|e| e.to_string())?;
        }
        Command::Device { position, device_id } => {
            let id = track_at(studio, position)?;
            let outcome = studio
                .update_track(id, TrackPatch::device(device_id))
                .await
                .map_err(|e| e.to_string())?;
            if let Some(outcome) = outcome {
                println!("track {}: {}", position + 1, outcome_text(&outcome));
            }
        }
        Command::Remove { position } => {
            let id = track_at(studio, position)?;
            let track = studio.remove_track(id).map_err(|e| e.to_string())?;
            println!("removed {}", track_label(&track));
        }
        Command::Record => match studio.toggle_recording().await.map_err(|e| e.to_string())? {
            ToggleOutcome::Started { .. } => println!("recording, type rec again to stop"),
            ToggleOutcome::Finished(artifact) => {
                println!("recorded {}", artifact.file_name())
            }
        },
        Command::List => print_tracks(studio),
        Command::Devices => {
            let devices = multitrack_cpal::list_input_devices().map_err(|e| e.to_string())?;
            for device in devices {
                let marker = if device.is_default { "*" } else { " " };
                println!("{} {:<32} {}", marker, device.id, device.label);
            }
        }
        Command::Levels => print_levels(studio).await,
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn track_at(studio: &ConsoleStudio, position: usize) -> Result<multitrack_core::TrackId, String> {
    studio
        .track_at(position)
        .ok_or_else(|| format!("no track {}", position + 1))
}

fn outcome_text(outcome: &AttachOutcome) -> String {
    match outcome {
        AttachOutcome::Attached => "live".into(),
        AttachOutcome::Superseded => "replaced by a newer selection".into(),
        AttachOutcome::Failed(e) => format!("not connected: {}", e),
    }
}

fn print_tracks(studio: &ConsoleStudio) {
    let tracks = studio.tracks();
    if tracks.is_empty() {
        println!("no tracks, type add");
    }
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "{:>2}. {:<20} {:<24} {}",
            i + 1,
            track_label(track),
            track.device_id,
            describe_attach(&studio.attach_state(track.id))
        );
    }
    if studio.recorder_state().is_recording() {
        println!("recording {}", studio.recording_elapsed());
    }
}

async fn print_levels(studio: &ConsoleStudio) {
    let tracks = studio.tracks();
    let meters: Vec<_> = tracks
        .iter()
        .map(|track| studio.mount_meter(track.id))
        .collect();

    tokio::time::sleep(LEVEL_WINDOW).await;

    for (i, (track, meter)) in tracks.iter().zip(&meters).enumerate() {
        match meter {
            Some(meter) => {
                let level = meter.level();
                let bar = "#".repeat((level.clamp(0.0, 1.0) * 40.0).round() as usize);
                println!("{:>2}. {:<20} {:>5.3} {}", i + 1, track_label(track), level, bar);
            }
            None => println!("{:>2}. {:<20} --", i + 1, track_label(track)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_positions() {
        assert_eq!(parse("add").unwrap(), Some(Command::Add));
        assert_eq!(
            parse("name 2 Lead vocal").unwrap(),
            Some(Command::Name {
                position: 1,
                text: "Lead vocal".into()
            })
        );
        assert_eq!(
            parse("  device 1 USB Audio Device  ").unwrap(),
            Some(Command::Device {
                position: 0,
                device_id: "USB Audio Device".into()
            })
        );
        assert_eq!(parse("remove 3").unwrap(), Some(Command::Remove { position: 2 }));
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("remove 0").is_err());
        assert!(parse("remove x").is_err());
        assert!(parse("device 1").is_err());
        assert!(parse("dance").is_err());
    }
}
