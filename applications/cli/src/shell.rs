//! Stdin command loop and output formatting

use crate::commands::{self, Command, HELP};
use cadence_core::QueueEntry;
use cadence_playback::{History, PlaybackController, PlaybackEvent, PlaybackSnapshot};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until EOF or `quit`
pub async fn run<R>(controller: &PlaybackController, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Ok(Some(command)) => {
                if execute(controller, command).await == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

/// Apply one command and print its result
pub async fn execute(controller: &PlaybackController, command: Command) -> Flow {
    debug!(?command, "Executing command");

    match command {
        Command::Play => controller.play().await,
        Command::Pause => controller.pause().await,
        Command::Toggle => controller.toggle_play().await,
        Command::Next => println!("{:?}", controller.request_next().await),
        Command::Previous => println!("{:?}", controller.request_previous().await),
        Command::Seek(position) => {
            if !controller.seek(position).await {
                println!("nothing to seek");
            }
        }
        Command::Volume(level) => controller.set_volume(level).await,
        Command::Add(title) => report(controller.enqueue(&title).await, "add"),
        Command::Remove(position) => report(controller.dequeue(position).await, "remove"),
        Command::Move { from, to } => report(controller.move_entry(from, to).await, "move"),
        Command::Queue => {
            let queue = controller.queue();
            print!(
                "{}",
                format_queue(&queue.entries(), queue.current_position())
            );
        }
        Command::History => print!("{}", format_history(&controller.history())),
        Command::Status => println!("{}", format_status(&controller.snapshot())),
        Command::Retry => println!("{:?}", controller.retry().await),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
    }

    Flow::Continue
}

fn report(ok: bool, action: &str) {
    if !ok {
        println!("{} failed (see log)", action);
    }
}

/// Print controller events as they arrive
pub fn spawn_event_printer(mut events: broadcast::Receiver<PlaybackEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = format_event(&event) {
                        println!("{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// One line per user-visible event; position ticks are silent
pub fn format_event(event: &PlaybackEvent) -> Option<String> {
    match event {
        PlaybackEvent::TrackChanged { title, .. } => Some(format!("> {}", title)),
        PlaybackEvent::StateChanged { state } => Some(format!("[{}]", state)),
        PlaybackEvent::Error { message } => Some(format!("! {}", message)),
        PlaybackEvent::QueueChanged { length } => Some(format!("queue: {} entries", length)),
        PlaybackEvent::VolumeChanged { level } => Some(format!("volume {:.0}%", level * 100.0)),
        PlaybackEvent::PositionUpdate { .. } => None,
    }
}

pub fn format_status(snapshot: &PlaybackSnapshot) -> String {
    let track = snapshot.track.as_ref().map_or_else(
        || "nothing loaded".to_string(),
        |t| format!("{} - {}", t.artist, t.title),
    );
    let duration = snapshot
        .duration
        .map_or_else(|| "--:--".to_string(), clock);

    format!(
        "{} [{}{}] {}/{} vol {:.0}%",
        track,
        snapshot.state,
        if snapshot.is_playing { ", playing" } else { "" },
        clock(snapshot.current_time),
        duration,
        snapshot.volume * 100.0
    )
}

pub fn format_queue(entries: &[QueueEntry], current: Option<i64>) -> String {
    if entries.is_empty() {
        return "queue is empty\n".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            let marker = if Some(entry.position) == current { '*' } else { ' ' };
            format!("{} {:>3}  {}\n", marker, entry.position, entry.title)
        })
        .collect()
}

pub fn format_history(history: &History) -> String {
    if history.is_empty() {
        return "no history\n".to_string();
    }

    history
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if Some(index) == history.cursor() { '*' } else { ' ' };
            format!("{} {:>3}  {}\n", marker, index, track.title)
        })
        .collect()
}

fn clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
