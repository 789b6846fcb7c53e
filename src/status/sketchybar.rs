use anyhow::Result;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::daemon::{event::TimerEvent, forward::TimerSink};

/// Arguments for painting a timer value onto an item. Built as a vector and
/// passed straight to exec, no shell quoting involved.
pub fn set_label_args(item: &str, label: &str) -> Vec<String> {
    vec![
        "--set".into(),
        item.into(),
        "label.drawing=on".into(),
        format!("label={label}"),
    ]
}

/// Arguments for hiding the label again, used on shutdown.
pub fn clear_label_args(item: &str) -> Vec<String> {
    vec!["--set".into(), item.into(), "label.drawing=off".into()]
}

fn query_args(item: &str) -> Vec<String> {
    vec!["--query".into(), item.into()]
}

fn add_item_args(item: &str, position: &str) -> Vec<String> {
    vec![
        "--add".into(),
        "item".into(),
        item.into(),
        position.into(),
    ]
}

/// Runs sketchybar with the given arguments. A missing binary is reported
/// once per call and treated as a no-op so the poll loop keeps running.
pub async fn run_sketchybar(args: &[String]) -> Result<Option<std::process::Output>> {
    match Command::new("sketchybar").args(args).output().await {
        Ok(output) => Ok(Some(output)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("sketchybar not found; skipping {:?}", args);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn item_exists(item: &str) -> Result<bool> {
    let output = run_sketchybar(&query_args(item)).await?;
    Ok(output.is_some_and(|o| o.status.success() && !o.stdout.is_empty()))
}

/// Creates the item when it's missing. Re-adding an existing item makes
/// sketchybar complain, hence the query first.
pub async fn ensure_item(item: &str, position: &str) -> Result<()> {
    if item_exists(item).await? {
        debug!("Item {item} already exists");
        return Ok(());
    }
    run_sketchybar(&add_item_args(item, position)).await?;
    Ok(())
}

pub struct SketchybarSink {
    item: String,
}

impl SketchybarSink {
    pub fn new(item: String) -> Self {
        Self { item }
    }
}

impl TimerSink for SketchybarSink {
    async fn process_next(&mut self, event: TimerEvent) -> Result<()> {
        run_sketchybar(&set_label_args(&self.item, &event.label)).await?;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        run_sketchybar(&clear_label_args(&self.item)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{add_item_args, clear_label_args, set_label_args};

    #[test]
    fn set_label_builds_exec_args() {
        assert_eq!(
            set_label_args("brain_timer", "12:34"),
            vec!["--set", "brain_timer", "label.drawing=on", "label=12:34"]
        );
    }

    #[test]
    fn labels_with_spaces_stay_one_argument() {
        let args = set_label_args("brain_timer", "1:05:12 left");
        assert_eq!(args.len(), 4);
        assert_eq!(args[3], "label=1:05:12 left");
    }

    #[test]
    fn clear_turns_drawing_off() {
        assert_eq!(
            clear_label_args("brain_timer"),
            vec!["--set", "brain_timer", "label.drawing=off"]
        );
    }

    #[test]
    fn add_places_item_at_position() {
        assert_eq!(
            add_item_args("brain_timer", "right"),
            vec!["--add", "item", "brain_timer", "right"]
        );
    }
}
