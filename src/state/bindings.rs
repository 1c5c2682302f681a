use crate::state::messages::BindingEvent;
use log::{debug, error};
use std::fmt;
use tennis_engine::MatchSnapshot;
use tokio::sync::{mpsc, watch};

/// A display field bound to a dotted snapshot path, e.g. `P1 pts=score.player1Points`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub label: String,
    pub path: String,
}

impl Binding {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub label: String,
    pub path: String,
    pub value: String,
    /// The path exists in the snapshot (its value may still be null).
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingParseError(pub String);

impl fmt::Display for BindingParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding must look like label=path, got {:?}", self.0)
    }
}

impl std::error::Error for BindingParseError {}

pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new("P1 name", "player1.name"),
        Binding::new("P2 name", "player2.name"),
        Binding::new("P1 country", "player1.country"),
        Binding::new("P2 country", "player2.country"),
        Binding::new("P1 points", "score.player1Points"),
        Binding::new("P2 points", "score.player2Points"),
        Binding::new("P1 games", "score.player1Games"),
        Binding::new("P2 games", "score.player2Games"),
        Binding::new("P1 sets", "score.player1Sets"),
        Binding::new("P2 sets", "score.player2Sets"),
        Binding::new("Serving", "servingPlayer"),
        Binding::new("Set", "currentSet"),
        Binding::new("Tiebreak", "isTiebreak"),
        Binding::new("TB P1", "tiebreakScore.player1"),
        Binding::new("TB P2", "tiebreakScore.player2"),
        Binding::new("Set 1", "sets.set1.player1"),
        Binding::new("Status", "matchStatus"),
    ]
}

/// Parse a comma-separated `label=path` list. A bare path is its own label.
pub fn parse_bindings(list: &str) -> Result<Vec<Binding>, BindingParseError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((label, path)) => {
                let (label, path) = (label.trim(), path.trim());
                if label.is_empty() || path.is_empty() {
                    Err(BindingParseError(entry.to_string()))
                } else {
                    Ok(Binding::new(label, path))
                }
            }
            None => Ok(Binding::new(entry, entry)),
        })
        .collect()
}

pub fn resolve_all(bindings: &[Binding], snapshot: Option<&MatchSnapshot>) -> Vec<ResolvedField> {
    let json = snapshot.map(MatchSnapshot::to_json);
    bindings
        .iter()
        .map(|binding| {
            let value = json
                .as_ref()
                .and_then(|root| tennis_engine::snapshot::resolve_path(root, &binding.path));
            ResolvedField {
                label: binding.label.clone(),
                path: binding.path.clone(),
                found: value.is_some(),
                value: value.map(tennis_engine::snapshot::display_value).unwrap_or_default(),
            }
        })
        .collect()
}

/// Subscribes to "score changed" and pushes freshly resolved fields back to
/// the UI loop.
pub struct BindingWorker {
    bindings: Vec<Binding>,
    snapshots: watch::Receiver<Option<MatchSnapshot>>,
    events: mpsc::Sender<BindingEvent>,
}

impl BindingWorker {
    pub fn new(
        bindings: Vec<Binding>,
        snapshots: watch::Receiver<Option<MatchSnapshot>>,
        events: mpsc::Sender<BindingEvent>,
    ) -> Self {
        Self {
            bindings,
            snapshots,
            events,
        }
    }

    pub async fn run(mut self) {
        loop {
            let fields = {
                let snapshot = self.snapshots.borrow_and_update();
                resolve_all(&self.bindings, snapshot.as_ref())
            };
            debug!("resolved {} bindings", fields.len());

            if let Err(e) = self.events.send(BindingEvent::Resolved { fields }).await {
                error!("Failed to send resolved bindings: {e}");
                break;
            }
            if self.snapshots.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tennis_engine::{MatchFormat, MatchScoringEngine, Player, PlayerSlot};

    fn snapshot() -> MatchSnapshot {
        let mut engine = MatchScoringEngine::new();
        engine.create_new_match(
            Player::named("Novak Djokovic"),
            Player::named("Rafael Nadal"),
            MatchFormat::BestOf3,
        );
        engine.start_match();
        engine.add_point(PlayerSlot::P2);
        engine.current_data().unwrap()
    }

    #[test]
    fn parses_label_path_pairs() {
        assert_eq!(
            parse_bindings("Home=player1.name, score.player2Points ,"),
            Ok(vec![
                Binding::new("Home", "player1.name"),
                Binding::new("score.player2Points", "score.player2Points"),
            ])
        );
        assert!(parse_bindings("=score.player1Points").is_err());
        assert!(parse_bindings("Home=").is_err());
    }

    #[test]
    fn resolves_against_snapshot() {
        let bindings = vec![
            Binding::new("Away", "player2.name"),
            Binding::new("Away pts", "score.player2Points"),
            Binding::new("Away flag", "player2.country"),
            Binding::new("Typo", "score.player3Points"),
        ];
        let fields = resolve_all(&bindings, Some(&snapshot()));
        let values: Vec<(&str, bool)> = fields.iter().map(|f| (f.value.as_str(), f.found)).collect();
        assert_eq!(
            values,
            vec![("Rafael Nadal", true), ("15", true), ("", true), ("", false)]
        );
    }

    #[test]
    fn no_match_resolves_empty() {
        let fields = resolve_all(&default_bindings(), None);
        assert!(fields.iter().all(|f| f.value.is_empty() && !f.found));
    }

    #[tokio::test]
    async fn worker_pushes_on_every_change() {
        let (snap_tx, snap_rx) = watch::channel(None);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let worker = BindingWorker::new(vec![Binding::new("pts", "score.player2Points")], snap_rx, event_tx);
        let task = tokio::spawn(worker.run());

        let Some(BindingEvent::Resolved { fields }) = event_rx.recv().await else {
            panic!("expected initial resolution");
        };
        assert_eq!(fields[0].value, "");

        snap_tx.send_replace(Some(snapshot()));
        let Some(BindingEvent::Resolved { fields }) = event_rx.recv().await else {
            panic!("expected resolution after change");
        };
        assert_eq!(fields[0].value, "15");

        drop(snap_tx);
        task.await.unwrap();
    }
}
