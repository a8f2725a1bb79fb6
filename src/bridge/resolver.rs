use tracing::trace;

use super::snapshot::{PlaybackSnapshot, PlaybackStatus, SourceId, SourceKind};

/// The source chosen as ground truth for one tick.
///
/// `Idle` is the synthesized "nothing playing" placeholder: status Stopped,
/// empty text, and no owner for command routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSelection {
    /// No source reported anything
    Idle,

    /// A real source won resolution
    Source(PlaybackSnapshot),
}

impl ActiveSelection {
    /// Winning snapshot, if any.
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match self {
            ActiveSelection::Idle => None,
            ActiveSelection::Source(snapshot) => Some(snapshot),
        }
    }

    /// Source that owns command routing for this selection.
    pub fn owner(&self) -> Option<&SourceId> {
        self.snapshot().map(|snapshot| &snapshot.source_id)
    }

    /// Status, `Stopped` for the placeholder.
    pub fn status(&self) -> PlaybackStatus {
        self.snapshot()
            .map_or(PlaybackStatus::Stopped, |snapshot| snapshot.status)
    }

    /// Title, empty for the placeholder.
    pub fn title(&self) -> &str {
        self.snapshot().map_or("", |snapshot| snapshot.title.as_str())
    }

    /// Artist, empty for the placeholder.
    pub fn artist(&self) -> &str {
        self.snapshot().map_or("", |snapshot| snapshot.artist.as_str())
    }

    /// Artwork locator, empty for the placeholder.
    pub fn artwork_reference(&self) -> &str {
        self.snapshot()
            .map_or("", |snapshot| snapshot.artwork_reference.as_str())
    }

    /// Whether this is the placeholder.
    pub fn is_idle(&self) -> bool {
        matches!(self, ActiveSelection::Idle)
    }
}

/// Picks the highest-status snapshot: Playing, then Paused, then Stopped.
///
/// Among equal statuses the first in enumeration order wins. An empty input
/// yields [`ActiveSelection::Idle`].
pub fn resolve(snapshots: &[PlaybackSnapshot]) -> ActiveSelection {
    let mut best: Option<&PlaybackSnapshot> = None;

    for snapshot in snapshots {
        match best {
            Some(current) if current.status <= snapshot.status => {}
            _ => best = Some(snapshot),
        }
    }

    best.cloned()
        .map_or(ActiveSelection::Idle, ActiveSelection::Source)
}

/// Cross-backend precedence, applied before status priority.
///
/// The first backend class in `order` that reports at least one snapshot
/// wins outright, even if a later class has a better status. Status priority
/// is then applied within that class only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedencePolicy {
    order: Vec<SourceKind>,
}

impl PrecedencePolicy {
    /// Creates a policy from an ordered list of backend classes.
    pub fn new(order: Vec<SourceKind>) -> Self {
        Self { order }
    }

    /// Configured class order.
    pub fn order(&self) -> &[SourceKind] {
        &self.order
    }

    /// Resolves the active selection from per-adapter readings.
    ///
    /// Readings are `(class, snapshots)` pairs in adapter enumeration order;
    /// classes missing from the policy are never selected.
    pub fn resolve<'a, I>(&self, readings: I) -> ActiveSelection
    where
        I: IntoIterator<Item = (SourceKind, &'a [PlaybackSnapshot])>,
    {
        let readings: Vec<_> = readings.into_iter().collect();

        for kind in &self.order {
            let candidates: Vec<PlaybackSnapshot> = readings
                .iter()
                .filter(|(reading_kind, _)| reading_kind == kind)
                .flat_map(|(_, snapshots)| snapshots.iter().cloned())
                .collect();

            if candidates.is_empty() {
                continue;
            }

            trace!(class = %kind, candidates = candidates.len(), "backend class selected");
            return resolve(&candidates);
        }

        ActiveSelection::Idle
    }
}

impl Default for PrecedencePolicy {
    fn default() -> Self {
        Self::new(vec![
            SourceKind::Spotify,
            SourceKind::Jellyfin,
            SourceKind::Mpris,
        ])
    }
}

/// Resolves the command-routing target from local sources only.
pub fn command_target<'a, I>(readings: I) -> Option<SourceId>
where
    I: IntoIterator<Item = (SourceKind, &'a [PlaybackSnapshot])>,
{
    let local: Vec<PlaybackSnapshot> = readings
        .into_iter()
        .filter(|(kind, _)| kind.is_local())
        .flat_map(|(_, snapshots)| snapshots.iter().cloned())
        .collect();

    resolve(&local).owner().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(id: &str, kind: SourceKind, status: PlaybackStatus) -> PlaybackSnapshot {
        let mut snapshot = PlaybackSnapshot::new(SourceId::new(id), kind, status);
        snapshot.title = format!("{id} title");
        snapshot
    }

    #[test]
    fn empty_input_is_idle() {
        assert_eq!(resolve(&[]), ActiveSelection::Idle);
        assert_eq!(ActiveSelection::Idle.owner(), None);
        assert_eq!(ActiveSelection::Idle.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn playing_beats_paused_beats_stopped() {
        let snapshots = vec![
            snap("stopped", SourceKind::Mpris, PlaybackStatus::Stopped),
            snap("paused", SourceKind::Mpris, PlaybackStatus::Paused),
            snap("playing", SourceKind::Mpris, PlaybackStatus::Playing),
        ];

        let selection = resolve(&snapshots);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("playing"));

        let selection = resolve(&snapshots[..2]);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("paused"));

        let selection = resolve(&snapshots[..1]);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("stopped"));
    }

    #[test]
    fn ties_go_to_first_reported() {
        let snapshots = vec![
            snap("paused", SourceKind::Mpris, PlaybackStatus::Paused),
            snap("first", SourceKind::Mpris, PlaybackStatus::Playing),
            snap("second", SourceKind::Mpris, PlaybackStatus::Playing),
        ];

        let selection = resolve(&snapshots);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("first"));
    }

    #[test]
    fn precedence_overrides_status() {
        let spotify = vec![snap("spotify", SourceKind::Spotify, PlaybackStatus::Paused)];
        let jellyfin = vec![snap("jellyfin", SourceKind::Jellyfin, PlaybackStatus::Playing)];

        let policy = PrecedencePolicy::new(vec![SourceKind::Spotify, SourceKind::Jellyfin]);
        let selection = policy.resolve([
            (SourceKind::Jellyfin, jellyfin.as_slice()),
            (SourceKind::Spotify, spotify.as_slice()),
        ]);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("spotify"));

        let reordered = PrecedencePolicy::new(vec![SourceKind::Jellyfin, SourceKind::Spotify]);
        let selection = reordered.resolve([
            (SourceKind::Jellyfin, jellyfin.as_slice()),
            (SourceKind::Spotify, spotify.as_slice()),
        ]);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("jellyfin"));
    }

    #[test]
    fn empty_class_falls_through() {
        let spotify: Vec<PlaybackSnapshot> = Vec::new();
        let jellyfin = vec![snap("jellyfin", SourceKind::Jellyfin, PlaybackStatus::Paused)];

        let selection = PrecedencePolicy::default().resolve([
            (SourceKind::Spotify, spotify.as_slice()),
            (SourceKind::Jellyfin, jellyfin.as_slice()),
        ]);
        assert_eq!(selection.owner().map(SourceId::as_str), Some("jellyfin"));
    }

    #[test]
    fn unlisted_class_is_ignored() {
        let local = vec![snap("vlc", SourceKind::Mpris, PlaybackStatus::Playing)];
        let policy = PrecedencePolicy::new(vec![SourceKind::Spotify]);

        assert!(policy.resolve([(SourceKind::Mpris, local.as_slice())]).is_idle());
    }

    #[test]
    fn command_target_uses_local_sources_only() {
        let remote = vec![snap("spotify", SourceKind::Spotify, PlaybackStatus::Playing)];
        let local = vec![
            snap("org.mpris.MediaPlayer2.vlc", SourceKind::Mpris, PlaybackStatus::Stopped),
            snap("org.mpris.MediaPlayer2.mpv", SourceKind::Mpris, PlaybackStatus::Paused),
        ];

        let target = command_target([
            (SourceKind::Spotify, remote.as_slice()),
            (SourceKind::Mpris, local.as_slice()),
        ]);
        assert_eq!(
            target.as_ref().map(SourceId::as_str),
            Some("org.mpris.MediaPlayer2.mpv")
        );

        assert_eq!(command_target([(SourceKind::Spotify, remote.as_slice())]), None);
    }
}
