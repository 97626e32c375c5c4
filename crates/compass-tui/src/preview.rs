//! Preview players — one independent play/pause toggle per recommendation.
//!
//! A `PreviewPlayer` only tracks the displayed state (`playing`) and forwards
//! play/pause to a `PreviewBackend`.  Whatever the backend reports back
//! (paused from elsewhere, reached the end, failed) forces the toggle back
//! to "not playing".  Players never look at each other: several previews
//! may run at once.
//!
//! The real backend is one mpv process per player, spawned on first play
//! and killed when the player is dropped.

use std::path::PathBuf;

use anyhow::Context;
use compass_proto::protocol::Recommendation;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::mpv::{MpvEvent, MpvHandle, MpvProcess, OBS_PAUSE};

pub const LABEL_IDLE: &str = "Play Preview";
pub const LABEL_PLAYING: &str = "Playing Snippet";

/// Identifies a player across async boundaries.  `generation` is the search
/// that produced the card, so events from players of replaced results can
/// be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    pub generation: u64,
    pub index: usize,
}

/// Something the audio side did on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    /// Playback was paused (by us or by anything else).
    Paused,
    /// The snippet played to the end.
    Ended,
    /// The backend could not start or lost its audio process.
    Failed(String),
}

pub trait PreviewBackend: Send {
    fn play(&mut self) -> anyhow::Result<()>;
    fn pause(&mut self) -> anyhow::Result<()>;
}

/// Creates a backend the first time a player is started.
pub trait PreviewLauncher {
    fn launch(&self, url: &str, key: PlayerKey) -> anyhow::Result<Box<dyn PreviewBackend>>;
}

pub struct PreviewPlayer {
    key: PlayerKey,
    url: String,
    playing: bool,
    backend: Option<Box<dyn PreviewBackend>>,
}

impl PreviewPlayer {
    pub fn new(key: PlayerKey, url: impl Into<String>) -> Self {
        Self {
            key,
            url: url.into(),
            playing: false,
            backend: None,
        }
    }

    pub fn key(&self) -> PlayerKey {
        self.key
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn label(&self) -> &'static str {
        if self.playing {
            LABEL_PLAYING
        } else {
            LABEL_IDLE
        }
    }

    pub fn glyph(&self) -> &'static str {
        if self.playing {
            "❚❚"
        } else {
            "▶"
        }
    }

    /// Pause when playing, start/resume otherwise.  On error the toggle
    /// stays (or falls back) at "not playing".
    pub fn toggle(&mut self, launcher: &dyn PreviewLauncher) -> anyhow::Result<()> {
        if self.playing {
            self.playing = false;
            if let Some(backend) = self.backend.as_mut() {
                backend.pause()?;
            }
            return Ok(());
        }

        if self.backend.is_none() {
            self.backend = Some(launcher.launch(&self.url, self.key)?);
        }
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.play() {
                // A dead backend is relaunched on the next toggle.
                self.backend = None;
                return Err(e);
            }
        }
        self.playing = true;
        Ok(())
    }

    /// Apply a backend event.  Returns `true` if the displayed state changed.
    pub fn on_event(&mut self, event: &PreviewEvent) -> bool {
        if let PreviewEvent::Failed(_) = event {
            self.backend = None;
        }
        let changed = self.playing;
        self.playing = false;
        changed
    }
}

/// One optional player per recommendation, in card order.
pub fn players_for(generation: u64, recs: &[Recommendation]) -> Vec<Option<PreviewPlayer>> {
    recs.iter()
        .enumerate()
        .map(|(index, rec)| {
            rec.preview_url()
                .map(|url| PreviewPlayer::new(PlayerKey { generation, index }, url))
        })
        .collect()
}

// ── mpv backend ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum PreviewCommand {
    Play,
    Pause,
}

/// Launches one mpv-backed preview task per player.
pub struct MpvLauncher {
    volume: u8,
    events: mpsc::UnboundedSender<(PlayerKey, PreviewEvent)>,
}

impl MpvLauncher {
    pub fn new(volume: u8, events: mpsc::UnboundedSender<(PlayerKey, PreviewEvent)>) -> Self {
        Self { volume, events }
    }
}

impl PreviewLauncher for MpvLauncher {
    fn launch(&self, url: &str, key: PlayerKey) -> anyhow::Result<Box<dyn PreviewBackend>> {
        let binary = compass_proto::platform::find_mpv_binary()
            .context("mpv not found — install mpv to play previews")?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(preview_task(
            binary,
            self.volume,
            url.to_string(),
            key,
            rx,
            self.events.clone(),
        ));
        Ok(Box::new(MpvPreview { tx }))
    }
}

/// Handle held by the player; dropping it ends the task and kills mpv.
struct MpvPreview {
    tx: mpsc::UnboundedSender<PreviewCommand>,
}

impl PreviewBackend for MpvPreview {
    fn play(&mut self) -> anyhow::Result<()> {
        self.tx
            .send(PreviewCommand::Play)
            .map_err(|_| anyhow::anyhow!("preview task gone"))
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.tx
            .send(PreviewCommand::Pause)
            .map_err(|_| anyhow::anyhow!("preview task gone"))
    }
}

struct Session {
    process: MpvProcess,
    handle: MpvHandle,
    /// Snippet reached its end; the next play starts it over.
    finished: bool,
}

/// Map an mpv event to what the player cares about.
fn classify(event: &MpvEvent) -> Option<PreviewEvent> {
    if let Some((id, data)) = event.as_property_change() {
        return (id == OBS_PAUSE && data.as_bool() == Some(true)).then_some(PreviewEvent::Paused);
    }
    match event.end_file_reason() {
        Some("eof") | Some("error") => Some(PreviewEvent::Ended),
        _ => None,
    }
}

async fn next_mpv_event(rx: &mut Option<mpsc::Receiver<MpvEvent>>) -> Option<MpvEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn start_or_resume(
    session: &mut Option<Session>,
    mpv_events: &mut Option<mpsc::Receiver<MpvEvent>>,
    binary: &PathBuf,
    volume: u8,
    url: &str,
) -> anyhow::Result<()> {
    if let Some(s) = session.as_mut() {
        if !s.process.alive() {
            *session = None;
            *mpv_events = None;
        }
    }

    match session.as_mut() {
        Some(s) if !s.finished => s.handle.set_pause(false).await,
        Some(s) => {
            s.finished = false;
            s.handle.load(url).await
        }
        None => {
            let (event_tx, event_rx) = mpsc::channel(64);
            let (process, handle) = MpvProcess::spawn_and_connect(binary, volume, event_tx).await?;
            handle.observe_pause().await?;
            handle.load(url).await?;
            *session = Some(Session {
                process,
                handle,
                finished: false,
            });
            *mpv_events = Some(event_rx);
            Ok(())
        }
    }
}

async fn preview_task(
    binary: PathBuf,
    volume: u8,
    url: String,
    key: PlayerKey,
    mut commands: mpsc::UnboundedReceiver<PreviewCommand>,
    events: mpsc::UnboundedSender<(PlayerKey, PreviewEvent)>,
) {
    info!("preview {}#{}: {}", key.generation, key.index, url);
    let mut session: Option<Session> = None;
    let mut mpv_events: Option<mpsc::Receiver<MpvEvent>> = None;

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                None => break,
                Some(PreviewCommand::Play) => {
                    if let Err(e) =
                        start_or_resume(&mut session, &mut mpv_events, &binary, volume, &url).await
                    {
                        warn!("preview {}#{}: play failed: {:#}", key.generation, key.index, e);
                        session = None;
                        mpv_events = None;
                        let _ = events.send((key, PreviewEvent::Failed(e.to_string())));
                    }
                }
                Some(PreviewCommand::Pause) => {
                    if let Some(s) = session.as_ref() {
                        if let Err(e) = s.handle.set_pause(true).await {
                            warn!("preview {}#{}: pause failed: {}", key.generation, key.index, e);
                        }
                    }
                }
            },
            ev = next_mpv_event(&mut mpv_events) => match ev {
                Some(ev) => {
                    if let Some(preview_event) = classify(&ev) {
                        if preview_event == PreviewEvent::Ended {
                            if let Some(s) = session.as_mut() {
                                s.finished = true;
                            }
                        }
                        debug!("preview {}#{}: {:?}", key.generation, key.index, preview_event);
                        let _ = events.send((key, preview_event));
                    }
                }
                None => {
                    // IPC closed: mpv went away under us.
                    session = None;
                    mpv_events = None;
                    let _ = events.send((key, PreviewEvent::Ended));
                }
            }
        }
    }
    debug!("preview {}#{}: task exiting", key.generation, key.index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<String>>>;

    struct FakeBackend {
        calls: Calls,
        fail_play: bool,
    }

    impl PreviewBackend for FakeBackend {
        fn play(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("play".into());
            if self.fail_play {
                anyhow::bail!("no audio device");
            }
            Ok(())
        }

        fn pause(&mut self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("pause".into());
            Ok(())
        }
    }

    struct FakeLauncher {
        calls: Calls,
        fail_play: bool,
        missing: bool,
    }

    impl FakeLauncher {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_play: false,
                missing: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PreviewLauncher for FakeLauncher {
        fn launch(&self, url: &str, _key: PlayerKey) -> anyhow::Result<Box<dyn PreviewBackend>> {
            if self.missing {
                anyhow::bail!("mpv not found");
            }
            self.calls.lock().unwrap().push(format!("launch {}", url));
            Ok(Box::new(FakeBackend {
                calls: self.calls.clone(),
                fail_play: self.fail_play,
            }))
        }
    }

    fn player() -> PreviewPlayer {
        PreviewPlayer::new(
            PlayerKey {
                generation: 1,
                index: 0,
            },
            "https://example.test/a.m4a",
        )
    }

    #[test]
    fn test_toggle_twice_round_trips_label() {
        let launcher = FakeLauncher::new();
        let mut p = player();
        assert_eq!(p.label(), "Play Preview");
        assert_eq!(p.glyph(), "▶");

        p.toggle(&launcher).unwrap();
        assert_eq!(p.label(), "Playing Snippet");
        assert_eq!(p.glyph(), "❚❚");

        p.toggle(&launcher).unwrap();
        assert_eq!(p.label(), "Play Preview");

        // Repeating the pair lands in the same place every time.
        for _ in 0..3 {
            p.toggle(&launcher).unwrap();
            p.toggle(&launcher).unwrap();
        }
        assert!(!p.is_playing());
    }

    #[test]
    fn test_backend_launched_once_and_resumed() {
        let launcher = FakeLauncher::new();
        let mut p = player();
        p.toggle(&launcher).unwrap();
        p.toggle(&launcher).unwrap();
        p.toggle(&launcher).unwrap();
        assert_eq!(
            launcher.calls(),
            vec!["launch https://example.test/a.m4a", "play", "pause", "play"]
        );
    }

    #[test]
    fn test_ended_and_external_pause_reset_toggle() {
        let launcher = FakeLauncher::new();
        let mut p = player();

        p.toggle(&launcher).unwrap();
        assert!(p.on_event(&PreviewEvent::Ended));
        assert_eq!(p.label(), "Play Preview");

        p.toggle(&launcher).unwrap();
        assert!(p.on_event(&PreviewEvent::Paused));
        assert!(!p.is_playing());

        // Already stopped: nothing to redraw.
        assert!(!p.on_event(&PreviewEvent::Paused));
    }

    #[test]
    fn test_launch_failure_keeps_toggle_idle() {
        let mut launcher = FakeLauncher::new();
        launcher.missing = true;
        let mut p = player();
        assert!(p.toggle(&launcher).is_err());
        assert!(!p.is_playing());

        // Once mpv shows up the same player works.
        launcher.missing = false;
        p.toggle(&launcher).unwrap();
        assert!(p.is_playing());
    }

    #[test]
    fn test_play_failure_drops_backend() {
        let mut launcher = FakeLauncher::new();
        launcher.fail_play = true;
        let mut p = player();
        assert!(p.toggle(&launcher).is_err());
        assert!(!p.is_playing());

        launcher.fail_play = false;
        p.toggle(&launcher).unwrap();
        assert_eq!(
            launcher.calls().iter().filter(|c| c.starts_with("launch")).count(),
            2
        );
    }

    #[test]
    fn test_players_are_independent() {
        let launcher = FakeLauncher::new();
        let recs = vec![
            Recommendation {
                artist: "A".into(),
                sample_url: Some("https://example.test/a.m4a".into()),
                ..Default::default()
            },
            Recommendation {
                artist: "B".into(),
                ..Default::default()
            },
            Recommendation {
                artist: "C".into(),
                sample_url: Some("https://example.test/c.m4a".into()),
                ..Default::default()
            },
        ];
        let mut players = players_for(7, &recs);
        assert!(players[1].is_none());

        for p in players.iter_mut().flatten() {
            p.toggle(&launcher).unwrap();
        }
        let playing: Vec<bool> = players.iter().flatten().map(|p| p.is_playing()).collect();
        assert_eq!(playing, vec![true, true]);
        assert_eq!(
            players[2].as_ref().unwrap().key(),
            PlayerKey {
                generation: 7,
                index: 2
            }
        );
    }

    #[test]
    fn test_classify_mpv_events() {
        let ev = |raw| MpvEvent { raw };
        assert_eq!(
            classify(&ev(json!({"event": "property-change", "id": OBS_PAUSE, "data": true}))),
            Some(PreviewEvent::Paused)
        );
        assert_eq!(
            classify(&ev(json!({"event": "property-change", "id": OBS_PAUSE, "data": false}))),
            None
        );
        assert_eq!(
            classify(&ev(json!({"event": "end-file", "reason": "eof"}))),
            Some(PreviewEvent::Ended)
        );
        assert_eq!(
            classify(&ev(json!({"event": "end-file", "reason": "stop"}))),
            None
        );
    }
}
