use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use blue_podcast::audio::StreamingEngine;
use blue_podcast::config::{AppConfig, USER_AGENT};
use blue_podcast::controller::{
    PlayerHandle, PlayerService, PlayerSignal, StartOutcome, WidgetUpdate,
};
use blue_podcast::directory::{DirectoryApi, HttpDirectory, PodcastListings, Section};
use blue_podcast::episodes::EpisodeList;
use blue_podcast::model::{EpisodeInfo, Listing, Podcast};
use blue_podcast::platform::{FocusHandle, FocusKind, FocusManager, NowPlayingNotifier, WidgetHub};
use blue_podcast::logging;

const HELP: &str = "\
commands:
  list <best|comedy|business|health>   show a channel listing
  open <podcast-id>                    load a podcast's episodes
  play <n>                             play episode n of the open podcast (takes audio focus)
  pause | resume | stop                control playback directly
  PLAY | PAUSE | STOP                  send a host command
  status                               print playback status
  duck | interrupt | call | release    simulate another app taking audio focus
  quit";

struct Session {
    listings: PodcastListings<HttpDirectory>,
    episodes: EpisodeList,
    podcast: Option<Podcast>,
    player: PlayerHandle,
    focus: FocusManager,
    intruder: FocusHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Blue Podcast Starting ===");

    let directory = HttpDirectory::new(&config.api_base_url, config.api_key.clone(), USER_AGENT)?;
    let listings = PodcastListings::new(directory);

    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = StreamingEngine::new(engine_tx, USER_AGENT)?;

    let focus = FocusManager::new();
    let (player_focus, focus_rx) = focus.register();
    let (intruder, _intruder_rx) = focus.register();

    let notifier = NowPlayingNotifier::new();
    let mut notifications = notifier.subscribe();
    let widgets = WidgetHub::new();
    let mut widget_rx = widgets.subscribe();

    let service = PlayerService::new(
        engine,
        player_focus,
        notifier,
        widgets,
        config.player_settings(),
    );
    let (player, mut signals, player_task) =
        blue_podcast::controller::spawn_player(service, engine_rx, focus_rx, config.ready_timeout());
    player.bind()?;

    tokio::spawn(async move {
        while notifications.changed().await.is_ok() {
            match notifications.borrow_and_update().as_ref() {
                Some(n) => println!("[notification] {} - {}", n.status, n.title),
                None => println!("[notification] cleared"),
            }
        }
    });

    tokio::spawn(async move {
        while let Ok(update) = widget_rx.recv().await {
            match update {
                WidgetUpdate::Episode { title, is_playing, .. } => {
                    println!("[widget] {} ({})", title, if is_playing { "playing" } else { "paused" })
                }
                WidgetUpdate::NoEpisode => println!("[widget] no episode playing"),
            }
        }
    });

    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            match signal {
                PlayerSignal::StatusChanged(status) => tracing::info!(%status, "Player status"),
                PlayerSignal::PlaybackFailed(reason) => println!("[player] {}", reason),
                PlayerSignal::Terminated => println!("[player] stopped"),
            }
        }
    });

    let mut session = Session {
        listings,
        episodes: EpisodeList::new(),
        podcast: None,
        player,
        focus,
        intruder,
    };

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Err(e) = session.handle_line(line).await {
            tracing::warn!(error = %e, line, "Command failed");
            println!("error: {:#}", e);
        }
    }

    if let Ok(residency) = session.player.unbind().await {
        tracing::debug!(?residency, "Host unbound");
    }
    let _ = session.player.shutdown();
    drop(session);
    let _ = player_task.await;

    tracing::info!("Blue Podcast shutting down");
    Ok(())
}

impl Session {
    async fn handle_line(&mut self, line: &str) -> Result<()> {
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "list" => self.list(arg).await,
            "open" => self.open(arg).await?,
            "play" => self.play(arg).await?,
            "pause" => self.player.pause()?,
            "resume" => self.player.resume()?,
            "stop" => self.player.stop()?,
            "PLAY" | "PAUSE" | "STOP" => {
                let outcome = self.player.send_command(Some(command)).await?;
                println!("{:?}", outcome);
            }
            "status" => println!("{}", self.player.status().await?),
            "duck" => {
                self.intruder.request_kind(FocusKind::GainTransientMayDuck);
            }
            "interrupt" => {
                self.intruder.request_kind(FocusKind::GainTransient);
            }
            "call" => self.focus.set_call_active(true),
            "release" => {
                self.focus.set_call_active(false);
                self.intruder.release();
            }
            _ => println!("{}", HELP),
        }
        Ok(())
    }

    async fn list(&self, arg: &str) {
        let Some(section) = Section::from_name(if arg.is_empty() { "best" } else { arg }) else {
            println!("unknown section {:?}", arg);
            return;
        };

        match self.listings.get(section).await {
            Listing::Loaded(channels) => {
                for channel in channels {
                    println!("{:<24} {} ({})", channel.id, channel.title, channel.publisher);
                }
            }
            Listing::Failed(reason) => println!("could not load {}: {}", section.name(), reason),
            Listing::Unset => {}
        }
    }

    async fn open(&mut self, id: &str) -> Result<()> {
        let podcast = self.listings.directory().podcast(id).await?;
        self.episodes.swap_episodes(podcast.episodes.clone());
        println!("{} by {}", podcast.title, podcast.publisher);
        for (i, row) in self.episodes.rows().enumerate() {
            println!("{:>3}. {} [{}]", i, row.title, row.duration);
        }
        self.podcast = Some(podcast);
        Ok(())
    }

    async fn play(&self, arg: &str) -> Result<()> {
        let index: usize = arg.parse()?;
        let (Some(podcast), Some(episode)) = (&self.podcast, self.episodes.select(index)) else {
            println!("no episode {}", index);
            return Ok(());
        };
        self.player.request(
            episode.audio_url.clone(),
            EpisodeInfo::from_episode(episode, podcast),
        )?;

        // Focus is only taken on the host command path
        if self.player.send_command(Some("PLAY")).await? == StartOutcome::NotSticky {
            println!("audio focus denied");
        }
        Ok(())
    }
}
