//! Dispatcher: routes decoded actions to the Sonos control plane
//!
//! Owns the session state and the HTTP client. Request failures are
//! logged and swallowed so a flaky network never takes down the scan
//! loop; the loop itself is the unit of availability.

use tracing::{info, warn};

use crate::indicator::StatusLed;
use crate::sonos::{self, Client};
use crate::state::{PlayMode, Session};
use crate::table::{Action, CommandTable};

const ROOM_PLAYROOM: &str = "Playroom";
const ROOM_LIVING: &str = "Living Room";
const ROOM_BATHROOM: &str = "Bathroom";

pub struct Dispatcher {
    client: Client,
    session: Session,
    table: CommandTable,
    led: StatusLed,
}

impl Dispatcher {
    pub fn new(client: Client, session: Session, table: CommandTable, led: StatusLed) -> Self {
        Self {
            client,
            session,
            table,
            led,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one scanned code: table lookup, then dispatch by action kind.
    pub async fn handle_swipe(&mut self, code: &str) {
        info!(%code, "handling swipe");

        let Some(action) = self.table.lookup(code).cloned() else {
            warn!(%code, "code not found in command table");
            return;
        };

        match &action {
            Action::Command(name) => self.handle_command(name).await,
            Action::Library(id) => self.handle_library(id).await,
            Action::Spotify(id) => self.handle_spotify(id).await,
        }

        // Visual confirmation that the code was handled, for actions with
        // no audible feedback of their own.
        self.led.blink_twice().await;
    }

    /// Startup announcements: pause everything, greet, optionally warm up
    /// the library index, then prompt for a card.
    pub async fn announce_startup(&self, skip_load: bool) {
        self.global_request("pauseall").await;
        self.speak("Hello, let's play some music.").await;

        if !skip_load {
            // The library index takes a few seconds to prepare
            info!("indexing the music library");
            self.speak("Please give me a moment to gather my thoughts.")
                .await;
            self.room_request("musicsearch/library/loadifneeded").await;
            info!("indexing complete");
            self.speak("I'm ready now!").await;
        }

        self.speak("Show me a card!").await;
    }

    async fn handle_command(&mut self, name: &str) {
        info!(command = name, "handling built-in command");

        let phrase = match name {
            "playpause" => {
                self.room_request("playpause").await;
                None
            }
            "next" => {
                self.room_request("next").await;
                None
            }
            // Informational: the speaker answers, so no confirmation phrase
            "whatsong" => {
                self.room_request("saysong").await;
                None
            }
            "whatnext" => {
                self.room_request("saynext").await;
                None
            }
            "playroom" => {
                self.switch_to_rooms(&[ROOM_PLAYROOM]).await;
                None
            }
            "livingroom" => {
                self.switch_to_rooms(&[ROOM_LIVING]).await;
                Some("I'm switching to the living room")
            }
            "bathroom" => {
                self.switch_to_rooms(&[ROOM_BATHROOM]).await;
                Some("I'm switching to the bathroom")
            }
            "everywhere" => {
                self.switch_to_rooms(&[ROOM_PLAYROOM, ROOM_LIVING, ROOM_BATHROOM])
                    .await;
                Some("I'm switching to the whole house")
            }
            "songonly" => {
                self.session.set_mode(PlayMode::SongImmediate);
                Some("Scan a card and I'll play that song right away")
            }
            "wholealbum" => {
                self.session.set_mode(PlayMode::AlbumImmediate);
                Some("Scan a card and I'll play the whole album")
            }
            "buildqueue" => {
                self.session.set_mode(PlayMode::BuildQueue);
                self.room_request("clearqueue").await;
                Some("Let's build a list of songs")
            }
            "combinerooms" => {
                self.session.toggle_combine_rooms();
                None
            }
            _ => {
                warn!(command = name, "unrecognized built-in command");
                Some("Hmm, I don't recognize that command")
            }
        };

        if let Some(phrase) = phrase {
            self.speak(phrase).await;
        }
    }

    async fn handle_library(&self, id: &str) {
        info!(%id, mode = %self.session.mode(), "playing from library");

        let action = match self.session.mode() {
            PlayMode::BuildQueue => "queuesongfromhash",
            PlayMode::AlbumImmediate => "playalbumfromhash",
            PlayMode::SongImmediate => "playsongfromhash",
        };

        self.room_request(&format!("musicsearch/library/{}/{}", action, id))
            .await;
    }

    async fn handle_spotify(&self, id: &str) {
        info!(%id, mode = %self.session.mode(), "playing from spotify");

        let action = match self.session.mode() {
            PlayMode::BuildQueue => "queue",
            PlayMode::AlbumImmediate => "clearqueueandplayalbum",
            PlayMode::SongImmediate => "clearqueueandplaysong",
        };

        self.room_request(&format!("spotify/{}/{}", action, id))
            .await;
    }

    /// Recompute the room group. New rooms join the current primary's
    /// group; rooms dropped from the group leave it and pause. With the
    /// combine flag set, targets are added to the group instead of
    /// replacing it.
    async fn switch_to_rooms(&mut self, targets: &[&str]) {
        let current: Vec<String> = self.session.rooms().to_vec();
        let primary = self.session.primary().to_string();

        let targets: Vec<String> = if self.session.combine_rooms() {
            let mut union = current.clone();
            for room in targets {
                if !union.iter().any(|r| r == room) {
                    union.push(room.to_string());
                }
            }
            union
        } else {
            targets.iter().map(|r| r.to_string()).collect()
        };

        info!(?current, ?targets, "switching rooms");

        for room in &targets {
            if !current.contains(room) {
                self.request_for_room(room, &format!("join/{}", sonos::escape(&primary)))
                    .await;
            }
        }

        for room in &current {
            if !targets.contains(room) {
                self.request_for_room(room, "leave").await;
                self.request_for_room(room, "pause0").await;
            }
        }

        // Keep the old primary first when it survives the switch so the
        // group stays addressed through it.
        let mut group = Vec::with_capacity(targets.len());
        if targets.contains(&primary) {
            group.push(primary);
        }
        for room in targets {
            if !group.contains(&room) {
                group.push(room);
            }
        }

        self.session.set_rooms(group);
    }

    /// Room-addressed request to the current primary; failures are logged.
    async fn room_request(&self, path: &str) {
        self.request_for_room(self.session.primary(), path).await;
    }

    async fn request_for_room(&self, room: &str, path: &str) {
        if let Err(e) = self.client.room(room, path).await {
            warn!(%room, %path, error = %e, "room request failed");
        }
    }

    async fn global_request(&self, path: &str) {
        if let Err(e) = self.client.global(path).await {
            warn!(%path, error = %e, "global request failed");
        }
    }

    async fn speak(&self, phrase: &str) {
        info!(%phrase, "speaking");
        if let Err(e) = self.client.speak(self.session.primary(), phrase).await {
            warn!(%phrase, error = %e, "speak request failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockito::{Matcher, ServerGuard};
    use tempfile::TempDir;

    use super::*;

    fn make_dispatcher(server: &ServerGuard, entries: &[(&str, &str)]) -> (Dispatcher, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::restore(&dir.path().join(".last-room"), "Living Room");
        let raw: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let dispatcher = Dispatcher::new(
            Client::new(server.url()).unwrap(),
            session,
            CommandTable::from_entries(raw),
            StatusLed::disabled(),
        );
        (dispatcher, dir)
    }

    #[tokio::test]
    async fn lookup_miss_issues_no_request() {
        let mut server = mockito::Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Regex(".*".into()))
            .expect(0)
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(&server, &[("known", "cmd:playpause")]);
        dispatcher.handle_swipe("unknown-code").await;

        any.assert_async().await;
    }

    #[tokio::test]
    async fn unrecognized_command_speaks_fallback_without_state_change() {
        let mut server = mockito::Server::new_async().await;
        let say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(&server, &[("card", "cmd:dance")]);
        dispatcher.handle_swipe("card").await;

        say.assert_async().await;
        assert_eq!(dispatcher.session().mode(), PlayMode::SongImmediate);
        assert_eq!(dispatcher.session().rooms(), ["Living Room"]);
    }

    #[tokio::test]
    async fn album_mode_plays_album_from_hash() {
        let mut server = mockito::Server::new_async().await;
        let say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .create_async()
            .await;
        let play = server
            .mock(
                "GET",
                "/Living%20Room/musicsearch/library/playalbumfromhash/42",
            )
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(
            &server,
            &[("mode-card", "cmd:wholealbum"), ("album-card", "lib:42")],
        );
        dispatcher.handle_swipe("mode-card").await;
        dispatcher.handle_swipe("album-card").await;

        say.assert_async().await;
        play.assert_async().await;
    }

    #[tokio::test]
    async fn song_mode_plays_spotify_immediately() {
        let mut server = mockito::Server::new_async().await;
        let play = server
            .mock("GET", "/Living%20Room/spotify/clearqueueandplaysong/abc")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(&server, &[("card", "spotify:abc")]);
        dispatcher.handle_swipe("card").await;

        play.assert_async().await;
    }

    #[tokio::test]
    async fn build_queue_clears_then_queues() {
        let mut server = mockito::Server::new_async().await;
        let clear = server
            .mock("GET", "/Living%20Room/clearqueue")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        let _say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .create_async()
            .await;
        let queue_lib = server
            .mock(
                "GET",
                "/Living%20Room/musicsearch/library/queuesongfromhash/99",
            )
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        let queue_spotify = server
            .mock("GET", "/Living%20Room/spotify/queue/xyz")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(
            &server,
            &[
                ("mode-card", "cmd:buildqueue"),
                ("song-card", "lib:99"),
                ("spotify-card", "spotify:xyz"),
            ],
        );
        dispatcher.handle_swipe("mode-card").await;
        dispatcher.handle_swipe("song-card").await;
        dispatcher.handle_swipe("spotify-card").await;

        clear.assert_async().await;
        queue_lib.assert_async().await;
        queue_spotify.assert_async().await;
    }

    #[tokio::test]
    async fn room_switch_joins_leaves_and_persists() {
        let mut server = mockito::Server::new_async().await;
        let join = server
            .mock("GET", "/Bathroom/join/Living%20Room")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        let leave = server
            .mock("GET", "/Living%20Room/leave")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        let pause = server
            .mock("GET", "/Living%20Room/pause0")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        // Confirmation addresses the new primary
        let say = server
            .mock("GET", Matcher::Regex("^/Bathroom/say/.*".into()))
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, dir) = make_dispatcher(&server, &[("card", "cmd:bathroom")]);
        dispatcher.handle_swipe("card").await;

        join.assert_async().await;
        leave.assert_async().await;
        pause.assert_async().await;
        say.assert_async().await;

        assert_eq!(dispatcher.session().rooms(), ["Bathroom"]);
        let persisted = std::fs::read_to_string(dir.path().join(".last-room")).unwrap();
        assert_eq!(persisted, r#"["Bathroom"]"#);
    }

    #[tokio::test]
    async fn combine_unions_groups() {
        let mut server = mockito::Server::new_async().await;
        let join = server
            .mock("GET", "/Bathroom/join/Living%20Room")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        let leave = server
            .mock("GET", Matcher::Regex("^/.*/leave$".into()))
            .expect(0)
            .create_async()
            .await;
        // Primary is unchanged, so the confirmation stays in the living room
        let _say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .create_async()
            .await;

        let (mut dispatcher, _dir) = make_dispatcher(
            &server,
            &[("combine-card", "cmd:combinerooms"), ("card", "cmd:bathroom")],
        );
        dispatcher.handle_swipe("combine-card").await;
        dispatcher.handle_swipe("card").await;

        join.assert_async().await;
        leave.assert_async().await;
        assert_eq!(dispatcher.session().rooms(), ["Living Room", "Bathroom"]);
        assert_eq!(dispatcher.session().primary(), "Living Room");
    }

    #[tokio::test]
    async fn startup_warms_up_the_library_index() {
        let mut server = mockito::Server::new_async().await;
        let pauseall = server
            .mock("GET", "/pauseall")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;
        // Greeting, "gather my thoughts", "ready", card prompt
        let say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .expect(4)
            .create_async()
            .await;
        let load = server
            .mock("GET", "/Living%20Room/musicsearch/library/loadifneeded")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (dispatcher, _dir) = make_dispatcher(&server, &[]);
        dispatcher.announce_startup(false).await;

        pauseall.assert_async().await;
        say.assert_async().await;
        load.assert_async().await;
    }

    #[tokio::test]
    async fn skip_load_suppresses_warm_up() {
        let mut server = mockito::Server::new_async().await;
        let _pauseall = server
            .mock("GET", "/pauseall")
            .with_body("ok")
            .create_async()
            .await;
        // Greeting and card prompt only
        let say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .expect(2)
            .create_async()
            .await;
        let load = server
            .mock("GET", "/Living%20Room/musicsearch/library/loadifneeded")
            .expect(0)
            .create_async()
            .await;

        let (dispatcher, _dir) = make_dispatcher(&server, &[]);
        dispatcher.announce_startup(true).await;

        say.assert_async().await;
        load.assert_async().await;
    }

    #[tokio::test]
    async fn startup_survives_pauseall_failure() {
        let mut server = mockito::Server::new_async().await;
        let _pauseall = server
            .mock("GET", "/pauseall")
            .with_status(500)
            .create_async()
            .await;
        let say = server
            .mock("GET", Matcher::Regex("^/Living%20Room/say/.*".into()))
            .with_body("ok")
            .expect(2)
            .create_async()
            .await;

        let (dispatcher, _dir) = make_dispatcher(&server, &[]);
        dispatcher.announce_startup(true).await;

        say.assert_async().await;
    }

    #[tokio::test]
    async fn request_failure_does_not_poison_the_dispatcher() {
        let mut server = mockito::Server::new_async().await;
        let _fail = server
            .mock("GET", "/Living%20Room/playpause")
            .with_status(500)
            .create_async()
            .await;
        let next = server
            .mock("GET", "/Living%20Room/next")
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let (mut dispatcher, _dir) =
            make_dispatcher(&server, &[("a", "cmd:playpause"), ("b", "cmd:next")]);
        dispatcher.handle_swipe("a").await;
        dispatcher.handle_swipe("b").await;

        next.assert_async().await;
    }
}
