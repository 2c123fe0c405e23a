// On-disk library: playlist files plus the shared search history file.
// All writes go through here so the text formats live in one place.

use crate::api::Track;
use crate::config::Config;
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Artist and song names are cut to this many characters before use.
pub const MAX_FIELD_CHARS: usize = 50;

/// Separator terminating every history entry.
pub const HISTORY_DELIMITER: char = ',';

/// A search hit reduced to what gets written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub artist_name: String,
    pub song_name: String,
}

impl Song {
    pub fn new(artist_name: &str, song_name: &str) -> Self {
        Song {
            artist_name: truncate_chars(artist_name, MAX_FIELD_CHARS),
            song_name: truncate_chars(song_name, MAX_FIELD_CHARS),
        }
    }

    /// True when `keyword` occurs in the artist or song name, ignoring case.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.artist_name.to_lowercase().contains(&keyword)
            || self.song_name.to_lowercase().contains(&keyword)
    }

    /// Block written to a playlist file.
    pub fn playlist_block(&self) -> String {
        format!(
            "Artist name: {}\nSong name: {}\n\n",
            self.artist_name, self.song_name
        )
    }

    /// Entry appended to the history file.
    pub fn history_entry(&self) -> String {
        format!("{} by {}{}", self.song_name, self.artist_name, HISTORY_DELIMITER)
    }
}

impl From<&Track> for Song {
    fn from(track: &Track) -> Self {
        Song::new(&track.artist.name, &track.title)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Playlist name as stored on disk: trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistName(String);

impl PlaylistName {
    pub fn normalize(raw: &str) -> Self {
        PlaylistName(raw.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a name can't be used for a new playlist. The messages are shown to
/// the user as-is before prompting again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaylistNameError {
    #[error("Playlist name cannot be empty. Please enter a name.")]
    Empty,
    #[error("Playlist {0} already exists. Enter another playlist name.")]
    AlreadyExists(PlaylistName),
}

/// Handle to the history file and the playlists directory.
#[derive(Debug, Clone)]
pub struct Library {
    history_file: PathBuf,
    playlists_dir: PathBuf,
}

impl Library {
    pub fn new(history_file: impl Into<PathBuf>, playlists_dir: impl Into<PathBuf>) -> Self {
        Library {
            history_file: history_file.into(),
            playlists_dir: playlists_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.history_file.clone(), config.playlists_dir.clone())
    }

    pub fn history_file(&self) -> &Path {
        &self.history_file
    }

    pub fn playlist_path(&self, name: &PlaylistName) -> PathBuf {
        self.playlists_dir.join(format!("{}.txt", name))
    }

    pub fn playlist_exists(&self, name: &PlaylistName) -> bool {
        self.playlist_path(name).exists()
    }

    /// Normalize `raw` and check it can name a new playlist.
    pub fn validate_name(&self, raw: &str) -> Result<PlaylistName, PlaylistNameError> {
        let name = PlaylistName::normalize(raw);
        if name.is_empty() {
            return Err(PlaylistNameError::Empty);
        }
        if self.playlist_exists(&name) {
            return Err(PlaylistNameError::AlreadyExists(name));
        }
        Ok(name)
    }

    /// Write `songs` to a brand new playlist file. The file is opened with
    /// `create_new`, an existing playlist is never overwritten.
    pub fn create_playlist(&self, name: &PlaylistName, songs: &[Song]) -> Result<PathBuf> {
        fs::create_dir_all(&self.playlists_dir).with_context(|| {
            format!(
                "Failed to create playlists folder {}",
                self.playlists_dir.display()
            )
        })?;

        let path = self.playlist_path(name);
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                anyhow::bail!("Playlist {} already exists", name)
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create playlist {}", path.display()))
            }
        };

        write_or_remove(&path, file, |out| {
            for song in songs {
                out.write_all(song.playlist_block().as_bytes())?;
            }
            Ok(())
        })
        .with_context(|| format!("Failed to write playlist {}", path.display()))?;

        info!(playlist = %name, songs = songs.len(), path = %path.display(), "playlist saved");
        Ok(path)
    }

    /// Append one history entry per song.
    pub fn append_history(&self, songs: &[Song]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_file)
            .with_context(|| format!("Failed to open {}", self.history_file.display()))?;
        let mut out = BufWriter::new(file);
        for song in songs {
            out.write_all(song.history_entry().as_bytes())
                .with_context(|| {
                    format!("Failed to append to {}", self.history_file.display())
                })?;
        }
        out.flush()
            .with_context(|| format!("Failed to append to {}", self.history_file.display()))?;
        debug!(entries = songs.len(), "history appended");
        Ok(())
    }

    /// Truncate the history file, creating it if needed.
    pub fn clear_history(&self) -> Result<()> {
        fs::write(&self.history_file, "")
            .with_context(|| format!("Failed to clear {}", self.history_file.display()))?;
        info!("search history cleared");
        Ok(())
    }

    /// Whole history text. A history file that was never written reads as
    /// empty.
    pub fn read_history(&self) -> Result<String> {
        match fs::read_to_string(&self.history_file) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read {}", self.history_file.display())),
        }
    }

    /// Pick one history entry uniformly at random, `None` when the history
    /// is empty. The trailing delimiter leaves an empty last entry, which
    /// can be picked like any other.
    pub fn random_song<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<String>> {
        let content = self.read_history()?;
        if content.is_empty() {
            return Ok(None);
        }
        let entries = history_entries(&content);
        Ok(entries.choose(rng).map(|entry| entry.to_string()))
    }

    /// Delete the playlist file. Returns false, touching nothing, if there
    /// is no such playlist.
    pub fn remove_playlist(&self, name: &PlaylistName) -> Result<bool> {
        let path = self.playlist_path(name);
        if !path.exists() {
            debug!(path = %path.display(), "playlist to remove not found");
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        info!(playlist = %name, "playlist deleted");
        Ok(true)
    }
}

/// Fill a freshly created file through a buffer. If any write fails the
/// file is deleted again, so no half-written playlist is left behind.
fn write_or_remove<F>(path: &Path, file: File, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut out = BufWriter::new(file);
    let result = fill(&mut out).and_then(|()| out.flush());
    if result.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove partial playlist");
        }
    }
    result
}

/// Split history text into entries, keeping the empty piece after the
/// final delimiter.
pub fn history_entries(content: &str) -> Vec<&str> {
    content.split(HISTORY_DELIMITER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn library(dir: &TempDir) -> Library {
        Library::new(dir.path().join("search-history.txt"), dir.path().join("playlists"))
    }

    #[test]
    fn test_song_truncates_to_50_chars() {
        let long = "x".repeat(80);
        let song = Song::new(&long, &"é".repeat(60));
        assert_eq!(song.artist_name.chars().count(), 50);
        assert_eq!(song.song_name.chars().count(), 50);
        assert!(song.song_name.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_song_matches_case_insensitive() {
        let song = Song::new("Adele", "Hello");
        assert!(song.matches("adele"));
        assert!(song.matches("ELL"));
        assert!(!song.matches("beyonce"));
    }

    #[test]
    fn test_match_uses_truncated_fields() {
        let title = format!("{}needle", "a".repeat(50));
        let song = Song::new("Someone", &title);
        assert!(!song.matches("needle"));
    }

    #[test]
    fn test_formats() {
        let song = Song::new("Adele", "Hello");
        assert_eq!(song.playlist_block(), "Artist name: Adele\nSong name: Hello\n\n");
        assert_eq!(song.history_entry(), "Hello by Adele,");
    }

    #[test]
    fn test_history_entries_keeps_trailing_empty() {
        assert_eq!(history_entries("A by B,C by D,"), vec!["A by B", "C by D", ""]);
    }

    #[test]
    fn test_validate_name() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        assert_eq!(lib.validate_name("   "), Err(PlaylistNameError::Empty));
        assert_eq!(lib.validate_name("  Rock "), Ok(PlaylistName::normalize("rock")));

        lib.create_playlist(&PlaylistName::normalize("rock"), &[]).unwrap();
        assert_eq!(
            lib.validate_name("ROCK"),
            Err(PlaylistNameError::AlreadyExists(PlaylistName::normalize("rock")))
        );
        assert_eq!(
            lib.validate_name("ROCK").unwrap_err().to_string(),
            "Playlist rock already exists. Enter another playlist name."
        );
    }

    #[test]
    fn test_create_playlist_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        let rock = PlaylistName::normalize("rock");

        let path = lib.create_playlist(&rock, &[Song::new("Queen", "Rock You")]).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(lib.create_playlist(&rock, &[Song::new("Other", "Rock")]).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_write_removes_the_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.txt");
        let file = OpenOptions::new().write(true).create_new(true).open(&path).unwrap();

        let err = write_or_remove(&path, file, |out| {
            out.write_all(b"Artist name: Adele\n")?;
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_write_keeps_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.txt");
        let file = OpenOptions::new().write(true).create_new(true).open(&path).unwrap();

        write_or_remove(&path, file, |out| out.write_all(b"Song name: Hello\n")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Song name: Hello\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_history_write_failure_has_context() {
        if OpenOptions::new().append(true).open("/dev/full").is_err() {
            return;
        }
        let lib = Library::new("/dev/full", "/nonexistent-playlists");
        // Enough entries to spill past the write buffer.
        let songs = vec![Song::new("Adele", "Hello"); 2000];

        let err = lib.append_history(&songs).unwrap_err();
        assert!(err.to_string().starts_with("Failed to append to /dev/full"));
    }

    #[test]
    fn test_history_append_and_clear() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);

        lib.append_history(&[Song::new("B", "A")]).unwrap();
        lib.append_history(&[Song::new("D", "C")]).unwrap();
        assert_eq!(lib.read_history().unwrap(), "A by B,C by D,");

        lib.clear_history().unwrap();
        assert_eq!(lib.read_history().unwrap(), "");
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(lib.random_song(&mut rng).unwrap(), None);
    }

    #[test]
    fn test_random_song_without_history_file() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(lib.random_song(&mut rng).unwrap(), None);
    }

    #[test]
    fn test_random_song_picks_an_entry() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        fs::write(lib.history_file(), "A by B,C by D,").unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let pick = lib.random_song(&mut rng).unwrap().unwrap();
            assert!(["A by B", "C by D", ""].contains(&pick.as_str()));
        }
    }

    #[test]
    fn test_remove_playlist() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        let favs = PlaylistName::normalize("favs");

        assert!(!lib.remove_playlist(&favs).unwrap());
        assert!(!dir.path().join("playlists").exists());

        lib.create_playlist(&favs, &[]).unwrap();
        assert!(lib.remove_playlist(&PlaylistName::normalize(" FAVS ")).unwrap());
        assert!(!lib.playlist_exists(&favs));
    }
}
