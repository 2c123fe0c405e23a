// Search-and-save flow, independent of how the user is prompted.

use crate::api::{SongSearch, Track};
use crate::library::{Library, PlaylistName, Song};
use anyhow::Result;
use tracing::{info, warn};

/// What a search-and-save run ended with.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The request failed or the response couldn't be read. Nothing was
    /// written.
    Failed,
    /// The endpoint returned no tracks. Nothing was written.
    NoSongs,
    Saved { playlist: PlaylistName, songs: usize },
}

/// Re-apply the keyword on the client: keep tracks whose truncated artist
/// or title contains `keyword`, ignoring case.
pub fn keep_matching(keyword: &str, tracks: &[Track]) -> Vec<Song> {
    tracks
        .iter()
        .map(Song::from)
        .filter(|song| song.matches(keyword))
        .collect()
}

/// Search for `keyword` and save the matching songs to a new playlist.
///
/// `choose_name` is only called once there is something to save; it must
/// return a name that `Library::validate_name` accepted. The keyword is
/// lower-cased before it is sent.
pub fn search_and_save<S, F>(
    search: &S,
    library: &Library,
    keyword: &str,
    choose_name: F,
) -> Result<SearchOutcome>
where
    S: SongSearch + ?Sized,
    F: FnOnce(&Library) -> Result<PlaylistName>,
{
    let keyword = keyword.to_lowercase();

    let tracks = match search.search(&keyword) {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!(keyword = %keyword, error = %format!("{:#}", e), "search request failed");
            return Ok(SearchOutcome::Failed);
        }
    };
    if tracks.is_empty() {
        info!(keyword = %keyword, "search returned no songs");
        return Ok(SearchOutcome::NoSongs);
    }

    let playlist = choose_name(library)?;
    let songs = keep_matching(&keyword, &tracks);
    library.create_playlist(&playlist, &songs)?;
    library.append_history(&songs)?;

    info!(
        keyword = %keyword,
        fetched = tracks.len(),
        kept = songs.len(),
        "search results saved"
    );
    Ok(SearchOutcome::Saved {
        playlist,
        songs: songs.len(),
    })
}
