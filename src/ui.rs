// UI layer: the numbered menu loop and the prompts behind each entry,
// using `dialoguer` for input and `indicatif` while a search is running.
// Everything else is delegated to `finder` and `library`.

use crate::api::{SongSearch, Track};
use crate::finder::{search_and_save, SearchOutcome};
use crate::library::{Library, PlaylistName};
use anyhow::Result;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// One entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Search,
    RandomSong,
    RemovePlaylist,
    ClearHistory,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        MenuAction::Search,
        MenuAction::RandomSong,
        MenuAction::RemovePlaylist,
        MenuAction::ClearHistory,
        MenuAction::Exit,
    ];

    /// The character the user types to pick this entry.
    pub fn key(self) -> char {
        match self {
            MenuAction::Search => '1',
            MenuAction::RandomSong => '2',
            MenuAction::RemovePlaylist => '3',
            MenuAction::ClearHistory => '4',
            MenuAction::Exit => '5',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Search => "Search by a keyword and save a playlist",
            MenuAction::RandomSong => "Get a random song from your search history",
            MenuAction::RemovePlaylist => "Delete existing playlist",
            MenuAction::ClearHistory => "Delete search history",
            MenuAction::Exit => "Exit",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid choice. Please select a valid option.")]
pub struct InvalidChoice(pub String);

impl FromStr for MenuAction {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choice = s.trim();
        MenuAction::ALL
            .into_iter()
            .find(|action| {
                let mut chars = choice.chars();
                chars.next() == Some(action.key()) && chars.next().is_none()
            })
            .ok_or_else(|| InvalidChoice(choice.to_string()))
    }
}

/// Whether the menu keeps looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Running,
    Stopped,
}

/// Printed when the user leaves the menu.
pub const GOODBYE: &str = "The application is closed. See you next time!";

/// The terminal failed while a prompt was open. Unlike failures inside an
/// action, this ends the menu.
#[derive(Debug, Error)]
#[error("Failed to read from the terminal")]
pub struct PromptError(#[from] std::io::Error);

/// Main interactive menu. Prints the options, reads a choice and runs it
/// until the user picks "Exit". Only terminal I/O errors end the loop
/// early; failures inside an action are reported and the menu comes back.
pub fn main_menu<S: SongSearch + ?Sized>(api: &S, library: &Library) -> Result<()> {
    let mut state = MenuState::Running;
    while state == MenuState::Running {
        print_menu();
        let choice: String = Input::new()
            .with_prompt("Enter your choice")
            .allow_empty(true)
            .interact_text()
            .map_err(PromptError)?;
        println!();

        state = match choice.parse::<MenuAction>() {
            Ok(action) => dispatch(action, api, library)?,
            Err(e) => {
                debug!(choice = %e.0, "invalid menu choice");
                println!("{}\n", e);
                MenuState::Running
            }
        };
    }
    Ok(())
}

fn print_menu() {
    println!("\nMenu:");
    for action in MenuAction::ALL {
        println!("{}. {}", action.key(), action.label());
    }
    println!();
}

/// Run one menu action and return the state the menu should be in after it.
pub fn dispatch<S: SongSearch + ?Sized>(
    action: MenuAction,
    api: &S,
    library: &Library,
) -> Result<MenuState> {
    debug!(?action, "menu action");
    match action {
        MenuAction::Search => handle_search(api, library)?,
        MenuAction::RandomSong => handle_random_song(library),
        MenuAction::RemovePlaylist => handle_remove_playlist(library)?,
        MenuAction::ClearHistory => handle_clear_history(library),
        MenuAction::Exit => {
            println!("{}", GOODBYE);
            return Ok(MenuState::Stopped);
        }
    }
    Ok(MenuState::Running)
}

/// Shows a spinner while the wrapped search is in flight.
struct WithSpinner<'a, S: ?Sized>(&'a S);

impl<S: SongSearch + ?Sized> SongSearch for WithSpinner<'_, S> {
    fn search(&self, keyword: &str) -> Result<Vec<Track>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        spinner.set_message("Searching...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = self.0.search(keyword);
        spinner.finish_and_clear();
        result
    }
}

/// Ask for a keyword, search, and save the matches under a new playlist.
fn handle_search<S: SongSearch + ?Sized>(api: &S, library: &Library) -> Result<()> {
    let keyword: String = Input::new()
        .with_prompt("Search keyword")
        .allow_empty(true)
        .interact_text()
        .map_err(PromptError)?;

    report_search(search_and_save(
        &WithSpinner(api),
        library,
        &keyword,
        prompt_playlist_name,
    ))
}

/// Print the result of a search-and-save run. A terminal failure during the
/// name prompt is handed back to end the menu; any other error is reported.
fn report_search(result: Result<SearchOutcome>) -> Result<()> {
    match result {
        Ok(SearchOutcome::Failed) => println!("Failed to retrieve songs. Please try again"),
        Ok(SearchOutcome::NoSongs) => println!("No songs found."),
        Ok(SearchOutcome::Saved { playlist, .. }) => {
            println!("Playlist {} has been saved", playlist)
        }
        Err(e) if e.is::<PromptError>() => return Err(e),
        Err(e) => {
            error!(error = %format!("{:#}", e), "saving playlist failed");
            println!("Failed to save playlist: {:#}", e);
        }
    }
    Ok(())
}

/// Keep asking until the name is non-empty and not already taken.
/// `dialoguer` prints the validation message and re-prompts on its own.
fn prompt_playlist_name(library: &Library) -> Result<PlaylistName> {
    let raw: String = Input::new()
        .with_prompt("Enter playlist name")
        .allow_empty(true)
        .validate_with(|input: &String| library.validate_name(input).map(|_| ()))
        .interact_text()
        .map_err(PromptError)?;
    Ok(library.validate_name(&raw)?)
}

fn handle_random_song(library: &Library) {
    match library.random_song(&mut rand::thread_rng()) {
        Ok(Some(song)) => println!("Your song is {}", song),
        Ok(None) => println!("You have no search history."),
        Err(e) => {
            error!(error = %format!("{:#}", e), "reading history failed");
            println!("Could not read search history: {:#}", e);
        }
    }
}

fn handle_remove_playlist(library: &Library) -> Result<()> {
    let raw: String = Input::new()
        .with_prompt("What playlist do you want to delete")
        .allow_empty(true)
        .interact_text()
        .map_err(PromptError)?;
    let name = PlaylistName::normalize(&raw);

    match library.remove_playlist(&name) {
        Ok(true) => println!("Playlist {} was deleted.", name),
        Ok(false) => println!("Playlist {} doesn't exist.", name),
        Err(e) => {
            error!(error = %format!("{:#}", e), "deleting playlist failed");
            println!("Failed to delete playlist {}: {:#}", name, e);
        }
    }
    Ok(())
}

fn handle_clear_history(library: &Library) {
    match library.clear_history() {
        Ok(()) => println!("Search history deleted."),
        Err(e) => {
            error!(error = %format!("{:#}", e), "clearing history failed");
            println!("Failed to delete search history: {:#}", e);
        }
    }
}
