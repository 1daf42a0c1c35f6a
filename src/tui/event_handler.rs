use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;

use super::app::{App, AppMode, SettingsField};
use crate::output;

/// Handle input in main mode
pub async fn handle_main_input(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Home => app.selected_image = 0,
        KeyCode::End => {
            if !app.images.is_empty() {
                app.selected_image = app.images.len() - 1;
            }
        }

        // Enter input mode
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.mode = AppMode::Input;
            app.clear_messages();
        }

        // Open settings
        KeyCode::Char('s') => {
            app.mode = AppMode::Settings;
            app.settings_selected = 0;
        }

        // Download all as zip
        KeyCode::Char('z') => download_archive(app).await,

        // Clear results
        KeyCode::Char('c') => {
            if !app.generating {
                app.clear_results();
                app.set_status("Cleared results");
            }
        }

        // Quit
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }

        _ => {}
    }
    Ok(())
}

/// Handle input in text input mode
pub async fn handle_input_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Main;
            app.input.clear();
            app.cursor_pos = 0;
        }

        KeyCode::Enter => {
            let prompt = app.input.clone();
            if app.submit_prompt(&prompt) {
                app.input.clear();
                app.cursor_pos = 0;
                app.mode = AppMode::Main;
            }
        }

        // Recall the most recent prompt
        KeyCode::Up => {
            if let Some(entry) = app.history.latest() {
                app.input = entry.prompt.clone();
                app.cursor_pos = app.input_len();
            }
        }

        KeyCode::Char(c) => {
            let idx = app.cursor_byte_index();
            app.input.insert(idx, c);
            app.cursor_pos += 1;
        }

        KeyCode::Backspace => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
                let idx = app.cursor_byte_index();
                app.input.remove(idx);
            }
        }

        KeyCode::Delete => {
            if app.cursor_pos < app.input_len() {
                let idx = app.cursor_byte_index();
                app.input.remove(idx);
            }
        }

        KeyCode::Left => {
            if app.cursor_pos > 0 {
                app.cursor_pos -= 1;
            }
        }

        KeyCode::Right => {
            if app.cursor_pos < app.input_len() {
                app.cursor_pos += 1;
            }
        }

        KeyCode::Home => {
            app.cursor_pos = 0;
        }

        KeyCode::End => {
            app.cursor_pos = app.input_len();
        }

        _ => {}
    }
    Ok(())
}

/// Handle input in settings mode
pub fn handle_settings_input(app: &mut App, key: KeyEvent) -> Result<()> {
    let fields = SettingsField::all();

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            if app.settings_selected > 0 {
                app.settings_selected -= 1;
            }
        }

        KeyCode::Down | KeyCode::Char('j') => {
            if app.settings_selected < fields.len() - 1 {
                app.settings_selected += 1;
            }
        }

        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right | KeyCode::Char('l') => {
            let field = fields[app.settings_selected];
            app.adjust_setting(&field, true);
            app.set_status(format!("{}: {}", field.label(), app.get_settings_value(&field)));
        }

        KeyCode::Left | KeyCode::Char('h') => {
            let field = fields[app.settings_selected];
            app.adjust_setting(&field, false);
            app.set_status(format!("{}: {}", field.label(), app.get_settings_value(&field)));
        }

        KeyCode::Esc | KeyCode::Char('q') => {
            app.mode = AppMode::Main;
            app.clear_messages();
        }

        _ => {}
    }
    Ok(())
}

/// Write the current results to a zip archive in the output directory
async fn download_archive(app: &mut App) {
    if app.images.is_empty() {
        app.set_error("No images to download");
        return;
    }

    let output_dir = PathBuf::from(&app.config.output.directory);
    let result = output::write_archive(app.images.iter().map(|i| &i.bitmap), &output_dir).await;

    match result {
        Ok(path) => app.set_status(format!("⬇️  Saved {} image(s) to {}", app.images.len(), path.display())),
        Err(e) => app.set_error(format!("Download failed: {:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn offline_app() -> App {
        App::new(Config::default(), Err("API token not configured".to_string()))
    }

    #[tokio::test]
    async fn test_typing_and_editing_prompt() {
        let mut app = offline_app();
        app.mode = AppMode::Input;

        for c in "cat".chars() {
            handle_input_mode(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_input_mode(&mut app, key(KeyCode::Left)).await.unwrap();
        handle_input_mode(&mut app, key(KeyCode::Backspace)).await.unwrap();
        handle_input_mode(&mut app, key(KeyCode::Char('u'))).await.unwrap();

        assert_eq!(app.input, "cut");
        assert_eq!(app.cursor_pos, 2);
    }

    #[tokio::test]
    async fn test_enter_on_blank_prompt_stays_in_input() {
        let mut app = offline_app();
        app.mode = AppMode::Input;
        app.input = "   ".to_string();

        handle_input_mode(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.mode, AppMode::Input);
        assert!(app.error_message.is_some());
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn test_archive_without_images_is_refused() {
        let mut app = offline_app();
        handle_main_input(&mut app, key(KeyCode::Char('z'))).await.unwrap();
        assert_eq!(app.error_message.as_deref(), Some("No images to download"));
    }

    #[tokio::test]
    async fn test_clearing_results_keeps_history() {
        let mut app = offline_app();
        app.history.push("a red fox");

        handle_main_input(&mut app, key(KeyCode::Char('c'))).await.unwrap();
        assert_eq!(app.history.len(), 1);
        assert!(app.images.is_empty());
    }

    #[test]
    fn test_settings_navigation() {
        let mut app = offline_app();
        app.mode = AppMode::Settings;

        handle_settings_input(&mut app, key(KeyCode::Down)).unwrap();
        handle_settings_input(&mut app, key(KeyCode::Right)).unwrap();
        assert_eq!(app.num_images, 2);

        handle_settings_input(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.mode, AppMode::Main);
    }
}
