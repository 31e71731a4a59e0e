use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::config;
use crate::core::{BadTrackDecision, CoreAction, PlayerCore};
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct AppStartupOptions {
    /// Folder to add to the library before the first draw.
    pub add_folder: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    run_with_startup(AppStartupOptions::default())
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let state = config::load_state()?;
    let mut core = PlayerCore::from_persisted(state);

    if let Some(folder) = options.add_folder {
        core.add_folder(&folder);
    }

    let mut audio: Box<dyn AudioEngine> = match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => Box::new(NullAudioEngine::new()),
    };
    audio.set_volume(core.saved_volume);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();
    let mut library_rect = ratatui::prelude::Rect::default();

    let result: Result<()> = loop {
        maybe_auto_advance_track(&mut core, &mut *audio);

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                library_rect = crate::ui::library_rect(frame.area());
                let command = command_mode.then_some(command_buffer.as_str());
                crate::ui::draw(frame, &core, &*audio, command);
            })?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(&mut core, mouse, library_rect);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break Ok(());
        }

        // An unresolved bad-track report is modal: only the decision keys
        // are live until the user answers.
        if core.pending_bad_track().is_some() {
            handle_bad_track_key(&mut core, &mut *audio, key.code);
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(&mut core, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Down => core.select_next(),
            KeyCode::Up => core.select_prev(),
            KeyCode::Enter => {
                let action = core.play_selected();
                apply_action(&mut core, &mut *audio, action);
            }
            KeyCode::Char('n') => {
                let action = core.next_track();
                apply_action(&mut core, &mut *audio, action);
            }
            KeyCode::Char('b') => {
                let position = audio.position().unwrap_or(Duration::ZERO);
                let action = core.prev_track(position);
                apply_action(&mut core, &mut *audio, action);
            }
            KeyCode::Char('f') => {
                if let Some(action) = core.go_forward() {
                    apply_action(&mut core, &mut *audio, Some(action));
                }
            }
            KeyCode::Char(' ') => {
                if audio.is_paused() {
                    audio.resume();
                    core.status = String::from("Resumed");
                } else {
                    audio.pause();
                    core.status = String::from("Paused");
                }
                core.dirty = true;
            }
            KeyCode::Char('s') => core.toggle_shuffle(),
            KeyCode::Char('e') => core.cycle_repeat(),
            KeyCode::Char('r') => core.rescan(),
            KeyCode::Char(digit @ '0'..='5') => {
                let rating = f64::from(digit as u8 - b'0');
                core.rate_current(rating);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (audio.volume() + 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.status = format!("Volume: {}%", (next * 100.0).round() as u16);
                core.dirty = true;
            }
            KeyCode::Char('-') => {
                let next = (audio.volume() - 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.status = format!("Volume: {}%", (next * 100.0).round() as u16);
                core.dirty = true;
            }
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    core.saved_volume = audio.volume();
    let save_result = core.save();
    result?;
    save_result?;
    Ok(())
}

fn maybe_auto_advance_track(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if audio.current_track().is_none() || audio.is_paused() || !audio.is_finished() {
        return;
    }
    if core.pending_bad_track().is_some() {
        return;
    }

    let action = core.on_track_ended();
    apply_action(core, audio, action);
}

fn apply_action(core: &mut PlayerCore, audio: &mut dyn AudioEngine, action: Option<CoreAction>) {
    match action {
        Some(CoreAction::Load(path)) => {
            if let Err(err) = audio.play(&path) {
                core.status = format!("playback error: {err:#}");
                core.dirty = true;
            }
        }
        Some(CoreAction::Restart) => {
            if audio.current_track().is_some() {
                if let Err(err) = audio.seek_to(Duration::ZERO) {
                    core.status = format!("playback error: {err:#}");
                }
                audio.resume();
            } else if let Some(track) = core.current_track() {
                let path = track.path.clone();
                if let Err(err) = audio.play(&path) {
                    core.status = format!("playback error: {err:#}");
                }
            }
            core.dirty = true;
        }
        None => {
            // Navigation found nothing playable; stop unless the engine is
            // waiting for a bad-track decision.
            if core.pending_bad_track().is_none() {
                audio.stop();
            }
        }
    }
}

fn handle_bad_track_key(core: &mut PlayerCore, audio: &mut dyn AudioEngine, code: KeyCode) {
    let decision = match code {
        KeyCode::Char('s') | KeyCode::Enter => BadTrackDecision::SkipOnce,
        KeyCode::Char('a') => BadTrackDecision::SkipAlways,
        KeyCode::Esc | KeyCode::Char('x') => BadTrackDecision::Stop,
        _ => return,
    };

    let action = core.resolve_bad_track(decision);
    if decision == BadTrackDecision::Stop {
        audio.stop();
        return;
    }
    apply_action(core, audio, action);
}

fn handle_mouse(core: &mut PlayerCore, mouse: MouseEvent, library_rect: ratatui::prelude::Rect) {
    let inside_library = point_in_rect(mouse.column, mouse.row, library_rect);
    match mouse.kind {
        MouseEventKind::ScrollDown if inside_library => core.select_next(),
        MouseEventKind::ScrollUp if inside_library => core.select_prev(),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: ratatui::prelude::Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn run_command(core: &mut PlayerCore, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        core.status = String::from("No command");
        core.dirty = true;
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => {
            core.status =
                String::from("Commands: add <path> | skip | save  (keys: n/b/f/s/e/r, 0-5 rate)");
            core.dirty = true;
        }
        "add" => {
            if rest.is_empty() {
                core.status = String::from("Usage: add <path>");
                core.dirty = true;
            } else {
                core.add_folder(&PathBuf::from(rest));
            }
        }
        "skip" => core.toggle_skip_policy(),
        "save" => {
            if let Err(err) = core.save() {
                core.status = format!("save error: {err:#}");
                core.dirty = true;
            }
        }
        _ => {
            core.status = String::from("Unknown command. Use :help");
            core.dirty = true;
        }
    }
}
