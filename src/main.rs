mod storage;
mod terminal;
mod ui;

use std::ffi::OsString;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::Event;
use directories::BaseDirs;
use num_traits::{FromPrimitive, ToPrimitive};
use stopwatch_core::{
    shortcut, Command, Config, Control, Controller, Focus, RepeatingTask, Scheduler, TimeSource,
};
use tracing_subscriber::EnvFilter;

use crate::storage::FileStore;
use crate::terminal::{key_action, KeyAction, RawMode};
use crate::ui::TerminalUi;

const APP_NAME: &str = "Stopwatch";
const DATA_DIR_ENV: &str = "STOPWATCH_DATA_DIR";
const KEY_QUIT: char = 'q';

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
enum AppOp {
    Rawkeys = 0,
    Control,
    Pump,
    AutoSave,
    Quit,
}

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
enum PumpOp {
    Start = 0,
    Stop,
    Quit,
}

/// Two-word message passed between the app threads.
#[derive(Clone, Copy, Debug)]
struct Scalar {
    id: usize,
    arg1: usize,
}

impl Scalar {
    fn new<T: ToPrimitive>(op: T, arg1: usize) -> Self {
        Self {
            id: op.to_usize().unwrap_or(usize::MAX),
            arg1,
        }
    }
}

/// Milliseconds since the app started.
struct MonotonicClock {
    origin: Instant,
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Drives the render loop through the pump thread.
struct PumpScheduler {
    pump_conn: Sender<Scalar>,
}

impl Scheduler for PumpScheduler {
    fn repeat_every(&mut self, interval_ms: u64) -> RepeatingTask {
        let interval = usize::try_from(interval_ms).unwrap_or(usize::MAX);
        self.pump_conn.send(Scalar::new(PumpOp::Start, interval)).ok();
        let conn = self.pump_conn.clone();
        RepeatingTask::new(move || {
            conn.send(Scalar::new(PumpOp::Stop, 0)).ok();
        })
    }
}

fn pump_thread(pump_rx: Receiver<Scalar>, main_conn: Sender<Scalar>) {
    let mut interval = Duration::from_millis(16);
    let mut running = false;

    loop {
        // Wait out one interval when running, block for a command when stopped
        let envelope = if running {
            match pump_rx.recv_timeout(interval) {
                Ok(msg) => Some(msg),
                Err(RecvTimeoutError::Timeout) => {
                    if main_conn.send(Scalar::new(AppOp::Pump, 0)).is_err() {
                        break;
                    }
                    None
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match pump_rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            }
        };

        if let Some(msg) = envelope {
            match PumpOp::from_usize(msg.id) {
                Some(PumpOp::Start) => {
                    let ms = if msg.arg1 == 0 { 16 } else { msg.arg1 as u64 };
                    interval = Duration::from_millis(ms);
                    running = true;
                }
                Some(PumpOp::Stop) => running = false,
                Some(PumpOp::Quit) => break,
                None => log::error!("pump: unknown opcode {}", msg.id),
            }
        }
    }
}

fn autosave_thread(interval_ms: u64, main_conn: Sender<Scalar>) {
    loop {
        thread::sleep(Duration::from_millis(interval_ms));
        if main_conn.send(Scalar::new(AppOp::AutoSave, 0)).is_err() {
            break;
        }
    }
}

fn send_action(main_conn: &Sender<Scalar>, action: KeyAction) -> bool {
    let msg = match action {
        KeyAction::Key(c) => Scalar::new(AppOp::Rawkeys, c as usize),
        KeyAction::Press(control) => {
            Scalar::new(AppOp::Control, control.to_usize().unwrap_or(usize::MAX))
        }
        KeyAction::Quit => Scalar::new(AppOp::Quit, 0),
    };
    main_conn.send(msg).is_ok()
}

// Raw terminal: every keypress is delivered as it happens.
fn key_thread(main_conn: Sender<Scalar>) {
    loop {
        match crossterm::event::read() {
            Ok(Event::Key(key)) => {
                if let Some(action) = key_action(&key) {
                    if !send_action(&main_conn, action) {
                        return;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("terminal input: {}", e);
                break;
            }
        }
    }
    main_conn.send(Scalar::new(AppOp::Quit, 0)).ok();
}

// Piped input: a line naming a control presses that button; anything else
// is typed key by key.
fn line_thread(main_conn: Sender<Scalar>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("stdin: {}", e);
                break;
            }
        };
        let actions: Vec<KeyAction> = match Control::from_name(&line) {
            Some(control) => vec![KeyAction::Press(control)],
            None if line.is_empty() => vec![KeyAction::Key('\r')],
            None => line.chars().map(KeyAction::Key).collect(),
        };
        for action in actions {
            if !send_action(&main_conn, action) {
                return;
            }
        }
    }
    main_conn.send(Scalar::new(AppOp::Quit, 0)).ok();
}

/// `STOPWATCH_DATA_DIR` if set, else the platform's local data dir.
fn data_dir(explicit: Option<OsString>) -> Option<PathBuf> {
    match explicit {
        Some(dir) => Some(PathBuf::from(dir)),
        None => BaseDirs::new().map(|dirs| dirs.data_local_dir().to_path_buf()),
    }
}

fn init_logging() {
    let from_env = EnvFilter::try_from_default_env();
    let explicit = from_env.is_ok();
    let filter = from_env.unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("logging unavailable: {}", e);
    }
    if !explicit {
        log::set_max_level(log::LevelFilter::Info);
    }
}

fn main() {
    init_logging();
    log::info!("{} PID is {}", APP_NAME, std::process::id());

    let config = Config::default();
    let store = match data_dir(std::env::var_os(DATA_DIR_ENV)) {
        Some(dir) => FileStore::open(&dir),
        None => {
            log::warn!("Storage disabled, no data directory for this user");
            FileStore::disabled()
        }
    };

    let (main_conn, main_rx) = mpsc::channel::<Scalar>();
    let (pump_conn, pump_rx) = mpsc::channel::<Scalar>();
    {
        let main_conn = main_conn.clone();
        thread::spawn(move || pump_thread(pump_rx, main_conn));
    }
    {
        let main_conn = main_conn.clone();
        let interval = config.autosave_interval_ms;
        thread::spawn(move || autosave_thread(interval, main_conn));
    }
    let raw_mode = match RawMode::enable() {
        Ok(guard) => Some(guard),
        Err(e) => {
            log::info!("raw terminal unavailable ({}), reading lines", e);
            None
        }
    };
    if raw_mode.is_some() {
        thread::spawn(move || key_thread(main_conn));
    } else {
        thread::spawn(move || line_thread(main_conn));
    }

    let mut ui = TerminalUi::new(std::io::stdout());
    ui.draw_help();
    let mut app = Controller::new(
        &config,
        MonotonicClock {
            origin: Instant::now(),
        },
        PumpScheduler {
            pump_conn: pump_conn.clone(),
        },
        store,
        ui,
    );
    app.restore();

    while let Ok(msg) = main_rx.recv() {
        match AppOp::from_usize(msg.id) {
            Some(AppOp::Rawkeys) => {
                let key = char::from_u32(msg.arg1 as u32).unwrap_or('\u{0000}');
                if key == KEY_QUIT {
                    break;
                }
                if let Some(command) = shortcut(key, Focus::Page) {
                    app.dispatch(command);
                }
            }
            Some(AppOp::Control) => match Control::from_usize(msg.arg1) {
                Some(control) => app.dispatch(control.command()),
                None => log::error!("unknown control: {}", msg.arg1),
            },
            Some(AppOp::Pump) => app.dispatch(Command::Tick),
            Some(AppOp::AutoSave) => app.dispatch(Command::PeriodicSave),
            Some(AppOp::Quit) => break,
            None => log::error!("unknown opcode: {:?}", msg),
        }
    }

    // Clean up
    app.dispatch(Command::PeriodicSave);
    drop(app);
    pump_conn.send(Scalar::new(PumpOp::Quit, 0)).ok();
    drop(raw_mode);
    log::info!("{} exiting", APP_NAME);
}
