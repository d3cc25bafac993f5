// Library-style modules expose more API (accessors, helpers used by tests)
// than the binary itself calls
#![allow(dead_code)]

mod control;
mod display;
mod kaleido;
mod mqtt;
mod settings;
mod texture;
mod util;

use anyhow::{bail, Context, Result};
use control::{Command, Controller};
use display::{
    Display, InputEvent, MouseButtonKind, PixelBuffer, RenderTarget, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
use kaleido::{DoubleBuffer, Kaleidoscope};
use mqtt::MqttClient;
use sdl2::keyboard::Keycode;
use settings::{FilterConfig, FilterParams, ParamPatch, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use texture::{Pattern, Texture};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use util::FpsCounter;

const TITLE: &str = "kaleidoscope";

/// Command line options
#[derive(Debug, Clone, PartialEq)]
struct Options {
    width: u32,
    height: u32,
    vsync: bool,
    image: Option<PathBuf>,
    pattern: Pattern,
    config: PathBuf,
    feedback: bool,
    mqtt_host: Option<String>,
    mqtt_topic: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            image: None,
            pattern: Pattern::Checker,
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            feedback: false,
            mqtt_host: None,
            mqtt_topic: MqttClient::default_topic().to_string(),
        }
    }
}

fn print_usage() {
    println!("Usage: kaleidoscope [OPTIONS]");
    println!();
    println!("Options:");
    println!(
        "  --width W, -w W           Set window width (default: {})",
        DEFAULT_WIDTH
    );
    println!(
        "  --height H, -h H          Set window height (default: {})",
        DEFAULT_HEIGHT
    );
    println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1280x720)");
    println!("  --image PATH              Source image (resized to the window)");
    println!("  --pattern NAME            Procedural source: checker, xor, plasma");
    println!(
        "  --config PATH             Filter config file (default: {})",
        DEFAULT_CONFIG_PATH
    );
    println!("  --feedback                Feed each output frame back as the next source");
    println!("  --mqtt HOST               Receive parameter changes from an MQTT broker");
    println!(
        "  --topic TOPIC             MQTT topic (default: {})",
        MqttClient::default_topic()
    );
    println!("  --no-vsync                Disable VSync for uncapped framerate");
    println!("  --help                    Show this help message");
}

fn print_controls() {
    println!("Controls:");
    println!("  Arrows      - Move center (Shift: x10)");
    println!("  + / -       - Grow / shrink triangle (mouse wheel too)");
    println!("  , / .       - Rotate by 1 degree (Shift: x10)");
    println!("  Left click  - Set center (drag to move)");
    println!("  T           - Toggle triangle outline");
    println!("  B           - Toggle feedback");
    println!("  R           - Reset to defaults");
    println!("  S           - Save current values as defaults");
    println!("  L           - Reload config");
    println!("  F           - Toggle FPS in title");
    println!("  Escape      - Quit");
    println!();
    println!("Remote: echo 'size 80' | nc -U {}", Controller::socket_path());
}

fn parse_dimension(value: &str, what: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => bail!("invalid {} '{}'", what, value),
    }
}

/// Parse command line arguments. Returns `None` when only help was requested.
fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let takes_value = matches!(
            flag,
            "--width"
                | "-w"
                | "--height"
                | "-h"
                | "--resolution"
                | "-r"
                | "--image"
                | "--pattern"
                | "--config"
                | "--mqtt"
                | "--topic"
        );
        let value = if takes_value {
            i += 1;
            match args.get(i) {
                Some(v) => v.as_str(),
                None => bail!("{} needs a value", flag),
            }
        } else {
            ""
        };

        match flag {
            "--no-vsync" => options.vsync = false,
            "--feedback" => options.feedback = true,
            "--width" | "-w" => options.width = parse_dimension(value, "width")?,
            "--height" | "-h" => options.height = parse_dimension(value, "height")?,
            "--resolution" | "-r" => {
                // Parse WxH format (e.g., 1920x1080)
                let Some((w, h)) = value.split_once('x') else {
                    bail!("invalid resolution '{}' (expected WxH)", value);
                };
                options.width = parse_dimension(w, "width")?;
                options.height = parse_dimension(h, "height")?;
            },
            "--image" => options.image = Some(PathBuf::from(value)),
            "--pattern" => options.pattern = value.parse()?,
            "--config" => options.config = PathBuf::from(value),
            "--mqtt" => options.mqtt_host = Some(value.to_string()),
            "--topic" => options.mqtt_topic = value.to_string(),
            "--help" => return Ok(None),
            other => bail!("unknown option '{}' (see --help)", other),
        }
        i += 1;
    }

    Ok(Some(options))
}

/// Host-side state: parameters, config and toggles
struct App {
    config: FilterConfig,
    config_path: PathBuf,
    params: FilterParams,
    feedback: bool,
    show_fps: bool,
    dragging: bool,
    /// Copy the pristine source into the edit buffer before the next frame
    refill: bool,
    quit: bool,
}

impl App {
    fn new(config: FilterConfig, config_path: PathBuf, feedback: bool) -> Self {
        Self {
            params: config.defaults(),
            config,
            config_path,
            feedback,
            show_fps: false,
            dragging: false,
            refill: true,
            quit: false,
        }
    }

    fn patch(&mut self, patch: ParamPatch) {
        self.params.apply(&patch, &self.config);
    }

    fn nudge(&mut self, dx: i32, dy: i32, dsize: i32, dangle: i32) {
        let p = self.params;
        self.patch(ParamPatch {
            x: Some(p.x.saturating_add(dx)),
            y: Some(p.y.saturating_add(dy)),
            size: Some(p.size.saturating_add(dsize)),
            angle: Some(p.angle.saturating_add(dangle)),
            show_triangle: None,
        });
    }

    fn set_center(&mut self, x: i32, y: i32) {
        self.patch(ParamPatch {
            x: Some(x),
            y: Some(y),
            ..ParamPatch::default()
        });
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Set(patch) => self.patch(patch),
            Command::ToggleOutline => {
                self.params.show_triangle = !self.params.show_triangle;
                info!(show_triangle = self.params.show_triangle, "outline toggled");
            },
            Command::ToggleFeedback => {
                self.feedback = !self.feedback;
                info!(feedback = self.feedback, "feedback toggled");
            },
            Command::Reset => {
                self.params = self.config.defaults();
                self.refill = true;
                info!("parameters reset");
            },
            Command::Save => {
                self.config.store_defaults(&self.params);
                match self.config.save(&self.config_path) {
                    Ok(()) => info!(path = %self.config_path.display(), "config saved"),
                    Err(e) => warn!("failed to save config: {:#}", e),
                }
            },
            Command::Load => match FilterConfig::load(&self.config_path) {
                Ok(config) => {
                    self.params = config.defaults();
                    self.config = config;
                    info!(path = %self.config_path.display(), "config loaded");
                },
                Err(e) => warn!("failed to load config: {:#}", e),
            },
            Command::Quit => self.quit = true,
        }
    }

    fn handle_key(&mut self, key: Keycode, shift: bool) {
        let step = if shift { 10 } else { 1 };
        match key {
            Keycode::Escape => self.quit = true,
            Keycode::Left => self.nudge(-step, 0, 0, 0),
            Keycode::Right => self.nudge(step, 0, 0, 0),
            Keycode::Up => self.nudge(0, -step, 0, 0),
            Keycode::Down => self.nudge(0, step, 0, 0),
            Keycode::Equals | Keycode::Plus | Keycode::KpPlus => self.nudge(0, 0, step, 0),
            Keycode::Minus | Keycode::KpMinus => self.nudge(0, 0, -step, 0),
            // angle is in tenths of a degree
            Keycode::Comma => self.nudge(0, 0, 0, -10 * step),
            Keycode::Period => self.nudge(0, 0, 0, 10 * step),
            Keycode::T => self.handle_command(Command::ToggleOutline),
            Keycode::B => self.handle_command(Command::ToggleFeedback),
            Keycode::R => self.handle_command(Command::Reset),
            Keycode::S => self.handle_command(Command::Save),
            Keycode::L => self.handle_command(Command::Load),
            Keycode::F => self.show_fps = !self.show_fps,
            _ => {},
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => self.quit = true,
            InputEvent::KeyDown { key, shift } => self.handle_key(key, shift),
            InputEvent::MouseDown {
                x,
                y,
                button: MouseButtonKind::Left,
            } => {
                self.dragging = true;
                self.set_center(x, y);
            },
            InputEvent::MouseMove { x, y } if self.dragging => self.set_center(x, y),
            InputEvent::MouseUp {
                button: MouseButtonKind::Left,
            } => self.dragging = false,
            InputEvent::Wheel { delta } => self.nudge(0, 0, delta.saturating_mul(5), 0),
            _ => {},
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kaleidoscope=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };
    let (width, height) = (options.width, options.height);

    // Source frame, converted once. Rows are padded like the editing host's.
    let source = match &options.image {
        Some(path) => Texture::load(path, width, height)?,
        None => Texture::pattern(options.pattern, width, height),
    };
    let pristine = source.to_yc_frame(width.next_multiple_of(16));
    let mut frames = DoubleBuffer::new(pristine.clone());
    let mut kaleidoscope = Kaleidoscope::new();

    let config = FilterConfig::load_or_default(&options.config);
    let mut app = App::new(config, options.config.clone(), options.feedback);

    let controller = match Controller::new() {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("control socket disabled: {:#}", e);
            None
        },
    };
    let mqtt = match &options.mqtt_host {
        Some(host) => Some(MqttClient::new(host, &options.mqtt_topic)?),
        None => None,
    };

    let (mut display, texture_creator) =
        Display::with_options(TITLE, width, height, options.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    let mut buffer = PixelBuffer::with_size(width, height);

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut title_shows_fps = false;
    let mut frame: u64 = 0;

    println!("=== kaleidoscope ===");
    println!("Resolution: {}x{}", display.width(), display.height());
    match &options.image {
        Some(path) => println!("Source: {}", path.display()),
        None => println!("Source: {:?} pattern", options.pattern),
    }
    if options.vsync {
        println!("VSync: ON (60fps locked). Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!("Use --help for command line options.");
    print_controls();

    while !app.quit {
        let avg_fps = fps_counter.tick();

        for event in display.poll_events() {
            app.handle_event(event);
        }
        let remote = controller.iter().flat_map(Controller::poll);
        let remote = remote.chain(mqtt.iter().flat_map(MqttClient::poll));
        for cmd in remote.collect::<Vec<_>>() {
            app.handle_command(cmd);
        }
        if app.quit {
            break;
        }

        if app.refill || !app.feedback {
            frames.edit_mut().copy_from(&pristine);
            app.refill = false;
        }
        let lattice = app.params.lattice().context("invalid filter parameters")?;
        kaleidoscope.process(&mut frames, lattice, app.params.show_triangle);

        buffer.copy_from_yc(frames.edit());
        display.present(&mut target, &buffer)?;

        // FPS in the window title (press F to toggle)
        frame += 1;
        if app.show_fps && frame % 30 == 0 {
            let (min_fps, max_fps) = fps_counter.min_max_fps();
            display.set_title(&format!(
                "{} - {} fps ({} min, {} max, {:.1}ms)",
                TITLE,
                avg_fps as u32,
                min_fps as u32,
                max_fps as u32,
                fps_counter.avg_frame_time_ms()
            ))?;
            title_shows_fps = true;
        } else if !app.show_fps && title_shows_fps {
            display.set_title(TITLE)?;
            title_shows_fps = false;
        }
    }

    info!("bye");
    Ok(())
}
