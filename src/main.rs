//! Console front-end for the panel core.
//!
//! This binary is the presentation loop: it owns the single thread that
//! pumps the panel, reads intent commands from stdin, re-polls the port
//! list while disconnected, and turns core notifications into console
//! output. Everything device-related lives in the library.

use clap::Parser;
use domu_panel::{
    available_ports, config::ConfigLoader, AppError, DoorIntentOutcome, DoorPhase, Panel,
    PanelObserver, SWITCH_COUNT, SWITCH_NAMES,
};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Control panel for a serial-attached home-automation device",
    long_about = "Drives the panel device over a serial line: light switches, a door \
                  with timed auto-close, and a target-temperature sensor. Commands are \
                  read interactively from stdin; type 'help' for the list."
)]
struct Args {
    /// Serial port to connect to at startup.
    #[arg(short, long)]
    port: Option<String>,

    /// Override the configured baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Explicit configuration file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// List candidate serial ports and exit.
    #[arg(long)]
    list_ports: bool,
}

/// Observer that renders core notifications on the console and launches the
/// external camera viewer when the doorbell button is pressed.
struct ConsoleFrontend {
    camera_command: Option<String>,
}

impl ConsoleFrontend {
    fn launch_camera(&self) -> Result<(), AppError> {
        let Some(command) = self.camera_command.as_deref() else {
            return Ok(());
        };
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Ok(());
        };
        std::process::Command::new(program)
            .args(parts)
            .spawn()
            .map(|_| ())
            .map_err(|e| AppError::External(format!("failed to launch '{command}': {e}")))
    }
}

impl PanelObserver for ConsoleFrontend {
    fn on_switch_changed(&mut self, index: u8, on: bool) {
        let name = SWITCH_NAMES
            .get(index as usize)
            .copied()
            .unwrap_or("Unknown");
        println!("{} is now {}", name, if on { "on" } else { "off" });
    }

    fn on_door_phase_changed(&mut self, phase: DoorPhase) {
        let text = match phase {
            DoorPhase::Closed => "door closed",
            DoorPhase::Opening => "door opening",
            DoorPhase::Open => "door open",
            DoorPhase::Closing => "door closing",
        };
        println!("{text}");
    }

    fn on_reading_updated(&mut self, raw: u16, celsius: f32) {
        println!(
            "target temperature: {celsius:.1} C (raw {raw}) - {}",
            hvac_mode(celsius)
        );
    }

    fn on_button_pressed(&mut self) {
        println!("doorbell pressed - type 'open' to admit the visitor");
        if let Err(e) = self.launch_camera() {
            error!(error = %e, "camera viewer did not start");
            println!("(camera viewer unavailable: {e})");
        }
    }

    fn on_connection_status_changed(&mut self, connected: bool, detail: &str) {
        if connected {
            println!("connected to {detail}");
        } else {
            println!("disconnected");
        }
    }
}

/// Display-side interpretation of the target temperature.
fn hvac_mode(celsius: f32) -> &'static str {
    if celsius < 18.0 {
        "heating"
    } else if celsius > 26.0 {
        "cooling"
    } else {
        "comfort"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config = loader.into_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    if args.list_ports {
        for port in available_ports() {
            println!("{port}");
        }
        return Ok(());
    }

    let mut options = config.panel_options();
    if let Some(baud) = args.baud {
        options.baud_rate = baud;
    }
    let rescan_interval = Duration::from_millis(config.panel.port_rescan_ms);

    let frontend = ConsoleFrontend {
        camera_command: config.panel.camera_command.clone(),
    };
    let mut panel = Panel::new(options, Box::new(frontend));

    if let Some(port) = &args.port {
        panel.connect(port)?;
        info!(port = %port, "connecting");
    } else {
        println!("no port given; 'ports' lists candidates, 'connect <port>' opens one");
    }

    // Stdin is blocking, so a helper thread feeds lines into the loop.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if line_tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut known_ports: Vec<String> = Vec::new();
    let mut last_rescan = Instant::now() - rescan_interval;

    loop {
        panel.pump();

        while let Ok(line) = line_rx.try_recv() {
            if !handle_command(&mut panel, &line) {
                panel.disconnect();
                return Ok(());
            }
        }

        if !panel.is_connected() && last_rescan.elapsed() >= rescan_interval {
            last_rescan = Instant::now();
            let ports = available_ports();
            if ports != known_ports {
                known_ports = ports;
                if known_ports.is_empty() {
                    println!("no serial ports detected");
                } else {
                    println!("available ports: {}", known_ports.join(", "));
                }
            }
        }

        thread::sleep(Duration::from_millis(20));
    }
}

/// Execute one console command. Returns false when the loop should exit.
fn handle_command(panel: &mut Panel, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return true;
    };

    let result: Result<(), AppError> = match command {
        "help" => {
            print_help();
            Ok(())
        }
        "ports" => {
            for port in available_ports() {
                println!("{port}");
            }
            Ok(())
        }
        "connect" => match parts.next() {
            Some(port) => panel.connect(port),
            None => {
                println!("usage: connect <port>");
                Ok(())
            }
        },
        "disconnect" => {
            panel.disconnect();
            Ok(())
        }
        "toggle" => match parts.next().and_then(|s| s.parse::<u8>().ok()) {
            Some(index) => panel.toggle_switch(index),
            None => {
                println!("usage: toggle <0-{}>", SWITCH_COUNT - 1);
                Ok(())
            }
        },
        "open" => panel.open_door().map(|outcome| {
            if outcome == DoorIntentOutcome::AlreadyOpen {
                println!("door is already open");
            }
        }),
        "close" => panel.close_door().map(|outcome| {
            if outcome == DoorIntentOutcome::AlreadyClosed {
                println!("door is already closed");
            }
        }),
        "read" => panel.request_reading(),
        "poll" => match parts.next() {
            Some("on") => panel.set_periodic_polling(true),
            Some("off") => panel.set_periodic_polling(false),
            _ => {
                println!("usage: poll on|off");
                Ok(())
            }
        },
        "status" => {
            print_status(panel);
            Ok(())
        }
        "quit" | "exit" => return false,
        other => {
            println!("unknown command '{other}', try 'help'");
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(error = %e, command, "command failed");
        println!("error: {e}");
    }
    true
}

fn print_status(panel: &Panel) {
    let snapshot = panel.snapshot();
    println!(
        "link: {}",
        if panel.is_ready() {
            "ready"
        } else if panel.is_connected() {
            "settling"
        } else {
            "disconnected"
        }
    );
    for (i, switch) in snapshot.switches.iter().enumerate() {
        println!(
            "  {}: {}",
            SWITCH_NAMES[i],
            if switch.confirmed_on { "on" } else { "off" }
        );
    }
    println!("  door: {:?}", snapshot.door);
    match snapshot.last_reading {
        Some(reading) => println!(
            "  target: {:.1} C (raw {}) - {}",
            reading.celsius,
            reading.raw,
            hvac_mode(reading.celsius)
        ),
        None => println!("  target: no reading yet"),
    }
    println!("  visitors: {}", snapshot.visitor_count);
    println!(
        "  polling: {}",
        if panel.polling_enabled() { "on" } else { "off" }
    );
}

fn print_help() {
    println!("commands:");
    println!("  ports              list candidate serial ports");
    println!("  connect <port>     open the device link");
    println!("  disconnect         close the device link");
    println!("  toggle <0-3>       toggle a light switch");
    println!("  open / close       drive the door");
    println!("  read               request one target reading");
    println!("  poll on|off        periodic target readings");
    println!("  status             show the current device state");
    println!("  quit               disconnect and exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hvac_mode_bands() {
        assert_eq!(hvac_mode(15.0), "heating");
        assert_eq!(hvac_mode(22.5), "comfort");
        assert_eq!(hvac_mode(30.0), "cooling");
    }
}
