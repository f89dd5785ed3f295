// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Headless host for the link attacher.
//!
//! Loads a scene, steps it on a physics thread, serves the plugin's services
//! on a dispatch thread and reads one JSON request per line from stdin:
//!
//! ```text
//! {"service": "attach", "request": {"model_name_1": "robot", "link_name_1": "arm",
//!  "model_name_2": "box", "link_name_2": "box_link", "offset": {"x": 0, "y": 0, "z": 0.1}}}
//! ```
//!
//! Each reply is printed as one JSON line on stdout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use attacher_core::plugin::WorldPlugin;
use attacher_core::service::ServiceTransport;
use attacher_core::world::SimulationWorld;
use attacher_infra::{load_scene, LocalServiceBus, RapierWorld, ServiceClient};
use attacher_service::{AttacherConfig, LinkAttacherPlugin};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene description to load (JSON).
    #[arg(long)]
    scene: PathBuf,

    /// Physics steps per second.
    #[arg(long, default_value_t = 240.0)]
    step_hz: f32,

    /// Start paused regardless of the scene setting.
    #[arg(long)]
    paused: bool,
}

/// One stdin line.
#[derive(Deserialize)]
struct Envelope {
    service: String,
    #[serde(default)]
    request: Value,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("rapier3d", log::LevelFilter::Warn)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.step_hz.is_finite() && args.step_hz > 0.0,
        "--step-hz must be a positive number, got {}",
        args.step_hz
    );
    run(args)
}

fn run(args: Args) -> Result<()> {
    let scene = load_scene(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    let world = Arc::new(RapierWorld::from_scene(&scene).context("building world")?);
    if args.paused {
        world.set_paused(true);
    }

    let bus = Arc::new(LocalServiceBus::new());
    bus.init();

    let config: AttacherConfig = scene
        .plugin_config(LinkAttacherPlugin::NAME)
        .context("reading link attacher configuration")?;
    let node = config.node_name.clone();
    let mut plugin = LinkAttacherPlugin::new(config);
    plugin
        .load(world.clone(), &*bus)
        .with_context(|| format!("loading plugin '{}'", plugin.name()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let physics = {
        let world = Arc::clone(&world);
        let stop = Arc::clone(&stop);
        let period = Duration::from_secs_f32(1.0 / args.step_hz);
        thread::Builder::new()
            .name("physics".into())
            .spawn(move || step_until(&world, period, &stop))
            .context("spawning physics thread")?
    };
    let dispatcher = {
        let bus = Arc::clone(&bus);
        thread::Builder::new()
            .name("dispatch".into())
            .spawn(move || bus.serve())
            .context("spawning dispatch thread")?
    };

    let client = bus.client();
    let served = serve_stdin(&client, &*bus, &node);

    client.shutdown();
    stop.store(true, Ordering::Release);
    if dispatcher.join().is_err() {
        log::error!("Dispatch thread panicked.");
    }
    if physics.join().is_err() {
        log::error!("Physics thread panicked.");
    }
    log::info!("Runtime stopped.");
    served
}

fn step_until(world: &RapierWorld, period: Duration, stop: &AtomicBool) {
    log::debug!("Physics thread stepping every {period:?}");
    let dt = period.as_secs_f32();
    let mut next = Instant::now();
    while !stop.load(Ordering::Acquire) {
        world.step(dt);
        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            // Running behind; drop the backlog instead of bursting.
            next = now;
        }
    }
}

/// Reads requests until EOF. Malformed lines are answered with an error
/// object and do not stop the loop.
fn serve_stdin(client: &ServiceClient, transport: &dyn ServiceTransport, node: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Envelope>(&line) {
            Ok(envelope) => {
                let service = if envelope.service.starts_with('/') {
                    envelope.service
                } else {
                    transport.resolve_name(node, &envelope.service)
                };
                match client.call(&service, envelope.request) {
                    Ok(response) => response,
                    Err(err) => json!({ "error": err.to_string() }),
                }
            }
            Err(err) => json!({ "error": format!("malformed request: {err}") }),
        };
        writeln!(stdout, "{reply}").context("writing reply")?;
        stdout.flush().context("flushing stdout")?;
    }
    Ok(())
}
