//! discrete_demo - renders a built-in discrete sound effect.
//!
//! The demo wires up a small siren: a Norton integrator and a comparator
//! with switched thresholds form a triangle oscillator, and a slow ramp
//! drives a variable mixing resistor to swell the tone in.
//!
//! # Usage
//!
//! ```bash
//! discrete_demo -o siren.wav
//! discrete_demo | ffmpeg -f f32le -ac 1 -ar 48000 -i - siren.wav
//! ```

use std::path::PathBuf;

use clap::Parser;
use discrete_core::{
    audio::{self, normalize_samples, AudioOutput},
    error::Result,
    graph::{Graph, GraphBuilder, Input},
    nodes::{Element, IntegrateInfo, IntegrateKind, MixerDesc, TriggerFn},
    Simulator, DEFAULT_SAMPLE_RATE,
};

/// Discrete sound circuit demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Write a WAV file here instead of streaming raw f32le to stdout
    #[arg(short, long, value_name = "WAV_FILE")]
    output: Option<PathBuf>,

    /// Length of the rendered effect in seconds
    #[arg(short, long, default_value_t = 3.0)]
    seconds: f64,

    /// Sample rate in Hz
    #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: f64,
}

/// Triangle oscillator with a swelling mix, all from graph primitives.
fn build_siren(seconds: f64) -> Result<Graph> {
    let mut g = GraphBuilder::new();

    // The square wave closes the loop, so reserve it up front.
    let square = g.placeholder();

    // Norton integrator: charges while the square is high, discharges
    // while it is low. Component values put the triangle near 440 Hz.
    let tri = g.add(
        Element::integrate(IntegrateInfo {
            kind: IntegrateKind::OpAmp1Norton,
            r1: 100_000.0,
            r2: 10_000.0,
            r3: 0.0,
            c: 33e-9,
            v1: 12.0,
            v_p: 12.0,
            f0: TriggerFn::Trig0,
            f1: TriggerFn::Trig0,
            f2: TriggerFn::Trig0,
        }),
        vec![square.into()],
    )?;

    // Threshold with hysteresis: 8 V while charging, 2 V while falling.
    let threshold = g.add(
        Element::switch(),
        vec![Input::ON, square.into(), 2.0.into(), 8.0.into()],
    )?;
    let over = g.add(
        Element::transform("01>")?,
        vec![Input::ON, tri.into(), threshold.into()],
    )?;
    let flip = g.add(Element::logic_inv(), vec![Input::ON, over.into()])?;
    g.fill(
        square,
        Element::gain(),
        vec![Input::ON, flip.into(), 5.0.into(), 0.0.into()],
    )?;

    // Slow swell: a ramp walks a variable series resistor from 220k down
    // to 10k, pulling the triangle up in the mix.
    let r_swell = g.add(
        Element::ramp(),
        vec![
            Input::ON,
            Input::ON,
            ((220_000.0 - 10_000.0) / seconds).into(),
            220_000.0.into(),
            10_000.0.into(),
            220_000.0.into(),
        ],
    )?;

    let mut desc = MixerDesc::resistor(vec![0.0, 10_000.0]);
    desc.r_node[0] = Some(r_swell);
    desc.c_amp = 1e-6; // strip the DC offset of the triangle
    let mix = g.add(
        Element::mixer(desc)?,
        vec![Input::ON, tri.into(), 0.0.into()],
    )?;

    g.finish(mix)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let graph = build_siren(args.seconds)?;
    let mut sim = Simulator::new(graph, args.sample_rate);

    let mut samples = audio::render(&mut sim, args.seconds);
    normalize_samples(&mut samples);

    match args.output {
        Some(path) => audio::write_wav_file(&path, &samples, args.sample_rate as u32)?,
        None => {
            let mut out = AudioOutput::new();
            out.write_block(&samples)?;
            out.flush()?;
        }
    }
    Ok(())
}
