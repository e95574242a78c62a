mod common;

use channoise_core::diagnostics::{DiagnosticSink, EventRecord, StepRecord};
use channoise_core::{AppConfig, WriterSink};
use channoise_lib::model::{Simulation, SimulationError, VoltageProtocol};
use common::SimulationBuilder;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Counts {
    events: u64,
    steps: u64,
}

struct SharedSink(Arc<Mutex<Counts>>);

impl DiagnosticSink for SharedSink {
    fn record_event(&mut self, _event: &EventRecord) {
        self.0.lock().unwrap().events += 1;
    }

    fn record_step(&mut self, _step: &StepRecord) {
        self.0.lock().unwrap().steps += 1;
    }
}

#[test]
fn test_config_file_drives_simulation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[simulation]
nodes = 3
channels_per_node = 250
step_size_ms = 0.02
steps = 40
seed = 8

[kinetics]
preset = "constant"
constant_rates = [3.0, 1.0, 2.0, 1.0]

[channel]
single_channel_conductance_ps = 10.0
"#
    )
    .unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.simulation.nodes, 3);
    assert_eq!(config.simulation.seed, Some(8));

    let steps = config.simulation.steps;
    let mut sim = Simulation::new(config).unwrap();
    assert_eq!(sim.seed(), 8);

    let mut seen = 0;
    sim.run(&VoltageProtocol::hold(0.0), steps, |report| {
        seen += 1;
        for (open, g) in report.open.iter().zip(&report.conductance_ns) {
            assert!((f64::from(*open) * 0.01 - g).abs() < 1e-9);
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, 40);
    assert_eq!(sim.node_count(), 3);
}

#[test]
fn test_report_callback_error_stops_run() {
    let mut sim = SimulationBuilder::new().build();
    let mut calls = 0;
    let err = sim
        .run(&VoltageProtocol::hold(0.0), 20, |_| {
            calls += 1;
            if calls == 5 {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            } else {
                Ok(())
            }
        })
        .unwrap_err();

    assert!(matches!(err, SimulationError::Io(_)));
    assert_eq!(calls, 5);
    assert_eq!(sim.step_index, 5);
}

#[test]
fn test_diagnostics_see_every_node_and_event() {
    let counts = Arc::new(Mutex::new(Counts::default()));
    let mut sim = SimulationBuilder::new()
        .with_nodes(4)
        .build()
        .with_diagnostics(Box::new(SharedSink(Arc::clone(&counts))));

    let summary = sim.run(&VoltageProtocol::hold(0.0), 25, |_| Ok(())).unwrap();

    let counts = counts.lock().unwrap();
    assert_eq!(counts.steps, 4 * 25);
    assert_eq!(counts.events, summary.events);
    assert!(counts.events > 0);
}

struct FullDisk;

impl Write for FullDisk {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_failed_dump_write_fails_the_run() {
    let mut sim = SimulationBuilder::new()
        .build()
        .with_diagnostics(Box::new(WriterSink::new(FullDisk)));

    let err = sim
        .run(&VoltageProtocol::hold(0.0), 5, |_| Ok(()))
        .unwrap_err();

    match err {
        SimulationError::Io(e) => assert_eq!(e.to_string(), "no space left"),
        other => panic!("Expected dump write error, got {other:?}"),
    }
}

#[test]
fn test_run_continues_after_previous_run() {
    let mut sim = SimulationBuilder::new().with_nodes(2).build();
    let protocol = VoltageProtocol::hold(0.0);
    sim.run(&protocol, 10, |_| Ok(())).unwrap();
    let clock = sim.time_ms();

    sim.run(&protocol, 10, |report| {
        assert!(report.time_ms >= clock - 1e-12);
        Ok(())
    })
    .unwrap();
    assert_eq!(sim.step_index, 20);
}

#[test]
fn test_reinitialize_resets_step_counter() {
    let mut sim = SimulationBuilder::new().with_nodes(2).build();
    sim.run(&VoltageProtocol::hold(0.0), 10, |_| Ok(())).unwrap();
    sim.initialize(&[0.0, 0.0]).unwrap();

    assert_eq!(sim.step_index, 0);
    assert_eq!(sim.open_counts(), vec![28, 28]);
}

#[test]
fn test_fingerprint_in_summary_matches_config() {
    let builder = SimulationBuilder::new();
    let expected = builder.config().fingerprint();
    let mut sim = builder.build();
    let summary = sim.run(&VoltageProtocol::hold(0.0), 1, |_| Ok(())).unwrap();
    assert_eq!(summary.fingerprint, expected);
    assert_eq!(summary.fingerprint.len(), 16);
}
