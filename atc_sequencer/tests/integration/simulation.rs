//! Full cycles against the simulation driver.

use atc_common::changer::config::AtcConfig;
use atc_common::machine::driver::MachineControl;
use atc_common::machine::types::{MotionCommand, OperatorResponse};
use atc_common::tool::ToolNumber;
use atc_hal::drivers::simulation::HaltKind;
use atc_hal::{ScriptedConsole, SimulatedMachine, SimulationConfig};
use atc_sequencer::config::LoadedConfig;
use atc_sequencer::gate::Rejection;
use atc_sequencer::report::CycleOutcome;
use atc_sequencer::Sequencer;
use std::time::Duration;

fn loaded() -> LoadedConfig {
    LoadedConfig::from_config(AtcConfig::default()).unwrap()
}

fn machine(loaded: &LoadedConfig, current: i32, requested: i32) -> SimulatedMachine {
    let mut machine = SimulatedMachine::new(&SimulationConfig::default(), &loaded.config.io);
    machine.set_current_tool(ToolNumber::new(current));
    machine.request_tool(ToolNumber::new(requested));
    machine
}

#[test]
fn test_simulated_rack_to_rack_change() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 3, 7);
    let mut console = ScriptedConsole::proceeding();

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut console)
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::Completed { tool: ToolNumber::new(7) });
    assert_eq!(machine.current_tool(), ToolNumber::new(7));
    assert_eq!(machine.loaded_offset(), Some(ToolNumber::new(7)));
    assert_eq!(machine.position(), [250.0, 1500.0, -3.0]);
    assert_eq!(machine.halted(), None);
    assert!(!machine.output(loaded.config.io.rack_output));
    assert!(!machine.output(loaded.config.io.chuck_output));
    assert_eq!(console.prompts().count(), 0);

    // Travel time is spent in settle polls on the virtual clock.
    assert!(report.elapsed > Duration::from_secs(10));
    assert_eq!(report.elapsed, machine.now());
}

#[test]
fn test_simulated_change_persists_tool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atc_state");
    let loaded = loaded();

    let mut first = machine(&loaded, 0, 4).with_state_file(&path).unwrap();
    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut first, &mut ScriptedConsole::proceeding())
        .unwrap();
    assert!(report.outcome.is_completed());
    drop(first);

    let restarted = SimulatedMachine::new(&SimulationConfig::default(), &loaded.config.io)
        .with_state_file(&path)
        .unwrap();
    assert_eq!(restarted.current_tool(), ToolNumber::new(4));
}

#[test]
fn test_simulated_stop_during_eject() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 3, 7);
    machine.interrupt_at(Duration::from_secs(1));
    let mut console = ScriptedConsole::proceeding();

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut console)
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::Interrupted { current: ToolNumber::new(3) });
    assert_eq!(machine.current_tool(), ToolNumber::new(3));
    assert_eq!(machine.halted(), Some(HaltKind::Decelerated));
    assert_eq!(
        console.notices().last(),
        Some("Tool change was interrupted by user!")
    );
    assert!(!machine
        .history()
        .iter()
        .any(|m| matches!(m, MotionCommand::LoadToolOffset(_))));
}

#[test]
fn test_simulated_overflow_load() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 0, 15);
    let mut console = ScriptedConsole::proceeding();

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut console)
        .unwrap();

    assert!(report.outcome.is_completed());
    assert_eq!(machine.current_tool(), ToolNumber::new(15));
    assert_eq!(console.prompts().count(), 2);
    assert!(!machine.output(loaded.config.io.chuck_output));
}

#[test]
fn test_simulated_overflow_removal_cancelled() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 20, 3);
    let mut console = ScriptedConsole::with_answers([OperatorResponse::Cancel]);

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut console)
        .unwrap();

    assert!(matches!(report.outcome, CycleOutcome::Aborted(_)));
    assert_eq!(machine.current_tool(), ToolNumber::new(20));
    assert_eq!(machine.halted(), None);
}

#[test]
fn test_simulated_unhomed_machine() {
    let loaded = loaded();
    let config = SimulationConfig {
        homed: false,
        ..SimulationConfig::default()
    };
    let mut machine = SimulatedMachine::new(&config, &loaded.config.io);
    machine.set_current_tool(ToolNumber::new(3));
    machine.request_tool(ToolNumber::new(7));

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut ScriptedConsole::proceeding())
        .unwrap();

    assert!(matches!(
        report.outcome,
        CycleOutcome::Rejected(Rejection::NotHomed { .. })
    ));
    assert_eq!(machine.halted(), Some(HaltKind::Hard));
    assert!(machine.history().is_empty());
    assert_eq!(machine.now(), Duration::ZERO);
}

#[test]
fn test_report_serializes_for_cli() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 3, 7);
    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut ScriptedConsole::proceeding())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["from"], 3);
    assert_eq!(json["to"], 7);
    assert_eq!(json["phases"].as_array().map(Vec::len), Some(9));
    assert_eq!(json["elapsed"], report.elapsed.as_millis() as u64);
}

#[test]
fn test_simulated_stop_after_pickup_finishes_safe_z_retract() {
    let loaded = loaded();
    let mut machine = machine(&loaded, 0, 7);
    // Raised during the rack retract dwell, after tool 7 was committed.
    machine.interrupt_at(Duration::from_secs(12));
    let mut console = ScriptedConsole::proceeding();

    let report = Sequencer::new(&loaded.config, &loaded.slot_map)
        .run(&mut machine, &mut console)
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::Interrupted { current: ToolNumber::new(7) });
    assert_eq!(machine.halted(), Some(HaltKind::Decelerated));

    let slot = loaded.slot_map.position(ToolNumber::new(7)).unwrap();
    let [x, y, z] = machine.position();
    assert_eq!((x, y), (slot.x, slot.y));
    assert_eq!(z, loaded.config.heights.safe_z);
}
